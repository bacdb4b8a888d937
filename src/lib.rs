mod client;
pub mod fleet;
pub mod metadata;
pub mod prompt;
pub mod tools;
pub mod transport;

#[cfg(test)]
mod testing;

pub use fleet_voice_types as types;
pub use fleet_voice_utils as utils;
pub use client::{
    Config, ConfigBuilder, ConfigError, EventHandler, OutboundStream, SessionError, SessionHandle,
    SessionManager,
};
