pub mod session;
pub mod tools;
pub mod audio;
pub mod events;

pub use events::{ClientEvent, EventKind, Frame, ServerEvent, SessionEvent};
pub use session::InferenceConfig;
pub use tools::{Tool, ToolResult, ToolSpec};
