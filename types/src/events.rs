pub mod client;
pub mod error;
pub mod server;
pub mod session;

use serde::{Deserialize, Serialize};

pub use client::ClientEvent;
pub use error::ErrorEvent;
pub use server::{ClassifyError, ServerEvent};
pub use session::{EventKind, SessionEvent};

/// Envelope every outbound frame travels in: `{"event": {"<kind>": {...}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    event: ClientEvent,
}

impl Frame {
    pub fn new(event: ClientEvent) -> Self {
        Self { event }
    }

    pub fn event(&self) -> &ClientEvent {
        &self.event
    }

    pub fn kind(&self) -> &'static str {
        self.event.kind()
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl From<ClientEvent> for Frame {
    fn from(event: ClientEvent) -> Self {
        Self::new(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::client::SessionEnd;

    #[test]
    fn frame_wraps_event_in_envelope() {
        let frame = Frame::from(ClientEvent::SessionEnd(SessionEnd::new()));
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), r#"{"event":{"sessionEnd":{}}}"#);
        assert_eq!(frame.kind(), "sessionEnd");
    }
}
