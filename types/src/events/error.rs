use serde::{Deserialize, Serialize};

pub const SOURCE_BIDIRECTIONAL_STREAM: &str = "bidirectionalStream";
pub const SOURCE_RESPONSE_STREAM: &str = "responseStream";
pub const SOURCE_MODEL_STREAM: &str = "modelStreamErrorException";
pub const SOURCE_INTERNAL_SERVER: &str = "internalServerException";

/// Error surfaced to a session's handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    source: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ErrorEvent {
    pub fn new(source: &str, message: &str) -> Self {
        Self {
            source: source.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }
}
