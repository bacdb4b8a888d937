/// Failures reported by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Stream session with ID {0} already exists")]
    AlreadyExists(String),
    #[error("Stream session {0} not found")]
    NotFound(String),
    #[error("Stream session {0} is not active")]
    Inactive(String),
    #[error("Stream session {0} has already been initiated")]
    AlreadyInitiated(String),
    #[error("Prompt has not been started for session {0}")]
    PromptNotStarted(String),
    #[error("Audio content has not been started for session {0}")]
    AudioNotStarted(String),
    #[error("Audio content has already ended for session {0}")]
    AudioEnded(String),
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Failures while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}
