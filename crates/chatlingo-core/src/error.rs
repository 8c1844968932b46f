use thiserror::Error;

/// Top-level error type for Chatlingo.
#[derive(Debug, Error)]
pub enum ChatlingoError {
    /// Error from an LLM provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from a messaging platform.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Conversation store error.
    #[error("memory error: {0}")]
    Memory(String),

    /// Domain validation error (bad day number, unknown scenario, malformed selection).
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
