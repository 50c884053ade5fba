//! Error types for contentai.

use thiserror::Error;

/// Result type alias using contentai's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for contentai operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Task not found
    #[error("Task not found: {0}")]
    TaskNotFound(uuid::Uuid),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Chat completion failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// A completion reply could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Task lifecycle violation
    #[error("Task error: {0}")]
    Task(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error stems from the caller's request rather than a collaborator.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
