//! OpenAI-specific error handling.

use contentai_core::Error;

/// Which API surface a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Embeddings,
    ChatCompletions,
}

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and the error's type or code string.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Convert an OpenAI failure into a contentai Error.
///
/// Credential and model problems are configuration errors; everything else is
/// reported against the endpoint that failed.
pub fn to_contentai_error(code: OpenAIErrorCode, endpoint: Endpoint, message: &str) -> Error {
    let upstream = |msg: String| match endpoint {
        Endpoint::Embeddings => Error::Embedding(msg),
        Endpoint::ChatCompletions => Error::Inference(msg),
    };

    match code {
        OpenAIErrorCode::AuthenticationError => {
            Error::Config(format!("Authentication failed: {}", message))
        }
        OpenAIErrorCode::ModelNotFound => Error::Config(format!("Model not found: {}", message)),
        OpenAIErrorCode::RateLimitExceeded => {
            upstream(format!("Rate limit exceeded: {}", message))
        }
        OpenAIErrorCode::ContextLengthExceeded => {
            upstream(format!("Context too long: {}", message))
        }
        OpenAIErrorCode::ServerError => upstream(format!("Server error: {}", message)),
        OpenAIErrorCode::Unknown => upstream(message.to_string()),
    }
}
