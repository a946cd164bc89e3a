//! Application error types.
//!
//! The context engine itself is designed to never fail: malformed records
//! and unparseable date phrases degrade to documented defaults. Errors only
//! surface for the caller-supplied current moment, configuration loading,
//! and remote collaborator calls.

/// Error model used throughout configuration, orchestration, and
/// collaborator calls.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The caller-supplied current-moment timestamp could not be parsed.
    /// Every downstream date computation depends on it, so this is
    /// surfaced instead of silently defaulting.
    #[error("{0}")]
    InvalidTimestamp(String),
    #[error("{0}")]
    InvalidRequest(String),
    /// Remote language-model or transcription service failure.
    #[error("{0}")]
    Provider(String),
    /// The model replied, but not in the shape the pipeline requires.
    #[error("{0}")]
    ModelResponse(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Creates an invalid current-moment timestamp error.
    pub fn invalid_timestamp(message: impl Into<String>) -> Self {
        Self::InvalidTimestamp(message.into())
    }

    /// Creates an invalid caller input error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates a remote collaborator error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Creates a malformed-model-reply error.
    pub fn model_response(message: impl Into<String>) -> Self {
        Self::ModelResponse(message.into())
    }

    /// Creates a generic internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
