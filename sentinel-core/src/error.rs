//! Error types for sentinel-core.
//!
//! Only the collaborators return errors: the upstream model call, the trace
//! transport and the trace store. The analyzers themselves are total.

use thiserror::Error;

/// Result type alias using sentinel-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur outside the pure verification pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// LLM API error
    #[error("LLM API error: {provider} - {message}")]
    LlmApi { provider: String, message: String },

    /// LLM error (simple variant)
    #[error("LLM error: {0}")]
    LLM(String),

    /// Trace could not be delivered to the logging endpoint
    #[error("Trace logging error: {0}")]
    TraceLog(String),

    /// Trace storage error
    #[error("Trace storage error: {0}")]
    TraceStorage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an LLM API error.
    pub fn llm_api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LlmApi {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a trace logging error.
    pub fn trace_log(message: impl Into<String>) -> Self {
        Self::TraceLog(message.into())
    }

    /// Create a trace storage error.
    pub fn trace_storage(message: impl Into<String>) -> Self {
        Self::TraceStorage(message.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::TraceStorage(err.to_string())
    }
}
