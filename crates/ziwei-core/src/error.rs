//! Error types for the Ziwei interpretation core

use crate::generation::GenerationError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for interpretation core operations
pub type ZiweiResult<T> = Result<T, ZiweiError>;

/// Main error type for the interpretation core
#[derive(Error, Debug, Clone)]
pub enum ZiweiError {
    /// Configuration related errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid input errors
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Request rejected by admission control
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    AdmissionRejected {
        retry_after_secs: u64,
        reset_at: DateTime<Utc>,
    },

    /// Chart engine errors
    #[error("chart computation failed: {0}")]
    Chart(String),

    /// Upstream generation errors
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Every model in the fallback chain failed
    #[error("all {tried} models exhausted, last error: {last}")]
    AllModelsExhausted {
        tried: usize,
        #[source]
        last: GenerationError,
    },

    /// Persistent store errors (absorbed by the cache layer, never surfaced
    /// to callers of `interpret`)
    #[error("storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),
}

impl ZiweiError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a new chart engine error
    pub fn chart(message: impl Into<String>) -> Self {
        Self::Chart(message.into())
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// HTTP-like status code the application layer should respond with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AdmissionRejected { .. } => 429,
            Self::InvalidInput(_) => 400,
            Self::Chart(_) => 422,
            Self::Generation(inner) => inner.status_code(),
            Self::AllModelsExhausted { .. } => 502,
            Self::Config(_) | Self::Storage(_) | Self::Json(_) | Self::Io(_) => 500,
        }
    }

    /// Safe, non-empty message suitable for end users.
    ///
    /// Never exposes upstream error bodies or internal detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::AdmissionRejected {
                retry_after_secs, ..
            } => format!(
                "You have made too many requests. Please wait {retry_after_secs} seconds and try again."
            ),
            Self::InvalidInput(_) => {
                "The request could not be understood. Please check the birth data and try again."
                    .to_string()
            }
            Self::Chart(_) => {
                "The chart could not be computed for the given birth data.".to_string()
            }
            Self::Generation(GenerationError::Timeout(_)) => {
                "The interpretation took too long to produce. Please try again.".to_string()
            }
            Self::Generation(_) | Self::AllModelsExhausted { .. } => {
                "The interpretation service is busy right now. Please try again shortly."
                    .to_string()
            }
            Self::Config(_) | Self::Storage(_) | Self::Json(_) | Self::Io(_) => {
                "Something went wrong on our side. Please try again later.".to_string()
            }
        }
    }
}

impl From<std::io::Error> for ZiweiError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for ZiweiError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}
