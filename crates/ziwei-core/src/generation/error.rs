//! Upstream generation error classification
//!
//! Errors from the narrative backend are classified once, at the edge, so the
//! retry executor and the fallback chain can make recovery decisions without
//! string matching.

use std::time::Duration;
use thiserror::Error;

/// Classified failure from the narrative generation backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Backend signalled a rate limit, possibly with a suggested delay
    #[error("upstream rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Backend 5xx-equivalent failure
    #[error("upstream server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Backend 4xx-equivalent failure, non-rate-limit
    #[error("upstream client error (status {status}): {message}")]
    Client { status: u16, message: String },

    /// Attempt exceeded the configured per-attempt duration
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Response parsed but lacked the required content
    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// Transport-level failure before any response arrived
    #[error("network error: {0}")]
    Network(String),
}

impl GenerationError {
    /// Classify an HTTP-like status into an error variant
    pub fn from_status(
        status: u16,
        message: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        let message = message.into();
        match status {
            429 => Self::RateLimited {
                message,
                retry_after,
            },
            s if s >= 500 => Self::Server { status: s, message },
            s => Self::Client { status: s, message },
        }
    }

    /// Whether a retry of the same model may succeed.
    ///
    /// Rate limits, server errors, timeouts (including HTTP 408), network
    /// failures, and malformed responses are transient; any other client
    /// error is fatal for this model.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. }
            | Self::Server { .. }
            | Self::Timeout(_)
            | Self::Malformed(_)
            | Self::Network(_) => true,
            Self::Client { status, .. } => *status == 408,
        }
    }

    /// Whether the backend explicitly signalled a rate limit
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Server-suggested delay before the next attempt, if one was provided
    pub fn retry_hint(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// HTTP-like status code to surface when this error reaches a caller
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RateLimited { .. } => 429,
            Self::Server { status, .. } | Self::Client { status, .. } => *status,
            Self::Timeout(_) => 504,
            Self::Malformed(_) | Self::Network(_) => 502,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            GenerationError::from_status(429, "slow down", Some(Duration::from_secs(5))),
            GenerationError::RateLimited { .. }
        ));
        assert!(matches!(
            GenerationError::from_status(503, "unavailable", None),
            GenerationError::Server { status: 503, .. }
        ));
        assert!(matches!(
            GenerationError::from_status(400, "bad prompt", None),
            GenerationError::Client { status: 400, .. }
        ));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(GenerationError::from_status(500, "boom", None).is_retryable());
        assert!(GenerationError::from_status(429, "limit", None).is_retryable());
        assert!(GenerationError::from_status(408, "slow", None).is_retryable());
        assert!(GenerationError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(GenerationError::Malformed("empty".to_string()).is_retryable());
        assert!(GenerationError::Network("reset".to_string()).is_retryable());

        assert!(!GenerationError::from_status(400, "bad", None).is_retryable());
        assert!(!GenerationError::from_status(401, "key", None).is_retryable());
        assert!(!GenerationError::from_status(404, "gone", None).is_retryable());
    }

    #[test]
    fn test_retry_hint_only_on_rate_limits() {
        let hint = Duration::from_secs(7);
        let limited = GenerationError::from_status(429, "limit", Some(hint));
        assert_eq!(limited.retry_hint(), Some(hint));

        let server = GenerationError::from_status(502, "gateway", None);
        assert_eq!(server.retry_hint(), None);
    }
}
