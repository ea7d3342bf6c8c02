//! Retry with bounded attempts, per-attempt timeout, and backoff
//!
//! Wraps any fallible asynchronous operation. Each attempt races a timer;
//! retryable failures back off exponentially with jitter unless the backend
//! supplied its own delay hint, and fatal failures abort immediately.

use super::error::GenerationError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

/// Jitter is uniform in `[0, JITTER_RATIO * exponential_delay]`, breaking up
/// retry synchronization across concurrent callers.
const JITTER_RATIO: f64 = 0.3;

/// Immutable retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 means exactly one attempt
    pub max_retries: u32,
    /// Backoff base delay
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Ceiling for any delay, server-suggested or computed
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Exponential growth factor
    pub backoff_multiplier: f64,
    /// Per-attempt deadline
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set max retries
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Set the initial backoff delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay ceiling
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// How a single attempt resolved
pub enum AttemptOutcome<T> {
    Success(T),
    /// Worth another attempt, possibly with a server-suggested delay
    Retryable {
        error: GenerationError,
        hint: Option<Duration>,
    },
    /// No further attempts will help
    Fatal(GenerationError),
}

impl<T> AttemptOutcome<T> {
    fn classify(result: Result<T, GenerationError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) if error.is_retryable() => {
                let hint = error.retry_hint();
                Self::Retryable { error, hint }
            }
            Err(error) => Self::Fatal(error),
        }
    }
}

/// Runs operations under a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails fatally, or retries are
    /// exhausted; the last observed error is re-returned on exhaustion.
    ///
    /// A timer expiry counts as a retryable timeout. Dropping the timed-out
    /// attempt future cancels the underlying transport call, so an abandoned
    /// attempt does not keep consuming backend quota.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, GenerationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let mut last_error: Option<GenerationError> = None;

        for attempt in 0..=self.policy.max_retries {
            let result = match timeout(self.policy.timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout(self.policy.timeout)),
            };

            match AttemptOutcome::classify(result) {
                AttemptOutcome::Success(value) => {
                    if attempt > 0 {
                        info!(attempt, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                AttemptOutcome::Fatal(error) => {
                    warn!(error = %error, "non-retryable error, aborting");
                    return Err(error);
                }
                AttemptOutcome::Retryable { error, hint } => {
                    if attempt < self.policy.max_retries {
                        let delay = self.delay_for_attempt(attempt, hint);
                        warn!(
                            attempt = attempt + 1,
                            max_attempts = self.policy.max_retries + 1,
                            delay_secs = delay.as_secs_f64(),
                            error = %error,
                            "retrying after failure"
                        );
                        last_error = Some(error);
                        sleep(delay).await;
                    } else {
                        warn!(
                            attempts = self.policy.max_retries + 1,
                            error = %error,
                            "all retry attempts exhausted"
                        );
                        last_error = Some(error);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            GenerationError::Network(format!(
                "all {} attempts failed without error details",
                self.policy.max_retries + 1
            ))
        }))
    }

    /// Delay before retrying attempt `attempt` (0-indexed). A server hint
    /// wins over the computed backoff; both respect `max_delay`.
    fn delay_for_attempt(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.policy.max_delay);
        }

        let exponential = self.policy.initial_delay.as_secs_f64()
            * self.policy.backoff_multiplier.powi(attempt as i32);
        let jitter = rand::thread_rng().gen_range(0.0..=JITTER_RATIO) * exponential;
        let delayed = (exponential + jitter).min(self.policy.max_delay.as_secs_f64());
        Duration::from_secs_f64(delayed.max(0.0))
    }
}
