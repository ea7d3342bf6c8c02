//! Fixed-window admission control
//!
//! The sole gate in front of the expensive interpretation path. One counter
//! window per `(key_prefix, client identity)`; a request over budget is
//! rejected, never queued, so a cheap 429 with a retry hint replaces an
//! expensive generation call.

pub mod identity;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Configuration for one admission window class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionPolicy {
    /// Window length
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Requests allowed per identity per window
    pub max_requests: u32,
    /// Namespace so distinct endpoints can carry distinct budgets
    pub key_prefix: String,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: 10,
            key_prefix: "interpret".to_string(),
        }
    }
}

impl AdmissionPolicy {
    /// Create a policy with the given window and budget
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            ..Default::default()
        }
    }

    /// Set the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone)]
pub struct AdmissionDecision {
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window resets
    pub reset_at: DateTime<Utc>,
    /// Whole seconds the client should wait, present only on rejection
    pub retry_after_secs: Option<u64>,
}

#[derive(Debug)]
struct WindowRecord {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window rate limiter keyed by client identity.
///
/// Windows are replaced, not slid: once `reset_at` passes, the next request
/// opens a fresh window with a count of 1. `count` never exceeds
/// `max_requests` because over-budget requests are rejected without touching
/// the counter.
#[derive(Debug)]
pub struct AdmissionController {
    policy: AdmissionPolicy,
    windows: Mutex<HashMap<String, WindowRecord>>,
}

impl AdmissionController {
    /// Create a controller for the given policy
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Get the configured policy
    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Check and consume one request slot for `identity`
    pub fn check(&self, identity: &str) -> AdmissionDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let key = format!("{}:{}", self.policy.key_prefix, identity);

        let record = windows.entry(key).or_insert_with(|| WindowRecord {
            count: 0,
            reset_at: now + self.policy.window,
        });

        // an elapsed window is treated as absent: replace it wholesale
        if now >= record.reset_at {
            record.count = 0;
            record.reset_at = now + self.policy.window;
        }

        let remaining_window = record.reset_at - now;
        let reset_at = wall_clock(remaining_window);

        if record.count >= self.policy.max_requests {
            let retry_after_secs = remaining_window.as_millis().div_ceil(1000) as u64;
            debug!(identity, retry_after_secs, "admission rejected");
            return AdmissionDecision {
                allowed: false,
                remaining: 0,
                reset_at,
                retry_after_secs: Some(retry_after_secs),
            };
        }

        record.count += 1;
        AdmissionDecision {
            allowed: true,
            remaining: self.policy.max_requests - record.count,
            reset_at,
            retry_after_secs: None,
        }
    }

    /// Remove windows that have elapsed, returning how many were dropped.
    /// Purely a memory bound; `check` treats elapsed windows as absent
    /// whether or not this ever runs.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, record| now < record.reset_at);
        before - windows.len()
    }

    /// Number of identities currently tracked
    pub fn tracked(&self) -> usize {
        self.windows.lock().len()
    }
}

fn wall_clock(from_now: Duration) -> DateTime<Utc> {
    Utc::now() + chrono::Duration::from_std(from_now).unwrap_or_else(|_| chrono::Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(window_ms: u64, max_requests: u32) -> AdmissionPolicy {
        AdmissionPolicy::new(Duration::from_millis(window_ms), max_requests)
    }

    #[test]
    fn test_allows_up_to_budget_then_rejects() {
        let controller = AdmissionController::new(policy(60_000, 3));

        for expected_remaining in (0..3).rev() {
            let decision = controller.check("1.2.3.4");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
            assert!(decision.retry_after_secs.is_none());
        }

        let rejected = controller.check("1.2.3.4");
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        let retry_after = rejected.retry_after_secs.expect("retry hint on rejection");
        assert!(retry_after >= 1 && retry_after <= 60);
    }

    #[test]
    fn test_identities_are_independent() {
        let controller = AdmissionController::new(policy(60_000, 1));

        assert!(controller.check("a").allowed);
        assert!(!controller.check("a").allowed);
        assert!(controller.check("b").allowed);
    }

    #[tokio::test]
    async fn test_window_reset_opens_fresh_budget() {
        let controller = AdmissionController::new(policy(100, 2));

        assert!(controller.check("client").allowed);
        assert!(controller.check("client").allowed);
        assert!(!controller.check("client").allowed);

        tokio::time::sleep(Duration::from_millis(150)).await;

        let decision = controller.check("client");
        assert!(decision.allowed);
        // fresh window, fresh count of 1
        assert_eq!(decision.remaining, 1);
    }

    #[tokio::test]
    async fn test_prune_drops_only_elapsed_windows() {
        let controller = AdmissionController::new(policy(100, 5));
        controller.check("old");

        tokio::time::sleep(Duration::from_millis(150)).await;
        controller.check("fresh");

        assert_eq!(controller.prune(), 1);
        assert_eq!(controller.tracked(), 1);

        // pruning never affects decisions for live windows
        assert!(controller.check("fresh").allowed);
    }

    #[test]
    fn test_rejection_does_not_inflate_count() {
        let controller = AdmissionController::new(policy(60_000, 1));
        controller.check("c");
        for _ in 0..5 {
            assert!(!controller.check("c").allowed);
        }
        let windows = controller.windows.lock();
        let record = windows.values().next().expect("window recorded");
        assert_eq!(record.count, 1);
    }
}
