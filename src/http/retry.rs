//! Retry policy
//!
//! Only throttling and gateway/server statuses are retried. The delay
//! before retry `n` (1-based) is `initial * 2^(n-1)`, capped at `max_backoff`,
//! with optional jitter on top.

use crate::error::is_retryable_status;
use crate::types::BackoffType;
use rand::Rng;
use std::time::Duration;

/// Retry policy applied below the public request surface
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    /// Growth of the delay between retries
    pub backoff_type: BackoffType,
    /// Add up to 50% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
            backoff_type: BackoffType::Exponential,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Total attempts for one request, honoring a per-request override
    pub fn attempt_limit(&self, max_attempts: Option<u32>) -> u32 {
        max_attempts.unwrap_or(self.max_attempts).max(1)
    }

    /// Whether a response with `status` on attempt `attempt` (1-based)
    /// should be retried
    pub fn should_retry(&self, status: u16, attempt: u32, max_attempts: Option<u32>) -> bool {
        is_retryable_status(status) && attempt < self.attempt_limit(max_attempts)
    }

    /// Backoff before the retry that follows failed attempt `attempt`
    /// (1-based), without jitter
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let retry = attempt.saturating_sub(1);
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff.saturating_mul(retry + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(retry);
                self.initial_backoff.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }

    /// Backoff with jitter applied when enabled
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.calculate_backoff(attempt);
        if !self.jitter || base.is_zero() {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0.0..0.5);
        base + base.mul_f64(extra)
    }
}

#[cfg(test)]
mod retry_tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1, 200 ; "first retry")]
    #[test_case(2, 400 ; "second retry")]
    #[test_case(3, 800 ; "third retry")]
    #[test_case(4, 1600 ; "fourth retry")]
    fn test_exponential_backoff(attempt: u32, expected_ms: u64) {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.calculate_backoff(attempt),
            Duration::from_millis(expected_ms)
        );
    }

    #[test]
    fn test_backoff_respects_max() {
        let policy = RetryPolicy {
            max_backoff: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.calculate_backoff(10), Duration::from_millis(500));
        assert_eq!(policy.calculate_backoff(40), Duration::from_millis(500));
    }

    #[test]
    fn test_constant_and_linear_backoff() {
        let constant = RetryPolicy {
            backoff_type: BackoffType::Constant,
            ..RetryPolicy::default()
        };
        assert_eq!(constant.calculate_backoff(3), Duration::from_millis(200));

        let linear = RetryPolicy {
            backoff_type: BackoffType::Linear,
            ..RetryPolicy::default()
        };
        assert_eq!(linear.calculate_backoff(3), Duration::from_millis(600));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let policy = RetryPolicy {
            jitter: true,
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.delay(2);
            assert!(delay >= Duration::from_millis(400));
            assert!(delay < Duration::from_millis(600));
        }
    }

    #[test_case(429, true)]
    #[test_case(500, true)]
    #[test_case(502, true)]
    #[test_case(503, true)]
    #[test_case(504, true)]
    #[test_case(400, false)]
    #[test_case(401, false)]
    #[test_case(404, false)]
    #[test_case(501, false)]
    fn test_should_retry_status(status: u16, expected: bool) {
        assert_eq!(RetryPolicy::default().should_retry(status, 1, None), expected);
    }

    #[test]
    fn test_should_retry_stops_at_max_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(503, 4, None));
        assert!(!policy.should_retry(503, 5, None));
        assert!(!RetryPolicy::none().should_retry(503, 1, None));
    }

    #[test]
    fn test_per_request_attempt_limit() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempt_limit(None), 5);
        assert_eq!(policy.attempt_limit(Some(2)), 2);
        assert_eq!(policy.attempt_limit(Some(0)), 1);

        assert!(policy.should_retry(429, 1, Some(2)));
        assert!(!policy.should_retry(429, 2, Some(2)));
        assert!(RetryPolicy::none().should_retry(429, 3, Some(8)));
    }
}
