use std::time::Duration;

use crate::config::FetchConfig;

/// Bounded exponential backoff for transient fetch failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Attempt counter for a single resource
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Starts tracking a resource whose first attempt is about to be made
    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempts: 1,
        }
    }

    /// Delay before attempt `attempt + 1`, doubling from the base delay
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(fetch: &FetchConfig) -> Self {
        Self::new(
            fetch.max_attempts,
            Duration::from_millis(fetch.backoff_base_ms),
            Duration::from_millis(fetch.backoff_max_ms),
        )
    }
}

impl RetryState {
    /// Records a transient failure and decides whether to try again
    pub fn next(&mut self) -> RetryDecision {
        if self.attempts >= self.policy.max_attempts {
            return RetryDecision::GiveUp;
        }
        let delay = self.policy.delay_after(self.attempts);
        self.attempts += 1;
        RetryDecision::RetryAfter(delay)
    }

    /// Attempts made so far, including the one in progress
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
