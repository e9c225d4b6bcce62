//! Retry budget for external commands
//!
//! A [`RetryPolicy`] is the explicit, per-runner description of how often and
//! how patiently a failing command is repeated. It turns into a
//! `backon::ExponentialBuilder` when a retry loop starts.

use backon::{BackoffBuilder, ExponentialBuilder};
use msgbench_common::defaults::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_DELAY, DEFAULT_RETRY_MIN_DELAY,
};
use std::time::Duration;

/// Exponential backoff with a bounded number of attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first run included
    pub max_attempts: u32,
    /// Delay before the first retry
    pub min_delay: Duration,
    /// Cap for the exponential growth
    pub max_delay: Duration,
    /// Growth factor between consecutive delays
    pub factor: f32,
    /// Add random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_delay: DEFAULT_RETRY_MIN_DELAY,
            max_delay: DEFAULT_RETRY_MAX_DELAY,
            factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Run once, never retry
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Retries allowed after the first attempt
    pub fn max_retries(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }

    pub fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor)
            .with_max_times(self.max_retries() as usize);
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }

    /// The delays a full retry loop would sleep, in order
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        self.backoff().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_shared_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(policy.max_retries(), DEFAULT_MAX_ATTEMPTS - 1);
        assert!(policy.jitter);
    }

    #[test]
    fn delays_grow_exponentially_up_to_the_cap() {
        let policy = RetryPolicy {
            max_attempts: 6,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            factor: 2.0,
            jitter: false,
        };
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(
            delays,
            [1, 2, 4, 5, 5].map(Duration::from_secs).to_vec()
        );
    }

    #[test]
    fn jittered_delays_keep_the_budget() {
        let policy = RetryPolicy {
            max_attempts: 4,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delays().count(), 3);
    }

    #[test]
    fn no_retry_has_no_delays() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.max_retries(), 0);
        assert_eq!(policy.delays().count(), 0);

        let zero = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(zero.max_retries(), 0);
    }
}
