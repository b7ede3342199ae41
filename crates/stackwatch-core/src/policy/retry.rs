//! Retry budgets and exponential backoff.
//!
//! Receipt lookups and HTTP calls spend a bounded budget through
//! [`RetryPolicy::next_delay`]. Reconnect loops never give up and call
//! [`RetryPolicy::backoff`] directly.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Ceiling for a single delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays. Values below 1 are treated as 1.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::bounded(3, Duration::from_millis(100), Duration::from_secs(10))
    }
}

impl RetryConfig {
    /// Doubling delays, at most `max_retries` of them.
    pub fn bounded(max_retries: u32, initial: Duration, cap: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff: initial,
            max_backoff: cap,
            multiplier: 2.0,
        }
    }

    /// Doubling delays with no retry limit.
    pub fn unbounded(initial: Duration, cap: Duration) -> Self {
        Self::bounded(u32::MAX, initial, cap)
    }

    /// Fail on the first error.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Computes delays from an attempt number. Holds no per-call state, so one
/// policy can drive any number of concurrent retry loops.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay before retry number `attempt` (1-based), or `None` once the
    /// budget is spent.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (1..=self.config.max_retries)
            .contains(&attempt)
            .then(|| self.backoff(attempt))
    }

    /// Delay before retry number `attempt`, ignoring the budget.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let RetryConfig {
            initial_backoff,
            max_backoff,
            multiplier,
            ..
        } = &self.config;
        let steps = attempt.saturating_sub(1).min(1024) as i32;
        let grown = initial_backoff.as_millis() as f64 * multiplier.max(1.0).powi(steps);
        if grown.is_finite() && grown < max_backoff.as_millis() as f64 {
            Duration::from_millis(grown as u64)
        } else {
            *max_backoff
        }
    }
}
