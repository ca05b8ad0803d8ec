//! Retry budget and exponential backoff.

use core_runtime::config::{
    DEFAULT_RETRY_INITIAL_DELAY, DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_DELAY,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable retry policy.
///
/// `max_attempts` counts retries after the first attempt, so a strategy with
/// `max_attempts = 2` performs at most three downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryStrategy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryStrategy {
    /// Largest exponent applied to `initial_delay`.
    const MAX_EXPONENT: u32 = 62;

    pub const fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
        }
    }

    /// A single attempt, no retries.
    pub const fn no_retry() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// First attempt plus retries.
    pub fn total_attempts(&self) -> u32 {
        self.max_attempts.saturating_add(1)
    }

    /// Delay before retry number `attempt` (0-indexed, first attempt not
    /// counted): `min(initial_delay * 2^min(attempt, 62), max_delay)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u128 << attempt.min(Self::MAX_EXPONENT);
        let nanos = self.initial_delay.as_nanos().saturating_mul(factor);

        if nanos >= self.max_delay.as_nanos() {
            return self.max_delay;
        }

        const NANOS_PER_SEC: u128 = 1_000_000_000;
        let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
        Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETRY_MAX_ATTEMPTS,
            DEFAULT_RETRY_INITIAL_DELAY,
            DEFAULT_RETRY_MAX_DELAY,
        )
    }
}
