//! # Retry policy
//!
//! Subscribe connectivity retry configuration and the shared failure counter
//! used by the subscribe and retry loops.

use spin::Mutex;
use std::time::Duration;

/// Subscribe retry configuration.
///
/// Every timeout or unreachable network bumps the shared failure counter.
/// When it reaches `max_retries` all subscriptions are dropped and each
/// affected name gets a terminal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfiguration {
    /// Number of consecutive failures after which subscriptions are aborted.
    pub max_retries: u32,

    /// Delay between subscribe attempts after failure.
    ///
    /// Also used as the reachability check period.
    pub retry_interval: Duration,
}

impl Default for RetryConfiguration {
    fn default() -> Self {
        Self {
            max_retries: 50,
            retry_interval: Duration::from_secs(10),
        }
    }
}

impl RetryConfiguration {
    /// Check whether failures counter reached retry limit.
    pub(crate) fn reached_max_retries(&self, attempt: u32) -> bool {
        attempt >= self.max_retries
    }
}

/// Consecutive connectivity failures counter.
#[derive(Debug, Default)]
pub(crate) struct RetryCounter {
    failures: Mutex<u32>,
}

impl RetryCounter {
    /// Register one more failure and return updated count.
    pub fn increment(&self) -> u32 {
        let mut failures = self.failures.lock();
        *failures = failures.saturating_add(1);
        *failures
    }

    /// Register failure only when there is no outstanding one.
    ///
    /// Returns `None` when counter already holds failures.
    pub fn increment_if_clear(&self) -> Option<u32> {
        let mut failures = self.failures.lock();
        (*failures == 0).then(|| {
            *failures = 1;
            *failures
        })
    }

    /// Reset counter and return number of failures it held.
    pub fn reset(&self) -> u32 {
        std::mem::take(&mut *self.failures.lock())
    }
}
