//! Bounded retry with exponential backoff for transient storage contention.

use std::future::Future;
use std::time::Duration;

use tellr_shared::config::LedgerConfig;

use crate::account::AdjustError;
use crate::error::StoreError;

/// Errors that can tell whether a retry may help.
pub trait Transient {
    /// Returns true if repeating the call may succeed.
    fn is_transient(&self) -> bool;
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        StoreError::is_transient(self)
    }
}

impl Transient for AdjustError {
    fn is_transient(&self) -> bool {
        AdjustError::is_transient(self)
    }
}

/// How many times to attempt a storage call and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(25))
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is at least 1.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Builds the policy from configuration.
    #[must_use]
    pub const fn from_config(config: &LedgerConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    /// Maximum number of attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt + 1`, doubling each time.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Runs `op`, retrying transient failures.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::debug!(
                        operation,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Transient storage failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
