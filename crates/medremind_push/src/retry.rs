//! Bounded retry for gateway calls
//!
//! A batch is attempted, and only on a transient transport failure attempted
//! again, up to `max_attempts` in total. There is no backoff; an optional
//! fixed delay may be configured between attempts.

use crate::error::PushError;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Total attempts per batch, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// A policy allowing `max_attempts` calls in total (at least one)
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
        }
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt follows a failed `attempt` (1-based)
    pub fn should_retry(&self, attempt: u32, error: &PushError) -> bool {
        error.is_transient() && attempt < self.max_attempts
    }

    /// Runs `operation` until it succeeds, fails permanently or the budget is spent
    ///
    /// The error of the last attempt is returned unchanged.
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, PushError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PushError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(attempt, &err) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        "Retrying push gateway call after transient failure: {}",
                        err
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        error!(attempt, "Push gateway call failed, retries exhausted: {}", err);
                    }
                    return Err(err);
                }
            }
        }
    }
}
