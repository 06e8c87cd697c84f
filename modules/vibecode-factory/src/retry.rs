//! Exponential backoff around a fallible async operation.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

use crate::pacing::Pacer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound of random extra delay added to each backoff.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_jitter: Duration::from_secs(1),
        }
    }
}

/// Outcome of a failed [`RetryPolicy::run`].
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last: E },
    /// A non-retryable error; no further attempts were made.
    Aborted { attempt: u32, error: E },
}

impl RetryPolicy {
    pub fn without_jitter(mut self) -> Self {
        self.max_jitter = Duration::ZERO;
        self
    }

    /// Backoff before retry number `retry` (1-based): `base * 2^(retry-1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. Waits go through `pacer`.
    pub async fn run<T, E, F, Fut>(
        &self,
        pacer: &dyn Pacer,
        is_retryable: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if !is_retryable(&error) => {
                    return Err(RetryError::Aborted { attempt, error });
                }
                Err(error) if attempt >= max_attempts => {
                    error!(attempts = attempt, error = %error, "All attempts failed");
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: error,
                    });
                }
                Err(error) => {
                    let delay = self.backoff(attempt) + self.jitter();
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Attempt failed, retrying after backoff"
                    );
                    pacer.pause(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
