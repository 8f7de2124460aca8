//! Bounded retry with capped exponential backoff

use crate::config::RetryConfig;
use crate::ScreenerError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Errors that can tell whether trying again may help
pub trait Retryable {
    /// `true` for conditions worth retrying (timeouts, throttling, server hiccups)
    fn is_transient(&self) -> bool;
}

impl Retryable for ScreenerError {
    fn is_transient(&self) -> bool {
        match self {
            ScreenerError::Timeout { .. } | ScreenerError::RateLimited { .. } => true,
            ScreenerError::HttpStatus { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }
}

/// Final failure of a retried operation
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// The last error observed
    pub error: E,

    /// Attempts made, including the first
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: if max_delay.is_zero() {
                base_delay
            } else {
                max_delay
            },
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Runs `op` until it succeeds, fails permanently, or runs out of attempts
    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    attempt += 1;
                    if !error.is_transient() || attempt >= self.max_attempts {
                        return Err(RetryFailure {
                            error,
                            attempts: attempt,
                        });
                    }

                    let delay = self.backoff_delay(attempt - 1);
                    tracing::warn!(
                        "Attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        error,
                        delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    fn backoff_delay(&self, retry: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }

        let factor = 1u128 << retry.min(6);
        let delay_ms = self.base_delay.as_millis().saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis());
        Duration::from_millis(capped as u64)
    }
}
