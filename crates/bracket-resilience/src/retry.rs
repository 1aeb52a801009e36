//! Retry policy with exponential backoff (spec §4.3).
//!
//! Ported from the gateway's retry policy and generalized over any
//! error type that can classify itself as retryable, so this crate
//! does not need to know about upstream-specific error variants.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

/// An error that can classify itself as retryable.
pub trait Retryable {
    /// Whether this error should trigger another attempt.
    fn is_retryable(&self) -> bool;
}

/// Retry configuration (spec §4.3: `base_delay * 2^attempt`, default
/// `base_delay` 2000ms, default `max_retries` 3).
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Maximum delay between retries, regardless of attempt number.
    pub max_delay: Duration,
    /// Backoff multiplier (spec fixes this at 2.0).
    pub multiplier: f64,
    /// Jitter factor (0.0 - 1.0).
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

/// Retry policy implementation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration.
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Calculate the delay for a given attempt (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay.as_millis() as f64;
        let delay = base * self.config.multiplier.powi(attempt as i32);
        let delay = delay.min(self.config.max_delay.as_millis() as f64);

        let jitter_range = delay * self.config.jitter;
        let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
        let final_delay = (delay + jitter).max(0.0);

        Duration::from_millis(final_delay as u64)
    }

    /// Execute an operation, retrying on a retryable error up to
    /// `max_retries` additional times.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted, or
    /// immediately for a non-retryable error.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let mut last_error: Option<E> = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(attempt, "retry succeeded");
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_retryable() || attempt == self.config.max_retries {
                        return Err(error);
                    }

                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "retrying after error"
                    );

                    tokio::time::sleep(delay).await;
                    last_error = Some(error);
                }
            }
        }

        // Unreachable in practice: the loop always returns on the
        // final iteration (attempt == max_retries short-circuits above).
        Err(last_error.expect("retry loop always returns before exhausting without an error"))
    }

    /// The configuration backing this policy.
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
