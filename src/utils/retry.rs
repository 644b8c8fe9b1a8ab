//! Retry mechanism with exponential backoff
//!
//! Only errors classified as retryable are retried. The attempt count is
//! reported back to the caller so batch outcomes can record it.

use std::time::Duration;

use tracing::{debug, error};

/// Classification hook for errors worth retrying
pub trait RetryableError {
    /// Whether a later attempt may succeed
    fn is_retryable(&self) -> bool;

    /// Server-provided delay hint, if any
    fn retry_delay(&self) -> Option<Duration> {
        None
    }
}

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, first try included
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Configuration that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Configuration with near-zero delays, for tests
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

/// Retry mechanism with exponential backoff
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Execute a function with retry logic, returning the result together
    /// with the number of attempts made
    pub async fn call<F, Fut, R, E>(&self, mut f: F) -> (std::result::Result<R, E>, u32)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<R, E>>,
        E: RetryableError + std::fmt::Display,
    {
        let mut attempt = 0;
        let mut delay = self.config.base_delay;

        loop {
            attempt += 1;

            match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("Retry succeeded on attempt {}", attempt);
                    }
                    return (Ok(result), attempt);
                }
                Err(err) => {
                    if !err.is_retryable() {
                        debug!("Attempt {} failed, not retryable: {}", attempt, err);
                        return (Err(err), attempt);
                    }
                    if attempt >= self.config.max_attempts {
                        error!("Retry failed after {} attempts: {}", attempt, err);
                        return (Err(err), attempt);
                    }

                    // A server-provided hint wins over the computed backoff
                    let base = err.retry_delay().unwrap_or(delay);
                    debug!(
                        "Attempt {} failed: {}, retrying in {:?}",
                        attempt, err, base
                    );

                    // Sleep with optional jitter
                    let actual_delay = if self.config.jitter {
                        let jitter_factor = 0.1;
                        let jitter = base.as_millis() as f64
                            * jitter_factor
                            * (rand::random::<f64>() - 0.5);
                        Duration::from_millis((base.as_millis() as f64 + jitter) as u64)
                    } else {
                        base
                    };

                    tokio::time::sleep(actual_delay).await;

                    // Calculate next delay with exponential backoff
                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.config.backoff_multiplier) as u64,
                        ),
                        self.config.max_delay,
                    );
                }
            }
        }
    }
}
