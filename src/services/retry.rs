use shared::config::HttpConfig;
use shared::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

// ============================================================================
// RETRY POLICY
// ============================================================================

/// Bounded retry for portal requests.
///
/// Only errors classified as transient (`ScraperError::is_retryable`) are
/// retried. Backoff starts at `min_backoff` and doubles on each retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: u32,
    min_backoff: Duration,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self {
            retries: 3,
            min_backoff: Duration::from_millis(1000),
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_min_backoff(mut self, backoff: Duration) -> Self {
        self.min_backoff = backoff;
        self
    }

    pub fn from_config(config: &HttpConfig) -> Self {
        Self::new()
            .with_retries(config.retries)
            .with_min_backoff(Duration::from_millis(config.min_backoff_ms))
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    fn backoff(&self, retry: u32) -> Duration {
        self.min_backoff
            .saturating_mul(2_u32.saturating_pow(retry.saturating_sub(1)))
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the retry budget is spent. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry_count = 0;

        loop {
            if retry_count > 0 {
                let delay = self.backoff(retry_count);
                info!("Retry attempt {} for {} in {:?}", retry_count, operation_name, delay);
                tokio::time::sleep(delay).await;
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retry_count < self.retries => {
                    warn!("{} failed (attempt {}): {}", operation_name, retry_count + 1, e);
                    retry_count += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        error!(
                            "{} failed after {} attempts: {}",
                            operation_name,
                            retry_count + 1,
                            e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
