//! Retry with exponential backoff for outbound requests
//!
//! **Algorithm:**
//! 1. Attempt the fetch
//! 2. On success, return the body
//! 3. On a transient or rate-limit failure, if attempts remain: log WARN,
//!    sleep (the server's `Retry-After` when given, else the current
//!    backoff), double the backoff up to the cap, retry
//! 4. On a permanent failure, or when attempts are exhausted, return the error

use crate::cache::{CacheKey, Fetcher};
use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;

/// Backoff parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one (minimum 1)
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Delay before the attempt following `error`
    fn delay_for(&self, error: &FetchError, backoff: Duration) -> Duration {
        match error {
            FetchError::RateLimited {
                retry_after: Some(wait),
            } => (*wait).min(self.max_backoff),
            _ => backoff,
        }
    }
}

/// Retry `operation` according to `policy`
pub async fn retry_fetch<F, Fut, T>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Request succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) if attempt >= max_attempts => {
                tracing::error!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Request failed: attempts exhausted"
                );
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_for(&err, backoff);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Request failed, will retry after backoff"
                );
                tokio::time::sleep(delay).await;
                backoff = (backoff * 2).min(policy.max_backoff);
            }
        }
    }
}

/// Fetcher that retries transient and rate-limit failures
pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: Fetcher> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RetryingFetcher<F> {
    async fn fetch(&self, key: &CacheKey) -> Result<String, FetchError> {
        let name = key.to_string();
        retry_fetch(&name, self.policy, || self.inner.fetch(key)).await
    }
}
