//! Minimum spacing between outbound requests

use crate::cache::{CacheKey, Fetcher};
use crate::error::FetchError;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Rate limiter enforcing a minimum interval between requests
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Sleep until `min_interval` has passed since the previous call
    ///
    /// Returns how long the caller was held back.
    pub async fn wait(&self) -> Duration {
        let mut last = self.last_request.lock().await;

        let delay = last
            .map(|at| self.min_interval.saturating_sub(at.elapsed()))
            .unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        *last = Some(Instant::now());
        delay
    }
}

/// Fetcher that waits for its rate limiter before every request
///
/// Cache hits never reach the fetcher, so only misses pay the delay.
pub struct ThrottledFetcher<F> {
    inner: F,
    limiter: RateLimiter,
}

impl<F: Fetcher> ThrottledFetcher<F> {
    pub fn new(inner: F, min_interval: Duration) -> Self {
        Self {
            inner,
            limiter: RateLimiter::new(min_interval),
        }
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for ThrottledFetcher<F> {
    async fn fetch(&self, key: &CacheKey) -> Result<String, FetchError> {
        let delay = self.limiter.wait().await;
        if !delay.is_zero() {
            debug!(%key, delay_ms = delay.as_millis() as u64, "Throttled request");
        }
        self.inner.fetch(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        assert_eq!(limiter.min_interval(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let start = Instant::now();
        assert!(limiter.wait().await.is_zero());
        let first_elapsed = start.elapsed();

        let held = limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed.as_millis() < 50);
        assert!(held > Duration::ZERO && held <= Duration::from_millis(100));
        assert!(second_elapsed.as_millis() >= 100);
    }

    struct Echo;

    #[async_trait]
    impl Fetcher for Echo {
        async fn fetch(&self, key: &CacheKey) -> Result<String, FetchError> {
            Ok(key.file_name())
        }
    }

    #[tokio::test]
    async fn test_throttled_fetcher_spaces_requests() {
        let fetcher = ThrottledFetcher::new(Echo, Duration::from_millis(60));

        let start = Instant::now();
        assert_eq!(fetcher.fetch(&CacheKey::Page(1)).await.unwrap(), "1.xml");
        assert_eq!(fetcher.fetch(&CacheKey::Page(2)).await.unwrap(), "2.xml");
        assert_eq!(fetcher.fetch(&CacheKey::Page(3)).await.unwrap(), "3.xml");

        assert!(start.elapsed() >= Duration::from_millis(120));
    }
}
