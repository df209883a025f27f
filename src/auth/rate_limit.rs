// Fixed-window request limiting backed by the shared counter store

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::{RateLimitError, StoreError};
use crate::store::CounterStore;

/// Per-key request counter over a fixed time window.
///
/// The window is anchored at the first request after the previous window
/// expired, so a caller can issue up to twice the limit in a short span
/// straddling a boundary. Keys are caller-supplied; any handler wanting
/// call-volume protection picks its own.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    max_requests: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, max_requests: u64, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    /// Count one request against `key`, admitting it while the window's
    /// count stays within the limit.
    pub async fn try_acquire(&self, key: &str) -> Result<(), RateLimitError> {
        let count = self.store.incr(key).await?;
        if count == 1 {
            self.store.expire(key, self.window).await?;
        }

        if count <= self.max_requests {
            Ok(())
        } else {
            warn!(
                "Rate limit exceeded for {}: {} > {}",
                key, count, self.max_requests
            );
            Err(RateLimitError::Exceeded {
                retry_after_secs: self.window.as_secs(),
            })
        }
    }

    /// Administrative override: drop the counter for `key`.
    pub async fn reset(&self, key: &str) -> Result<(), StoreError> {
        self.store.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCounterStore;

    fn limiter(max: u64, window: Duration) -> RateLimiter {
        RateLimiter::new(Arc::new(MemoryCounterStore::new()), max, window)
    }

    #[tokio::test]
    async fn admits_up_to_the_limit_then_rejects() {
        let limiter = limiter(10, Duration::from_secs(60));

        for _ in 0..10 {
            assert!(limiter.try_acquire("k").await.is_ok());
        }
        assert!(matches!(
            limiter.try_acquire("k").await,
            Err(RateLimitError::Exceeded { .. })
        ));
    }

    #[tokio::test]
    async fn fresh_window_starts_a_new_count() {
        let limiter = limiter(2, Duration::from_millis(100));

        assert!(limiter.try_acquire("k").await.is_ok());
        assert!(limiter.try_acquire("k").await.is_ok());
        assert!(limiter.try_acquire("k").await.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(limiter.try_acquire("k").await.is_ok());
    }

    #[tokio::test]
    async fn keys_are_limited_independently() {
        let limiter = limiter(1, Duration::from_secs(60));

        assert!(limiter.try_acquire("a").await.is_ok());
        assert!(limiter.try_acquire("b").await.is_ok());
        assert!(limiter.try_acquire("a").await.is_err());
    }

    #[tokio::test]
    async fn reset_reopens_the_window() {
        let limiter = limiter(1, Duration::from_secs(60));

        assert!(limiter.try_acquire("k").await.is_ok());
        assert!(limiter.try_acquire("k").await.is_err());

        limiter.reset("k").await.unwrap();
        assert!(limiter.try_acquire("k").await.is_ok());
    }
}
