// Failed-login bookkeeping backed by the shared counter store

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::StoreError;
use crate::store::CounterStore;

const FAIL_KEY_PREFIX: &str = "login:fail:";

/// Per-identity failed-login counter with a rolling lock window.
///
/// Every failure refreshes the TTL, so the lock keeps extending while
/// failures continue and expires on its own after one quiet window. There is
/// no explicit unlock operation.
pub struct AttemptLedger {
    store: Arc<dyn CounterStore>,
    max_attempts: u64,
    lock_window: Duration,
}

impl AttemptLedger {
    pub fn new(store: Arc<dyn CounterStore>, max_attempts: u64, lock_window: Duration) -> Self {
        Self {
            store,
            max_attempts,
            lock_window,
        }
    }

    fn key(identity: &str) -> String {
        format!("{FAIL_KEY_PREFIX}{identity}")
    }

    /// Record one failed attempt and return the post-increment count.
    pub async fn record_failure(&self, identity: &str) -> Result<u64, StoreError> {
        let key = Self::key(identity);
        let attempts = self.store.incr(&key).await?;
        self.store.expire(&key, self.lock_window).await?;
        debug!(
            "Recorded failed login attempt {} of {} for {}",
            attempts, self.max_attempts, identity
        );
        Ok(attempts)
    }

    /// Current failure count; an absent counter reads as zero.
    pub async fn fail_count(&self, identity: &str) -> Result<u64, StoreError> {
        Ok(self.store.get(&Self::key(identity)).await?.unwrap_or(0))
    }

    /// Whether the identity has reached the lockout threshold.
    pub async fn is_locked(&self, identity: &str) -> Result<bool, StoreError> {
        Ok(self.fail_count(identity).await? >= self.max_attempts)
    }

    /// Clear the counter after a successful credential check, whatever its
    /// current value.
    pub async fn record_success(&self, identity: &str) -> Result<(), StoreError> {
        self.store.delete(&Self::key(identity)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCounterStore;

    fn ledger(window: Duration) -> AttemptLedger {
        AttemptLedger::new(Arc::new(MemoryCounterStore::new()), 5, window)
    }

    #[tokio::test]
    async fn locks_at_threshold_and_unlocks_on_success() {
        let ledger = ledger(Duration::from_secs(300));

        for i in 1..=5 {
            assert_eq!(ledger.record_failure("alice").await.unwrap(), i);
        }
        assert!(ledger.is_locked("alice").await.unwrap());

        ledger.record_success("alice").await.unwrap();
        assert!(!ledger.is_locked("alice").await.unwrap());
        assert_eq!(ledger.fail_count("alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn below_threshold_is_not_locked() {
        let ledger = ledger(Duration::from_secs(300));

        for _ in 0..4 {
            ledger.record_failure("bob").await.unwrap();
        }
        assert!(!ledger.is_locked("bob").await.unwrap());
    }

    #[tokio::test]
    async fn quiet_window_expires_the_counter() {
        let ledger = ledger(Duration::from_millis(100));

        for _ in 0..5 {
            ledger.record_failure("carol").await.unwrap();
        }
        assert!(ledger.is_locked("carol").await.unwrap());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(!ledger.is_locked("carol").await.unwrap());
        assert_eq!(ledger.fail_count("carol").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_failures_lose_no_updates() {
        let ledger = Arc::new(ledger(Duration::from_secs(300)));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(
                async move { ledger.record_failure("bob").await },
            ));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger.fail_count("bob").await.unwrap(), 20);
    }
}
