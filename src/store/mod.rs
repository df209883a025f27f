// Counter store backends shared by the attempt ledger and the rate limiter

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

pub mod memory;
pub mod redis;

pub use memory::MemoryCounterStore;
pub use redis::RedisCounterStore;

/// String-keyed counters with store-managed expiry.
///
/// `incr` must be a single atomic operation on the backend: two concurrent
/// callers may never both act on a stale pre-increment value.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically increment the counter at `key` and return the
    /// post-increment value. An absent counter is created at 1.
    async fn incr(&self, key: &str) -> Result<u64, StoreError>;

    /// Current counter value, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError>;

    /// Set or refresh the TTL on an existing counter.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove the counter unconditionally.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
