// In-memory counter store for tests and single-node deployments

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::CounterStore;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy)]
struct Counter {
    value: u64,
    expires_at: Option<Instant>,
}

impl Counter {
    fn live(&self) -> bool {
        self.expires_at.map_or(true, |deadline| Instant::now() < deadline)
    }
}

/// Counter store backed by a process-local map. Expired entries are dropped
/// lazily on access. A single mutex covers every check-and-increment, giving
/// the same atomicity the Redis backend gets from single commands.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, Counter>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        let mut counters = self.counters.lock().await;
        let entry = counters.entry(key.to_string()).or_insert(Counter {
            value: 0,
            expires_at: None,
        });
        if !entry.live() {
            *entry = Counter {
                value: 0,
                expires_at: None,
            };
        }
        entry.value += 1;
        Ok(entry.value)
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let mut counters = self.counters.lock().await;
        match counters.get(key) {
            Some(counter) if counter.live() => Ok(Some(counter.value)),
            Some(_) => {
                counters.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut counters = self.counters.lock().await;
        if let Some(counter) = counters.get_mut(key) {
            if counter.live() {
                counter.expires_at = Some(Instant::now() + ttl);
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.counters.lock().await.remove(key);
        Ok(())
    }
}
