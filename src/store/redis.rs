// Redis-backed counter store
// One shared store coordinates lockout and rate-limit state across instances

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, RedisError};
use tokio::sync::Mutex;

use super::CounterStore;
use crate::error::StoreError;

/// Counter store over a multiplexed Redis connection. Every trait operation
/// maps to a single Redis command, so increments are atomic server-side.
pub struct RedisCounterStore {
    conn: Arc<Mutex<MultiplexedConnection>>,
}

impl RedisCounterStore {
    pub async fn connect(redis_url: &str) -> Result<Self, RedisError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_tokio_connection().await?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn store_err(e: RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.lock().await;
        conn.incr(key, 1).await.map_err(store_err)
    }

    async fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let mut conn = self.conn.lock().await;
        conn.get(key).await.map_err(store_err)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().await;
        let _: () = conn
            .expire(key, ttl.as_secs() as i64)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().await;
        let _: () = conn.del(key).await.map_err(store_err)?;
        Ok(())
    }
}
