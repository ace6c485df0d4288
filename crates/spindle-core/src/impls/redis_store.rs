//! Redis-backed store.
//!
//! Uses `redis::aio::ConnectionManager` for a multiplexed connection with
//! automatic reconnection. Values are plain strings set with `SET` (no TTL).

use async_trait::async_trait;
use tracing::debug;

use crate::ports::{KvStore, StoreError};

#[derive(Clone)]
pub struct RedisStore {
    connection_manager: redis::aio::ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connection_manager", &"ConnectionManager")
            .finish()
    }
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://localhost:6379/0`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| {
            StoreError::Connection(format!("failed to create Redis client: {}", e))
        })?;

        let connection_manager = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(format!("failed to connect to Redis: {}", e)))?;

        debug!(url = %url, "Redis store connected");

        Ok(Self { connection_manager })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection_manager.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Operation {
                op: "GET",
                key: key.to_string(),
                message: e.to_string(),
            })?;

        debug!(key = key, present = value.is_some(), "Redis GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection_manager.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| StoreError::Operation {
                op: "SET",
                key: key.to_string(),
                message: e.to_string(),
            })?;

        debug!(key = key, bytes = value.len(), "Redis SET");
        Ok(())
    }
}
