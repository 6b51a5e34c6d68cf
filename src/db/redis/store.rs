use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;

use crate::db::storage::{KeyValueStore, StorageKey};
use crate::error::AppResult;

/// Opens a Redis-backed store
///
/// Establishes a managed connection that transparently reconnects,
/// so the store can be cloned freely across tasks.
pub async fn create_redis_store(redis_url: &str) -> anyhow::Result<RedisStore> {
    let client = Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;
    tracing::info!("Redis store connected");
    Ok(RedisStore { manager })
}

/// Durable storage for seeds, recommendation results and recent searches
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &StorageKey) -> AppResult<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key.to_string()).await.map_err(|e| {
            tracing::warn!(error = %e, key = %key, "Redis get failed");
            e
        })?;
        Ok(value)
    }

    async fn set(&self, key: &StorageKey, value: String) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn.set(key.to_string(), value).await.map_err(|e| {
            tracing::warn!(error = %e, key = %key, "Redis set failed");
            e
        })?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &StorageKey, value: String) -> AppResult<bool> {
        let mut conn = self.manager.clone();
        let stored: bool = conn.set_nx(key.to_string(), value).await.map_err(|e| {
            tracing::warn!(error = %e, key = %key, "Redis set_nx failed");
            e
        })?;
        Ok(stored)
    }

    async fn remove(&self, key: &StorageKey) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: () = conn.del(key.to_string()).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
