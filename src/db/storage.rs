use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Display;

use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::Identity;

/// Namespaced storage keys, one live value per key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKey {
    RecentSearches(Identity),
    Seed(Identity),
    Recommendation(Identity),
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKey::RecentSearches(identity) => write!(f, "recent_searches:{}", identity),
            StorageKey::Seed(identity) => write!(f, "recommendation_seed:{}", identity),
            StorageKey::Recommendation(identity) => {
                write!(f, "recommendation_cache:{}", identity)
            }
        }
    }
}

/// Durable string key-value storage
///
/// Backends only move strings; (de)serialization belongs to the stores built on top.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &StorageKey) -> AppResult<Option<String>>;

    async fn set(&self, key: &StorageKey, value: String) -> AppResult<()>;

    /// Stores `value` only when `key` holds nothing, atomically with respect to
    /// other writers. Returns whether the value was stored.
    async fn set_if_absent(&self, key: &StorageKey, value: String) -> AppResult<bool>;

    async fn remove(&self, key: &StorageKey) -> AppResult<()>;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Reads and deserializes a JSON value stored under `key`
///
/// A value that fails to parse is reported as [`AppError::MalformedStoredValue`].
pub async fn read_json<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &StorageKey,
) -> AppResult<Option<T>> {
    match store.get(key).await? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| AppError::MalformedStoredValue {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Serializes `value` as JSON and stores it under `key`, replacing any previous value
pub async fn write_json<T: serde::Serialize>(
    store: &dyn KeyValueStore,
    key: &StorageKey,
    value: &T,
) -> AppResult<()> {
    let json = serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Storage serialization error: {}", e)))?;
    store.set(key, json).await
}

/// Like [`write_json`], but leaves an existing value in place
///
/// Returns whether `value` was stored.
pub async fn write_json_if_absent<T: serde::Serialize>(
    store: &dyn KeyValueStore,
    key: &StorageKey,
    value: &T,
) -> AppResult<bool> {
    let json = serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Storage serialization error: {}", e)))?;
    store.set_if_absent(key, json).await
}

/// In-process storage, used when no Redis URL is configured and in tests
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &StorageKey) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(&key.to_string()).cloned())
    }

    async fn set(&self, key: &StorageKey, value: String) -> AppResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn set_if_absent(&self, key: &StorageKey, value: String) -> AppResult<bool> {
        match self.entries.write().await.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(true)
            }
        }
    }

    async fn remove(&self, key: &StorageKey) -> AppResult<()> {
        self.entries.write().await.remove(&key.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
