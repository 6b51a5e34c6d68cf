use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    db::{read_json, write_json, KeyValueStore, StorageKey},
    error::AppResult,
    models::{Identity, RecommendationResult},
};

/// Single-slot, per-identity store of the last computed recommendation
#[derive(Clone)]
pub struct RecommendationCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl RecommendationCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached result only when it is present, readable, fresh at
    /// `now` and has at least one item. Anything else reads as a miss.
    pub async fn read_cache(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Option<RecommendationResult> {
        let key = StorageKey::Recommendation(identity.clone());
        let cached: Option<RecommendationResult> =
            match read_json(self.store.as_ref(), &key).await {
                Ok(cached) => cached,
                Err(e) => {
                    tracing::warn!(error = %e, identity = %identity, "Ignoring unreadable recommendation cache");
                    return None;
                }
            };

        match cached {
            Some(result) if result.is_servable(now, self.ttl) => {
                tracing::debug!(identity = %identity, "Recommendation cache hit");
                Some(result)
            }
            Some(result) => {
                tracing::debug!(
                    identity = %identity,
                    items = result.items.len(),
                    computed_at = %result.computed_at,
                    "Recommendation cache stale or empty"
                );
                None
            }
            None => {
                tracing::debug!(identity = %identity, "Recommendation cache miss");
                None
            }
        }
    }

    pub async fn write_cache(
        &self,
        identity: &Identity,
        result: &RecommendationResult,
    ) -> AppResult<()> {
        write_json(
            self.store.as_ref(),
            &StorageKey::Recommendation(identity.clone()),
            result,
        )
        .await?;
        tracing::debug!(identity = %identity, items = result.items.len(), "Recommendation cached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{CatalogSummary, MediaKind, Seed};

    fn summary(id: u64) -> CatalogSummary {
        CatalogSummary {
            id,
            title: format!("Title {}", id),
            overview: String::new(),
            backdrop_path: None,
            poster_path: None,
            genre_ids: vec![28],
        }
    }

    fn result(computed_at: DateTime<Utc>, ids: &[u64]) -> RecommendationResult {
        RecommendationResult {
            seed: Seed::search("Inception", computed_at),
            items: ids.iter().copied().map(summary).collect(),
            label: Some("Because you searched Inception".to_string()),
            media_kind: MediaKind::Movie,
            computed_at,
        }
    }

    fn cache() -> (RecommendationCache, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        (
            RecommendationCache::new(memory.clone(), Duration::hours(6)),
            memory,
        )
    }

    #[tokio::test]
    async fn test_fresh_result_is_served() {
        let (cache, _) = cache();
        let identity = Identity::user(1);
        let now = Utc::now();
        let stored = result(now - Duration::minutes(30), &[1, 2]);

        cache.write_cache(&identity, &stored).await.unwrap();

        assert_eq!(cache.read_cache(&identity, now).await, Some(stored));
    }

    #[tokio::test]
    async fn test_stale_result_is_never_served() {
        let (cache, _) = cache();
        let identity = Identity::user(1);
        let now = Utc::now();

        cache
            .write_cache(&identity, &result(now - Duration::hours(7), &[1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(cache.read_cache(&identity, now).await, None);
    }

    #[tokio::test]
    async fn test_empty_result_reads_as_miss() {
        let (cache, _) = cache();
        let identity = Identity::anonymous();
        let now = Utc::now();

        cache.write_cache(&identity, &result(now, &[])).await.unwrap();

        assert_eq!(cache.read_cache(&identity, now).await, None);
    }

    #[tokio::test]
    async fn test_single_slot_per_identity() {
        let (cache, memory) = cache();
        let identity = Identity::user(2);
        let now = Utc::now();

        cache.write_cache(&identity, &result(now, &[1])).await.unwrap();
        let newer = result(now, &[9]);
        cache.write_cache(&identity, &newer).await.unwrap();

        assert_eq!(cache.read_cache(&identity, now).await, Some(newer));
        assert_eq!(memory.len().await, 1);
    }

    #[tokio::test]
    async fn test_corrupted_entry_reads_as_miss() {
        let (cache, memory) = cache();
        let identity = Identity::anonymous();
        memory
            .set(
                &StorageKey::Recommendation(identity.clone()),
                "not json".to_string(),
            )
            .await
            .unwrap();

        assert_eq!(cache.read_cache(&identity, Utc::now()).await, None);
    }
}
