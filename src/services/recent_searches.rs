use std::sync::Arc;

use crate::{
    db::{read_json, write_json, KeyValueStore, StorageKey},
    error::AppResult,
    models::Identity,
};

/// Longest recent-search list kept per identity
pub const MAX_RECENT_SEARCHES: usize = 6;

/// Most-recent-first list of distinct search terms per identity
#[derive(Clone)]
pub struct RecentSearches {
    store: Arc<dyn KeyValueStore>,
}

impl RecentSearches {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Unreadable lists count as empty
    pub async fn list(&self, identity: &Identity) -> Vec<String> {
        let key = StorageKey::RecentSearches(identity.clone());
        match read_json::<Vec<String>>(self.store.as_ref(), &key).await {
            Ok(terms) => terms.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, identity = %identity, "Ignoring unreadable recent searches");
                Vec::new()
            }
        }
    }

    pub async fn most_recent(&self, identity: &Identity) -> Option<String> {
        self.list(identity).await.into_iter().next()
    }

    /// Moves `term` to the front, dropping any case-insensitive duplicate and
    /// anything past the size limit. Returns the updated list.
    pub async fn record(&self, identity: &Identity, term: &str) -> AppResult<Vec<String>> {
        let previous = self.list(identity).await;
        let next = push_front_distinct(previous, term);

        write_json(
            self.store.as_ref(),
            &StorageKey::RecentSearches(identity.clone()),
            &next,
        )
        .await?;
        Ok(next)
    }

    pub async fn clear(&self, identity: &Identity) -> AppResult<()> {
        self.store
            .remove(&StorageKey::RecentSearches(identity.clone()))
            .await
    }
}

fn push_front_distinct(previous: Vec<String>, term: &str) -> Vec<String> {
    let lowered = term.to_lowercase();
    std::iter::once(term.to_string())
        .chain(
            previous
                .into_iter()
                .filter(|existing| existing.to_lowercase() != lowered),
        )
        .take(MAX_RECENT_SEARCHES)
        .collect()
}
