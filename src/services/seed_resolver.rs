use chrono::Utc;

use crate::{
    models::{Identity, Seed},
    services::{recent_searches::RecentSearches, seed_store::SeedStore},
};

/// Picks the seed recommendations are computed from
#[derive(Clone)]
pub struct SeedResolver {
    seeds: SeedStore,
    recent: RecentSearches,
}

impl SeedResolver {
    pub fn new(seeds: SeedStore, recent: RecentSearches) -> Self {
        Self { seeds, recent }
    }

    /// An explicit seed always wins. Otherwise the newest recent search becomes
    /// the seed and is stored, so it is explicit from then on. The fallback is
    /// only stored into an empty slot.
    pub async fn resolve(&self, identity: &Identity) -> Option<Seed> {
        if let Some(seed) = self.seeds.read_seed(identity).await {
            return Some(seed);
        }

        let term = self.recent.most_recent(identity).await?;
        let seed = Seed::search(term, Utc::now());

        // A seed written since the first read takes precedence over the fallback.
        match self.seeds.persist_seed_if_absent(identity, &seed).await {
            Ok(true) => {
                tracing::debug!(identity = %identity, "Seed synthesized from recent searches");
                Some(seed)
            }
            Ok(false) => {
                tracing::debug!(identity = %identity, "Seed written concurrently, keeping it");
                self.seeds.read_seed(identity).await.or(Some(seed))
            }
            Err(e) => {
                tracing::warn!(error = %e, identity = %identity, "Failed to persist fallback seed");
                Some(seed)
            }
        }
    }
}
