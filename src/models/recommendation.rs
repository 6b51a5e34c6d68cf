use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{CatalogSummary, MediaKind, Seed};

/// Most candidates a single recommendation run keeps
pub const MAX_CANDIDATES: usize = 5;

/// Output of one recommendation computation, as stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResult {
    pub seed: Seed,
    pub items: Vec<CatalogSummary>,
    pub label: Option<String>,
    pub media_kind: MediaKind,
    pub computed_at: DateTime<Utc>,
}

impl RecommendationResult {
    /// A result is fresh while strictly younger than `ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.computed_at < ttl
    }

    /// Whether a cached copy of this result may be served
    pub fn is_servable(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        !self.items.is_empty() && self.is_fresh(now, ttl)
    }
}

/// What the landing page renders for the recommendation panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RecommendationView {
    pub candidate: Option<CatalogSummary>,
    pub label: Option<String>,
    pub media_kind: Option<MediaKind>,
    pub has_recommendations: bool,
}

impl RecommendationView {
    /// The "no recommendations yet" state
    pub fn empty() -> Self {
        Self::default()
    }
}
