use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod identity;
pub mod recommendation;
pub mod seed;

pub use identity::Identity;
pub use recommendation::{RecommendationResult, RecommendationView};
pub use seed::Seed;

/// Catalog identifier of a movie or series
pub type CatalogId = u64;

/// Kind of media the catalog distinguishes between
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    #[serde(alias = "tv")]
    Series,
}

impl MediaKind {
    /// Path segment the catalog uses for this kind
    pub fn catalog_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Series => write!(f, "series"),
        }
    }
}

/// Read-only projection of a catalog entry, as shown on the landing page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSummary {
    pub id: CatalogId,
    /// Movies carry `title`, series carry `name`
    #[serde(alias = "name", default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
}

/// The subset of title details recommendations are derived from
#[derive(Debug, Clone, PartialEq)]
pub struct TitleDetails {
    pub id: CatalogId,
    pub title: String,
    pub genres: Vec<u64>,
    pub rating_average: f64,
}

/// One page of catalog results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagedResult<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> PagedResult<T> {
    pub fn from_results(results: Vec<T>) -> Self {
        let total = results.len() as u32;
        Self {
            page: 1,
            results,
            total_pages: 1,
            total_results: total,
        }
    }
}

/// Sort orders accepted by the discover endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    PopularityDesc,
}

impl Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortBy::PopularityDesc => write!(f, "popularity.desc"),
        }
    }
}

/// Filters for a discover/similar query
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub media_kind: MediaKind,
    /// Empty means no genre filter
    pub genre_ids: Vec<u64>,
    pub rating_floor: Option<f64>,
    pub sort_by: SortBy,
    pub page: u32,
}

// ============================================================================
// Catalog (TMDB) API Types
// ============================================================================

/// Raw response from GET /{movie|tv}/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct ApiTitleDetails {
    pub id: CatalogId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub genres: Vec<ApiGenre>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiGenre {
    pub id: u64,
}

impl From<ApiTitleDetails> for TitleDetails {
    fn from(api: ApiTitleDetails) -> Self {
        TitleDetails {
            id: api.id,
            title: api
                .title
                .or(api.name)
                .unwrap_or_else(|| "this title".to_string()),
            genres: api.genres.into_iter().map(|g| g.id).collect(),
            rating_average: api.vote_average.unwrap_or(0.0),
        }
    }
}
