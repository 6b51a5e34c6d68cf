/// Media catalog abstraction
///
/// The recommendation pipeline only ever needs three catalog operations: a text
/// search, a details lookup, and a discover query. Each backend implements them
/// behind this trait so the pipeline can be exercised against fakes.
use crate::{
    error::AppResult,
    models::{CatalogId, CatalogSummary, DiscoverQuery, MediaKind, PagedResult, TitleDetails},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for catalog data providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Search titles of one media kind by free text
    async fn search(
        &self,
        term: &str,
        media_kind: MediaKind,
        page: u32,
    ) -> AppResult<PagedResult<CatalogSummary>>;

    /// Fetch the genres, rating and display title of one entry
    async fn details(&self, catalog_id: CatalogId, media_kind: MediaKind)
        -> AppResult<TitleDetails>;

    /// Query titles matching genre and rating filters
    async fn discover(&self, query: &DiscoverQuery) -> AppResult<PagedResult<CatalogSummary>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
