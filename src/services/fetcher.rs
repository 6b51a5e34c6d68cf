use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        recommendation::MAX_CANDIDATES, CatalogId, CatalogSummary, DiscoverQuery, MediaKind,
        RecommendationResult, Seed, SortBy, TitleDetails,
    },
    services::providers::CatalogProvider,
};

/// How far below the seed title's rating discovered titles may score
const RATING_SLACK: f64 = 1.5;
/// Genres of the seed title used as the discover filter
const MAX_SEED_GENRES: usize = 2;
/// Rating floors keep six decimals; catalog ratings carry three
const FLOOR_PRECISION: f64 = 1_000_000.0;

/// Turns a seed into a ranked list of recommended titles
#[derive(Clone)]
pub struct RecommendationFetcher {
    catalog: Arc<dyn CatalogProvider>,
}

impl RecommendationFetcher {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self { catalog }
    }

    /// Runs the catalog lookups for `seed`
    ///
    /// Any failed catalog call aborts the whole computation with
    /// [`AppError::CatalogUnavailable`]. A search matching nothing is not a
    /// failure: it yields an empty result that still carries its label.
    pub async fn fetch(&self, seed: &Seed) -> AppResult<RecommendationResult> {
        let (items, label, media_kind) = match seed {
            Seed::PlaylistAdd {
                catalog_id,
                media_kind,
                ..
            } => {
                let details = self.details(*catalog_id, *media_kind).await?;
                let items = self.similar_to(*catalog_id, &details, *media_kind).await?;
                (
                    items,
                    Some(format!("Because you liked {}", details.title)),
                    *media_kind,
                )
            }
            Seed::Search { term, .. } => {
                let label = Some(format!("Because you searched {}", term));
                match self.top_hit(term).await? {
                    Some((hit, media_kind)) => {
                        let details = self.details(hit.id, media_kind).await?;
                        let items = self.similar_to(hit.id, &details, media_kind).await?;
                        (items, label, media_kind)
                    }
                    None => {
                        tracing::info!(term = %term, "Search seed matched no titles");
                        (Vec::new(), label, MediaKind::Series)
                    }
                }
            }
        };

        tracing::info!(
            items = items.len(),
            media_kind = %media_kind,
            provider = self.catalog.name(),
            "Recommendations fetched"
        );

        Ok(RecommendationResult {
            seed: seed.clone(),
            items,
            label,
            media_kind,
            computed_at: Utc::now(),
        })
    }

    /// First search hit for `term`, trying movies before series
    async fn top_hit(&self, term: &str) -> AppResult<Option<(CatalogSummary, MediaKind)>> {
        for media_kind in [MediaKind::Movie, MediaKind::Series] {
            let page = self
                .catalog
                .search(term, media_kind, 1)
                .await
                .map_err(unavailable)?;

            if let Some(hit) = page.results.into_iter().next() {
                return Ok(Some((hit, media_kind)));
            }
        }
        Ok(None)
    }

    async fn details(&self, catalog_id: CatalogId, media_kind: MediaKind) -> AppResult<TitleDetails> {
        self.catalog
            .details(catalog_id, media_kind)
            .await
            .map_err(unavailable)
    }

    /// Popular titles sharing genres with `details`, never including the seed entity
    async fn similar_to(
        &self,
        seed_id: CatalogId,
        details: &TitleDetails,
        media_kind: MediaKind,
    ) -> AppResult<Vec<CatalogSummary>> {
        let query = discover_query(details, media_kind);
        let page = self.catalog.discover(&query).await.map_err(unavailable)?;

        Ok(page
            .results
            .into_iter()
            .filter(|item| item.id != seed_id)
            .take(MAX_CANDIDATES)
            .collect())
    }
}

/// Builds the discover filters for titles like `details`
///
/// A zero rating means the catalog has no votes, so no floor is applied;
/// likewise a title without genres gets no genre filter.
pub fn discover_query(details: &TitleDetails, media_kind: MediaKind) -> DiscoverQuery {
    DiscoverQuery {
        media_kind,
        genre_ids: details.genres.iter().take(MAX_SEED_GENRES).copied().collect(),
        rating_floor: rating_floor(details.rating_average),
        sort_by: SortBy::PopularityDesc,
        page: 1,
    }
}

fn rating_floor(rating: f64) -> Option<f64> {
    if rating > 0.0 {
        // Trims float noise only: 8.8 gives 7.3, not 7.300000000000001
        let floor = (rating - RATING_SLACK).max(0.0);
        Some((floor * FLOOR_PRECISION).round() / FLOOR_PRECISION)
    } else {
        None
    }
}

fn unavailable(e: AppError) -> AppError {
    match e {
        AppError::CatalogUnavailable(_) => e,
        other => AppError::CatalogUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PagedResult;
    use crate::services::providers::MockCatalogProvider;
    use mockall::predicate::eq;

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

    fn page(ids: &[u64]) -> PagedResult<CatalogSummary> {
        PagedResult::from_results(ids.iter().copied().map(summary).collect())
    }

    fn inception() -> TitleDetails {
        TitleDetails {
            id: 27205,
            title: "Inception".to_string(),
            genres: vec![28, 878],
            rating_average: 8.8,
        }
    }

    fn fetcher(mock: MockCatalogProvider) -> RecommendationFetcher {
        RecommendationFetcher::new(Arc::new(mock))
    }

    fn assert_floor(rating: f64, expected: f64) {
        let floor = rating_floor(rating).unwrap();
        assert!(
            (floor - expected).abs() < 1e-9,
            "floor for {} was {}, expected {}",
            rating,
            floor,
            expected
        );
    }

    #[test]
    fn test_rating_floor() {
        assert_floor(8.8, 7.3);
        assert_floor(1.0, 0.0);
        assert_eq!(rating_floor(0.0), None);
    }

    #[test]
    fn test_rating_floor_keeps_catalog_precision() {
        assert_floor(8.369, 6.869);
        assert_floor(7.051, 5.551);
    }

    #[test]
    fn test_discover_query_takes_two_genres() {
        let details = TitleDetails {
            genres: vec![18, 80, 53],
            ..inception()
        };
        let query = discover_query(&details, MediaKind::Series);

        assert_eq!(query.genre_ids, vec![18, 80]);
        assert_eq!(query.media_kind, MediaKind::Series);
        assert_eq!(query.sort_by, SortBy::PopularityDesc);
    }

    #[tokio::test]
    async fn test_playlist_seed_discovers_by_genre_and_rating() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_details()
            .with(eq(27205), eq(MediaKind::Movie))
            .times(1)
            .returning(|_, _| Ok(inception()));
        mock.expect_discover()
            .withf(|q| {
                q.genre_ids == vec![28, 878]
                    && q.rating_floor.is_some_and(|f| (f - 7.3).abs() < 1e-9)
                    && q.media_kind == MediaKind::Movie
                    && q.sort_by == SortBy::PopularityDesc
            })
            .times(1)
            .returning(|_| Ok(page(&[157336, 27205, 1, 2, 3, 4, 5])));

        let seed = Seed::playlist_add(27205, MediaKind::Movie, Utc::now());
        let result = fetcher(mock).fetch(&seed).await.unwrap();

        let ids: Vec<u64> = result.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![157336, 1, 2, 3, 4]);
        assert_eq!(result.label.as_deref(), Some("Because you liked Inception"));
        assert_eq!(result.media_kind, MediaKind::Movie);
        assert_eq!(result.seed, seed);
    }

    #[tokio::test]
    async fn test_playlist_seed_excludes_requested_id() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_name().return_const("mock");
        // The details payload reports a different id than the one asked for
        mock.expect_details()
            .with(eq(27205), eq(MediaKind::Movie))
            .returning(|_, _| Ok(TitleDetails { id: 99, ..inception() }));
        mock.expect_discover()
            .returning(|_| Ok(page(&[27205, 1, 99])));

        let result = fetcher(mock)
            .fetch(&Seed::playlist_add(27205, MediaKind::Movie, Utc::now()))
            .await
            .unwrap();

        let ids: Vec<u64> = result.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 99]);
    }

    #[tokio::test]
    async fn test_search_seed_falls_back_to_series() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_search()
            .withf(|_, kind, _| *kind == MediaKind::Movie)
            .returning(|_, _, _| Ok(page(&[])));
        mock.expect_search()
            .withf(|term, kind, page| term == "Inception" && *kind == MediaKind::Series && *page == 1)
            .returning(|_, _, _| Ok(page(&[4242])));
        mock.expect_details()
            .with(eq(4242), eq(MediaKind::Series))
            .returning(|id, _| {
                Ok(TitleDetails {
                    id,
                    title: "Inception: The Series".to_string(),
                    genres: vec![10765],
                    rating_average: 7.0,
                })
            });
        mock.expect_discover()
            .withf(|q| q.media_kind == MediaKind::Series)
            .returning(|_| Ok(page(&[4242, 10, 11])));

        let seed = Seed::search("Inception", Utc::now());
        let result = fetcher(mock).fetch(&seed).await.unwrap();

        assert_eq!(result.media_kind, MediaKind::Series);
        assert_eq!(result.label.as_deref(), Some("Because you searched Inception"));
        assert!(result.items.iter().all(|item| item.id != 4242));
        assert_eq!(result.items.len(), 2);
    }

    #[tokio::test]
    async fn test_search_seed_prefers_movies() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_search()
            .withf(|_, kind, _| *kind == MediaKind::Movie)
            .times(1)
            .returning(|_, _, _| Ok(page(&[27205, 99])));
        mock.expect_search()
            .withf(|_, kind, _| *kind == MediaKind::Series)
            .times(0);
        mock.expect_details()
            .with(eq(27205), eq(MediaKind::Movie))
            .returning(|_, _| Ok(inception()));
        mock.expect_discover()
            .returning(|_| Ok(page(&[27205, 1])));

        let result = fetcher(mock)
            .fetch(&Seed::search("Inception", Utc::now()))
            .await
            .unwrap();

        assert_eq!(result.media_kind, MediaKind::Movie);
        assert_eq!(result.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_search_without_hits_is_empty_but_labelled() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_search().times(2).returning(|_, _, _| Ok(page(&[])));
        mock.expect_details().times(0);
        mock.expect_discover().times(0);

        let result = fetcher(mock)
            .fetch(&Seed::search("zzqx", Utc::now()))
            .await
            .unwrap();

        assert!(result.items.is_empty());
        assert_eq!(result.label.as_deref(), Some("Because you searched zzqx"));
    }

    #[tokio::test]
    async fn test_catalog_failure_is_unavailable() {
        let mut mock = MockCatalogProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_details()
            .returning(|_, _| Err(AppError::Internal("connection reset".to_string())));

        let result = fetcher(mock)
            .fetch(&Seed::playlist_add(1, MediaKind::Movie, Utc::now()))
            .await;

        assert!(matches!(result, Err(AppError::CatalogUnavailable(_))));
    }
}
