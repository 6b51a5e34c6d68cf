/// TMDB catalog provider
///
/// API Flow:
/// 1. Search: /search/{movie|tv} → summaries of matching titles
/// 2. Details: /{movie|tv}/{id} → genres and average rating
/// 3. Discover: /discover/{movie|tv} → titles filtered by genre and rating floor
use crate::{
    error::{AppError, AppResult},
    models::{
        ApiTitleDetails, CatalogId, CatalogSummary, DiscoverQuery, MediaKind, PagedResult,
        TitleDetails,
    },
    services::providers::CatalogProvider,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    /// Creates a provider whose requests all give up after `timeout`
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Query parameters for a discover request; unset filters are omitted
    fn discover_params(query: &DiscoverQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("sort_by", query.sort_by.to_string()),
            ("page", query.page.to_string()),
            ("include_adult", "false".to_string()),
        ];

        if !query.genre_ids.is_empty() {
            let genres = query
                .genre_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            params.push(("with_genres", genres));
        }

        if let Some(floor) = query.rating_floor {
            params.push(("vote_average.gte", floor.to_string()));
        }

        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                "Catalog request failed"
            );
            return Err(AppError::CatalogUnavailable(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                "Failed to deserialize TMDB response"
            );
            AppError::CatalogUnavailable(format!("Failed to parse TMDB response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn search(
        &self,
        term: &str,
        media_kind: MediaKind,
        page: u32,
    ) -> AppResult<PagedResult<CatalogSummary>> {
        if term.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let path = format!("/search/{}", media_kind.catalog_path());
        let results: PagedResult<CatalogSummary> = self
            .get_json(
                &path,
                &[
                    ("query", term.to_string()),
                    ("page", page.to_string()),
                    ("include_adult", "false".to_string()),
                ],
            )
            .await?;

        tracing::info!(
            query = %term,
            media_kind = %media_kind,
            results = results.results.len(),
            provider = "tmdb",
            "Catalog search completed"
        );

        Ok(results)
    }

    async fn details(
        &self,
        catalog_id: CatalogId,
        media_kind: MediaKind,
    ) -> AppResult<TitleDetails> {
        let path = format!("/{}/{}", media_kind.catalog_path(), catalog_id);
        let details: ApiTitleDetails = self.get_json(&path, &[]).await?;

        tracing::debug!(
            catalog_id,
            media_kind = %media_kind,
            genres = details.genres.len(),
            provider = "tmdb",
            "Title details fetched"
        );

        Ok(details.into())
    }

    async fn discover(&self, query: &DiscoverQuery) -> AppResult<PagedResult<CatalogSummary>> {
        let path = format!("/discover/{}", query.media_kind.catalog_path());
        let results: PagedResult<CatalogSummary> = self
            .get_json(&path, &Self::discover_params(query))
            .await?;

        tracing::info!(
            media_kind = %query.media_kind,
            genres = ?query.genre_ids,
            rating_floor = ?query.rating_floor,
            results = results.results.len(),
            provider = "tmdb",
            "Catalog discover completed"
        );

        Ok(results)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
