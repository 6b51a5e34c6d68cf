use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::{CatalogId, MediaKind, RecommendationView};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub term: String,
}

#[derive(Debug, Serialize)]
pub struct RecentSearchesResponse {
    pub searches: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistAddRequest {
    pub catalog_id: CatalogId,
    pub media_kind: MediaKind,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub identity: String,
    pub authenticated: bool,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Current recommendation candidate, its label and media kind
pub async fn get_recommendation(State(state): State<AppState>) -> Json<RecommendationView> {
    Json(state.recommendations.view())
}

/// Recent searches of the current identity
pub async fn get_searches(State(state): State<AppState>) -> Json<RecentSearchesResponse> {
    let searches = state.recommendations.recent_searches().await;
    Json(RecentSearchesResponse { searches })
}

/// Record a submitted search; it becomes the new recommendation seed
pub async fn record_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> AppResult<(StatusCode, Json<RecentSearchesResponse>)> {
    let searches = state.recommendations.record_search(&request.term).await?;
    Ok((StatusCode::CREATED, Json(RecentSearchesResponse { searches })))
}

/// Forget the current identity's recent searches
pub async fn clear_searches(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.recommendations.clear_recent_searches().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a title added to a playlist; it becomes the new recommendation seed
pub async fn record_playlist_add(
    State(state): State<AppState>,
    Json(request): Json<PlaylistAddRequest>,
) -> AppResult<StatusCode> {
    if request.catalog_id == 0 {
        return Err(AppError::InvalidInput(
            "catalog_id must be positive".to_string(),
        ));
    }

    state
        .recommendations
        .record_playlist_add(request.catalog_id, request.media_kind)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// Current session identity
pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(session_response(&state).await)
}

/// Sign in with an access token issued by the backend
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<SessionResponse>> {
    if request.access_token.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "access_token cannot be empty".to_string(),
        ));
    }

    state
        .recommendations
        .session()
        .login(request.access_token)
        .await;
    Ok(Json(session_response(&state).await))
}

/// Sign out; state falls back to the anonymous identity
pub async fn logout(State(state): State<AppState>) -> Json<SessionResponse> {
    state.recommendations.session().logout().await;
    Json(session_response(&state).await)
}

async fn session_response(state: &AppState) -> SessionResponse {
    let session = state.recommendations.session();
    SessionResponse {
        identity: session.identity().await.to_string(),
        authenticated: session.is_authenticated().await,
    }
}
