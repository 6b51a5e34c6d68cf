use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Landing page panel
        .route("/recommendation", get(handlers::get_recommendation))
        // Seed-producing actions
        .route(
            "/searches",
            get(handlers::get_searches)
                .post(handlers::record_search)
                .delete(handlers::clear_searches),
        )
        .route("/playlist-adds", post(handlers::record_playlist_add))
        // Session
        .route(
            "/session",
            get(handlers::get_session)
                .post(handlers::login)
                .delete(handlers::logout),
        )
}
