use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Malformed stored value under {key}: {source}")]
    MalformedStoredValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No seed to recommend from")]
    NoSeed,

    #[error("Storage error: {0}")]
    Storage(#[from] redis::RedisError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::CatalogUnavailable(format!("request timed out: {}", e))
        } else {
            AppError::CatalogUnavailable(e.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NoSeed => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::CatalogUnavailable(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::MalformedStoredValue { .. } | AppError::Storage(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
