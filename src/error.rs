//! Error types for the image cache service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the image cache service.
///
/// A missing or expired image is not an error for the store itself; store
/// reads return `Option`. `NotFound` only exists for the HTTP layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Upload rejected before any write (wrong MIME type, oversized, bad key format)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Backend failed to open, a transaction failed, or the store is not initialized
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Resource absent at the HTTP boundary
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed HTTP request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No API key has been stored yet
    #[error("API key not configured")]
    MissingCredential,

    /// The analysis backend failed or answered with an error
    #[error("Analysis backend error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(err: sqlx::Error) -> Self {
        CacheError::StorageUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::StorageUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CacheError::Upstream("request timed out".to_string())
        } else if err.is_connect() {
            CacheError::Upstream(format!("cannot reach analysis backend: {}", err))
        } else {
            CacheError::Upstream(err.to_string())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Validation(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::MissingCredential => StatusCode::UNAUTHORIZED,
            CacheError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the image cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
