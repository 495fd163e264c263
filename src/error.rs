//! Error types for the API and the cache layer
//!
//! `ApiError` is what handlers return and what clients see. `CacheError` never
//! leaves the cache facade: it is logged, counted and turned into a miss or a
//! no-op. `PoolError` comes out of the worker pool and converts into `ApiError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == API Error Enum ==
/// Unified error type for the HTTP-facing layers (handlers and services).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input was well-formed but violated a validation rule
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Input could not be parsed at all
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The server is shutting down or cannot take more work
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "Not found",
            ApiError::Validation(_) => "Validation failed",
            ApiError::InvalidRequest(_) => "Invalid request",
            ApiError::ServiceUnavailable(_) => "Service unavailable",
            ApiError::Internal(_) => "Internal server error",
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Internal details stay in the logs
            ApiError::Internal(_) => "Internal server error".to_string(),
            ApiError::NotFound(msg)
            | ApiError::Validation(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::ServiceUnavailable(msg) => msg.clone(),
        };

        let body = Json(json!({
            "error": self.label(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

// == Cache Error Enum ==
/// Failures inside the cache store. Absorbed by `CacheService`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// The stored value is not of the type the caller asked for
    #[error("Type mismatch for key '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The underlying map could not be accessed
    #[error("Cache store failure: {0}")]
    Internal(String),
}

// == Pool Error Enum ==
/// Failures reported by the worker pool.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    /// Shutdown has begun; no new work is accepted
    #[error("worker pool is shut down")]
    ShutDown,

    /// The task was cancelled by a forced shutdown
    #[error("task cancelled by forced shutdown")]
    Cancelled,

    /// The task panicked
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::ShutDown | PoolError::Cancelled => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            PoolError::Panicked(_) => ApiError::Internal(err.to_string()),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for handlers and services.
pub type Result<T> = std::result::Result<T, ApiError>;
