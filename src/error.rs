//! Error types for the work engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Engine Error Enum ==
/// Unified error type for the engine and its HTTP surface.
///
/// Per-item failures inside a pool run are never reported through this type;
/// they stay in the caller's own error type and are counted in the run metrics.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Rejected configuration, raised before any work starts
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Requested result not found (absent or expired)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Queue refused an item under the `newest` drop strategy
    #[error("Queue full: {0}")]
    QueueFull(String),

    /// A worker task panicked or could not be joined
    #[error("Worker failure: {0}")]
    Worker(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::QueueFull(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::InvalidConfig(_) | EngineError::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the engine.
pub type Result<T> = std::result::Result<T, EngineError>;
