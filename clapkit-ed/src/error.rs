//! Error types for clapkit-ed

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., scene id mismatch awaiting confirmation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unprocessable input (422) - well-formed request, unusable content
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl From<clapkit_common::Error> for ApiError {
    fn from(err: clapkit_common::Error) -> Self {
        use clapkit_common::Error;
        match err {
            Error::SceneNotFound(_) => ApiError::NotFound(err.to_string()),
            Error::SceneIdMismatch { .. } => ApiError::Conflict(err.to_string()),
            Error::NoInput
            | Error::InvalidSceneJson(_)
            | Error::FilmIdMismatch { .. } => ApiError::Unprocessable(err.to_string()),
            Error::NotStage2
            | Error::SlotOutOfRange { .. }
            | Error::SlotAlreadyFilled(_) => ApiError::BadRequest(err.to_string()),
            Error::Json(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Other(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
