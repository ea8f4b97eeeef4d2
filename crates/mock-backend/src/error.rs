//! Error type for the mock backend.
//!
//! [`ApiError`] unifies all failure modes and implements
//! [`axum::response::IntoResponse`] so handlers can return
//! `Result<…, ApiError>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, malformed, or expired credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but not allowed to do this.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No such table, row, or function.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request itself is invalid.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An NKey operation failed (key parsing or signing).
    #[error("NKey error: {0}")]
    NKey(String),

    /// JSON (de)serialisation error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NKey(_) | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        tracing::error!(%status, error = %message, "request failed");
        (status, Json(json!({ "error": message }))).into_response()
    }
}
