//! HTTP request handlers.
//!
//! Every handler is a pure function of the request and the files on disk;
//! nothing is cached between requests.

mod archives;
mod feeds;
mod icons;
mod shared;

pub use archives::handle_archive;
pub use feeds::{handle_app_feed, handle_push_feed};
pub use icons::handle_icon;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use softcenter_core::{HttpConfig, SoftcenterError};
use thiserror::Error;
use tracing::error;

/// Handler error mapped onto an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing resource, rejected name or traversal attempt (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed JSONP callback name (400).
    #[error("invalid callback: {0}")]
    InvalidCallback(String),

    /// Unexpected failure reading a located file (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            Self::InvalidCallback(_) => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, HttpConfig::JAVASCRIPT_MIME)],
                HttpConfig::INVALID_CALLBACK_BODY,
            )
                .into_response(),
            Self::Internal(ref message) => {
                error!("Request failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

impl From<SoftcenterError> for ApiError {
    fn from(err: SoftcenterError) -> Self {
        match err {
            SoftcenterError::InvalidCallback(name) => Self::InvalidCallback(name),
            other if other.is_not_found() => Self::NotFound(other.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}
