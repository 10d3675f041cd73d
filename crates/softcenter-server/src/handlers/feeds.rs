//! Metadata and push-message feeds, served as JSON or JSONP.

use super::shared::read_text;
use super::ApiError;
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use softcenter_core::{parse_callback, render_feed, HttpConfig};
use std::path::Path;
use std::sync::Arc;

/// Query parameters accepted by the feed endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub callback: Option<String>,
}

/// `GET /softcenter/app.json.js`
pub async fn handle_app_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    reply_from(&state.paths.app_response(), query.callback.as_deref()).await
}

/// `GET /softcenter/push_message.json.js`
pub async fn handle_push_feed(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    reply_from(&state.paths.push_response(), query.callback.as_deref()).await
}

async fn reply_from(path: &Path, callback: Option<&str>) -> Result<Response, ApiError> {
    let raw = read_text(path).await?;
    let callback = parse_callback(callback)?;
    let body = render_feed(&raw, callback);

    Ok((
        [(header::CONTENT_TYPE, HttpConfig::JAVASCRIPT_UTF8_MIME)],
        body,
    )
        .into_response())
}
