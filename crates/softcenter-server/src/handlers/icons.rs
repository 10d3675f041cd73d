//! Package icons. Only `.png` files from the icon directory are served.

use super::shared::stream_file;
use super::ApiError;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use softcenter_core::{strip_directories, HttpConfig};
use std::sync::Arc;

/// `GET /softcenter/softcenter/res/*filename`
///
/// Icons get replaced in place, so responses are never cacheable.
pub async fn handle_icon(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let name = strip_directories(&filename).ok_or_else(|| ApiError::not_found(&filename))?;
    if !is_png(name) {
        return Err(ApiError::not_found(name));
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(HttpConfig::NO_CACHE),
    );

    stream_file(&state.paths.icon_dir().join(name), HttpConfig::PNG_MIME, headers).await
}

fn is_png(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}
