//! Package archive downloads.

use super::shared::stream_file;
use super::ApiError;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use softcenter_core::{
    is_safe_archive_name, is_safe_module, is_within, strip_directories, HttpConfig,
};
use std::sync::Arc;
use tracing::debug;

/// `GET /:module/:filename`
///
/// Looks for `file/<filename>` first and `file/<module>/<filename>` second.
pub async fn handle_archive(
    State(state): State<Arc<AppState>>,
    Path((module, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    if !(is_safe_module(&module) && is_safe_archive_name(&filename)) {
        debug!("Rejected archive request {}/{}", module, filename);
        return Err(ApiError::not_found(format!("{}/{}", module, filename)));
    }

    let name = strip_directories(&filename).ok_or_else(|| ApiError::not_found(&filename))?;
    let root = &state.file_root;

    let direct = root.join(name);
    let module_scoped = root.join(&module).join(name);

    for candidate in [direct, module_scoped] {
        if candidate.is_file() && is_within(root, &candidate) {
            return stream_file(&candidate, HttpConfig::ARCHIVE_MIME, attachment(name)?).await;
        }
    }

    Err(ApiError::not_found(format!("{}/{}", module, name)))
}

fn attachment(name: &str) -> Result<HeaderMap, ApiError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok(headers)
}
