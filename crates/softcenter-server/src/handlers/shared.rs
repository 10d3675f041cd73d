//! Shared handler utilities.

use super::ApiError;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Stream a regular file as the response body.
///
/// `headers` are added on top of `Content-Type` and `Content-Length`. Paths
/// that are missing or not regular files answer 404.
pub(crate) async fn stream_file(
    path: &Path,
    content_type: &'static str,
    mut headers: HeaderMap,
) -> Result<Response, ApiError> {
    let file = File::open(path).await.map_err(|e| open_error(path, e))?;
    let metadata = file.metadata().await.map_err(|e| open_error(path, e))?;
    if !metadata.is_file() {
        return Err(ApiError::not_found(path.display().to_string()));
    }

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));

    debug!("Serving {} ({} bytes)", path.display(), metadata.len());
    let body = Body::from_stream(ReaderStream::new(file));
    Ok((StatusCode::OK, headers, body).into_response())
}

/// Read a text file, answering 404 when it is absent.
pub(crate) async fn read_text(path: &Path) -> Result<String, ApiError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| open_error(path, e))
}

fn open_error(path: &Path, err: std::io::Error) -> ApiError {
    match err.kind() {
        ErrorKind::NotFound => ApiError::not_found(path.display().to_string()),
        _ => ApiError::Internal(format!("{}: {}", path.display(), err)),
    }
}
