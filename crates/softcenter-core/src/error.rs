//! Error types for the softcenter mirror.
//!
//! Request paths map these onto HTTP statuses; the startup refresh folds them
//! into a [`crate::metadata::RefreshOutcome`] and never lets them escape.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the softcenter core library.
#[derive(Debug, Error)]
pub enum SoftcenterError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Validation errors
    #[error("Invalid content reference: {reference}")]
    InvalidReference { reference: String },

    #[error("Invalid callback name: {0}")]
    InvalidCallback(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for softcenter operations.
pub type Result<T> = std::result::Result<T, SoftcenterError>;

impl From<std::io::Error> for SoftcenterError {
    fn from(err: std::io::Error) -> Self {
        SoftcenterError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for SoftcenterError {
    fn from(err: serde_json::Error) -> Self {
        SoftcenterError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl SoftcenterError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        SoftcenterError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether this error means "the resource is not there" rather than a
    /// real failure. Handlers answer these with 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            SoftcenterError::FileNotFound(_) | SoftcenterError::InvalidReference { .. } => true,
            SoftcenterError::Io {
                source: Some(source),
                ..
            } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
