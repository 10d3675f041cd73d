//! Centralized configuration for the softcenter mirror.
//!
//! Directory names, feed file names and tuning constants live here, along
//! with [`SoftcenterPaths`], which derives every on-disk location from the
//! installation root.

use std::path::{Path, PathBuf};

/// Directory and file names relative to the installation root.
pub struct PathsConfig;

impl PathsConfig {
    pub const ICON_DIR_NAME: &'static str = "picture";
    pub const FILE_DIR_NAME: &'static str = "file";
    pub const APP_RESPONSE_FILE: &'static str = "app_response.txt";
    pub const PUSH_RESPONSE_FILE: &'static str = "push_response.txt";
}

/// Digest computation tuning.
pub struct ChecksumConfig;

impl ChecksumConfig {
    /// Read size for streaming digests (1MB).
    pub const CHUNK_SIZE: usize = 1024 * 1024;
}

/// HTTP surface constants.
pub struct HttpConfig;

impl HttpConfig {
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 5000;
    pub const JAVASCRIPT_MIME: &'static str = "application/javascript";
    pub const JAVASCRIPT_UTF8_MIME: &'static str = "application/javascript; charset=utf-8";
    pub const PNG_MIME: &'static str = "image/png";
    pub const ARCHIVE_MIME: &'static str = "application/gzip";
    pub const NO_CACHE: &'static str = "no-cache, no-store, max-age=0";
    pub const INVALID_CALLBACK_BODY: &'static str = "/* invalid callback */";
}

/// On-disk layout of a softcenter installation.
#[derive(Debug, Clone)]
pub struct SoftcenterPaths {
    root: PathBuf,
}

impl SoftcenterPaths {
    /// Create the layout for an installation root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory holding `.png` icons.
    pub fn icon_dir(&self) -> PathBuf {
        self.root.join(PathsConfig::ICON_DIR_NAME)
    }

    /// Storage root for archives.
    pub fn file_dir(&self) -> PathBuf {
        self.root.join(PathsConfig::FILE_DIR_NAME)
    }

    /// Metadata feed file that the startup refresh rewrites.
    pub fn app_response(&self) -> PathBuf {
        self.root.join(PathsConfig::APP_RESPONSE_FILE)
    }

    /// Push-message feed file.
    pub fn push_response(&self) -> PathBuf {
        self.root.join(PathsConfig::PUSH_RESPONSE_FILE)
    }
}
