//! Atomic file operations for feed persistence.
//!
//! Implements atomic writes using:
//! 1. Write to a named temp file in the target's directory
//! 2. fsync to ensure data reaches disk
//! 3. Atomic rename over the target path
//!
//! The temp file is removed on every failure path, so an aborted write never
//! leaves a stray artifact next to the feed.

use crate::error::{Result, SoftcenterError};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Read a UTF-8 text file.
///
/// Returns `None` if the file doesn't exist.
pub fn read_text(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SoftcenterError::io_with_path(e, path)),
    }
}

/// Replace a text file's contents atomically.
///
/// Readers see either the old contents or the new ones, never a partial
/// write. The existing file's permissions carry over to the replacement.
pub fn atomic_write_text(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| SoftcenterError::io_with_path(e, dir))?;

    write_and_sync(&mut temp, contents)?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| SoftcenterError::io_with_path(e, temp.path()))?;
    }

    // On failure the returned error owns the temp file and deletes it on drop
    temp.persist(path)
        .map_err(|e| SoftcenterError::io_with_path(e.error, path))?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

fn write_and_sync(temp: &mut NamedTempFile, contents: &str) -> Result<()> {
    temp.write_all(contents.as_bytes())
        .map_err(|e| SoftcenterError::io_with_path(e, temp.path()))?;
    temp.flush()
        .map_err(|e| SoftcenterError::io_with_path(e, temp.path()))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| SoftcenterError::io_with_path(e, temp.path()))?;
    Ok(())
}
