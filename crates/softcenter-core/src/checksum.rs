//! Streaming MD5 digests for archive files.
//!
//! Files are read in [`ChecksumConfig::CHUNK_SIZE`] chunks so archives of any
//! size hash in constant memory.

use crate::config::ChecksumConfig;
use crate::error::{Result, SoftcenterError};
use md5::{Digest, Md5};
use std::io::Read;
use std::path::Path;

/// Compute the MD5 of a file as a lowercase hex string.
pub fn compute_md5(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| SoftcenterError::io_with_path(e, path))?;
    md5_of_reader(file).map_err(|e| SoftcenterError::io_with_path(e, path))
}

/// Fold everything a reader yields into an MD5 digest.
fn md5_of_reader(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = Md5::new();

    let mut buffer = vec![0u8; ChecksumConfig::CHUNK_SIZE];
    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
