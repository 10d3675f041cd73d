//! Softcenter Core - filesystem side of the softcenter package mirror.
//!
//! This crate resolves archive references, computes archive digests, shapes
//! JSONP feed responses and keeps the metadata feed's `md5` fields in sync
//! with the files on disk. It has no HTTP dependencies; the server crate
//! builds its handlers on top of it.
//!
//! # Example
//!
//! ```rust,ignore
//! use softcenter_core::{refresh_checksums, ContentLocator, SoftcenterPaths};
//!
//! let paths = SoftcenterPaths::new("/srv/softcenter");
//! let locator = ContentLocator::new(paths.file_dir());
//! let outcome = refresh_checksums(&paths.app_response(), &locator);
//! outcome.log(&paths.app_response());
//! ```

pub mod checksum;
pub mod config;
pub mod envelope;
pub mod error;
pub mod locator;
pub mod metadata;

// Re-export commonly used types
pub use checksum::compute_md5;
pub use config::{HttpConfig, PathsConfig, SoftcenterPaths};
pub use envelope::{parse_callback, render_feed, Envelope};
pub use error::{Result, SoftcenterError};
pub use locator::{
    is_safe_archive_name, is_safe_module, is_within, strip_directories, ContentLocator,
};
pub use metadata::{refresh_checksums, RefreshOutcome};
