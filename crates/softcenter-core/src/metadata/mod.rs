//! Metadata feed persistence and the startup checksum refresh.

pub mod atomic;
mod refresh;

pub use atomic::{atomic_write_text, read_text};
pub use refresh::{refresh_checksums, RefreshOutcome};
