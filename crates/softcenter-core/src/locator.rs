//! Maps content references from metadata onto files under the storage root.
//!
//! A reference such as `acme/acme.tar.gz` resolves to `file/acme/acme.tar.gz`
//! when that exists, otherwise to the flat `file/acme.tar.gz`. Nothing that
//! could leave the storage root is ever returned.

use crate::error::{Result, SoftcenterError};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Module directory names accepted in archive URLs.
static SAFE_MODULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_\-]*$").expect("module name regex must compile")
});

/// Archive file names accepted in archive URLs.
static SAFE_ARCHIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_\-]*\.tar\.gz$").expect("archive name regex must compile")
});

/// Resolves metadata `tar_url` references to archive files on disk.
#[derive(Debug, Clone)]
pub struct ContentLocator {
    root: PathBuf,
}

impl ContentLocator {
    /// Create a locator for a storage root.
    ///
    /// Relative roots are made absolute against the current directory so that
    /// containment checks compare like with like.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        Self { root }
    }

    /// Resolve a reference to an existing regular file, module-nested first,
    /// then flat by basename.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        self.locate(reference).ok()
    }

    /// Like [`resolve`](Self::resolve), but says why a reference failed.
    pub fn locate(&self, reference: &str) -> Result<PathBuf> {
        let relative =
            normalize_reference(reference).ok_or_else(|| SoftcenterError::InvalidReference {
                reference: reference.to_string(),
            })?;

        let nested = self.root.join(&relative);
        if nested.is_file() && is_within(&self.root, &nested) {
            return Ok(nested);
        }

        if let Some(name) = relative.file_name() {
            let flat = self.root.join(name);
            if flat.is_file() && is_within(&self.root, &flat) {
                return Ok(flat);
            }
        }

        debug!("No file for reference {}", reference);
        Err(SoftcenterError::FileNotFound(nested))
    }
}

/// Turn a reference into a clean relative path, or `None` if it is unsafe.
///
/// Rejects `..` anywhere, absolute references and `//`. Leading and trailing
/// separators are stripped and `.` segments dropped.
pub fn normalize_reference(reference: &str) -> Option<PathBuf> {
    if reference.contains("..") || reference.starts_with('/') || reference.contains("//") {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in Path::new(reference.trim_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

/// Final path segment of a request-supplied name, dropping any directories.
///
/// Returns `None` when the last segment is empty, `.` or `..`, which covers
/// `""`, `a/..` and names with a trailing `/`.
pub fn strip_directories(name: &str) -> Option<&str> {
    match name.rsplit('/').next() {
        None | Some("" | "." | "..") => None,
        Some(base) => Some(base),
    }
}

/// Whether a URL segment is an acceptable module directory name.
pub fn is_safe_module(name: &str) -> bool {
    SAFE_MODULE.is_match(name)
}

/// Whether a URL segment is an acceptable `.tar.gz` archive name.
pub fn is_safe_archive_name(name: &str) -> bool {
    SAFE_ARCHIVE.is_match(name)
}

/// Lexical containment check: does `path` sit under `root`?
///
/// Any `..` segment in `path` fails the check outright, so a joined path can
/// never climb back out through normalization.
pub fn is_within(root: &Path, path: &Path) -> bool {
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return false;
    }
    path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn storage_with(files: &[&str]) -> (TempDir, ContentLocator) {
        let temp_dir = TempDir::new().unwrap();
        for file in files {
            let path = temp_dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, file.as_bytes()).unwrap();
        }
        let locator = ContentLocator::new(temp_dir.path());
        (temp_dir, locator)
    }

    #[test]
    fn test_rejects_traversal_references() {
        let (_temp, locator) = storage_with(&["acme.tar.gz"]);

        for reference in [
            "../acme.tar.gz",
            "acme/../../acme.tar.gz",
            "..",
            "/acme.tar.gz",
            "/etc/passwd",
            "acme//acme.tar.gz",
            "//acme.tar.gz",
            "a..b/acme.tar.gz",
        ] {
            assert_eq!(locator.resolve(reference), None, "reference {reference:?}");
        }
    }

    #[test]
    fn test_prefers_module_nested_file() {
        let (temp, locator) = storage_with(&["acme/acme.tar.gz", "acme.tar.gz"]);

        let resolved = locator.resolve("acme/acme.tar.gz").unwrap();
        assert_eq!(resolved, temp.path().join("acme").join("acme.tar.gz"));
    }

    #[test]
    fn test_falls_back_to_flat_basename() {
        let (temp, locator) = storage_with(&["acme.tar.gz"]);

        let resolved = locator.resolve("acme/acme.tar.gz").unwrap();
        assert_eq!(resolved, temp.path().join("acme.tar.gz"));
    }

    #[test]
    fn test_strips_outer_separators_and_dot_segments() {
        let (_temp, locator) = storage_with(&["acme/acme.tar.gz"]);

        assert!(locator.resolve("acme/acme.tar.gz/").is_some());
        assert!(locator.resolve("./acme/./acme.tar.gz").is_some());
    }

    #[test]
    fn test_locate_reports_reason() {
        let (_temp, locator) = storage_with(&["acme.tar.gz"]);

        assert!(matches!(
            locator.locate("../acme.tar.gz"),
            Err(SoftcenterError::InvalidReference { .. })
        ));
        assert!(matches!(
            locator.locate("tools/tools.tar.gz"),
            Err(SoftcenterError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_directories_are_not_files() {
        let (_temp, locator) = storage_with(&["acme/acme.tar.gz"]);

        assert_eq!(locator.resolve("acme"), None);
        assert_eq!(locator.resolve(""), None);
        assert_eq!(locator.resolve("missing.tar.gz"), None);
    }

    #[test]
    fn test_strip_directories() {
        assert_eq!(strip_directories("../../etc/passwd.png"), Some("passwd.png"));
        assert_eq!(strip_directories("icon.png"), Some("icon.png"));
        assert_eq!(strip_directories("a/.."), None);
        assert_eq!(strip_directories("a/."), None);
        assert_eq!(strip_directories("acme.png/"), None);
        assert_eq!(strip_directories(""), None);
    }

    #[test]
    fn test_archive_request_names() {
        assert!(is_safe_module("acme"));
        assert!(is_safe_module("Tool_kit-2"));
        assert!(!is_safe_module("-acme"));
        assert!(!is_safe_module("acme.v2"));
        assert!(!is_safe_module(".."));

        assert!(is_safe_archive_name("acme.tar.gz"));
        assert!(is_safe_archive_name("acme_1-2.tar.gz"));
        assert!(!is_safe_archive_name("evil.sh"));
        assert!(!is_safe_archive_name("acme.TAR.GZ"));
        assert!(!is_safe_archive_name("acme.1.tar.gz"));
        assert!(!is_safe_archive_name(".tar.gz"));
        assert!(!is_safe_archive_name("acme.tar.gz.sh"));
    }

    #[test]
    fn test_is_within() {
        let root = Path::new("/srv/file");
        assert!(is_within(root, Path::new("/srv/file/acme.tar.gz")));
        assert!(!is_within(root, Path::new("/srv/file/../secret")));
        assert!(!is_within(root, Path::new("/srv/files/acme.tar.gz")));
    }
}
