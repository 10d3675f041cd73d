//! Startup checksum refresh for the metadata feed.
//!
//! Re-hashes every archive the feed points at and rewrites stale `md5`
//! fields in place. The feed keeps its envelope, key order and unrelated
//! fields; only digests change.

use super::atomic::{atomic_write_text, read_text};
use crate::checksum::compute_md5;
use crate::envelope::Envelope;
use crate::error::{Result, SoftcenterError};
use crate::locator::ContentLocator;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info, warn};

/// What a refresh run did.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The feed file does not exist.
    Missing,
    /// Every digest already matched; the file was not touched.
    Unchanged,
    /// Stale digests were replaced and the file rewritten.
    Updated { changed: usize },
    /// The run was abandoned; the file is as it was.
    Failed(SoftcenterError),
}

impl RefreshOutcome {
    /// Log the outcome at a level matching its severity.
    pub fn log(&self, path: &Path) {
        match self {
            RefreshOutcome::Missing => {
                debug!("{} not found, skipping checksum refresh", path.display())
            }
            RefreshOutcome::Unchanged => info!("Checksums in {} are current", path.display()),
            RefreshOutcome::Updated { changed } => {
                info!("Updated {} checksum(s) in {}", changed, path.display())
            }
            RefreshOutcome::Failed(e) => {
                warn!("Checksum refresh of {} failed: {}", path.display(), e)
            }
        }
    }
}

/// Bring the feed's `md5` fields in line with the archives on disk.
///
/// Never fails: any error becomes [`RefreshOutcome::Failed`] and leaves the
/// feed untouched.
pub fn refresh_checksums(feed_path: &Path, locator: &ContentLocator) -> RefreshOutcome {
    match try_refresh(feed_path, locator) {
        Ok(outcome) => outcome,
        Err(e) => RefreshOutcome::Failed(e),
    }
}

fn try_refresh(feed_path: &Path, locator: &ContentLocator) -> Result<RefreshOutcome> {
    let Some(original) = read_text(feed_path)? else {
        return Ok(RefreshOutcome::Missing);
    };

    let envelope = Envelope::parse(&original);
    let mut document: Value = serde_json::from_str(envelope.payload)?;
    let Some(root) = document.as_object_mut() else {
        return Err(SoftcenterError::Other(
            "metadata document is not a JSON object".to_string(),
        ));
    };

    let mut changed = 0;

    match root.get_mut("apps") {
        None => {}
        Some(Value::Array(apps)) => {
            for (index, app) in apps.iter_mut().enumerate() {
                let app = app.as_object_mut().ok_or_else(|| {
                    SoftcenterError::Other(format!("apps[{index}] is not a JSON object"))
                })?;
                if refresh_entry(app, locator)? {
                    changed += 1;
                }
            }
        }
        Some(_) => {
            return Err(SoftcenterError::Other(
                "`apps` is not a JSON array".to_string(),
            ))
        }
    }

    if refresh_entry(root, locator)? {
        changed += 1;
    }

    if changed == 0 {
        return Ok(RefreshOutcome::Unchanged);
    }

    let payload = serde_json::to_string(&document)?;
    atomic_write_text(feed_path, &Envelope::wrap(envelope.callback, &payload))?;

    Ok(RefreshOutcome::Updated { changed })
}

/// Refresh one `tar_url`/`md5` pair. Returns whether `md5` changed.
///
/// Entries with no `tar_url` (absent, `null` or empty), or whose archive is
/// missing or unreadable, are skipped. A `tar_url` of any other non-string
/// type aborts the run.
fn refresh_entry(entry: &mut Map<String, Value>, locator: &ContentLocator) -> Result<bool> {
    let tar_url = match entry.get("tar_url") {
        None | Some(Value::Null) => return Ok(false),
        Some(Value::String(url)) if url.is_empty() => return Ok(false),
        Some(Value::String(url)) => url.clone(),
        Some(other) => {
            return Err(SoftcenterError::Other(format!(
                "tar_url is not a string: {other}"
            )))
        }
    };
    let tar_url = tar_url.as_str();

    let local = match locator.locate(tar_url) {
        Ok(local) => local,
        Err(e) => {
            debug!("Skipping {}: {}", tar_url, e);
            return Ok(false);
        }
    };

    let digest = match compute_md5(&local) {
        Ok(digest) => digest,
        Err(e) => {
            warn!("Failed to hash {}: {}", tar_url, e);
            return Ok(false);
        }
    };

    if entry.get("md5").and_then(Value::as_str) == Some(digest.as_str()) {
        return Ok(false);
    }

    info!("{} -> {}", tar_url, digest);
    entry.insert("md5".to_string(), Value::String(digest));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SoftcenterPaths;
    use std::fs;
    use tempfile::TempDir;

    // MD5 of the archive bodies written by `install`
    const ACME_MD5: &str = "9e107d9d372bb6826bd81d3542a419d6";
    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    fn install(feed: &str) -> (TempDir, SoftcenterPaths, ContentLocator) {
        let temp_dir = TempDir::new().unwrap();
        let paths = SoftcenterPaths::new(temp_dir.path());
        let file_dir = paths.file_dir();
        fs::create_dir_all(file_dir.join("tools")).unwrap();
        fs::write(
            file_dir.join("acme.tar.gz"),
            "The quick brown fox jumps over the lazy dog",
        )
        .unwrap();
        fs::write(file_dir.join("tools").join("tools.tar.gz"), "").unwrap();
        fs::write(paths.app_response(), feed).unwrap();

        let locator = ContentLocator::new(&file_dir);
        (temp_dir, paths, locator)
    }

    #[test]
    fn test_missing_feed_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let locator = ContentLocator::new(temp_dir.path());

        let outcome = refresh_checksums(&temp_dir.path().join("app_response.txt"), &locator);
        assert!(matches!(outcome, RefreshOutcome::Missing));
        assert!(!temp_dir.path().join("app_response.txt").exists());
    }

    #[test]
    fn test_replaces_stale_digest() {
        let (_temp, paths, locator) =
            install(r#"{"apps":[{"tar_url":"acme.tar.gz","md5":"stale"}]}"#);

        let outcome = refresh_checksums(&paths.app_response(), &locator);
        assert!(matches!(outcome, RefreshOutcome::Updated { changed: 1 }));

        assert_eq!(
            fs::read_to_string(paths.app_response()).unwrap(),
            format!(r#"{{"apps":[{{"tar_url":"acme.tar.gz","md5":"{ACME_MD5}"}}]}}"#)
        );
    }

    #[test]
    fn test_preserves_envelope_and_unrelated_fields() {
        let feed = format!(
            concat!(
                r#"softcenterCallback({{"version":"1.5.9","apps":["#,
                r#"{{"name":"acme","title":"应用","tar_url":"acme/acme.tar.gz","md5":"stale","size":42}},"#,
                r#"{{"name":"tools","tar_url":"tools/tools.tar.gz","md5":"{}"}},"#,
                r#"{{"name":"ghost","tar_url":"ghost.tar.gz","md5":"keep"}}"#,
                r#"],"tar_url":"acme.tar.gz","flag":true}});"#
            ),
            EMPTY_MD5
        );
        let (_temp, paths, locator) = install(&feed);

        let outcome = refresh_checksums(&paths.app_response(), &locator);
        assert!(matches!(outcome, RefreshOutcome::Updated { changed: 2 }));

        let expected = format!(
            concat!(
                r#"softcenterCallback({{"version":"1.5.9","apps":["#,
                r#"{{"name":"acme","title":"应用","tar_url":"acme/acme.tar.gz","md5":"{acme}","size":42}},"#,
                r#"{{"name":"tools","tar_url":"tools/tools.tar.gz","md5":"{empty}"}},"#,
                r#"{{"name":"ghost","tar_url":"ghost.tar.gz","md5":"keep"}}"#,
                r#"],"tar_url":"acme.tar.gz","flag":true,"md5":"{acme}"}});"#
            ),
            acme = ACME_MD5,
            empty = EMPTY_MD5
        );
        assert_eq!(fs::read_to_string(paths.app_response()).unwrap(), expected);
    }

    #[test]
    fn test_second_run_does_not_rewrite() {
        let (_temp, paths, locator) =
            install(r#"cb({"apps":[{"tar_url":"acme.tar.gz","md5":"stale"}]});"#);

        let first = refresh_checksums(&paths.app_response(), &locator);
        assert!(matches!(first, RefreshOutcome::Updated { changed: 1 }));

        let before = fs::metadata(paths.app_response()).unwrap().modified().unwrap();
        let contents = fs::read_to_string(paths.app_response()).unwrap();

        let second = refresh_checksums(&paths.app_response(), &locator);
        assert!(matches!(second, RefreshOutcome::Unchanged));

        let after = fs::metadata(paths.app_response()).unwrap().modified().unwrap();
        assert_eq!(before, after);
        assert_eq!(fs::read_to_string(paths.app_response()).unwrap(), contents);
    }

    #[test]
    fn test_unparseable_feed_is_left_alone() {
        let feed = "cb({\"apps\":[{\"tar_url\":\"acme.tar.gz\",);";
        let (_temp, paths, locator) = install(feed);

        let outcome = refresh_checksums(&paths.app_response(), &locator);
        assert!(matches!(outcome, RefreshOutcome::Failed(SoftcenterError::Json { .. })));
        assert_eq!(fs::read_to_string(paths.app_response()).unwrap(), feed);
    }

    #[test]
    fn test_non_object_document_fails() {
        let (_temp, paths, locator) = install("[1,2,3]");

        let outcome = refresh_checksums(&paths.app_response(), &locator);
        assert!(matches!(outcome, RefreshOutcome::Failed(SoftcenterError::Other(_))));
    }

    #[test]
    fn test_large_numbers_survive_rewrite() {
        let (_temp, paths, locator) = install(concat!(
            r#"{"size":123456789012345678901234567890,"ratio":1.50,"#,
            r#""apps":[{"tar_url":"acme.tar.gz","md5":"stale","build":-98765432109876543210}]}"#
        ));

        let outcome = refresh_checksums(&paths.app_response(), &locator);
        assert!(matches!(outcome, RefreshOutcome::Updated { changed: 1 }));

        assert_eq!(
            fs::read_to_string(paths.app_response()).unwrap(),
            format!(
                concat!(
                    r#"{{"size":123456789012345678901234567890,"ratio":1.50,"#,
                    r#""apps":[{{"tar_url":"acme.tar.gz","md5":"{}","build":-98765432109876543210}}]}}"#
                ),
                ACME_MD5
            )
        );
    }

    #[test]
    fn test_malformed_apps_abort_the_run() {
        for feed in [
            r#"{"apps":[{"tar_url":"acme.tar.gz","md5":"stale"},"acme"]}"#,
            r#"{"apps":[{"tar_url":"acme.tar.gz","md5":"stale"},{"tar_url":7}]}"#,
            r#"{"apps":{"tar_url":"acme.tar.gz"},"tar_url":"acme.tar.gz"}"#,
            r#"{"apps":null,"tar_url":"acme.tar.gz"}"#,
        ] {
            let (_temp, paths, locator) = install(feed);

            let outcome = refresh_checksums(&paths.app_response(), &locator);
            assert!(
                matches!(outcome, RefreshOutcome::Failed(SoftcenterError::Other(_))),
                "feed {feed}"
            );
            assert_eq!(fs::read_to_string(paths.app_response()).unwrap(), feed);
        }
    }

    #[test]
    fn test_unsafe_references_are_skipped() {
        let feed = r#"{"apps":[{"tar_url":"../acme.tar.gz","md5":"x"},{"tar_url":"","md5":"y"},{"tar_url":null},{"md5":"z"}]}"#;
        let (_temp, paths, locator) = install(feed);

        let outcome = refresh_checksums(&paths.app_response(), &locator);
        assert!(matches!(outcome, RefreshOutcome::Unchanged));
        assert_eq!(fs::read_to_string(paths.app_response()).unwrap(), feed);
    }
}
