//! JSONP envelope handling.
//!
//! Feed files are stored either as bare JSON or as `callback(JSON);`. This
//! module detects and strips that wrapper for the checksum refresh, and
//! rewrites it for responses that ask for a different callback.

use crate::error::{Result, SoftcenterError};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Leading `identifier(` of an enveloped document.
static ENVELOPE_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9A-Za-z_.\[\]$]+)\s*\(").expect("envelope head regex must compile")
});

/// Callback names accepted from query strings.
static CALLBACK_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Za-z_.\[\]$]+$").expect("callback name regex must compile")
});

/// A feed document split into its callback name and JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<'a> {
    /// Callback name, when the document was wrapped.
    pub callback: Option<&'a str>,
    /// The JSON text inside the wrapper (or the whole document).
    pub payload: &'a str,
}

impl<'a> Envelope<'a> {
    /// Split a document into callback and payload.
    ///
    /// The payload starts after the first `(` and loses surrounding
    /// whitespace plus one trailing `);`.
    pub fn parse(text: &'a str) -> Self {
        let Some(captures) = ENVELOPE_HEAD.captures(text) else {
            return Self {
                callback: None,
                payload: text,
            };
        };

        let callback = captures.get(1).map(|m| m.as_str());
        let open = text.find('(').map(|i| i + 1).unwrap_or(0);
        let mut payload = text[open..].trim();
        if let Some(stripped) = payload.strip_suffix(");") {
            payload = stripped.trim_end();
        }

        Self { callback, payload }
    }

    /// Serialize a payload back into the envelope form it came from.
    pub fn wrap(callback: Option<&str>, payload: &str) -> String {
        match callback {
            Some(name) => format!("{}({});", name, payload),
            None => payload.to_string(),
        }
    }
}

/// Normalize and validate a `callback` query value.
///
/// Surrounding whitespace is ignored and an empty value means no callback.
pub fn parse_callback(raw: Option<&str>) -> Result<Option<&str>> {
    let Some(name) = raw.map(str::trim).filter(|name| !name.is_empty()) else {
        return Ok(None);
    };

    if CALLBACK_NAME.is_match(name) {
        Ok(Some(name))
    } else {
        Err(SoftcenterError::InvalidCallback(name.to_string()))
    }
}

/// Shape feed content for a response.
///
/// Enveloped content keeps its payload untouched: only the head is swapped
/// when a callback is given, and a missing `);` is appended. Bare JSON is
/// wrapped only when a callback is given.
pub fn render_feed(content: &str, callback: Option<&str>) -> String {
    if let Some(head) = ENVELOPE_HEAD.find(content) {
        let rewritten: Cow<'_, str> = match callback {
            Some(name) => Cow::Owned(format!("{}({}", name, &content[head.end()..])),
            None => Cow::Borrowed(content),
        };

        let trimmed = rewritten.trim_end();
        if trimmed.ends_with(");") {
            return rewritten.into_owned();
        }
        return format!("{});", trimmed);
    }

    Envelope::wrap(callback, content)
}
