//! Canonical message record and source locators.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Sentinel body value carried by a record whose unit fetch failed.
///
/// Failed fetches produce a record with this body and empty headers rather
/// than nothing at all, so callers can observe exactly which units were
/// attempted. The list aggregator skips these records when assembling a
/// [`MailingList`](crate::model::MailingList).
pub const FETCH_FAILURE: &str = "RequestException";

/// Header mapping: lower-cased field name → value. Unique keys,
/// insertion order irrelevant.
pub type Headers = HashMap<String, String>;

/// Opaque locator for where a message (or archive page) came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceRef {
    /// A fetchable URL. A `#<marker>` fragment identifies an in-file
    /// message position inside a downloaded digest.
    Url(String),
    /// A local file, optionally with the line offset of the message's
    /// `Message-ID:` marker inside it.
    File {
        path: PathBuf,
        offset: Option<usize>,
    },
}

impl SourceRef {
    /// Attach an in-file message position to this reference.
    ///
    /// Used by the digest format, where one period file contains many
    /// messages distinguished only by their marker line offset.
    pub fn at_offset(&self, offset: usize) -> SourceRef {
        match self {
            SourceRef::Url(url) => SourceRef::Url(format!("{url}#{offset}")),
            SourceRef::File { path, .. } => SourceRef::File {
                path: path.clone(),
                offset: Some(offset),
            },
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Url(url) => write!(f, "{url}"),
            SourceRef::File {
                path,
                offset: Some(off),
            } => write!(f, "{}#{off}", path.display()),
            SourceRef::File { path, offset: None } => write!(f, "{}", path.display()),
        }
    }
}

/// Canonical in-memory representation of one discussion message.
///
/// Created once per fetch and never mutated in place; sinks copy and
/// reshape, they do not edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Stable archival identifier, unique within a list.
    ///
    /// Derived from a `Message-ID`-like header when one was recovered,
    /// otherwise synthesized deterministically from the source reference
    /// (stable across re-fetches of the same unit).
    pub archival_id: String,

    /// Lower-cased header fields recovered by the format lexer.
    /// Empty when the lexer could not parse the unit, or when the fetch
    /// failed, or when only the body was requested.
    pub headers: Headers,

    /// Message body. `None` when only headers were requested;
    /// [`FETCH_FAILURE`] when the unit fetch failed.
    pub body: Option<String>,

    /// Where this record was scraped from.
    pub source_ref: SourceRef,

    /// Attachment hrefs recovered from the legacy-tabular format's
    /// `Parts/Attachments` row. Empty for the other formats.
    pub attachments: Vec<String>,
}

impl MessageRecord {
    /// Build the record for a unit whose fetch failed: sentinel body,
    /// empty headers, identifier synthesized from the source reference.
    pub fn failed(source_ref: SourceRef) -> Self {
        Self {
            archival_id: synthesize_id(&source_ref.to_string()),
            headers: Headers::new(),
            body: Some(FETCH_FAILURE.to_string()),
            source_ref,
            attachments: Vec::new(),
        }
    }

    /// Whether this record carries the fetch-failure sentinel.
    pub fn is_fetch_failure(&self) -> bool {
        self.body.as_deref() == Some(FETCH_FAILURE)
    }

    /// Look up a header by (case-insensitive) field name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// Synthesize a stable archival identifier from a source-reference string.
///
/// Every run of non-alphanumeric characters collapses to a single `-`, so
/// re-fetching the same unit always yields the same identifier.
pub fn synthesize_id(source: &str) -> String {
    let mut id = String::with_capacity(source.len());
    let mut last_dash = true;
    for ch in source.chars() {
        if ch.is_ascii_alphanumeric() {
            id.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            id.push('-');
            last_dash = true;
        }
    }
    // Drop scheme noise and trailing separators
    let trimmed = id
        .trim_start_matches("https-")
        .trim_start_matches("http-")
        .trim_matches('-');
    trimmed.to_string()
}
