//! Mailing-list and domain aggregates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::message::MessageRecord;

/// Where a mailing list's archive lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListSource {
    /// Root index URL of a web archive.
    Url(String),
    /// One or more local digest files.
    Files(Vec<PathBuf>),
}

impl ListSource {
    /// Human-readable description for log lines.
    pub fn describe(&self) -> String {
        match self {
            ListSource::Url(url) => url.clone(),
            ListSource::Files(paths) => paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// One mailing list, built by a single ingestion run.
///
/// Messages are stored in scrape order (period order × unit order within
/// period), which is not necessarily chronological. Immutable once built;
/// sinks copy and reshape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailingList {
    /// List name as embedded in the archive (e.g. `"public-dev"`).
    pub name: String,
    /// Where the list was scraped from.
    pub source: ListSource,
    /// Recovered records, fetch-failure sentinels already skipped.
    pub messages: Vec<MessageRecord>,
}

impl MailingList {
    /// Number of recovered messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the run recovered nothing.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Archival identifiers in scrape order.
    pub fn archival_ids(&self) -> Vec<&str> {
        self.messages
            .iter()
            .map(|m| m.archival_id.as_str())
            .collect()
    }
}

/// A whole archive host: many mailing lists under one root.
///
/// In instant-save mode only `saved` is populated — each list is flushed to
/// a mailbox file and discarded, so memory stays bounded on large crawls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDomain {
    /// Domain name (e.g. the archive host).
    pub name: String,
    /// Root index the lists were discovered from.
    pub root_source: String,
    /// Fully materialized lists (memory mode only).
    pub lists: Vec<MailingList>,
    /// Names of lists already flushed to disk (instant-save mode only).
    pub saved: Vec<String>,
}

impl ListDomain {
    /// A new, empty domain.
    pub fn new(name: impl Into<String>, root_source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_source: root_source.into(),
            lists: Vec::new(),
            saved: Vec::new(),
        }
    }

    /// Number of lists this crawl produced, resident or flushed.
    pub fn list_count(&self) -> usize {
        self.lists.len() + self.saved.len()
    }
}
