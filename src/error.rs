//! Centralized error types for listscrape.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the listscrape library.
///
/// Only archive-level operations surface these: a single bad message never
/// raises out of a bulk crawl (see `scrape::list`). The variants here
/// correspond to failures that leave nothing downstream to scrape.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// HTTP transport failure (timeout, DNS, connection reset).
    #[error("HTTP error fetching '{url}': {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// The server answered with a non-success status code.
    #[error("Unexpected status {status} fetching '{url}'")]
    Status { url: String, status: u16 },

    /// The HTTP client itself could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    /// A source URL could not be parsed or joined.
    #[error("Invalid source URL '{url}': {source}")]
    Url {
        url: String,
        source: url::ParseError,
    },

    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file-based archive source does not exist.
    #[error("Archive source not found: {0}")]
    SourceNotFound(PathBuf),

    /// A glob pattern for file-based discovery was malformed.
    #[error("Invalid file pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// Login to an archive host was rejected.
    #[error("Login to '{url}' rejected with status {status}")]
    Login { url: String, status: u16 },

    /// A mailbox file could not be written or read back.
    #[error("Mailbox error for '{path}': {reason}")]
    Mbox { path: PathBuf, reason: String },
}

/// Convenience alias for `Result<T, ScrapeError>`.
pub type Result<T> = std::result::Result<T, ScrapeError>;

impl ScrapeError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `ScrapeError`
/// when no path context is available (rare — prefer `ScrapeError::io`).
impl From<std::io::Error> for ScrapeError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
