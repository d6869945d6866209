//! Fetching archive pages and files.
//!
//! The engine never talks to the network directly; it goes through the
//! [`Fetcher`] trait so tests (and embedders with their own transport) can
//! supply a substitute. [`HttpFetcher`] is the blocking-reqwest
//! implementation used for real crawls.
//!
//! Error policy: a fetch failure here is always an `Err`. Whether that is
//! fatal depends on the caller — index and period fetches propagate it,
//! single-message fetches convert it to the sentinel record and continue
//! (see `scrape::list`).

use reqwest::blocking::Client;

use crate::config::CrawlConfig;
use crate::error::{Result, ScrapeError};

use super::session::Session;

/// HTTP-capable client supplied to the engine.
pub trait Fetcher {
    /// Fetch a URL and decode the response body as text.
    fn fetch_text(&self, url: &str) -> Result<String>;

    /// Fetch a URL and return the raw response bytes (for gzipped digest
    /// files, where transparent text decoding would corrupt the payload).
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher backed by reqwest.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher with the configured user agent and timeout.
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .cookie_store(true)
            .build()
            .map_err(ScrapeError::Client)?;
        Ok(Self { client })
    }

    /// Reuse an authenticated session's client, carrying its cookies.
    pub fn with_session(session: Session) -> Self {
        Self {
            client: session.into_client(),
        }
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        let response = self.client.get(url).send().map_err(|source| {
            ScrapeError::Http {
                url: url.to_string(),
                source,
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch_bytes(url)?;
        Ok(decode_text(&bytes))
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url)?;
        let bytes = response.bytes().map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }
}

/// Decode fetched bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every
/// byte). Legacy archives predate consistent charset declarations.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &bytes[3..]
    } else {
        bytes
    };

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
