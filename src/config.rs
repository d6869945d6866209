//! Crawl configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$LISTSCRAPE_CONFIG` (environment variable)
//! 2. Built-in defaults
//!
//! Credential handling and richer config discovery are left to the
//! embedding application; this covers only what the engine itself needs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::fetch::backoff::FixedBackoff;

/// Top-level crawl configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Politeness pause between successful unit fetches, in seconds.
    pub unit_pause_secs: u64,
    /// Backoff after a recoverable unit-fetch failure, in seconds.
    pub failure_backoff_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("listscrape/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 60,
            unit_pause_secs: 1,
            failure_backoff_secs: 30,
        }
    }
}

impl CrawlConfig {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The fixed backoff policy these settings describe.
    pub fn backoff(&self) -> FixedBackoff {
        FixedBackoff {
            unit_pause: Duration::from_secs(self.unit_pause_secs),
            failure_delay: Duration::from_secs(self.failure_backoff_secs),
        }
    }
}

/// Load configuration from `$LISTSCRAPE_CONFIG`, if set.
///
/// Returns the default configuration if the variable is unset, the file is
/// missing, or it fails to parse.
pub fn load_config() -> CrawlConfig {
    if let Ok(path) = std::env::var("LISTSCRAPE_CONFIG") {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<CrawlConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "Loaded config");
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to parse config, using defaults");
                }
            },
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Failed to read config file, using defaults");
            }
        }
    }
    CrawlConfig::default()
}
