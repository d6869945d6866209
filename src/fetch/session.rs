//! Authenticated archive sessions.
//!
//! Some archive hosts show a restricted header set to anonymous visitors.
//! A session logs in once with a form post, then posts a preference toggle
//! so subsequent pages carry the full header set. The session is read-only
//! once established; the engine never mutates it mid-crawl.

use reqwest::blocking::Client;
use tracing::info;

use crate::config::CrawlConfig;
use crate::error::{Result, ScrapeError};

/// An authenticated session against one archive host.
pub struct Session {
    client: Client,
}

impl Session {
    /// Log in by posting credentials to the archive's login endpoint.
    ///
    /// The cookie jar on the returned session carries the authentication
    /// cookie for every later fetch.
    pub fn login(
        login_url: &str,
        username: &str,
        password: &str,
        config: &CrawlConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .cookie_store(true)
            .build()
            .map_err(ScrapeError::Client)?;

        let response = client
            .post(login_url)
            .form(&[("username", username), ("password", password)])
            .send()
            .map_err(|source| ScrapeError::Http {
                url: login_url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Login {
                url: login_url.to_string(),
                status: status.as_u16(),
            });
        }

        info!(url = login_url, "Logged in to archive host");
        Ok(Self { client })
    }

    /// Ask the host to render full headers instead of the restricted set.
    ///
    /// This is a per-account display preference on the server side, posted
    /// once after login.
    pub fn request_full_headers(&self, preference_url: &str) -> Result<()> {
        let response = self
            .client
            .post(preference_url)
            .form(&[("fullheaders", "on")])
            .send()
            .map_err(|source| ScrapeError::Http {
                url: preference_url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: preference_url.to_string(),
                status: status.as_u16(),
            });
        }

        info!(url = preference_url, "Requested full header display");
        Ok(())
    }

    /// Hand the underlying client (and its cookie jar) to a fetcher.
    pub(crate) fn into_client(self) -> Client {
        self.client
    }
}
