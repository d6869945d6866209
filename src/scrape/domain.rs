//! Domain aggregation: crawl every list under one archive root.

use std::collections::HashSet;
use std::path::PathBuf;

use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::fetch::backoff::BackoffPolicy;
use crate::fetch::client::Fetcher;
use crate::lexer::ArchiveFormat;
use crate::model::{ListDomain, ListSource};
use crate::scrape::list::ListScraper;
use crate::select::Selection;
use crate::sink::mbox::write_mbox;

/// What to do with each list once scraped.
#[derive(Debug, Clone)]
pub enum SaveMode {
    /// Keep every list resident for a single final export.
    Memory,
    /// Flush each list to `<dir>/<list>.mbox` and drop it — the default
    /// and recommended mode for large crawls, since it bounds memory to
    /// one list at a time. Trades away the ability to do one combined
    /// export afterwards.
    Instant(PathBuf),
}

/// Drives a whole-archive crawl.
pub struct DomainScraper<'a> {
    fetcher: &'a dyn Fetcher,
    backoff: &'a dyn BackoffPolicy,
}

impl<'a> DomainScraper<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, backoff: &'a dyn BackoffPolicy) -> Self {
        Self { fetcher, backoff }
    }

    /// Discover the lists under `root_url` and scrape each in turn.
    ///
    /// Period discovery runs once per list. An unreachable root index is
    /// fatal; so is a list whose own index cannot be fetched mid-crawl
    /// (lists already flushed in instant-save mode stay valid on disk).
    pub fn scrape(
        &self,
        name: &str,
        root_url: &str,
        format: ArchiveFormat,
        selection: &Selection,
        mode: SaveMode,
    ) -> Result<ListDomain> {
        let lists = discover_lists(self.fetcher, root_url)?;
        info!(domain = name, lists = lists.len(), "Discovered mailing lists");

        let scraper = ListScraper::new(self.fetcher, self.backoff);
        let mut domain = ListDomain::new(name, root_url);

        for (list_name, list_url) in lists {
            let list = scraper.scrape(
                &list_name,
                &ListSource::Url(list_url),
                format,
                selection,
            )?;
            match &mode {
                SaveMode::Instant(dir) => {
                    std::fs::create_dir_all(dir).map_err(|e| ScrapeError::io(dir, e))?;
                    let path = dir.join(format!("{list_name}.mbox"));
                    let written = write_mbox(&list, &path)?;
                    info!(
                        list = %list_name,
                        messages = written,
                        path = %path.display(),
                        "Flushed list to mailbox"
                    );
                    domain.saved.push(list_name);
                }
                SaveMode::Memory => domain.lists.push(list),
            }
        }
        Ok(domain)
    }
}

/// Discover `(name, url)` pairs for the lists linked from the root index.
///
/// A list link is an anchor resolving to a child of the root URL; its name
/// is the last path segment. Navigation anchors pointing back at the root
/// itself, or off-host, are ignored.
fn discover_lists(fetcher: &dyn Fetcher, root_url: &str) -> Result<Vec<(String, String)>> {
    let html = fetcher.fetch_text(root_url)?;
    let root = Url::parse(root_url).map_err(|source| ScrapeError::Url {
        url: root_url.to_string(),
        source,
    })?;

    let doc = Html::parse_document(&html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Ok(Vec::new());
    };

    // Child test keeps the trailing slash, so a sibling path that merely
    // shares the root as a string prefix (`/archives-attic/` under
    // `/archives/`) is not mistaken for a list.
    let root_prefix = if root_url.ends_with('/') {
        root_url.to_string()
    } else {
        format!("{root_url}/")
    };

    let mut seen = HashSet::new();
    let mut lists = Vec::new();
    for anchor in doc.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = root.join(href) else {
            continue;
        };
        if resolved.host_str() != root.host_str() {
            continue;
        }
        let resolved_str = resolved.to_string();
        if !resolved_str.starts_with(&root_prefix)
            || resolved_str.trim_end_matches('/') == root_url.trim_end_matches('/')
        {
            continue;
        }
        let Some(list_name) = last_path_segment(&resolved) else {
            continue;
        };
        if seen.insert(resolved_str.clone()) {
            lists.push((list_name, resolved_str));
        }
    }
    Ok(lists)
}

fn last_path_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}
