//! List aggregation: periods → units → fetch → lex → records.
//!
//! One unit at a time, with the configured politeness pauses between
//! fetches. The fetch-failure policy is asymmetric: index and period
//! fetches propagate their error, because without them nothing downstream
//! can proceed; a single message fetch failure becomes a sentinel record
//! that is skipped, and the crawl continues after a backoff sleep.

use tracing::{info, warn};

use crate::error::Result;
use crate::fetch::backoff::BackoffPolicy;
use crate::fetch::client::Fetcher;
use crate::lexer::{digest, ArchiveFormat, DigestLexer, RawContent};
use crate::model::{ListSource, MailingList, MessageRecord, SourceRef};
use crate::scrape::assemble::assemble;
use crate::scrape::periods::{digest_lines, discover_periods, list_units};
use crate::select::{FieldScope, Period, Selection};

/// Drives one full list ingestion.
pub struct ListScraper<'a> {
    fetcher: &'a dyn Fetcher,
    backoff: &'a dyn BackoffPolicy,
}

impl<'a> ListScraper<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, backoff: &'a dyn BackoffPolicy) -> Self {
        Self { fetcher, backoff }
    }

    /// Scrape one mailing list, honoring the selection.
    ///
    /// Returns an error only when the list's index (or a period page /
    /// digest file) cannot be established. Individual bad messages are
    /// skipped, never fatal.
    pub fn scrape(
        &self,
        name: &str,
        source: &ListSource,
        format: ArchiveFormat,
        selection: &Selection,
    ) -> Result<MailingList> {
        let discovered = discover_periods(self.fetcher, source, format)?;
        let periods = selection.filter(&discovered);
        info!(
            list = name,
            source = %source.describe(),
            discovered = discovered.len(),
            selected = periods.len(),
            "Period discovery complete"
        );

        let mut messages = Vec::new();
        match format {
            ArchiveFormat::Digest => {
                for period in &periods {
                    self.scrape_digest_period(period, selection.fields, &mut messages)?;
                }
            }
            ArchiveFormat::Tabular | ArchiveFormat::Hypertext => {
                let lexer = format.lexer();
                for period in &periods {
                    let units = list_units(self.fetcher, period, name)?;
                    for unit in units {
                        self.scrape_unit(&*lexer, unit, selection.fields, &mut messages);
                    }
                }
            }
        }

        info!(list = name, messages = messages.len(), "List scrape complete");
        Ok(MailingList {
            name: name.to_string(),
            source: source.clone(),
            messages,
        })
    }

    /// Fetch and lex one web-format message unit.
    fn scrape_unit(
        &self,
        lexer: &dyn crate::lexer::FormatLexer,
        unit: SourceRef,
        scope: FieldScope,
        messages: &mut Vec<MessageRecord>,
    ) {
        let SourceRef::Url(url) = &unit else {
            return;
        };
        match self.fetcher.fetch_text(url) {
            Ok(html) => {
                let raw = RawContent::Markup(&html);
                messages.push(assemble(lexer, &raw, unit.clone(), scope));
                std::thread::sleep(self.backoff.after_unit());
            }
            Err(e) => {
                // The failed unit yields a sentinel record, which is
                // skipped from the assembled list rather than appended.
                let sentinel = MessageRecord::failed(unit);
                warn!(
                    unit = %sentinel.source_ref,
                    error = %e,
                    "Unit fetch failed; skipping after backoff"
                );
                std::thread::sleep(self.backoff.after_failure());
            }
        }
    }

    /// Lex every message of one digest file.
    ///
    /// A digest period is a single download; its units are in-file marker
    /// offsets, so no per-unit pause applies.
    fn scrape_digest_period(
        &self,
        period: &Period,
        scope: FieldScope,
        messages: &mut Vec<MessageRecord>,
    ) -> Result<()> {
        let lines = digest_lines(self.fetcher, &period.source)?;
        let markers = digest::message_markers(&lines);
        info!(period = %period.label, units = markers.len(), "Scanned digest");

        for marker in markers {
            let raw = RawContent::Lines {
                lines: &lines,
                marker,
            };
            let source_ref = period.source.at_offset(marker);
            messages.push(assemble(&DigestLexer, &raw, source_ref, scope));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::fetch::backoff::FixedBackoff;
    use std::collections::HashMap;

    /// In-memory fetcher: URL → canned page, anything else errors.
    struct MapFetcher {
        pages: HashMap<String, String>,
    }

    impl MapFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, p)| (u.to_string(), p.to_string()))
                    .collect(),
            }
        }
    }

    impl Fetcher for MapFetcher {
        fn fetch_text(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }

        fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
            self.fetch_text(url).map(String::into_bytes)
        }
    }

    const INDEX: &str = r#"
        <a href="period-1">April 2021, week 1</a>
        <a href="period-2">April 2021, week 2</a>
    "#;

    fn message_page(id: u32) -> String {
        format!(
            r##"<table>
            <tr><td><b>From:</b></td><td>ada@example.org</td></tr>
            <tr><td><b>Subject:</b></td><td><a href="#">msg {id}</a></td></tr>
            </table><pre>body {id}</pre>"##
        )
    }

    #[test]
    fn test_scrape_tabular_list_in_order() {
        let fetcher = MapFetcher::new(&[
            ("http://h/dev/", INDEX),
            (
                "http://h/dev/period-1",
                r#"<a href="dev-msg-1">m1</a><a href="other-list">x</a>"#,
            ),
            ("http://h/dev/period-2", r#"<a href="dev-msg-2">m2</a>"#),
            ("http://h/dev/dev-msg-1", &message_page(1)),
            ("http://h/dev/dev-msg-2", &message_page(2)),
        ]);
        let backoff = FixedBackoff::none();
        let scraper = ListScraper::new(&fetcher, &backoff);
        let list = scraper
            .scrape(
                "dev",
                &ListSource::Url("http://h/dev/".into()),
                ArchiveFormat::Tabular,
                &Selection::default(),
            )
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.messages[0].header("subject"), Some("msg 1"));
        assert_eq!(list.messages[1].body.as_deref(), Some("body 2"));
    }

    #[test]
    fn test_unit_failure_skipped_crawl_continues() {
        // period page links two messages but only the second resolves
        let fetcher = MapFetcher::new(&[
            ("http://h/dev/", r#"<a href="p1">April 2021</a>"#),
            (
                "http://h/dev/p1",
                r#"<a href="dev-broken">b</a><a href="dev-ok">ok</a>"#,
            ),
            ("http://h/dev/dev-ok", &message_page(7)),
        ]);
        let backoff = FixedBackoff::none();
        let scraper = ListScraper::new(&fetcher, &backoff);
        let list = scraper
            .scrape(
                "dev",
                &ListSource::Url("http://h/dev/".into()),
                ArchiveFormat::Tabular,
                &Selection::default(),
            )
            .unwrap();
        assert_eq!(list.len(), 1, "failed unit must be excluded");
        assert!(list.messages.iter().all(|m| !m.is_fetch_failure()));
    }

    #[test]
    fn test_index_failure_is_fatal() {
        let fetcher = MapFetcher::new(&[]);
        let backoff = FixedBackoff::none();
        let scraper = ListScraper::new(&fetcher, &backoff);
        let result = scraper.scrape(
            "dev",
            &ListSource::Url("http://h/missing/".into()),
            ArchiveFormat::Hypertext,
            &Selection::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_selection_narrows_periods() {
        let fetcher = MapFetcher::new(&[
            (
                "http://h/dev/",
                r#"<a href="p-2020">January 2020</a><a href="p-2021">January 2021</a>"#,
            ),
            ("http://h/dev/p-2020", r#"<a href="dev-old">m</a>"#),
            ("http://h/dev/dev-old", &message_page(1)),
        ]);
        let backoff = FixedBackoff::none();
        let scraper = ListScraper::new(&fetcher, &backoff);
        // 2021 page is never fetched: MapFetcher would 404 on it
        let list = scraper
            .scrape(
                "dev",
                &ListSource::Url("http://h/dev/".into()),
                ArchiveFormat::Tabular,
                &Selection::year(2020),
            )
            .unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_empty_selection_result_is_empty_list() {
        let fetcher = MapFetcher::new(&[("http://h/dev/", INDEX)]);
        let backoff = FixedBackoff::none();
        let scraper = ListScraper::new(&fetcher, &backoff);
        let list = scraper
            .scrape(
                "dev",
                &ListSource::Url("http://h/dev/".into()),
                ArchiveFormat::Tabular,
                &Selection::year(1999),
            )
            .unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_scrape_digest_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2021-April.txt");
        std::fs::write(
            &path,
            "\
From: ada@example.org
Date: Fri, 2 Apr 2021 10:15:00 +0000
Message-ID: <1@x>

first body

From: grace@example.org
Date: Sat, 3 Apr 2021 09:00:00 +0000
Message-ID: <2@x>

second body
",
        )
        .unwrap();

        let fetcher = MapFetcher::new(&[]);
        let backoff = FixedBackoff::none();
        let scraper = ListScraper::new(&fetcher, &backoff);
        let list = scraper
            .scrape(
                "dev",
                &ListSource::Files(vec![path]),
                ArchiveFormat::Digest,
                &Selection::default(),
            )
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.messages[0].archival_id, "1@x");
        assert_eq!(list.messages[1].body.as_deref(), Some("second body"));
    }
}
