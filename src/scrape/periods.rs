//! Period discovery and unit listing.
//!
//! Period discovery issues one fetch against a list's index and turns it
//! into an ordered `(label, source_ref)` sequence. For the web formats the
//! index links period pages; for the digest format it links downloadable
//! monthly files (or the "index" is simply a set of local files). Index
//! failures here are fatal: without the index nothing downstream can
//! proceed.

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::fetch::client::{decode_text, Fetcher};
use crate::lexer::ArchiveFormat;
use crate::model::{ListSource, SourceRef};
use crate::select::{label_year, Period};

/// Discover the ordered period sequence for a list.
pub fn discover_periods(
    fetcher: &dyn Fetcher,
    source: &ListSource,
    format: ArchiveFormat,
) -> Result<Vec<Period>> {
    match source {
        ListSource::Files(paths) => Ok(paths
            .iter()
            .map(|path| {
                Period::new(
                    period_label_from_filename(path),
                    SourceRef::File {
                        path: path.clone(),
                        offset: None,
                    },
                )
            })
            .collect()),
        ListSource::Url(index_url) => {
            let html = fetcher.fetch_text(index_url)?;
            let periods = match format {
                ArchiveFormat::Tabular | ArchiveFormat::Hypertext => {
                    web_periods(&html, index_url)?
                }
                ArchiveFormat::Digest => digest_periods(&html, index_url)?,
            };
            debug!(index = index_url, count = periods.len(), "Discovered periods");
            Ok(periods)
        }
    }
}

/// Periods on a web-format index: anchors whose text carries a year.
fn web_periods(html: &str, index_url: &str) -> Result<Vec<Period>> {
    let mut periods = Vec::new();
    for (href, text) in anchors(html) {
        let label = text.trim();
        if label.is_empty() || label_year(label).is_none() {
            continue;
        }
        let resolved = resolve(index_url, &href)?;
        periods.push(Period::new(label, SourceRef::Url(resolved)));
    }
    Ok(periods)
}

/// Periods on a digest index: anchors pointing at monthly text files.
fn digest_periods(html: &str, index_url: &str) -> Result<Vec<Period>> {
    let mut periods = Vec::new();
    for (href, _) in anchors(html) {
        if !is_digest_file(&href) {
            continue;
        }
        let resolved = resolve(index_url, &href)?;
        let filename = href.rsplit('/').next().unwrap_or(&href);
        periods.push(Period::new(
            period_label_from_stem(file_stem(filename)),
            SourceRef::Url(resolved),
        ));
    }
    Ok(periods)
}

/// Discover the individual message units of one web-format period page.
///
/// A unit link is any anchor whose href embeds the requested list name —
/// the substring match the archives themselves use to namespace message
/// pages. Duplicate hrefs (navigation repeats the first link) collapse to
/// one, preserving first-seen order.
pub fn list_units(
    fetcher: &dyn Fetcher,
    period: &Period,
    list_name: &str,
) -> Result<Vec<SourceRef>> {
    let SourceRef::Url(period_url) = &period.source else {
        return Ok(Vec::new());
    };
    let html = fetcher.fetch_text(period_url)?;

    let mut seen = HashSet::new();
    let mut units = Vec::new();
    for (href, _) in anchors(&html) {
        if !href.contains(list_name) {
            continue;
        }
        let resolved = resolve(period_url, &href)?;
        if seen.insert(resolved.clone()) {
            units.push(SourceRef::Url(resolved));
        }
    }
    debug!(period = %period.label, units = units.len(), "Listed units");
    Ok(units)
}

/// Load a digest period as a line array, transparently gunzipping.
///
/// Digest "units" are not separate fetches: the period file is read once
/// and message boundaries are found in memory.
pub fn digest_lines(fetcher: &dyn Fetcher, source: &SourceRef) -> Result<Vec<String>> {
    let bytes = match source {
        SourceRef::Url(url) => fetcher.fetch_bytes(url)?,
        SourceRef::File { path, .. } => {
            if !path.exists() {
                return Err(ScrapeError::SourceNotFound(path.clone()));
            }
            std::fs::read(path).map_err(|e| ScrapeError::io(path, e))?
        }
    };
    let text = if bytes.starts_with(&[0x1f, 0x8b]) {
        let mut decoder = flate2::read::GzDecoder::new(bytes.as_slice());
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| ScrapeError::io(PathBuf::from(source.to_string()), e))?;
        decode_text(&decompressed)
    } else {
        decode_text(&bytes)
    };
    Ok(text.lines().map(str::to_string).collect())
}

/// Glob-style listing of local digest files, sorted by path.
pub fn list_digest_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|e| ScrapeError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => warn!(pattern = pattern, error = %e, "Skipping unreadable glob entry"),
        }
    }
    paths.sort();
    Ok(paths)
}

/// All `(href, text)` anchor pairs in document order.
fn anchors(html: &str) -> Vec<(String, String)> {
    let doc = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    doc.select(&selector)
        .filter_map(|a| {
            let href = a.value().attr("href")?.to_string();
            let text = a.text().collect::<String>();
            Some((href, text))
        })
        .collect()
}

/// Join a possibly relative href against its index page.
fn resolve(base: &str, href: &str) -> Result<String> {
    let base_url = Url::parse(base).map_err(|source| ScrapeError::Url {
        url: base.to_string(),
        source,
    })?;
    let joined = base_url.join(href).map_err(|source| ScrapeError::Url {
        url: href.to_string(),
        source,
    })?;
    Ok(joined.to_string())
}

fn is_digest_file(href: &str) -> bool {
    href.ends_with(".txt") || href.ends_with(".txt.gz")
}

fn file_stem(filename: &str) -> &str {
    filename
        .strip_suffix(".txt.gz")
        .or_else(|| filename.strip_suffix(".txt"))
        .unwrap_or(filename)
}

/// `"2021-April"` → `"April 2021"`; anything else passes through.
fn period_label_from_stem(stem: &str) -> String {
    if let Some((year, month)) = stem.split_once('-') {
        if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
            return format!("{month} {year}");
        }
    }
    stem.to_string()
}

fn period_label_from_filename(path: &Path) -> String {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    period_label_from_stem(file_stem(&filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_label_from_stem() {
        assert_eq!(period_label_from_stem("2021-April"), "April 2021");
        assert_eq!(period_label_from_stem("2020-January"), "January 2020");
        assert_eq!(period_label_from_stem("irregular"), "irregular");
    }

    #[test]
    fn test_file_stem_strips_gz() {
        assert_eq!(file_stem("2021-April.txt.gz"), "2021-April");
        assert_eq!(file_stem("2021-April.txt"), "2021-April");
        assert_eq!(file_stem("README"), "README");
    }

    #[test]
    fn test_anchors_in_document_order() {
        let html = r#"<p><a href="/a">first</a> <a href="/b">second</a></p>"#;
        let found = anchors(html);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], ("/a".to_string(), "first".to_string()));
    }

    #[test]
    fn test_resolve_relative_href() {
        let joined = resolve("http://lists.example.org/archives/", "2021-April/").unwrap();
        assert_eq!(joined, "http://lists.example.org/archives/2021-April/");
    }

    #[test]
    fn test_web_periods_skip_yearless_anchors() {
        let html = r#"
            <a href="/archives/home">Home</a>
            <a href="/archives/2104">April 2021, week 1</a>
            <a href="/archives/2105">April 2021, week 2</a>
        "#;
        let periods = web_periods(html, "http://h/archives/").unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].label, "April 2021, week 1");
    }

    #[test]
    fn test_digest_periods_from_file_links() {
        let html = r#"
            <a href="2021-April.txt.gz">[ Text ]</a>
            <a href="2021-May.txt.gz">[ Text ]</a>
            <a href="thread.html">[ Thread ]</a>
        "#;
        let periods = digest_periods(html, "http://h/pipermail/dev/").unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].label, "April 2021");
        assert_eq!(
            periods[0].source,
            SourceRef::Url("http://h/pipermail/dev/2021-April.txt.gz".to_string())
        );
    }

    #[test]
    fn test_gzipped_digest_lines_roundtrip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let text = "From: a@b.org\nMessage-ID: <1@x>\n\nhello\n";
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        let gz = encoder.finish().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2021-April.txt.gz");
        std::fs::write(&path, gz).unwrap();

        struct NoFetch;
        impl Fetcher for NoFetch {
            fn fetch_text(&self, url: &str) -> Result<String> {
                Err(ScrapeError::Status {
                    url: url.to_string(),
                    status: 599,
                })
            }
            fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
                Err(ScrapeError::Status {
                    url: url.to_string(),
                    status: 599,
                })
            }
        }

        let source = SourceRef::File {
            path,
            offset: None,
        };
        let lines = digest_lines(&NoFetch, &source).unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "Message-ID: <1@x>");
    }

    #[test]
    fn test_missing_digest_file_is_fatal() {
        struct NoFetch;
        impl Fetcher for NoFetch {
            fn fetch_text(&self, _: &str) -> Result<String> {
                unreachable!()
            }
            fn fetch_bytes(&self, _: &str) -> Result<Vec<u8>> {
                unreachable!()
            }
        }
        let source = SourceRef::File {
            path: PathBuf::from("/nonexistent/2021-April.txt"),
            offset: None,
        };
        let err = digest_lines(&NoFetch, &source).unwrap_err();
        assert!(matches!(err, ScrapeError::SourceNotFound(_)));
    }
}
