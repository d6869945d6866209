//! Format lexers: recover header fields and body text from raw archive
//! content.
//!
//! Three incompatible source formats feed one contract:
//!
//! - [`TabularLexer`] — legacy tabular web archive (bold field names in
//!   table rows).
//! - [`HypertextLexer`] — per-message hypertext archive (fixed CSS
//!   selectors).
//! - [`DigestLexer`] — monthly digest text files (`Message-ID:` boundary
//!   markers in a line array).
//!
//! Every lexer degrades gracefully: on any parse failure it returns an
//! empty header map or `None` body instead of an error, so one malformed
//! message never aborts a bulk scrape.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::Headers;

pub mod digest;
pub mod hypertext;
pub mod tabular;

pub use digest::DigestLexer;
pub use hypertext::{HypertextLexer, HypertextSelectors};
pub use tabular::TabularLexer;

/// Raw fetched content handed to a lexer.
#[derive(Debug, Clone, Copy)]
pub enum RawContent<'a> {
    /// A fetched markup page (tabular and hypertext formats).
    Markup(&'a str),
    /// A digest file as a line array, plus the index of the message's
    /// `Message-ID:` marker line.
    Lines {
        lines: &'a [String],
        marker: usize,
    },
}

/// Lexing contract implemented once per source format.
pub trait FormatLexer {
    /// Recover the header mapping (lower-cased field name → value).
    /// Returns an empty map when the content cannot be parsed.
    fn extract_header(&self, raw: &RawContent<'_>) -> Headers;

    /// Recover the body text, or `None` when absent or unparseable.
    fn extract_body(&self, raw: &RawContent<'_>) -> Option<String>;

    /// Attachment hrefs, where the format exposes them. Empty by default.
    fn extract_attachments(&self, raw: &RawContent<'_>) -> Vec<String> {
        let _ = raw;
        Vec::new()
    }
}

/// The three supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Legacy tabular web archive.
    Tabular,
    /// Modern hypertext per-message archive.
    Hypertext,
    /// Monthly-digest text archive.
    Digest,
}

impl ArchiveFormat {
    /// The lexer for this format.
    pub fn lexer(self) -> Box<dyn FormatLexer> {
        match self {
            ArchiveFormat::Tabular => Box::new(TabularLexer),
            ArchiveFormat::Hypertext => Box::new(HypertextLexer::new()),
            ArchiveFormat::Digest => Box::new(DigestLexer),
        }
    }
}

/// Split a line of the shape `Name: value` into a lower-cased field name
/// and its value. Lines that do not look like a field yield `None` (they
/// continue the previous value).
pub(crate) fn field_line(line: &str) -> Option<(String, String)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9-]*)\s*:\s*(.*)$").unwrap());
    let caps = re.captures(line)?;
    Some((caps[1].to_lowercase(), caps[2].trim().to_string()))
}
