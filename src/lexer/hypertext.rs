//! Lexer for the modern hypertext per-message archive.
//!
//! Each message is its own page. Field values sit behind fixed CSS-like
//! selectors; the `From` header is rebuilt from separately marked-up
//! display-name and address fragments; `In-Reply-To` is recovered from a
//! markup comment convention (`<!-- inreplyto="…" -->`) because the page
//! does not render it as a field.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::model::Headers;

use super::{FormatLexer, RawContent};

/// CSS selectors identifying each field on a message page.
///
/// The defaults match the common archive layout; hosts with custom
/// stylesheets can override them.
#[derive(Debug, Clone)]
pub struct HypertextSelectors {
    pub date: String,
    pub to: String,
    pub cc: String,
    pub subject: String,
    pub from_name: String,
    pub from_addr: String,
    pub body: String,
}

impl Default for HypertextSelectors {
    fn default() -> Self {
        Self {
            date: ".date".to_string(),
            to: ".to".to_string(),
            cc: ".cc".to_string(),
            subject: ".subject".to_string(),
            from_name: ".from .fn".to_string(),
            from_addr: ".from .email".to_string(),
            body: "#body".to_string(),
        }
    }
}

/// Lexer for hypertext message pages.
#[derive(Debug, Clone, Default)]
pub struct HypertextLexer {
    selectors: HypertextSelectors,
}

impl HypertextLexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selectors(selectors: HypertextSelectors) -> Self {
        Self { selectors }
    }
}

impl FormatLexer for HypertextLexer {
    fn extract_header(&self, raw: &RawContent<'_>) -> Headers {
        let RawContent::Markup(html) = raw else {
            return Headers::new();
        };
        let doc = Html::parse_document(html);
        let mut headers = Headers::new();

        for (name, css) in [
            ("date", &self.selectors.date),
            ("to", &self.selectors.to),
            ("cc", &self.selectors.cc),
            ("subject", &self.selectors.subject),
        ] {
            if let Some(value) = select_text(&doc, css) {
                headers.insert(name.to_string(), value);
            }
        }

        // `From` is split across two fragments on the page; rebuild the
        // standard `"Display Name" <address>` form.
        let name = select_text(&doc, &self.selectors.from_name);
        let addr = select_text(&doc, &self.selectors.from_addr);
        if let Some(from) = rebuild_from(name, addr) {
            headers.insert("from".to_string(), from);
        }

        if let Some(parent) = inreplyto_comment(html) {
            headers.insert("in-reply-to".to_string(), parent);
        }

        headers
    }

    fn extract_body(&self, raw: &RawContent<'_>) -> Option<String> {
        let RawContent::Markup(html) = raw else {
            return None;
        };
        let doc = Html::parse_document(html);
        select_text(&doc, &self.selectors.body)
    }
}

/// Text of the first element matching `css`, trimmed. `None` when the
/// selector is invalid, matches nothing, or matches only whitespace.
fn select_text(doc: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let text = doc
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// `"Display Name" <address>` from whichever fragments the page carries.
fn rebuild_from(name: Option<String>, addr: Option<String>) -> Option<String> {
    match (name, addr) {
        (Some(n), Some(a)) => Some(format!("\"{n}\" <{a}>")),
        (None, Some(a)) => Some(a),
        (Some(n), None) => Some(n),
        (None, None) => None,
    }
}

/// Recover the parent message id from the `<!-- inreplyto="…" -->` comment.
fn inreplyto_comment(html: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r#"<!--\s*inreplyto="([^"]*)"\s*-->"#).unwrap());
    let value = re.captures(html)?.get(1)?.as_str().trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
