//! Lexer for the legacy tabular web archive.
//!
//! Message pages in this format render headers as a markup table: each row
//! holds a bolded field name and a value cell. Quirks handled here:
//!
//! - The subject value lives inside an anchor element.
//! - A value continues onto the next line whenever that line does not
//!   itself look like a new `Name: value` pair; continuation lines are
//!   rejoined with a single space.
//! - A `Parts/Attachments` row ends header parsing — rows after it are not
//!   header fields — and its hrefs become a side-channel attachment list.

use scraper::{ElementRef, Html, Selector};

use crate::model::Headers;

use super::{field_line, FormatLexer, RawContent};

/// Lexer for legacy tabular message pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularLexer;

impl FormatLexer for TabularLexer {
    fn extract_header(&self, raw: &RawContent<'_>) -> Headers {
        let RawContent::Markup(html) = raw else {
            return Headers::new();
        };
        let doc = Html::parse_document(html);
        let Some(sels) = Selectors::new() else {
            return Headers::new();
        };

        let mut headers = Headers::new();
        for row in doc.select(&sels.row) {
            let Some(bold) = row.select(&sels.bold).next() else {
                continue;
            };
            let name = normalize_field_name(&collect_text(&bold));
            if name.is_empty() {
                continue;
            }
            // Everything after the attachments row is not a header field.
            if is_attachment_row(&name) {
                break;
            }

            if name == "subject" {
                if let Some(anchor) = row.select(&sels.anchor).next() {
                    let subject = collect_text(&anchor).trim().to_string();
                    if !subject.is_empty() {
                        headers.entry(name).or_insert(subject);
                        continue;
                    }
                }
            }

            let Some(text) = value_text(&row, &bold, &sels) else {
                continue;
            };
            insert_with_continuations(&mut headers, name, &text);
        }
        headers
    }

    fn extract_body(&self, raw: &RawContent<'_>) -> Option<String> {
        let RawContent::Markup(html) = raw else {
            return None;
        };
        let doc = Html::parse_document(html);
        let pre = Selector::parse("pre").ok()?;
        let body = doc
            .select(&pre)
            .next()
            .map(|el| collect_text(&el).trim().to_string())?;
        if body.is_empty() {
            None
        } else {
            Some(body)
        }
    }

    fn extract_attachments(&self, raw: &RawContent<'_>) -> Vec<String> {
        let RawContent::Markup(html) = raw else {
            return Vec::new();
        };
        let doc = Html::parse_document(html);
        let Some(sels) = Selectors::new() else {
            return Vec::new();
        };

        for row in doc.select(&sels.row) {
            let Some(bold) = row.select(&sels.bold).next() else {
                continue;
            };
            if !is_attachment_row(&normalize_field_name(&collect_text(&bold))) {
                continue;
            }
            return row
                .select(&sels.anchor)
                .filter_map(|a| a.value().attr("href"))
                .map(str::to_string)
                .collect();
        }
        Vec::new()
    }
}

struct Selectors {
    row: Selector,
    cell: Selector,
    bold: Selector,
    anchor: Selector,
}

impl Selectors {
    fn new() -> Option<Self> {
        Some(Self {
            row: Selector::parse("tr").ok()?,
            cell: Selector::parse("td").ok()?,
            bold: Selector::parse("b").ok()?,
            anchor: Selector::parse("a").ok()?,
        })
    }
}

/// Text of the value cell for a header row.
///
/// Two-cell rows keep name and value apart; single-cell rows mix the bold
/// name into the value text, so the `Name:` prefix is stripped there.
fn value_text(row: &ElementRef<'_>, bold: &ElementRef<'_>, sels: &Selectors) -> Option<String> {
    let cells: Vec<ElementRef<'_>> = row.select(&sels.cell).collect();
    match cells.len() {
        0 => None,
        1 => {
            let full = collect_text(&cells[0]);
            let name_text = collect_text(bold);
            let stripped = full
                .trim_start()
                .strip_prefix(name_text.trim())
                .unwrap_or(&full);
            Some(stripped.trim_start_matches(':').trim().to_string())
        }
        _ => Some(collect_text(cells.last()?).trim().to_string()),
    }
}

/// Feed a value cell's lines into the header map.
///
/// The first line always starts the value. Later lines that look like a
/// new `Name: value` pair open a new field; all other lines continue the
/// current value, rejoined with a single space.
fn insert_with_continuations(headers: &mut Headers, name: String, text: &str) {
    let mut current_name = name;
    let mut current_value = String::new();
    let mut first = true;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !first {
            if let Some((next_name, next_value)) = field_line(line) {
                headers
                    .entry(std::mem::take(&mut current_name))
                    .or_insert(std::mem::take(&mut current_value));
                current_name = next_name;
                current_value = next_value;
                continue;
            }
        }
        if !current_value.is_empty() {
            current_value.push(' ');
        }
        current_value.push_str(line);
        first = false;
    }

    if !current_name.is_empty() {
        headers.entry(current_name).or_insert(current_value);
    }
}

fn collect_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

fn normalize_field_name(raw: &str) -> String {
    raw.trim().trim_end_matches(':').trim().to_lowercase()
}

fn is_attachment_row(name: &str) -> bool {
    name.starts_with("parts") || name.contains("attachment")
}
