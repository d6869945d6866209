//! Lexer for monthly-digest text archives.
//!
//! A digest file concatenates a month of messages as plain text. The only
//! reliable structural landmark is the `Message-ID:` header line, which
//! marks the **end** of each message's header block. The block's start is
//! the nearest preceding blank line; the scan upward is bounded so a file
//! with no blank lines cannot send it to the top of a multi-megabyte
//! digest. The body runs until the next message's header block begins.

use crate::model::Headers;

use super::{field_line, FormatLexer, RawContent};

/// Upper bound on the upward blank-line scan. A safety valve against
/// runaway scans in malformed files, not a correctness guarantee.
pub const HEADER_SCAN_LIMIT: usize = 200;

/// Lexer for digest text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestLexer;

/// Indices of all `Message-ID:` marker lines — one per message unit.
pub fn message_markers(lines: &[String]) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_marker(line))
        .map(|(i, _)| i)
        .collect()
}

/// First line of the header block ending at `marker`.
///
/// Scans upward for the nearest blank line, at most [`HEADER_SCAN_LIMIT`]
/// lines.
pub fn header_start(lines: &[String], marker: usize) -> usize {
    let floor = marker.saturating_sub(HEADER_SCAN_LIMIT);
    let mut i = marker;
    while i > floor {
        if lines[i - 1].trim().is_empty() {
            return i;
        }
        i -= 1;
    }
    floor
}

fn is_marker(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() >= 11 && bytes[..11].eq_ignore_ascii_case(b"message-id:")
}

impl FormatLexer for DigestLexer {
    fn extract_header(&self, raw: &RawContent<'_>) -> Headers {
        let RawContent::Lines { lines, marker } = raw else {
            return Headers::new();
        };
        let (lines, marker) = (*lines, *marker);
        if marker >= lines.len() || !is_marker(&lines[marker]) {
            return Headers::new();
        }

        let start = header_start(lines, marker);
        let mut headers = Headers::new();
        let mut current: Option<(String, String)> = None;

        for line in &lines[start..=marker] {
            if line.starts_with(' ') || line.starts_with('\t') {
                // Folded continuation of the previous field
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }
            if let Some((name, value)) = field_line(line) {
                if let Some((prev_name, prev_value)) = current.take() {
                    headers.entry(prev_name).or_insert(prev_value);
                }
                current = Some((name, value));
            }
            // Lines that are neither a field nor folded are skipped
        }
        if let Some((name, value)) = current {
            headers.entry(name).or_insert(value);
        }
        headers
    }

    fn extract_body(&self, raw: &RawContent<'_>) -> Option<String> {
        let RawContent::Lines { lines, marker } = raw else {
            return None;
        };
        let (lines, marker) = (*lines, *marker);
        if marker >= lines.len() {
            return None;
        }

        // The body ends where the next message's header block begins,
        // located relative to that message's own marker.
        let body_start = marker + 1;
        let body_end = lines[body_start..]
            .iter()
            .position(|line| is_marker(line))
            .map(|pos| header_start(lines, body_start + pos))
            .unwrap_or(lines.len());

        if body_end <= body_start {
            return None;
        }

        let mut slice = &lines[body_start..body_end];
        while let [first, rest @ ..] = slice {
            if first.trim().is_empty() {
                slice = rest;
            } else {
                break;
            }
        }
        while let [rest @ .., last] = slice {
            if last.trim().is_empty() {
                slice = rest;
            } else {
                break;
            }
        }

        if slice.is_empty() {
            None
        } else {
            Some(slice.join("\n"))
        }
    }
}
