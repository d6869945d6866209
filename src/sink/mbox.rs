//! MBOX sink: persist a scraped list to disk and read archival identifiers
//! back out of a saved file.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use mail_parser::MessageParser;
use tracing::warn;

use crate::error::{Result, ScrapeError};
use crate::model::{synthesize_id, MailingList, MessageRecord};

/// Header carrying the record's source reference. Re-reading a saved file
/// synthesizes identifiers from this value when no `Message-ID` is present,
/// so identifiers stay stable across a save/load cycle.
const ARCHIVED_AT: &str = "Archived-At";

/// Write a mailing list to `path` in MBOX format.
///
/// An existing file at `path` is replaced. Records that cannot be rendered
/// (a header value containing a line break, for instance) are logged and
/// skipped. Returns the number of messages written.
pub fn write_mbox(list: &MailingList, path: &Path) -> Result<u64> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| ScrapeError::io(path, e))?;
    }
    let mut file = File::create(path).map_err(|e| ScrapeError::io(path, e))?;

    let mut written = 0u64;
    for message in &list.messages {
        let rendered = match render_message(message) {
            Ok(r) => r,
            Err(reason) => {
                warn!(
                    archival_id = %message.archival_id,
                    reason,
                    "Skipping message that cannot be rendered as MBOX"
                );
                continue;
            }
        };
        file.write_all(rendered.as_bytes())
            .map_err(|e| ScrapeError::io(path, e))?;
        written += 1;
    }
    Ok(written)
}

/// Read the archival identifiers of every message in a saved MBOX file.
///
/// Identifiers are taken from `Message-ID` when present, otherwise
/// synthesized from the `Archived-At` header the writer added.
pub fn read_archival_ids(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read(path).map_err(|e| ScrapeError::io(path, e))?;
    let parser = MessageParser::default();

    let mut ids = Vec::new();
    for raw in split_messages(&data) {
        let parsed = parser.parse(raw).ok_or_else(|| ScrapeError::Mbox {
            path: path.to_path_buf(),
            reason: "unparseable message".into(),
        })?;
        if let Some(id) = parsed.message_id() {
            ids.push(id.to_string());
        } else if let Some(at) = parsed.header(ARCHIVED_AT).and_then(|v| v.as_text()) {
            ids.push(synthesize_id(at));
        } else {
            return Err(ScrapeError::Mbox {
                path: path.to_path_buf(),
                reason: "message without Message-ID or Archived-At".into(),
            });
        }
    }
    Ok(ids)
}

/// Split raw MBOX bytes into per-message slices on `From ` separator lines.
fn split_messages(data: &[u8]) -> Vec<&[u8]> {
    let mut messages = Vec::new();
    let mut start = None;
    let mut offset = 0;
    let mut prev_blank = true;

    for line in data.split_inclusive(|&b| b == b'\n') {
        if is_mbox_separator(line) && prev_blank {
            if let Some(s) = start {
                messages.push(&data[s..offset]);
            }
            start = Some(offset + line.len());
        }
        prev_blank = is_blank_line(line);
        offset += line.len();
    }
    if let Some(s) = start {
        if s < data.len() {
            messages.push(&data[s..]);
        }
    }
    messages
}

/// Render one record as an MBOX message, `From ` separator included.
///
/// Headers are written in canonical case. A `Message-ID` header is only
/// written when the record actually carried one; synthesized identifiers
/// are recoverable from `Archived-At` instead.
fn render_message(message: &MessageRecord) -> std::result::Result<String, String> {
    let mut out = String::new();
    out.push_str("From listscrape@localhost Thu Jan  1 00:00:00 1970\n");

    let mut names: Vec<&String> = message.headers.keys().collect();
    names.sort();
    for name in names {
        let value = &message.headers[name];
        if value.contains('\n') || value.contains('\r') {
            return Err(format!("header '{name}' contains a line break"));
        }
        out.push_str(&canonical_case(name));
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push_str(ARCHIVED_AT);
    out.push_str(": ");
    out.push_str(&message.source_ref.to_string());
    out.push('\n');
    out.push('\n');

    if let Some(body) = &message.body {
        for line in body.lines() {
            if line.starts_with("From ") {
                out.push('>');
            }
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push('\n');
    Ok(out)
}

/// Canonical header casing: each dash-separated part capitalized,
/// `message-id` becoming `Message-ID`.
fn canonical_case(name: &str) -> String {
    if name.eq_ignore_ascii_case("message-id") {
        return "Message-ID".to_string();
    }
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Check whether a line is an MBOX separator (`From ` at the start).
fn is_mbox_separator(line: &[u8]) -> bool {
    line.starts_with(b"From ")
}

fn is_blank_line(line: &[u8]) -> bool {
    matches!(line, b"" | b"\n" | b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Headers, ListSource, SourceRef};

    fn record(id: &str, with_message_id: bool) -> MessageRecord {
        let mut headers = Headers::new();
        headers.insert("from".into(), "ada@example.org".into());
        headers.insert("subject".into(), "Minutes".into());
        if with_message_id {
            headers.insert("message-id".into(), format!("<{id}>"));
        }
        MessageRecord {
            archival_id: id.to_string(),
            headers,
            body: Some("Hello.\n\nFrom here it only gets better.".into()),
            source_ref: SourceRef::Url(format!("http://h/list/{id}")),
            attachments: Vec::new(),
        }
    }

    fn list(messages: Vec<MessageRecord>) -> MailingList {
        MailingList {
            name: "dev".into(),
            source: ListSource::Url("http://h/dev/".into()),
            messages,
        }
    }

    #[test]
    fn test_write_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.mbox");
        let n = write_mbox(&list(vec![record("1@x", true), record("2@x", true)]), &path).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn test_round_trip_preserves_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.mbox");
        write_mbox(&list(vec![record("1@x", true), record("2@x", true)]), &path).unwrap();
        let ids = read_archival_ids(&path).unwrap();
        assert_eq!(ids, vec!["1@x".to_string(), "2@x".to_string()]);
    }

    #[test]
    fn test_synthesized_id_stable_across_round_trip() {
        let mut msg = record("ignored", false);
        msg.archival_id = synthesize_id(&msg.source_ref.to_string());
        let expected = msg.archival_id.clone();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.mbox");
        write_mbox(&list(vec![msg]), &path).unwrap();
        let ids = read_archival_ids(&path).unwrap();
        assert_eq!(ids, vec![expected]);
    }

    #[test]
    fn test_body_from_lines_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.mbox");
        write_mbox(&list(vec![record("1@x", true)]), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(">From here it only gets better."));
    }

    #[test]
    fn test_unrenderable_message_skipped() {
        let mut bad = record("2@x", true);
        bad.headers.insert("subject".into(), "split\nacross lines".into());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.mbox");
        let n = write_mbox(&list(vec![record("1@x", true), bad]), &path).unwrap();
        assert_eq!(n, 1);
        assert_eq!(read_archival_ids(&path).unwrap(), vec!["1@x".to_string()]);
    }

    #[test]
    fn test_existing_file_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.mbox");
        std::fs::write(&path, "stale contents").unwrap();
        write_mbox(&list(vec![record("1@x", true)]), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
    }

    #[test]
    fn test_canonical_case() {
        assert_eq!(canonical_case("subject"), "Subject");
        assert_eq!(canonical_case("in-reply-to"), "In-Reply-To");
        assert_eq!(canonical_case("message-id"), "Message-ID");
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = read_archival_ids(Path::new("/nonexistent/dev.mbox")).unwrap_err();
        assert!(matches!(err, ScrapeError::Io { .. }));
    }
}
