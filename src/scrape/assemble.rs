//! Message assembly: lexer output → canonical record.

use crate::lexer::{FormatLexer, RawContent};
use crate::model::{synthesize_id, Headers, MessageRecord, SourceRef};
use crate::select::FieldScope;

/// Build a [`MessageRecord`] from one unit's raw content.
///
/// The field scope decides which parts the lexer is even asked for; a
/// header-only run never touches body extraction and vice versa.
pub fn assemble(
    lexer: &dyn FormatLexer,
    raw: &RawContent<'_>,
    source_ref: SourceRef,
    scope: FieldScope,
) -> MessageRecord {
    let headers = if scope.wants_header() {
        lexer.extract_header(raw)
    } else {
        Headers::new()
    };
    let body = if scope.wants_body() {
        lexer.extract_body(raw)
    } else {
        None
    };
    let attachments = lexer.extract_attachments(raw);
    let archival_id = derive_archival_id(&headers, &source_ref);

    MessageRecord {
        archival_id,
        headers,
        body,
        source_ref,
        attachments,
    }
}

/// Derive the stable archival identifier for a unit.
///
/// Prefers a recovered `Message-ID`-like header (angle brackets stripped);
/// falls back to a deterministic synthesis from the source reference, so
/// the identifier survives re-fetches either way.
pub fn derive_archival_id(headers: &Headers, source_ref: &SourceRef) -> String {
    if let Some(mid) = headers.get("message-id") {
        let stripped = strip_angle_brackets(mid);
        if !stripped.is_empty() {
            return stripped.to_string();
        }
    }
    synthesize_id(&source_ref.to_string())
}

/// `"<id@host>"` → `"id@host"`; already-bare values pass through.
fn strip_angle_brackets(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(trimmed)
        .trim()
}
