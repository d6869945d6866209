//! Tabular sink: the dictionary rendering keyed by archival identifier,
//! with best-effort date normalization and CSV export.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use crate::error::{Result, ScrapeError};
use crate::model::MailingList;

use super::dict::FieldTable;

/// Minimum length for a value to be considered date-recognizable.
/// Anything shorter cannot carry a full date plus time.
const DATE_MIN_LEN: usize = 11;

/// Keyed, date-normalized rendering of a mailing list.
///
/// Rows are indexed by `archival_id`; every non-null value longer than ten
/// characters gets one best-effort parse as a date, and successes are
/// rewritten as RFC 3339 timestamps. Values that do not parse pass through
/// untouched — the conversion never discards data.
#[derive(Debug, Clone)]
pub struct DataTable {
    keys: Vec<String>,
    columns: BTreeMap<String, Vec<Option<String>>>,
}

impl DataTable {
    /// Render one mailing list.
    pub fn from_list(list: &MailingList) -> Self {
        let field_table = FieldTable::from_list(list);
        let keys = list
            .messages
            .iter()
            .map(|m| m.archival_id.clone())
            .collect();

        let mut columns = BTreeMap::new();
        for (name, column) in field_table.iter() {
            let converted = if name == "body" {
                column.to_vec()
            } else {
                // Only date-bearing fields are worth a warning on parse
                // failure; every other column gets the same best-effort
                // attempt silently.
                let expect_date = name.contains("date");
                column
                    .iter()
                    .map(|v| convert_value(v.as_deref(), expect_date))
                    .collect()
            };
            columns.insert(name.to_string(), converted);
        }
        Self { keys, columns }
    }

    /// Archival identifiers, one per row.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn row_count(&self) -> usize {
        self.keys.len()
    }

    /// One column's values.
    pub fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Column names in sorted order.
    pub fn field_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Write the table as CSV, first column `archival_id`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut file =
            std::fs::File::create(path).map_err(|e| ScrapeError::io(path, e))?;

        let names = self.field_names();
        let mut header = "archival_id".to_string();
        for name in &names {
            header.push(',');
            header.push_str(&csv_escape(name));
        }
        writeln!(file, "{header}").map_err(|e| ScrapeError::io(path, e))?;

        for (i, key) in self.keys.iter().enumerate() {
            let mut row = csv_escape(key);
            for name in &names {
                row.push(',');
                if let Some(value) = self.columns[*name][i].as_deref() {
                    row.push_str(&csv_escape(value));
                }
            }
            writeln!(file, "{row}").map_err(|e| ScrapeError::io(path, e))?;
        }
        Ok(())
    }
}

/// Rewrite a value as an RFC 3339 timestamp when it parses as a date.
fn convert_value(value: Option<&str>, expect_date: bool) -> Option<String> {
    let value = value?;
    if value.len() >= DATE_MIN_LEN {
        match parse_date(value) {
            Some(dt) => return Some(dt.to_rfc3339()),
            None if expect_date => warn!(value, "Could not parse date"),
            None => {}
        }
    }
    Some(value.to_string())
}

/// Parse an archive date string in the common formats.
///
/// Supports RFC 2822, ISO 8601, and the broken real-world variants legacy
/// archives produce.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let no_dow = strip_day_of_week(trimmed);

    let formats = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S",
        "%b %d %H:%M:%S %Y",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
    ];

    for candidate in [&no_dow, &replace_named_tz(&no_dow)] {
        for fmt in &formats {
            if let Ok(dt) = DateTime::parse_from_str(candidate, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(candidate, fmt) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
    }

    None
}

/// Strip a leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    let days = [
        "Mon,", "Tue,", "Wed,", "Thu,", "Fri,", "Sat,", "Sun,", "Mon ", "Tue ", "Wed ", "Thu ",
        "Fri ", "Sat ", "Sun ",
    ];
    for day in &days {
        if let Some(rest) = s.strip_prefix(day) {
            return rest.trim().to_string();
        }
    }
    s.to_string()
}

/// Replace well-known trailing timezone abbreviations with offsets.
fn replace_named_tz(s: &str) -> String {
    let tzs = [
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("CET", "+0100"),
        ("CEST", "+0200"),
    ];
    let mut result = s.to_string();
    for (name, offset) in &tzs {
        if result.ends_with(name) {
            let pos = result.len() - name.len();
            result.replace_range(pos.., offset);
            return result;
        }
    }
    result
}

/// Escape a value for CSV (RFC 4180).
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
