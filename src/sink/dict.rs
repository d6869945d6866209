//! Dictionary sink: field name → value column.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{ListDomain, MailingList, MessageRecord};

/// Field-oriented rendering of a message sequence.
///
/// Every header field that appears in *any* record becomes a column, plus
/// a `body` column; records lacking a field are padded with `None`, so
/// every column's length equals the record count. That length invariant is
/// asserted at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTable {
    rows: usize,
    columns: BTreeMap<String, Vec<Option<String>>>,
}

impl FieldTable {
    /// Render one mailing list.
    pub fn from_list(list: &MailingList) -> Self {
        Self::from_records(list.messages.iter().map(|m| (None, m)))
    }

    /// Render a whole domain's resident lists, with an extra
    /// `mailing-list` column naming each record's source list.
    pub fn from_domain(domain: &ListDomain) -> Self {
        Self::from_records(
            domain
                .lists
                .iter()
                .flat_map(|l| l.messages.iter().map(move |m| (Some(l.name.as_str()), m))),
        )
    }

    fn from_records<'a>(
        records: impl Iterator<Item = (Option<&'a str>, &'a MessageRecord)>,
    ) -> Self {
        let records: Vec<(Option<&str>, &MessageRecord)> = records.collect();
        let rows = records.len();

        let field_names: BTreeSet<&str> = records
            .iter()
            .flat_map(|(_, m)| m.headers.keys().map(String::as_str))
            .collect();

        let mut columns: BTreeMap<String, Vec<Option<String>>> = BTreeMap::new();
        for name in field_names {
            let column = records
                .iter()
                .map(|(_, m)| m.headers.get(name).cloned())
                .collect();
            columns.insert(name.to_string(), column);
        }
        columns.insert(
            "body".to_string(),
            records.iter().map(|(_, m)| m.body.clone()).collect(),
        );
        if records.iter().any(|(list, _)| list.is_some()) {
            columns.insert(
                "mailing-list".to_string(),
                records
                    .iter()
                    .map(|(list, _)| list.map(str::to_string))
                    .collect(),
            );
        }

        let table = Self { rows, columns };
        table.assert_lengths();
        table
    }

    /// Every column must be exactly as long as the record count.
    fn assert_lengths(&self) {
        for (name, column) in &self.columns {
            assert_eq!(
                column.len(),
                self.rows,
                "column '{name}' violates the length invariant"
            );
        }
    }

    /// Number of records.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in sorted order.
    pub fn field_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// One column's values, padded with `None` where a record lacked the
    /// field.
    pub fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Iterate `(field_name, column)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Option<String>])> {
        self.columns
            .iter()
            .map(|(name, col)| (name.as_str(), col.as_slice()))
    }
}
