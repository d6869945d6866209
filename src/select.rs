//! Period labels and selection filtering.
//!
//! A [`Period`] is one discoverable time bucket of a list archive (a month,
//! or a week of a month, depending on the source format). A [`Selection`]
//! narrows discovered periods by year / month / week and controls whether
//! headers, bodies, or both are requested per message.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::SourceRef;

/// One discoverable time bucket: a human-readable label plus the page or
/// file that holds its messages.
///
/// Label formats differ per source (`"April 2017"`, `"April 2017, week 2"`)
/// but every label yields a comparable year / month / week through the
/// projections below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub label: String,
    pub source: SourceRef,
}

impl Period {
    pub fn new(label: impl Into<String>, source: SourceRef) -> Self {
        Self {
            label: label.into(),
            source,
        }
    }
}

/// Numeric predicate for the `years` and `weeks` axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberPick {
    /// Exactly this value.
    One(i32),
    /// Inclusive range.
    Range(i32, i32),
    /// Any of these values.
    Many(Vec<i32>),
}

impl NumberPick {
    fn matches(&self, value: i32) -> bool {
        match self {
            NumberPick::One(n) => value == *n,
            NumberPick::Range(lo, hi) => (*lo..=*hi).contains(&value),
            NumberPick::Many(ns) => ns.contains(&value),
        }
    }
}

/// Name predicate for the `months` axis. Matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePick {
    One(String),
    Many(Vec<String>),
}

impl NamePick {
    fn matches(&self, value: &str) -> bool {
        match self {
            NamePick::One(name) => name.eq_ignore_ascii_case(value),
            NamePick::Many(names) => names.iter().any(|n| n.eq_ignore_ascii_case(value)),
        }
    }
}

/// Which message parts an ingestion run should recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldScope {
    /// Headers only; record bodies are `None`.
    Header,
    /// Bodies only; record header maps are empty.
    Body,
    /// Both (the default).
    #[default]
    Total,
}

impl FieldScope {
    pub fn wants_header(self) -> bool {
        matches!(self, FieldScope::Header | FieldScope::Total)
    }

    pub fn wants_body(self) -> bool {
        matches!(self, FieldScope::Body | FieldScope::Total)
    }
}

/// Caller-supplied filter narrowing periods and fields.
///
/// At most one predicate per axis; an absent axis means no filtering there.
/// Filtering is an intersection: a period survives only if every active
/// axis accepts it. A selection that matches nothing yields an empty period
/// set, not an error.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub years: Option<NumberPick>,
    pub months: Option<NamePick>,
    pub weeks: Option<NumberPick>,
    pub fields: FieldScope,
}

impl Selection {
    /// Keep only periods from one year.
    pub fn year(year: i32) -> Self {
        Self {
            years: Some(NumberPick::One(year)),
            ..Self::default()
        }
    }

    pub fn with_years(mut self, years: NumberPick) -> Self {
        self.years = Some(years);
        self
    }

    pub fn with_months(mut self, months: NamePick) -> Self {
        self.months = Some(months);
        self
    }

    pub fn with_weeks(mut self, weeks: NumberPick) -> Self {
        self.weeks = Some(weeks);
        self
    }

    pub fn with_fields(mut self, fields: FieldScope) -> Self {
        self.fields = fields;
        self
    }

    /// Narrow a discovered period sequence to the periods this selection
    /// accepts, preserving relative order.
    ///
    /// Each active axis narrows the survivors of the previous one. The
    /// axes are associative intersections, so evaluation order does not
    /// affect the result. A label that lacks the projection an active axis
    /// needs (e.g. no 4-digit run when `years` is set) is filtered out.
    pub fn filter(&self, periods: &[Period]) -> Vec<Period> {
        let mut survivors: Vec<Period> = periods.to_vec();

        if let Some(years) = &self.years {
            survivors.retain(|p| label_year(&p.label).is_some_and(|y| years.matches(y)));
        }
        if let Some(months) = &self.months {
            survivors.retain(|p| {
                label_month(&p.label).is_some_and(|m| months.matches(&m))
            });
        }
        if let Some(weeks) = &self.weeks {
            survivors.retain(|p| label_week(&p.label).is_some_and(|w| weeks.matches(w)));
        }

        survivors
    }
}

/// Year projection: the first 4-digit run in the label.
pub fn label_year(label: &str) -> Option<i32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\d{4}").unwrap());
    re.find(label)?.as_str().parse().ok()
}

/// Month projection: the leading word token of the label, punctuation
/// stripped (`"April 2017, week 2"` → `"April"`).
pub fn label_month(label: &str) -> Option<String> {
    let token = label.split_whitespace().next()?;
    let word: String = token.chars().filter(|c| c.is_alphabetic()).collect();
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

/// Week projection: the trailing integer run of the label
/// (`"April 2017, week 2"` → `2`).
pub fn label_week(label: &str) -> Option<i32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(\d+)\s*$").unwrap());
    re.captures(label)?.get(1)?.as_str().parse().ok()
}
