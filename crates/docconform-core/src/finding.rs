//! Findings: the unit of checker output.
//!
//! Every finding carries a [`Location`] that points a reader at the offending
//! heading, paragraph, table or cell. Findings are never mutated once a checker
//! returns them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Which check produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Title,
    HeadingFont,
    ContentFont,
    Table,
    Content,
}

impl FindingKind {
    pub fn label(self) -> &'static str {
        match self {
            FindingKind::Title => "title check",
            FindingKind::HeadingFont => "heading font check",
            FindingKind::ContentFont => "content font check",
            FindingKind::Table => "table check",
            FindingKind::Content => "content check",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a finding applies. Serialized as its human-readable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// The whole document.
    Document,
    /// The rule configuration itself.
    Configuration,
    /// A heading located by its text.
    Heading(String),
    /// Body paragraphs under the configured expected titles.
    ExpectedSections,
    /// A paragraph by 1-based ordinal among all paragraphs.
    Paragraph {
        number: usize,
        heading: Option<String>,
    },
    /// A table under a heading, by 0-based rule index.
    Table { heading: String, index: usize },
    /// A cell, 1-based row and column.
    Cell {
        heading: String,
        table_index: usize,
        row: usize,
        column: usize,
    },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Document => f.write_str("entire document"),
            Location::Configuration => f.write_str("configuration"),
            Location::Heading(text) => write!(f, "heading: {}", text),
            Location::ExpectedSections => f.write_str("body paragraphs under expected titles"),
            Location::Paragraph { number, heading } => match heading {
                Some(h) => write!(f, "paragraph {} [{}]", number, h),
                None => write!(f, "paragraph {} [unknown heading]", number),
            },
            Location::Table { heading, index } => {
                write!(f, "heading '{}', table #{}", heading, index)
            }
            Location::Cell {
                heading,
                table_index,
                row,
                column,
            } => write!(
                f,
                "heading '{}', table #{}, row {}, column {}",
                heading, table_index, row, column
            ),
        }
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Structured details: a location plus free-form keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Details {
    pub location: Location,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One check outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,

    pub passed: bool,

    pub message: String,

    pub details: Details,
}

impl Finding {
    pub fn pass(kind: FindingKind, message: impl Into<String>, location: Location) -> Self {
        Self::new(kind, true, message, location)
    }

    pub fn fail(kind: FindingKind, message: impl Into<String>, location: Location) -> Self {
        Self::new(kind, false, message, location)
    }

    fn new(kind: FindingKind, passed: bool, message: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            passed,
            message: message.into(),
            details: Details {
                location,
                extra: BTreeMap::new(),
            },
        }
    }

    /// Attach a detail entry.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.extra.insert(key.into(), value.into());
        self
    }

    pub fn location(&self) -> &Location {
        &self.details.location
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.extra.get(key)
    }
}

/// Drop findings equal to an earlier one, preserving first-occurrence order.
pub fn dedup_findings(findings: Vec<Finding>) -> Vec<Finding> {
    let mut unique: Vec<Finding> = Vec::with_capacity(findings.len());
    for finding in findings {
        if !unique.contains(&finding) {
            unique.push(finding);
        }
    }
    unique
}
