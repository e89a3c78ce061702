//! Parsed document tree.
//!
//! The engine never reads raw office files. A loader (see [`crate::loader`])
//! hands it this tree: named styles plus a flat, ordered list of blocks.
//! Nothing here is mutated once loaded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Explicit formatting attributes. Every field may be absent, in which case
/// the value is inherited from the next level of the style chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunProperties {
    /// Font used for Latin letters and digits (`w:ascii`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_latin: Option<String>,

    /// Font used for CJK characters (`w:eastAsia`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_east_asian: Option<String>,

    /// Size in half-points, as the source format stores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_half_points: Option<u32>,
}

impl RunProperties {
    pub fn is_empty(&self) -> bool {
        self.font_latin.is_none() && self.font_east_asian.is_none() && self.size_half_points.is_none()
    }
}

/// A contiguous span of text sharing one formatting context.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Run {
    #[serde(default)]
    pub text: String,

    #[serde(flatten)]
    pub properties: RunProperties,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            properties: RunProperties::default(),
        }
    }

    pub fn latin(mut self, font: impl Into<String>) -> Self {
        self.properties.font_latin = Some(font.into());
        self
    }

    pub fn east_asian(mut self, font: impl Into<String>) -> Self {
        self.properties.font_east_asian = Some(font.into());
        self
    }

    /// Set the size in points; stored as half-points.
    pub fn size_pt(mut self, points: f64) -> Self {
        self.properties.size_half_points = Some((points * 2.0).round() as u32);
        self
    }

    /// True when the run carries nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A paragraph: an ordered list of runs plus its style reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Paragraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,

    /// Paragraph-direct run defaults (`w:pPr/w:rPr`).
    #[serde(default, skip_serializing_if = "RunProperties::is_empty")]
    pub properties: RunProperties,

    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(style_name: Option<&str>) -> Self {
        Self {
            style_name: style_name.map(str::to_string),
            properties: RunProperties::default(),
            runs: Vec::new(),
        }
    }

    /// Convenience constructor for a single-run paragraph.
    pub fn with_text(style_name: Option<&str>, text: impl Into<String>) -> Self {
        Self::new(style_name).run(Run::new(text))
    }

    pub fn run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub fn properties(mut self, properties: RunProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Full paragraph text (concatenated runs, untrimmed).
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn style(&self) -> &str {
        self.style_name.as_deref().unwrap_or("")
    }

    /// No text and no runs at all: a structural spacer, not a content paragraph.
    pub fn is_structurally_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// A table as a grid of cell texts. The first row is the header.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<&str>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(str::to_string).collect())
                .collect(),
        }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Index of the column whose header text (trimmed) equals `header`.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.header()?
            .iter()
            .position(|cell| cell.trim() == header.trim())
    }
}

/// One block-level element in document order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Fallback formatting for a named style.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StyleDefault {
    #[serde(flatten)]
    pub properties: RunProperties,

    /// Parent style; its attributes apply where this one is silent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on: Option<String>,
}

/// A parsed document: named styles and the flat block sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub styles: BTreeMap<String, StyleDefault>,

    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            styles: BTreeMap::new(),
            blocks,
        }
    }

    pub fn with_style(mut self, name: impl Into<String>, style: StyleDefault) -> Self {
        self.styles.insert(name.into(), style);
        self
    }

    pub fn paragraph(mut self, paragraph: Paragraph) -> Self {
        self.blocks.push(Block::Paragraph(paragraph));
        self
    }

    pub fn table(mut self, table: Table) -> Self {
        self.blocks.push(Block::Table(table));
        self
    }

    /// All paragraphs in document order, tables skipped.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
