//! Effective font and size resolution.
//!
//! Formatting in the source format is sparse: a run only records what it
//! overrides. The effective value of an attribute is the first one found along
//! the chain
//!
//! ```text
//! run explicit  >  paragraph direct  >  named style (following based_on)
//! ```
//!
//! and is `None` when no level sets it. `None` means "unspecified"; callers
//! must not read it as a zero size or a default font.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::document::{Paragraph, Run, RunProperties, StyleDefault};

/// Allowed difference between actual and expected size, in points.
pub const SIZE_TOLERANCE_PT: f64 = 0.1;

/// Size assumed for a Chinese size name missing from the table (五号).
pub const DEFAULT_NAMED_SIZE_PT: f64 = 10.5;

/// Traditional Chinese size names and their point values.
pub const CHINESE_SIZE_NAMES: [(&str, f64); 16] = [
    ("初号", 42.0),
    ("小初", 36.0),
    ("一号", 26.0),
    ("小一", 24.0),
    ("二号", 22.0),
    ("小二", 18.0),
    ("三号", 16.0),
    ("小三", 15.0),
    ("四号", 14.0),
    ("小四", 12.0),
    ("五号", 10.5),
    ("小五", 9.0),
    ("六号", 7.5),
    ("小六", 6.5),
    ("七号", 5.5),
    ("八号", 5.0),
];

/// Script class of a single character, which selects the font attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    /// CJK Unified Ideographs (U+4E00..=U+9FFF).
    EastAsian,
    /// ASCII letters and digits.
    Latin,
    /// Punctuation, whitespace, symbols. Carries no font constraint.
    Neutral,
}

impl Script {
    pub fn of(c: char) -> Self {
        if ('\u{4E00}'..='\u{9FFF}').contains(&c) {
            Script::EastAsian
        } else if c.is_ascii_alphanumeric() {
            Script::Latin
        } else {
            Script::Neutral
        }
    }

    pub fn is_east_asian(self) -> bool {
        self == Script::EastAsian
    }
}

/// A configured size: points, or a Chinese size name such as "小四".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontSize {
    Points(f64),
    Named(String),
}

impl FontSize {
    /// Point value; numeric strings are taken literally, names go through the table.
    pub fn to_pt(&self) -> f64 {
        match self {
            FontSize::Points(pt) => *pt,
            FontSize::Named(name) => name
                .trim()
                .parse::<f64>()
                .unwrap_or_else(|_| size_name_to_pt(name)),
        }
    }
}

/// Convert a Chinese size name to points. Unknown names map to 五号 (10.5pt).
pub fn size_name_to_pt(name: &str) -> f64 {
    let name = name.trim();
    CHINESE_SIZE_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, pt)| *pt)
        .unwrap_or(DEFAULT_NAMED_SIZE_PT)
}

pub fn half_points_to_pt(half_points: u32) -> f64 {
    f64::from(half_points) / 2.0
}

/// Whether `actual` is within [`SIZE_TOLERANCE_PT`] of `expected`.
pub fn sizes_match(actual: f64, expected: f64) -> bool {
    // Epsilon absorbs binary rounding so that a difference of exactly 0.1pt passes.
    (actual - expected).abs() <= SIZE_TOLERANCE_PT + 1e-9
}

/// Resolves effective attributes against a document's named styles.
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    styles: &'a BTreeMap<String, StyleDefault>,
}

impl<'a> StyleResolver<'a> {
    pub fn new(styles: &'a BTreeMap<String, StyleDefault>) -> Self {
        Self { styles }
    }

    /// Effective font for a character of `script` inside `run`.
    ///
    /// Returns `None` for [`Script::Neutral`] and when no level of the chain
    /// names a font.
    pub fn effective_font(
        &self,
        paragraph: &'a Paragraph,
        run: &'a Run,
        script: Script,
    ) -> Option<&'a str> {
        if script == Script::Neutral {
            return None;
        }

        font_for(&run.properties, script)
            .or_else(|| font_for(&paragraph.properties, script))
            .or_else(|| {
                self.style_chain(paragraph.style_name.as_deref())
                    .find_map(|style| font_for(&style.properties, script))
            })
    }

    /// Effective size in points for `run` (or for the paragraph itself when
    /// `run` is `None`).
    pub fn effective_size_pt(&self, paragraph: &'a Paragraph, run: Option<&'a Run>) -> Option<f64> {
        run.and_then(|r| r.properties.size_half_points)
            .or(paragraph.properties.size_half_points)
            .or_else(|| {
                self.style_chain(paragraph.style_name.as_deref())
                    .find_map(|style| style.properties.size_half_points)
            })
            .map(half_points_to_pt)
    }

    /// Walk a named style and its `based_on` ancestors. Stops on unknown
    /// names and on cycles.
    fn style_chain(&self, name: Option<&'a str>) -> impl Iterator<Item = &'a StyleDefault> + 'a {
        let styles = self.styles;
        let mut next = name;
        let mut seen: HashSet<&'a str> = HashSet::new();

        std::iter::from_fn(move || {
            let current = next?;
            if !seen.insert(current) {
                return None;
            }
            let style = styles.get(current)?;
            next = style.based_on.as_deref();
            Some(style)
        })
    }
}

fn font_for(properties: &RunProperties, script: Script) -> Option<&str> {
    match script {
        Script::EastAsian => properties.font_east_asian.as_deref(),
        Script::Latin => properties.font_latin.as_deref(),
        Script::Neutral => None,
    }
}
