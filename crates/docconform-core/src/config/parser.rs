//! Rule configuration parsing from JSON/YAML.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::schema::validate_config_schema;
use crate::navigator::{HeadingConventions, MatchMode, DEFAULT_CLOSING_RANK, DEFAULT_HEADING_PREFIXES};
use crate::resolver::FontSize;

/// Legacy key accepted in place of `content_rules`.
pub const LEGACY_CONTENT_RULES_KEY: &str = "content_under_heading_rules";

/// Errors that can occur when loading a rule configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration does not match schema: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// One entry of `title_rules.expected_titles`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpectedTitle {
    pub text: String,

    /// When set, the paragraph's style name must equal this as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,

    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TitleRules {
    #[serde(default)]
    pub expected_titles: Vec<ExpectedTitle>,
}

/// Restricts one column to a fixed set of values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnValueCheck {
    pub column_header: String,
    pub allowed_values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableRule {
    /// Exact text of the heading the table sits under.
    pub heading_text: String,

    /// 0-based index among the tables under that heading.
    pub table_index: usize,

    #[serde(default)]
    pub all_cells_not_empty: bool,

    /// Header texts of columns that may contain empty cells.
    #[serde(default)]
    pub allow_empty_columns: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_value_check: Option<ColumnValueCheck>,
}

/// Heading target of a content rule: one text, one match mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingTarget {
    pub text: String,
    pub mode: MatchMode,
}

/// Paragraphs after a heading must exist and (optionally) be non-blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawContentRule", into = "RawContentRule")]
pub struct ContentRule {
    pub heading: HeadingTarget,
    pub check_next_paragraphs: usize,
    pub not_empty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawContentRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    heading_text_exact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    heading_text_contains: Option<String>,

    #[serde(default = "default_paragraph_count")]
    check_next_paragraphs: usize,

    #[serde(default = "default_true")]
    not_empty: bool,
}

fn default_paragraph_count() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl TryFrom<RawContentRule> for ContentRule {
    type Error = String;

    fn try_from(raw: RawContentRule) -> Result<Self, Self::Error> {
        let heading = match (raw.heading_text_exact, raw.heading_text_contains) {
            (Some(text), None) => HeadingTarget {
                text,
                mode: MatchMode::Exact,
            },
            (None, Some(text)) => HeadingTarget {
                text,
                mode: MatchMode::Contains,
            },
            (Some(_), Some(_)) => {
                return Err(
                    "content rule sets both heading_text_exact and heading_text_contains".into(),
                )
            }
            (None, None) => {
                return Err(
                    "content rule needs heading_text_exact or heading_text_contains".into(),
                )
            }
        };

        Ok(Self {
            heading,
            check_next_paragraphs: raw.check_next_paragraphs,
            not_empty: raw.not_empty,
        })
    }
}

impl From<ContentRule> for RawContentRule {
    fn from(rule: ContentRule) -> Self {
        let (exact, contains) = match rule.heading.mode {
            MatchMode::Exact => (Some(rule.heading.text), None),
            MatchMode::Contains => (None, Some(rule.heading.text)),
        };
        Self {
            heading_text_exact: exact,
            heading_text_contains: contains,
            check_next_paragraphs: rule.check_next_paragraphs,
            not_empty: rule.not_empty,
        }
    }
}

/// Expected formatting for one heading style.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HeadingFontRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chinese_font: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_font: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
}

/// Allowed fonts for body text. Singular legacy keys fold into the lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "RawContentFontRule")]
pub struct ContentFontRule {
    pub chinese_fonts: Vec<String>,
    pub english_fonts: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
}

impl ContentFontRule {
    pub fn is_empty(&self) -> bool {
        self.chinese_fonts.is_empty() && self.english_fonts.is_empty() && self.font_size.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct RawContentFontRule {
    #[serde(default)]
    chinese_fonts: Vec<String>,
    #[serde(default)]
    english_fonts: Vec<String>,
    #[serde(default)]
    chinese_font: Option<String>,
    #[serde(default)]
    english_font: Option<String>,
    #[serde(default)]
    font_size: Option<FontSize>,
}

impl From<RawContentFontRule> for ContentFontRule {
    fn from(raw: RawContentFontRule) -> Self {
        let fold = |list: Vec<String>, single: Option<String>| {
            if list.is_empty() {
                single.into_iter().collect()
            } else {
                list
            }
        };
        Self {
            chinese_fonts: fold(raw.chinese_fonts, raw.chinese_font),
            english_fonts: fold(raw.english_fonts, raw.english_font),
            font_size: raw.font_size,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FontRules {
    /// Style name → expected formatting.
    #[serde(default)]
    pub heading_font_rules: BTreeMap<String, HeadingFontRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_font_rules: Option<ContentFontRule>,

    /// Technical terms that mark a paragraph as mixed-font. Empty means the
    /// built-in list.
    #[serde(default)]
    pub mixed_font_patterns: Vec<String>,
}

/// A complete, validated rule configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleConfig {
    /// Path of the document to check.
    pub document_to_check: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_rules: Option<TitleRules>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_rules: Option<Vec<TableRule>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_rules: Option<Vec<ContentRule>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_rules: Option<FontRules>,

    #[serde(default = "default_heading_prefixes")]
    pub heading_style_prefixes: Vec<String>,

    #[serde(default = "default_closing_rank")]
    pub heading_closing_rank: u32,
}

fn default_heading_prefixes() -> Vec<String> {
    DEFAULT_HEADING_PREFIXES.iter().map(|p| p.to_string()).collect()
}

fn default_closing_rank() -> u32 {
    DEFAULT_CLOSING_RANK
}

impl RuleConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Load a configuration file. `.yaml`/`.yml` are read as YAML, anything
    /// else as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        debug!(config = %path.display(), "loading rule configuration");

        if is_yaml_path(path) {
            Self::from_yaml(&contents)
        } else {
            Self::from_json(&contents)
        }
    }

    /// Normalize legacy keys, check the schema, then build typed rules.
    pub fn from_value(mut value: Value) -> Result<Self, ConfigError> {
        normalize_aliases(&mut value);
        validate_config_schema(&value).map_err(ConfigError::Schema)?;

        let config: RuleConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the document path (CLI override).
    pub fn with_document(mut self, path: impl Into<String>) -> Self {
        self.document_to_check = path.into();
        self
    }

    pub fn document_path(&self) -> PathBuf {
        PathBuf::from(&self.document_to_check)
    }

    /// Heading conventions for the navigator.
    pub fn conventions(&self) -> HeadingConventions {
        HeadingConventions::new(self.heading_style_prefixes.iter().cloned(), self.heading_closing_rank)
    }

    /// Trimmed texts of all expected titles, in configuration order.
    pub fn expected_title_texts(&self) -> Vec<String> {
        self.title_rules
            .iter()
            .flat_map(|rules| rules.expected_titles.iter())
            .map(|title| title.text.trim().to_string())
            .collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.document_to_check.trim().is_empty() {
            return Err(ConfigError::MissingField("document_to_check".to_string()));
        }

        if self.heading_style_prefixes.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "heading_style_prefixes must name at least one prefix".to_string(),
            ));
        }

        if let Some(titles) = &self.title_rules {
            for (i, title) in titles.expected_titles.iter().enumerate() {
                if title.text.trim().is_empty() {
                    return Err(ConfigError::MissingField(format!(
                        "title_rules.expected_titles[{}].text",
                        i
                    )));
                }
            }
        }

        for (i, rule) in self.table_rules.iter().flatten().enumerate() {
            if rule.heading_text.trim().is_empty() {
                return Err(ConfigError::MissingField(format!("table_rules[{}].heading_text", i)));
            }
            if let Some(check) = &rule.column_value_check {
                if check.column_header.trim().is_empty() {
                    return Err(ConfigError::MissingField(format!(
                        "table_rules[{}].column_value_check.column_header",
                        i
                    )));
                }
            }
        }

        for (i, rule) in self.content_rules.iter().flatten().enumerate() {
            if rule.heading.text.trim().is_empty() {
                return Err(ConfigError::MissingField(format!("content_rules[{}] heading text", i)));
            }
        }

        if let Some(fonts) = &self.font_rules {
            for (style, rule) in &fonts.heading_font_rules {
                check_font_size(
                    rule.font_size.as_ref(),
                    &format!("font_rules.heading_font_rules[{}].font_size", style),
                )?;
            }
            if let Some(rule) = &fonts.content_font_rules {
                check_font_size(rule.font_size.as_ref(), "font_rules.content_font_rules.font_size")?;
            }
        }

        Ok(())
    }
}

/// Sizes must resolve to a finite, positive point value.
fn check_font_size(size: Option<&FontSize>, field: &str) -> Result<(), ConfigError> {
    let Some(size) = size else {
        return Ok(());
    };
    let pt = size.to_pt();
    if pt.is_finite() && pt > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{} must be a positive point size, got {:?}",
            field, size
        )))
    }
}

/// Whether a path should be read as YAML.
pub fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("yaml") | Some("yml")
    )
}

/// Rename `content_under_heading_rules` to `content_rules`.
fn normalize_aliases(value: &mut Value) {
    let Some(map) = value.as_object_mut() else {
        return;
    };
    let Some(legacy) = map.remove(LEGACY_CONTENT_RULES_KEY) else {
        return;
    };
    if map.contains_key("content_rules") {
        warn!(
            "both content_rules and {} are present; ignoring the legacy key",
            LEGACY_CONTENT_RULES_KEY
        );
    } else {
        map.insert("content_rules".to_string(), legacy);
    }
}
