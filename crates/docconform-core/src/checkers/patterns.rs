//! Mixed-font detection.
//!
//! Technical prose embeds Latin terms in Chinese sentences, and authors often
//! leave the surrounding Chinese characters in the Latin font. Paragraphs that
//! carry such terms (or shell-like special characters) are treated as
//! mixed-font and get a narrower font check.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Special characters that make a paragraph or run mixed-font.
    pub static ref SPECIAL_CHAR_PATTERN: Regex = Regex::new(r"[#$&-]").unwrap();
}

/// Built-in technical terms used when no patterns are configured.
pub const DEFAULT_MIXED_FONT_PATTERNS: &[&str] = &[
    "Ubuntu", "Linux", "Windows", "Docker", "ResNet", "INT8", "QPS", "x86", "ARM", "CPU", "GPU",
    "NPU", "TPU", "API", "JSON", "HTTPS", "HTTP", "FTP", "SDK", "AI", "ML", "DL", "TensorFlow",
    "PyTorch", "ResNet50", "xxx", "results", "results.json", "#", "&", "-",
];

/// Whether `text` contains one of `# $ & -`.
pub fn contains_special_char(text: &str) -> bool {
    SPECIAL_CHAR_PATTERN.is_match(text)
}

/// Case-insensitive substring matcher over technical terms.
#[derive(Debug, Clone)]
pub struct MixedFontMatcher {
    patterns: Vec<String>,
}

impl MixedFontMatcher {
    /// Build from configured patterns; an empty list selects the defaults.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns: Vec<String> = if patterns.is_empty() {
            DEFAULT_MIXED_FONT_PATTERNS.iter().map(|p| p.to_lowercase()).collect()
        } else {
            patterns.iter().map(|p| p.as_ref().to_lowercase()).collect()
        };
        Self { patterns }
    }

    /// A paragraph is mixed-font when it holds a special character or any
    /// configured term.
    pub fn is_mixed_font(&self, text: &str) -> bool {
        if contains_special_char(text) {
            return true;
        }
        let lower = text.to_lowercase();
        self.patterns
            .iter()
            .any(|p| !p.is_empty() && lower.contains(p.as_str()))
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for MixedFontMatcher {
    fn default() -> Self {
        Self::new::<&str>(&[])
    }
}
