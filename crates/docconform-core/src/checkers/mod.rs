//! The four rule checkers.
//!
//! Each checker owns one rule section of the configuration and reads the
//! document only through the shared [`CheckContext`]. Checkers never fail:
//! a rule that points at something missing produces a failing [`Finding`].

mod content;
mod font;
pub mod patterns;
mod table;
mod title;

pub use content::ContentChecker;
pub use font::FontChecker;
pub use patterns::MixedFontMatcher;
pub use table::TableChecker;
pub use title::TitleChecker;

use crate::document::Document;
use crate::finding::Finding;
use crate::navigator::{HeadingConventions, Navigator};
use crate::resolver::StyleResolver;

/// Read-only view handed to every checker for one document.
#[derive(Debug, Clone)]
pub struct CheckContext<'a> {
    pub document: &'a Document,
    pub navigator: Navigator<'a>,
    pub resolver: StyleResolver<'a>,
}

impl<'a> CheckContext<'a> {
    pub fn new(document: &'a Document, conventions: &'a HeadingConventions) -> Self {
        Self {
            document,
            navigator: Navigator::new(document, conventions),
            resolver: StyleResolver::new(&document.styles),
        }
    }
}

/// A rule checker.
pub trait Checker {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// What this checker verifies.
    fn description(&self) -> &'static str;

    /// Run the checker. Always returns at least one finding.
    fn check(&self, ctx: &CheckContext<'_>) -> Vec<Finding>;
}
