//! # docconform-core
//!
//! Deterministic conformance checking for structured office documents.
//!
//! Given a parsed document tree and a declarative rule configuration, the
//! engine answers:
//! - Are the required titles present?
//! - Do headings and body text use the prescribed fonts and sizes?
//! - Are the tables under each heading complete and within allowed values?
//! - Is every configured heading followed by real content?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same document and configuration, same findings
//! 2. **Located**: every finding points at a heading, paragraph, table or cell
//! 3. **Non-aborting**: rules that reference missing content yield failing
//!    findings; only configuration and load errors abort a document
//!
//! ## Example
//!
//! ```rust,ignore
//! use docconform_core::{check_document, RuleConfig, SerializedDocumentLoader};
//!
//! let config = RuleConfig::from_file("rules.json")?;
//! let report = check_document(&config, &SerializedDocumentLoader::new(), "report.json")?;
//! println!("{}", report.render_text());
//! ```

pub mod checkers;
pub mod config;
pub mod document;
pub mod finding;
pub mod loader;
pub mod navigator;
pub mod orchestrator;
pub mod report;
pub mod resolver;

pub use checkers::{
    CheckContext, Checker, ContentChecker, FontChecker, MixedFontMatcher, TableChecker,
    TitleChecker,
};
pub use config::{ConfigError, RuleConfig};
pub use document::{Block, Document, Paragraph, Run, RunProperties, StyleDefault, Table};
pub use finding::{Finding, FindingKind, Location};
pub use loader::{DocumentLoadError, DocumentLoader, SerializedDocumentLoader};
pub use navigator::{BlockItem, HeadingConventions, HeadingRank, MatchMode, Navigator};
pub use orchestrator::Orchestrator;
pub use report::Report;
pub use resolver::{FontSize, Script, StyleResolver};

use std::path::Path;

use thiserror::Error;

/// Errors that abort evaluation of a document.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document load error: {0}")]
    Load(#[from] DocumentLoadError),
}

impl EvaluationError {
    /// Process exit status for this error class.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Evaluate an already-loaded document.
pub fn evaluate(config: &RuleConfig, name: &str, document: &Document) -> Report {
    Orchestrator::new(config).evaluate(name, document)
}

/// Load `path` with `loader` and evaluate it.
pub fn check_document(
    config: &RuleConfig,
    loader: &dyn DocumentLoader,
    path: impl AsRef<Path>,
) -> Result<Report, EvaluationError> {
    let path = path.as_ref();
    let document = loader.load(path)?;
    Ok(evaluate(config, &path.display().to_string(), &document))
}

/// Evaluate the document named by `document_to_check`.
pub fn check_configured_document(
    config: &RuleConfig,
    loader: &dyn DocumentLoader,
) -> Result<Report, EvaluationError> {
    check_document(config, loader, config.document_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLoader(Document);

    impl DocumentLoader for FixedLoader {
        fn load(&self, _path: &Path) -> Result<Document, DocumentLoadError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_basic_evaluation() {
        let config = RuleConfig::from_yaml(
            r#"
document_to_check: "report.json"
title_rules:
  expected_titles:
    - text: "概述"
      required: true
content_rules:
  - heading_text_exact: "概述"
"#,
        )
        .unwrap();

        let doc = Document::default()
            .paragraph(Paragraph::with_text(Some("Heading 1"), "概述"))
            .paragraph(Paragraph::with_text(Some("Normal"), "本文档说明测试方法。"));

        let report = check_configured_document(&config, &FixedLoader(doc)).unwrap();
        assert!(report.passed, "{}", report.render_text());
        assert_eq!(report.document, "report.json");
        assert_eq!(report.total, 2);
    }

    #[test]
    fn test_load_error_maps_to_exit_code_two() {
        let config = RuleConfig::from_json(r#"{"document_to_check": "/nonexistent/x.json"}"#).unwrap();
        let err = check_configured_document(&config, &SerializedDocumentLoader::new()).unwrap_err();
        assert!(matches!(err, EvaluationError::Load(DocumentLoadError::NotFound(_))));
        assert_eq!(err.exit_code(), 2);
    }
}
