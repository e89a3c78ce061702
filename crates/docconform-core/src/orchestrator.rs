//! Orchestrator: runs the configured checkers over one document.
//!
//! Only checkers whose rule section is present run, always in the order
//! Title → Font → Table → Content.

use tracing::{debug, info};

use crate::checkers::{
    CheckContext, Checker, ContentChecker, FontChecker, TableChecker, TitleChecker,
};
use crate::config::RuleConfig;
use crate::document::Document;
use crate::finding::{dedup_findings, Finding};
use crate::navigator::HeadingConventions;
use crate::report::Report;

/// Evaluates documents against one validated configuration.
pub struct Orchestrator<'c> {
    config: &'c RuleConfig,
    conventions: HeadingConventions,
}

impl<'c> Orchestrator<'c> {
    pub fn new(config: &'c RuleConfig) -> Self {
        Self {
            config,
            conventions: config.conventions(),
        }
    }

    /// Checkers for the rule sections present in the configuration.
    fn checkers(&self) -> Vec<Box<dyn Checker + 'c>> {
        let config = self.config;
        let mut checkers: Vec<Box<dyn Checker + 'c>> = Vec::new();

        if let Some(rules) = &config.title_rules {
            checkers.push(Box::new(TitleChecker::new(rules)));
        }
        if let Some(rules) = &config.font_rules {
            checkers.push(Box::new(FontChecker::new(rules, config.expected_title_texts())));
        }
        if let Some(rules) = &config.table_rules {
            checkers.push(Box::new(TableChecker::new(rules)));
        }
        if let Some(rules) = &config.content_rules {
            checkers.push(Box::new(ContentChecker::new(rules)));
        }

        checkers
    }

    /// All findings for `document`, deduplicated, in checker order.
    pub fn run(&self, document: &Document) -> Vec<Finding> {
        let ctx = CheckContext::new(document, &self.conventions);

        let mut findings = Vec::new();
        for checker in self.checkers() {
            let produced = checker.check(&ctx);
            debug!(
                checker = checker.name(),
                findings = produced.len(),
                "checker finished"
            );
            findings.extend(produced);
        }

        dedup_findings(findings)
    }

    /// Run and aggregate into a [`Report`].
    pub fn evaluate(&self, name: &str, document: &Document) -> Report {
        let report = Report::new(name, self.run(document));
        info!(
            document = %name,
            passed = report.passed,
            findings = report.total,
            failed = report.failed_count,
            "document evaluated"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Paragraph;
    use crate::finding::FindingKind;

    fn config(json: &str) -> RuleConfig {
        RuleConfig::from_json(json).unwrap()
    }

    fn doc() -> Document {
        Document::default()
            .paragraph(Paragraph::with_text(Some("Heading 2"), "适用产品"))
            .paragraph(Paragraph::with_text(Some("Normal"), "说明"))
    }

    #[test]
    fn test_absent_sections_are_skipped() {
        let cfg = config(r#"{"document_to_check": "a.json"}"#);
        let findings = Orchestrator::new(&cfg).run(&doc());
        assert!(findings.is_empty());
        assert!(Orchestrator::new(&cfg).evaluate("a.json", &doc()).passed);
    }

    #[test]
    fn test_fixed_checker_order() {
        let cfg = config(
            r#"{
                "document_to_check": "a.json",
                "content_rules": [{"heading_text_exact": "适用产品"}],
                "table_rules": [{"heading_text": "适用产品", "table_index": 0}],
                "font_rules": {},
                "title_rules": {"expected_titles": [{"text": "适用产品", "required": true}]}
            }"#,
        );
        let kinds: Vec<FindingKind> = Orchestrator::new(&cfg)
            .run(&doc())
            .iter()
            .map(|f| f.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                FindingKind::Title,
                FindingKind::HeadingFont,
                FindingKind::ContentFont,
                FindingKind::Table,
                FindingKind::Content,
            ]
        );
    }

    #[test]
    fn test_overall_verdict_is_conjunction() {
        let cfg = config(
            r#"{
                "document_to_check": "a.json",
                "content_rules": [{"heading_text_exact": "适用产品"}],
                "table_rules": [{"heading_text": "适用产品", "table_index": 0}]
            }"#,
        );
        let report = Orchestrator::new(&cfg).evaluate("a.json", &doc());
        assert!(!report.passed);
        assert_eq!(report.passed_count, 1);
        assert_eq!(report.failed_count, 1);
    }

    #[test]
    fn test_duplicate_rules_collapse() {
        let cfg = config(
            r#"{
                "document_to_check": "a.json",
                "content_rules": [
                    {"heading_text_exact": "缺失"},
                    {"heading_text_exact": "缺失"}
                ]
            }"#,
        );
        assert_eq!(Orchestrator::new(&cfg).run(&doc()).len(), 1);
    }
}
