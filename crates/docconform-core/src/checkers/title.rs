//! Required-title presence.

use std::collections::HashSet;

use tracing::debug;

use crate::config::TitleRules;
use crate::finding::{Finding, FindingKind, Location};

use super::{CheckContext, Checker};

/// Verifies that every required title appears somewhere in the document.
pub struct TitleChecker<'r> {
    rules: &'r TitleRules,
}

impl<'r> TitleChecker<'r> {
    pub fn new(rules: &'r TitleRules) -> Self {
        Self { rules }
    }
}

impl Checker for TitleChecker<'_> {
    fn name(&self) -> &'static str {
        "title"
    }

    fn description(&self) -> &'static str {
        "Are all required titles present with the expected style?"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Vec<Finding> {
        if ctx.document.paragraphs().next().is_none() {
            return vec![Finding::fail(
                FindingKind::Title,
                "document is empty, no titles found",
                Location::Document,
            )];
        }

        let expected = &self.rules.expected_titles;
        if expected.is_empty() {
            return vec![Finding::fail(
                FindingKind::Title,
                "no expected titles defined in configuration",
                Location::Configuration,
            )];
        }

        let mut found: HashSet<&str> = HashSet::new();
        for paragraph in ctx.document.paragraphs() {
            let text = paragraph.text();
            let text = text.trim();
            let matched = expected.iter().find(|title| {
                text == title.text.trim()
                    && title
                        .style_name
                        .as_deref()
                        .map_or(true, |style| style == paragraph.style())
            });
            if let Some(title) = matched {
                found.insert(title.text.trim());
            }
        }

        let missing: Vec<String> = expected
            .iter()
            .filter(|title| title.required && !found.contains(title.text.trim()))
            .map(|title| title.text.trim().to_string())
            .collect();

        debug!(expected = expected.len(), missing = missing.len(), "title check done");

        if missing.is_empty() {
            vec![Finding::pass(
                FindingKind::Title,
                "all required titles present",
                Location::Document,
            )]
        } else {
            let listing: Vec<String> = missing.iter().map(|t| format!("- {}", t)).collect();
            vec![Finding::fail(
                FindingKind::Title,
                format!("missing required titles:\n{}", listing.join("\n")),
                Location::Document,
            )
            .with_detail("missing_titles", missing)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExpectedTitle, TitleRules};
    use crate::document::{Document, Paragraph};
    use crate::navigator::HeadingConventions;

    fn rules() -> TitleRules {
        TitleRules {
            expected_titles: vec![
                ExpectedTitle {
                    text: "测试工具版本".into(),
                    style_name: Some("Heading 2".into()),
                    required: true,
                },
                ExpectedTitle {
                    text: "适用产品".into(),
                    style_name: None,
                    required: true,
                },
                ExpectedTitle {
                    text: "附录".into(),
                    style_name: None,
                    required: false,
                },
            ],
        }
    }

    fn run(doc: &Document, rules: &TitleRules) -> Vec<Finding> {
        let conv = HeadingConventions::default();
        let ctx = CheckContext::new(doc, &conv);
        TitleChecker::new(rules).check(&ctx)
    }

    #[test]
    fn test_all_required_present() {
        let doc = Document::default()
            .paragraph(Paragraph::with_text(Some("Heading 2"), " 测试工具版本 "))
            .paragraph(Paragraph::with_text(Some("Normal"), "适用产品"));
        let findings = run(&doc, &rules());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].passed);
    }

    #[test]
    fn test_style_mismatch_counts_as_missing() {
        let doc = Document::default()
            .paragraph(Paragraph::with_text(Some("Heading 3"), "测试工具版本"))
            .paragraph(Paragraph::with_text(Some("Heading 2"), "适用产品"));
        let findings = run(&doc, &rules());
        assert!(!findings[0].passed);
        assert_eq!(
            findings[0].detail("missing_titles"),
            Some(&serde_json::json!(["测试工具版本"]))
        );
        assert!(findings[0].message.contains("- 测试工具版本"));
    }

    #[test]
    fn test_empty_document_and_empty_rules() {
        let empty = Document::default();
        let findings = run(&empty, &rules());
        assert!(!findings[0].passed);
        assert_eq!(findings[0].location(), &Location::Document);

        let doc = Document::default().paragraph(Paragraph::with_text(None, "x"));
        let findings = run(&doc, &TitleRules::default());
        assert!(!findings[0].passed);
        assert_eq!(findings[0].location(), &Location::Configuration);
    }
}
