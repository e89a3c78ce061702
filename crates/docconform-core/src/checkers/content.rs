//! Body paragraphs under headings.

use tracing::debug;

use crate::config::ContentRule;
use crate::finding::{Finding, FindingKind, Location};

use super::{CheckContext, Checker};

/// Checks that each configured heading is followed by non-blank paragraphs.
pub struct ContentChecker<'r> {
    rules: &'r [ContentRule],
}

impl<'r> ContentChecker<'r> {
    pub fn new(rules: &'r [ContentRule]) -> Self {
        Self { rules }
    }

    fn check_rule(&self, ctx: &CheckContext<'_>, rule: &ContentRule) -> Finding {
        let target = rule.heading.text.trim();
        let location = Location::Heading(target.to_string());

        if ctx.navigator.find_heading(target, rule.heading.mode).is_none() {
            return Finding::fail(
                FindingKind::Content,
                format!("heading '{}' not found", target),
                location,
            );
        }

        let paragraphs =
            ctx.navigator
                .paragraphs_after(target, rule.heading.mode, rule.check_next_paragraphs);

        if paragraphs.is_empty() {
            return Finding::fail(
                FindingKind::Content,
                format!("no paragraphs found after heading '{}'", target),
                location,
            );
        }

        let empty_positions: Vec<usize> = if rule.not_empty {
            paragraphs
                .iter()
                .enumerate()
                .filter(|(_, located)| located.item.text().trim().is_empty())
                .map(|(i, _)| i + 1)
                .collect()
        } else {
            Vec::new()
        };

        if empty_positions.is_empty() {
            Finding::pass(
                FindingKind::Content,
                format!("content under heading '{}' passed", target),
                location,
            )
            .with_detail("paragraphs_checked", paragraphs.len())
        } else {
            let positions: Vec<String> = empty_positions.iter().map(|p| p.to_string()).collect();
            Finding::fail(
                FindingKind::Content,
                format!(
                    "paragraph(s) {} after heading '{}' are empty",
                    positions.join(", "),
                    target
                ),
                location,
            )
            .with_detail("empty_paragraphs", empty_positions)
        }
    }
}

impl Checker for ContentChecker<'_> {
    fn name(&self) -> &'static str {
        "content"
    }

    fn description(&self) -> &'static str {
        "Does each configured heading have non-empty body paragraphs?"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Vec<Finding> {
        if self.rules.is_empty() {
            return vec![Finding::pass(
                FindingKind::Content,
                "no content rules configured",
                Location::Configuration,
            )];
        }

        let findings: Vec<Finding> = self
            .rules
            .iter()
            .map(|rule| self.check_rule(ctx, rule))
            .collect();

        debug!(
            rules = self.rules.len(),
            failed = findings.iter().filter(|f| !f.passed).count(),
            "content check done"
        );
        findings
    }
}
