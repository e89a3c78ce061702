//! Report: the aggregated outcome for one document.
//!
//! Aggregation policy is fixed:
//! 1. Duplicate findings (same kind, message, details and status) collapse
//!    to their first occurrence.
//! 2. The document passes only if every remaining finding passed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::finding::{dedup_findings, Finding};

/// Findings for one document plus the derived verdict.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Path or name of the checked document.
    pub document: String,

    pub passed: bool,

    pub total: usize,

    pub passed_count: usize,

    pub failed_count: usize,

    pub findings: Vec<Finding>,

    pub evaluated_at: DateTime<Utc>,
}

impl Report {
    pub fn new(document: impl Into<String>, findings: Vec<Finding>) -> Self {
        let findings = dedup_findings(findings);
        let passed_count = findings.iter().filter(|f| f.passed).count();
        let total = findings.len();

        Self {
            document: document.into(),
            passed: passed_count == total,
            total,
            passed_count,
            failed_count: total - passed_count,
            findings,
            evaluated_at: Utc::now(),
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.passed)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} checks, {} passed, {} failed",
            self.total, self.passed_count, self.failed_count
        )
    }

    /// Plain-text rendering: numbered findings, then the summary.
    pub fn render_text(&self) -> String {
        let mut out = format!("Document: {}\n\n", self.document);

        for (i, finding) in self.findings.iter().enumerate() {
            let mark = if finding.passed { "✓" } else { "✗" };
            out.push_str(&format!(
                "{}. [{}] {}: {}\n",
                i + 1,
                mark,
                finding.kind,
                indent_continuation(&finding.message, "   ")
            ));
            out.push_str(&format!("   location: {}\n", finding.details.location));
        }

        out.push_str(&format!(
            "\nResult: {} ({})\n",
            if self.passed { "PASSED" } else { "FAILED" },
            self.summary()
        ));
        out
    }

    /// Markdown rendering with one section per finding.
    pub fn render_markdown(&self) -> String {
        let mut out = format!(
            "## {}\n\n**Status:** {}  \n**Checked at:** {}  \n**Summary:** {}\n\n",
            self.document,
            if self.passed { "✅ passed" } else { "❌ failed" },
            self.evaluated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.summary()
        );

        for (i, finding) in self.findings.iter().enumerate() {
            let mark = if finding.passed { "✅" } else { "❌" };
            out.push_str(&format!("### {}. {} {}\n\n", i + 1, mark, finding.kind));
            out.push_str("```\n");
            out.push_str(finding.message.trim_end());
            out.push_str("\n```\n\n");
            out.push_str(&format!("- **Location:** {}\n", finding.details.location));
            for (key, value) in &finding.details.extra {
                out.push_str(&format!("- **{}:** {}\n", key, value));
            }
            out.push('\n');
        }
        out
    }
}

fn indent_continuation(text: &str, indent: &str) -> String {
    text.trim_end().replace('\n', &format!("\n{}", indent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{FindingKind, Location};

    fn findings() -> Vec<Finding> {
        vec![
            Finding::pass(FindingKind::Title, "all required titles present", Location::Document),
            Finding::fail(
                FindingKind::Content,
                "heading 'x' not found",
                Location::Heading("x".into()),
            ),
            Finding::fail(
                FindingKind::Content,
                "heading 'x' not found",
                Location::Heading("x".into()),
            ),
        ]
    }

    #[test]
    fn test_counts_after_dedup() {
        let report = Report::new("a.json", findings());
        assert_eq!(report.total, 2);
        assert_eq!(report.passed_count, 1);
        assert_eq!(report.failed_count, 1);
        assert!(!report.passed);
        assert_eq!(report.summary(), "2 checks, 1 passed, 1 failed");
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_empty_report_passes() {
        let report = Report::new("a.json", vec![]);
        assert!(report.passed);
        assert_eq!(report.total, 0);
    }

    #[test]
    fn test_text_rendering() {
        let text = Report::new("a.json", findings()).render_text();
        assert!(text.contains("1. [✓] title check: all required titles present"));
        assert!(text.contains("2. [✗] content check: heading 'x' not found"));
        assert!(text.contains("location: heading: x"));
        assert!(text.contains("Result: FAILED (2 checks, 1 passed, 1 failed)"));
    }

    #[test]
    fn test_markdown_rendering() {
        let md = Report::new("a.json", findings()).render_markdown();
        assert!(md.starts_with("## a.json"));
        assert!(md.contains("### 2. ❌ content check"));
        assert!(md.contains("- **Location:** heading: x"));
    }
}
