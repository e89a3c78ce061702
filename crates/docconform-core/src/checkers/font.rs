//! Font family and size checks.
//!
//! Two passes share the resolver:
//!
//! - **Headings**: paragraphs whose style name has a heading font rule are
//!   checked character by character (font by script class) and run by run
//!   (size). One finding per heading.
//! - **Body text**: paragraphs under an expected title are checked against
//!   the allowed font lists, with the mixed-font exception for technical
//!   prose. All problems merge into one finding with per-paragraph detail.
//!
//! An unset effective font is never flagged; an unset size is.

use serde_json::json;
use tracing::debug;

use crate::config::{ContentFontRule, FontRules, HeadingFontRule};
use crate::document::Paragraph;
use crate::finding::{Finding, FindingKind, Location};
use crate::navigator::BlockItem;
use crate::resolver::{sizes_match, FontSize, Script, StyleResolver};

use super::patterns::{contains_special_char, MixedFontMatcher};
use super::{CheckContext, Checker};

/// Examples shown per script class and paragraph in body-text messages.
const EXAMPLES_PER_CLASS: usize = 3;
const PARAGRAPH_EXCERPT_CHARS: usize = 30;
const RUN_EXCERPT_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
struct CharMismatch {
    ch: char,
    expected: String,
    actual: String,
}

impl CharMismatch {
    fn describe(&self) -> String {
        format!(
            "character '{}' expected font: {}, actual font: {}",
            self.ch, self.expected, self.actual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SizeMismatch {
    expected: f64,
    actual: Option<f64>,
}

impl SizeMismatch {
    fn describe(&self) -> String {
        match self.actual {
            Some(actual) => format!("expected size: {}pt, actual size: {}pt", self.expected, actual),
            None => format!("expected size: {}pt, actual size: not set", self.expected),
        }
    }
}

/// Body-text problems found in one paragraph.
#[derive(Debug, Clone)]
struct ParagraphIssues {
    location: Location,
    excerpt: String,
    mixed_font: bool,
    chinese: Vec<(CharMismatch, String)>,
    english: Vec<(CharMismatch, String)>,
    size: Option<SizeMismatch>,
}

impl ParagraphIssues {
    fn is_empty(&self) -> bool {
        self.chinese.is_empty() && self.english.is_empty() && self.size.is_none()
    }

    fn render(&self, out: &mut String) {
        let mixed = if self.mixed_font { " (mixed-font paragraph)" } else { "" };
        out.push_str(&format!("{}{}\n", self.location, mixed));
        out.push_str(&format!("text: {}\n", self.excerpt));

        for (label, errors) in [("Chinese", &self.chinese), ("Latin/digit", &self.english)] {
            if errors.is_empty() {
                continue;
            }
            out.push_str(&format!("  {} font errors: {}\n", label, errors.len()));
            for (mismatch, _) in errors.iter().take(EXAMPLES_PER_CLASS) {
                out.push_str(&format!("    {}\n", mismatch.describe()));
            }
            if errors.len() > EXAMPLES_PER_CLASS {
                out.push_str("    ... and more\n");
            }
        }

        if let Some(size) = &self.size {
            out.push_str(&format!("  size error: {}\n", size.describe()));
        }
        out.push('\n');
    }

    fn to_detail(&self) -> serde_json::Value {
        json!({
            "location": self.location.to_string(),
            "mixed_font": self.mixed_font,
            "chinese_errors": self.chinese.len(),
            "english_errors": self.english.len(),
            "size_error": self.size.map(|s| s.describe()),
        })
    }
}

/// Checks heading and body-text fonts.
pub struct FontChecker<'r> {
    rules: &'r FontRules,
    expected_titles: Vec<String>,
    matcher: MixedFontMatcher,
}

impl<'r> FontChecker<'r> {
    /// `expected_titles` scopes the body-text pass (see
    /// [`crate::config::RuleConfig::expected_title_texts`]).
    pub fn new(rules: &'r FontRules, expected_titles: Vec<String>) -> Self {
        Self {
            rules,
            expected_titles,
            matcher: MixedFontMatcher::new(&rules.mixed_font_patterns),
        }
    }

    pub fn check_headings(&self, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let rules = &self.rules.heading_font_rules;
        if rules.is_empty() {
            return vec![Finding::pass(
                FindingKind::HeadingFont,
                "no heading font rules configured",
                Location::Configuration,
            )];
        }

        let mut findings = Vec::new();
        for paragraph in ctx.document.paragraphs() {
            let Some(rule) = rules.get(paragraph.style()) else {
                continue;
            };
            let text = paragraph.text().trim().to_string();
            if text.is_empty() {
                continue;
            }
            findings.push(heading_finding(&ctx.resolver, paragraph, &text, rule));
        }

        if findings.is_empty() {
            findings.push(Finding::pass(
                FindingKind::HeadingFont,
                "no headings matched the heading font rules",
                Location::Document,
            ));
        }
        findings
    }

    pub fn check_content(&self, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let rule = match &self.rules.content_font_rules {
            Some(rule) if !rule.is_empty() => rule,
            _ => {
                return vec![Finding::pass(
                    FindingKind::ContentFont,
                    "no content font rules configured",
                    Location::Configuration,
                )]
            }
        };

        if self.expected_titles.is_empty() {
            return vec![Finding::pass(
                FindingKind::ContentFont,
                "no expected titles defined, content font check skipped",
                Location::Configuration,
            )];
        }

        let expected_size = rule.font_size.as_ref().map(FontSize::to_pt);
        let nav = &ctx.navigator;
        let mut issues: Vec<ParagraphIssues> = Vec::new();
        let mut checked = 0usize;

        for (index, item) in nav.items().iter().enumerate() {
            let BlockItem::Plain(paragraph) = item else {
                continue;
            };
            let text = paragraph.text();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            let heading = nav.nearest_preceding_heading(index).filter(|h| !h.is_empty());
            if !heading.as_deref().is_some_and(|h| self.is_expected_title(h)) {
                continue;
            }
            checked += 1;

            let mixed_font = self.matcher.is_mixed_font(text);
            let size = expected_size.and_then(|expected| {
                paragraph
                    .runs
                    .iter()
                    .filter(|r| !r.is_blank())
                    .find_map(|run| match ctx.resolver.effective_size_pt(paragraph, Some(run)) {
                        Some(actual) if sizes_match(actual, expected) => None,
                        actual => Some(SizeMismatch { expected, actual }),
                    })
            });

            let (chinese, english) = content_char_errors(&ctx.resolver, paragraph, rule, mixed_font);

            let paragraph_issues = ParagraphIssues {
                location: Location::Paragraph {
                    number: nav.paragraph_number(index),
                    heading,
                },
                excerpt: excerpt(text, PARAGRAPH_EXCERPT_CHARS),
                mixed_font,
                chinese,
                english,
                size,
            };
            if !paragraph_issues.is_empty() {
                issues.push(paragraph_issues);
            }
        }

        debug!(checked, failing = issues.len(), "content font pass done");

        if issues.is_empty() {
            return vec![Finding::pass(
                FindingKind::ContentFont,
                "body text fonts under expected titles passed",
                Location::ExpectedSections,
            )
            .with_detail("paragraphs_checked", checked)];
        }

        let mut message = String::from("body text font errors:\n\n");
        for paragraph in &issues {
            paragraph.render(&mut message);
        }

        let counts = json!({
            "chinese": issues.iter().map(|p| p.chinese.len()).sum::<usize>(),
            "english": issues.iter().map(|p| p.english.len()).sum::<usize>(),
            "size": issues.iter().filter(|p| p.size.is_some()).count(),
        });
        let samples: Vec<serde_json::Value> = issues
            .iter()
            .flat_map(|p| p.chinese.iter().chain(p.english.iter()).map(move |e| (p, e)))
            .take(EXAMPLES_PER_CLASS)
            .map(|(p, (mismatch, run_text))| {
                json!({
                    "location": p.location.to_string(),
                    "char": mismatch.ch.to_string(),
                    "text": run_text,
                    "expected": mismatch.expected,
                    "actual": mismatch.actual,
                })
            })
            .collect();
        let paragraphs: Vec<serde_json::Value> = issues.iter().map(ParagraphIssues::to_detail).collect();

        vec![Finding::fail(
            FindingKind::ContentFont,
            message.trim_end().to_string(),
            Location::ExpectedSections,
        )
        .with_detail("error_counts", counts)
        .with_detail("error_samples", samples)
        .with_detail("paragraphs", paragraphs)]
    }

    /// Substring match in either direction, tolerating numbering prefixes.
    fn is_expected_title(&self, heading: &str) -> bool {
        self.expected_titles
            .iter()
            .filter(|t| !t.is_empty())
            .any(|t| heading.contains(t.as_str()) || t.contains(heading))
    }
}

impl Checker for FontChecker<'_> {
    fn name(&self) -> &'static str {
        "font"
    }

    fn description(&self) -> &'static str {
        "Do headings and body text use the configured fonts and sizes?"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Vec<Finding> {
        let mut findings = self.check_headings(ctx);
        findings.extend(self.check_content(ctx));
        findings
    }
}

fn heading_finding(
    resolver: &StyleResolver<'_>,
    paragraph: &Paragraph,
    text: &str,
    rule: &HeadingFontRule,
) -> Finding {
    let style = paragraph.style();
    let expected_size = rule.font_size.as_ref().map(FontSize::to_pt);

    let mut chinese: Vec<CharMismatch> = Vec::new();
    let mut english: Vec<CharMismatch> = Vec::new();
    let mut size_error: Option<SizeMismatch> = None;

    for run in paragraph.runs.iter().filter(|r| !r.is_blank()) {
        if let (Some(expected), None) = (expected_size, size_error) {
            let actual = resolver.effective_size_pt(paragraph, Some(run));
            if !actual.is_some_and(|a| sizes_match(a, expected)) {
                size_error = Some(SizeMismatch { expected, actual });
            }
        }

        for ch in run.text.chars().filter(|c| !c.is_whitespace()) {
            let script = Script::of(ch);
            let expected = match script {
                Script::EastAsian => rule.chinese_font.as_deref(),
                Script::Latin => rule.english_font.as_deref(),
                Script::Neutral => None,
            };
            let Some(expected) = expected else {
                continue;
            };
            let Some(actual) = resolver.effective_font(paragraph, run, script) else {
                continue;
            };
            if actual == expected {
                continue;
            }

            let mismatch = CharMismatch {
                ch,
                expected: expected.to_string(),
                actual: actual.to_string(),
            };
            let bucket = if script.is_east_asian() { &mut chinese } else { &mut english };
            if !bucket.contains(&mismatch) {
                bucket.push(mismatch);
            }
        }
    }

    let location = Location::Heading(text.to_string());

    if chinese.is_empty() && english.is_empty() && size_error.is_none() {
        return Finding::pass(
            FindingKind::HeadingFont,
            format!("heading '{}' (style: {}) formatting correct", text, style),
            location,
        )
        .with_detail("style", style);
    }

    let mut message = format!("heading '{}' (style: {}) has formatting errors:", text, style);
    for (label, errors) in [("Chinese font", &chinese), ("Latin/digit font", &english)] {
        if let Some(example) = errors.first() {
            message.push_str(&format!(
                "\n{}: {} issue(s), e.g. {}",
                label,
                errors.len(),
                example.describe()
            ));
        }
    }
    if let Some(size) = &size_error {
        message.push_str(&format!("\nsize: {}", size.describe()));
    }

    Finding::fail(FindingKind::HeadingFont, message, location)
        .with_detail("style", style)
        .with_detail("chinese_errors_count", chinese.len())
        .with_detail("english_errors_count", english.len())
        .with_detail("size_error", size_error.map(|s| s.describe()))
}

type CharErrors = Vec<(CharMismatch, String)>;

/// Per-character body-text font errors, split by script class. Each error
/// carries an excerpt of the run it came from.
fn content_char_errors(
    resolver: &StyleResolver<'_>,
    paragraph: &Paragraph,
    rule: &ContentFontRule,
    mixed_font: bool,
) -> (CharErrors, CharErrors) {
    let mut chinese = Vec::new();
    let mut english = Vec::new();

    for run in paragraph.runs.iter().filter(|r| !r.is_blank()) {
        let exempt = mixed_font || contains_special_char(&run.text);

        for ch in run.text.chars().filter(|c| !c.is_whitespace()) {
            let script = Script::of(ch);
            let (allowed, bucket) = match script {
                Script::EastAsian => (&rule.chinese_fonts, &mut chinese),
                Script::Latin => (&rule.english_fonts, &mut english),
                Script::Neutral => continue,
            };
            let Some(actual) = resolver.effective_font(paragraph, run, script) else {
                continue;
            };
            if exempt && script.is_east_asian() && rule.english_fonts.iter().any(|f| f == actual) {
                continue;
            }
            if allowed.is_empty() || allowed.iter().any(|f| f == actual) {
                continue;
            }
            bucket.push((
                CharMismatch {
                    ch,
                    expected: allowed.join(", "),
                    actual: actual.to_string(),
                },
                excerpt(&run.text, RUN_EXCERPT_CHARS),
            ));
        }
    }

    (chinese, english)
}

/// First `max` characters, with an ellipsis when truncated.
fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentFontRule, ExpectedTitle, FontRules, HeadingFontRule};
    use crate::document::{Document, Paragraph, Run, RunProperties, StyleDefault};
    use crate::navigator::HeadingConventions;
    use std::collections::BTreeMap;

    fn heading_rules() -> FontRules {
        let mut map = BTreeMap::new();
        map.insert(
            "Heading 1".to_string(),
            HeadingFontRule {
                chinese_font: Some("黑体".into()),
                english_font: Some("Arial".into()),
                font_size: Some(FontSize::Named("小四".into())),
            },
        );
        FontRules {
            heading_font_rules: map,
            ..Default::default()
        }
    }

    fn content_rules() -> FontRules {
        FontRules {
            content_font_rules: Some(ContentFontRule {
                chinese_fonts: vec!["宋体".into()],
                english_fonts: vec!["Arial".into(), "Times New Roman".into()],
                font_size: Some(FontSize::Points(10.5)),
            }),
            ..Default::default()
        }
    }

    fn run_checker(doc: &Document, rules: &FontRules, titles: &[&str]) -> Vec<Finding> {
        let conv = HeadingConventions::default();
        let ctx = CheckContext::new(doc, &conv);
        let titles = titles.iter().map(|t| t.to_string()).collect();
        FontChecker::new(rules, titles).check(&ctx)
    }

    fn body_style() -> StyleDefault {
        StyleDefault {
            properties: RunProperties {
                font_latin: Some("Arial".into()),
                font_east_asian: Some("宋体".into()),
                size_half_points: Some(21),
            },
            based_on: None,
        }
    }

    #[test]
    fn test_heading_correct_formatting_passes() {
        let doc = Document::default().paragraph(
            Paragraph::new(Some("Heading 1")).run(
                Run::new("标题ABC")
                    .east_asian("黑体")
                    .latin("Arial")
                    .size_pt(12.0),
            ),
        );
        let findings = run_checker(&doc, &heading_rules(), &[]);
        let heading = &findings[0];
        assert_eq!(heading.kind, FindingKind::HeadingFont);
        assert!(heading.passed, "{}", heading.message);
    }

    #[test]
    fn test_heading_mismatches_are_deduplicated() {
        let doc = Document::default().paragraph(
            Paragraph::new(Some("Heading 1"))
                .run(Run::new("标标").east_asian("宋体").latin("Arial").size_pt(12.0))
                .run(Run::new("A").east_asian("黑体").latin("Calibri").size_pt(12.0)),
        );
        let findings = run_checker(&doc, &heading_rules(), &[]);
        assert!(!findings[0].passed);
        assert_eq!(findings[0].detail("chinese_errors_count"), Some(&json!(1)));
        assert_eq!(findings[0].detail("english_errors_count"), Some(&json!(1)));
        assert!(findings[0].message.contains("character '标' expected font: 黑体, actual font: 宋体"));
    }

    #[test]
    fn test_heading_unset_size_fails_but_unset_font_does_not() {
        let doc = Document::default().paragraph(Paragraph::with_text(Some("Heading 1"), "概述"));
        let findings = run_checker(&doc, &heading_rules(), &[]);
        assert!(!findings[0].passed);
        assert_eq!(findings[0].detail("chinese_errors_count"), Some(&json!(0)));
        assert!(findings[0].message.contains("actual size: not set"));
    }

    #[test]
    fn test_heading_size_tolerance() {
        let mut rules = heading_rules();
        if let Some(rule) = rules.heading_font_rules.get_mut("Heading 1") {
            rule.font_size = Some(FontSize::Points(11.9));
        }
        let doc = Document::default().paragraph(
            Paragraph::new(Some("Heading 1")).run(Run::new("标题").east_asian("黑体").size_pt(12.0)),
        );
        assert!(run_checker(&doc, &rules, &[])[0].passed);
    }

    fn content_doc(body: Paragraph) -> Document {
        Document::default()
            .with_style("Normal", body_style())
            .paragraph(Paragraph::with_text(Some("Heading 2"), "3.1 测试执行"))
            .paragraph(body)
    }

    fn content_finding(findings: &[Finding]) -> &Finding {
        findings
            .iter()
            .find(|f| f.kind == FindingKind::ContentFont)
            .unwrap()
    }

    #[test]
    fn test_content_chinese_in_english_font_flagged() {
        let doc = content_doc(Paragraph::new(Some("Normal")).run(Run::new("执行测试").east_asian("Arial")));
        let findings = run_checker(&doc, &content_rules(), &["测试执行"]);
        let finding = content_finding(&findings);
        assert!(!finding.passed);
        assert_eq!(finding.detail("error_counts").unwrap()["chinese"], 4);
        assert!(finding.message.contains("paragraph 2 [3.1 测试执行]"));
    }

    #[test]
    fn test_mixed_font_exception() {
        let doc = content_doc(Paragraph::new(Some("Normal")).run(Run::new("执行 #1 测试").east_asian("Arial")));
        let findings = run_checker(&doc, &content_rules(), &["测试执行"]);
        assert!(content_finding(&findings).passed);
    }

    #[test]
    fn test_paragraph_outside_expected_titles_ignored() {
        let doc = Document::default()
            .with_style("Normal", body_style())
            .paragraph(Paragraph::with_text(Some("Heading 2"), "附录"))
            .paragraph(Paragraph::new(Some("Normal")).run(Run::new("内容").east_asian("楷体")));
        let findings = run_checker(&doc, &content_rules(), &["测试执行"]);
        let finding = content_finding(&findings);
        assert!(finding.passed);
        assert_eq!(finding.detail("paragraphs_checked"), Some(&json!(0)));
    }

    #[test]
    fn test_content_examples_truncated() {
        let doc = content_doc(Paragraph::new(Some("Normal")).run(Run::new("一二三四五").east_asian("楷体")));
        let findings = run_checker(&doc, &content_rules(), &["测试执行"]);
        let finding = content_finding(&findings);
        assert!(finding.message.contains("Chinese font errors: 5"));
        assert!(finding.message.contains("... and more"));
        assert_eq!(finding.message.matches("character '").count(), 3);
    }

    #[test]
    fn test_content_skipped_without_expected_titles() {
        let doc = content_doc(Paragraph::new(Some("Normal")).run(Run::new("内容").east_asian("楷体")));
        let findings = run_checker(&doc, &content_rules(), &[]);
        let finding = content_finding(&findings);
        assert!(finding.passed);
        assert_eq!(finding.location(), &Location::Configuration);
    }

    #[test]
    fn test_content_size_unset_reported() {
        let doc = Document::default()
            .paragraph(Paragraph::with_text(Some("Heading 2"), "测试执行"))
            .paragraph(Paragraph::with_text(Some("Body"), "内容"));
        let findings = run_checker(&doc, &content_rules(), &["测试执行"]);
        let finding = content_finding(&findings);
        assert!(!finding.passed);
        assert!(finding.message.contains("actual size: not set"));
    }

    #[test]
    fn test_content_size_set_on_run_only() {
        let doc = Document::default()
            .paragraph(Paragraph::with_text(Some("Heading 2"), "测试执行"))
            .paragraph(Paragraph::new(Some("Body")).run(Run::new("正文内容").east_asian("宋体").size_pt(10.5)));
        let findings = run_checker(&doc, &content_rules(), &["测试执行"]);
        let finding = content_finding(&findings);
        assert!(finding.passed, "{}", finding.message);
    }

    #[test]
    fn test_content_size_mismatch_on_later_run() {
        let doc = Document::default()
            .paragraph(Paragraph::with_text(Some("Heading 2"), "测试执行"))
            .paragraph(
                Paragraph::new(Some("Body"))
                    .run(Run::new("正文").east_asian("宋体").size_pt(10.5))
                    .run(Run::new("   ").size_pt(20.0))
                    .run(Run::new("内容").east_asian("宋体").size_pt(12.0)),
            );
        let findings = run_checker(&doc, &content_rules(), &["测试执行"]);
        let finding = content_finding(&findings);
        assert!(!finding.passed);
        assert_eq!(finding.detail("error_counts").unwrap()["size"], 1);
        assert!(finding.message.contains("actual size: 12pt"), "{}", finding.message);
    }

    #[test]
    fn test_expected_titles_from_config_shape() {
        let title = ExpectedTitle {
            text: "测试执行".into(),
            style_name: None,
            required: true,
        };
        let rules = content_rules();
        let checker = FontChecker::new(&rules, vec![title.text.clone()]);
        assert!(checker.is_expected_title("3.1 测试执行"));
        assert!(checker.is_expected_title("测试"));
        assert!(!checker.is_expected_title("附录"));
    }

    #[test]
    fn test_excerpt_counts_characters() {
        assert_eq!(excerpt("一二三", 2), "一二...");
        assert_eq!(excerpt("abc", 3), "abc");
    }
}
