//! Property-Based Tests
//!
//! Invariants checked over generated documents:
//! - heading scopes never leak past a closing heading
//! - font resolution follows run > paragraph > style precedence
//! - size comparison tolerance is exactly 0.1pt
//! - evaluation is deterministic

use docconform_core::navigator::{HeadingConventions, MatchMode, Navigator};
use docconform_core::resolver::{sizes_match, Script, StyleResolver};
use docconform_core::{
    Document, Orchestrator, Paragraph, RuleConfig, Run, RunProperties, StyleDefault, Table,
};
use proptest::prelude::*;

const TARGET: &str = "TARGET";

#[derive(Debug, Clone)]
enum BlockSpec {
    Heading(u32),
    Body,
    Spacer,
    Table,
}

fn block_spec() -> impl Strategy<Value = BlockSpec> {
    prop_oneof![
        1 => (1u32..=6).prop_map(BlockSpec::Heading),
        3 => Just(BlockSpec::Body),
        1 => Just(BlockSpec::Spacer),
        1 => Just(BlockSpec::Table),
    ]
}

fn push(doc: Document, spec: &BlockSpec, i: usize) -> Document {
    match spec {
        BlockSpec::Heading(level) => doc.paragraph(Paragraph::with_text(
            Some(&format!("Heading {}", level)),
            format!("H{}", i),
        )),
        BlockSpec::Body => doc.paragraph(Paragraph::with_text(Some("Normal"), format!("p{}", i))),
        BlockSpec::Spacer => doc.paragraph(Paragraph::new(Some("Normal"))),
        BlockSpec::Table => doc.table(Table::new(vec![vec!["a", "b"]])),
    }
}

fn build(prefix: &[BlockSpec], level: u32, suffix: &[BlockSpec]) -> (Document, Vec<Option<u32>>) {
    let mut doc = Document::default();
    let mut levels = Vec::new();

    for (i, spec) in prefix.iter().enumerate() {
        doc = push(doc, spec, i);
        levels.push(match spec {
            BlockSpec::Heading(l) => Some(*l),
            _ => None,
        });
    }
    doc = doc.paragraph(Paragraph::with_text(Some(&format!("Heading {}", level)), TARGET));
    levels.push(Some(level));
    for (i, spec) in suffix.iter().enumerate() {
        doc = push(doc, spec, prefix.len() + 1 + i);
        levels.push(match spec {
            BlockSpec::Heading(l) => Some(*l),
            _ => None,
        });
    }
    (doc, levels)
}

proptest! {
    /// Property: collected paragraphs lie strictly inside the target's scope.
    #[test]
    fn proptest_scope_never_leaks(
        prefix in prop::collection::vec(block_spec(), 0..8),
        level in 1u32..=6,
        suffix in prop::collection::vec(block_spec(), 0..16),
        max_count in 0usize..12,
    ) {
        let (doc, levels) = build(&prefix, level, &suffix);
        let conv = HeadingConventions::default();
        let nav = Navigator::new(&doc, &conv);
        let target_index = prefix.len();

        let found = nav.paragraphs_after(TARGET, MatchMode::Exact, max_count);
        prop_assert!(found.len() <= max_count);

        let close = levels
            .iter()
            .enumerate()
            .skip(target_index + 1)
            .find(|(_, l)| l.is_some_and(|l| l <= level || l <= conv.closing_rank()))
            .map(|(i, _)| i)
            .unwrap_or(levels.len());

        for located in &found {
            prop_assert!(located.index > target_index);
            prop_assert!(located.index < close);
            prop_assert!(!located.item.runs.is_empty());
        }

        // Indices are strictly increasing.
        for pair in found.windows(2) {
            prop_assert!(pair[0].index < pair[1].index);
        }
    }

    /// Property: run beats paragraph beats style; all absent means unspecified.
    #[test]
    fn proptest_font_precedence(
        run_font in proptest::option::of("[A-Za-z]{1,8}"),
        para_font in proptest::option::of("[A-Za-z]{1,8}"),
        style_font in proptest::option::of("[A-Za-z]{1,8}"),
        east_asian in any::<bool>(),
    ) {
        let set = |font: &Option<String>| {
            let mut props = RunProperties::default();
            if east_asian {
                props.font_east_asian = font.clone();
            } else {
                props.font_latin = font.clone();
            }
            props
        };

        let doc = Document::default().with_style(
            "Body",
            StyleDefault { properties: set(&style_font), based_on: None },
        );
        let paragraph = Paragraph::new(Some("Body")).properties(set(&para_font));
        let run = Run { text: "x".into(), properties: set(&run_font) };
        let script = if east_asian { Script::EastAsian } else { Script::Latin };

        let resolver = StyleResolver::new(&doc.styles);
        let expected = run_font.as_deref().or(para_font.as_deref()).or(style_font.as_deref());
        prop_assert_eq!(resolver.effective_font(&paragraph, &run, script), expected);
    }

    /// Property: within 0.1pt passes, 0.2pt or more fails.
    #[test]
    fn proptest_size_tolerance(expected in 5.0f64..42.0, delta in -0.1f64..=0.1, far in 0.2f64..5.0) {
        prop_assert!(sizes_match(expected + delta, expected));
        prop_assert!(!sizes_match(expected + far, expected));
        prop_assert!(!sizes_match(expected - far, expected));
    }

    /// Property: two runs over the same input give identical findings.
    #[test]
    fn proptest_evaluation_is_deterministic(
        prefix in prop::collection::vec(block_spec(), 0..6),
        level in 1u32..=6,
        suffix in prop::collection::vec(block_spec(), 0..10),
    ) {
        let (doc, _) = build(&prefix, level, &suffix);
        let config = RuleConfig::from_json(r#"{
            "document_to_check": "generated.json",
            "title_rules": {"expected_titles": [{"text": "TARGET", "required": true}]},
            "table_rules": [{"heading_text": "TARGET", "table_index": 0, "all_cells_not_empty": true}],
            "content_rules": [{"heading_text_exact": "TARGET", "check_next_paragraphs": 3}],
            "font_rules": {"content_font_rules": {"chinese_font": "宋体", "font_size": "五号"}}
        }"#).unwrap();

        let orchestrator = Orchestrator::new(&config);
        prop_assert_eq!(orchestrator.run(&doc), orchestrator.run(&doc));
    }
}
