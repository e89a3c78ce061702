//! Structural navigation over the flat block sequence.
//!
//! The source format has no section tree: headings are ordinary paragraphs
//! whose style name follows a heading convention. Scoping ("which paragraphs
//! belong to heading H") is therefore a linear scan driven by a small state
//! machine:
//!
//! ```text
//! Seeking --text match--> Collecting --closing heading / quota--> Closed
//! ```
//!
//! `Closed` is terminal: every later block is ignored for that query.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::{Block, Document, Paragraph, Table};

lazy_static! {
    /// Trailing digits of a style name, e.g. "Heading 3" or "标题3".
    static ref TRAILING_RANK: Regex = Regex::new(r"(\d+)\s*$").unwrap();
}

/// Default heading style prefixes (English and Chinese Word templates).
pub const DEFAULT_HEADING_PREFIXES: [&str; 2] = ["Heading", "标题"];

/// Headings ranked at or above this level close any paragraph scope.
pub const DEFAULT_CLOSING_RANK: u32 = 4;

/// How a heading's text is compared against a rule's target text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Exact,
    Contains,
}

impl MatchMode {
    /// Compare trimmed block text against a trimmed target.
    pub fn matches(self, text: &str, target: &str) -> bool {
        let text = text.trim();
        let target = target.trim();
        match self {
            MatchMode::Exact => text == target,
            MatchMode::Contains => text.contains(target),
        }
    }
}

/// Numeric heading level parsed from a style name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingRank {
    Level(u32),
    /// Heading-class style without a parseable level. Never closes a
    /// rank-based scope.
    Unranked,
}

impl HeadingRank {
    pub fn level(self) -> Option<u32> {
        match self {
            HeadingRank::Level(n) => Some(n),
            HeadingRank::Unranked => None,
        }
    }
}

/// Which style names count as headings, and at which rank they close scopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingConventions {
    prefixes: Vec<String>,
    closing_rank: u32,
}

impl HeadingConventions {
    pub fn new<I, S>(prefixes: I, closing_rank: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            closing_rank,
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn closing_rank(&self) -> u32 {
        self.closing_rank
    }

    pub fn is_heading_style(&self, style_name: &str) -> bool {
        !style_name.is_empty() && self.prefixes.iter().any(|p| style_name.starts_with(p.as_str()))
    }

    /// Rank of a heading-class style, `None` for non-heading styles.
    pub fn rank(&self, style_name: &str) -> Option<HeadingRank> {
        if !self.is_heading_style(style_name) {
            return None;
        }
        let rank = TRAILING_RANK
            .captures(style_name)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|level| *level > 0)
            .map(HeadingRank::Level)
            .unwrap_or(HeadingRank::Unranked);
        Some(rank)
    }
}

impl Default for HeadingConventions {
    fn default() -> Self {
        Self::new(DEFAULT_HEADING_PREFIXES, DEFAULT_CLOSING_RANK)
    }
}

/// A block classified against the heading conventions.
#[derive(Debug, Clone, Copy)]
pub enum BlockItem<'a> {
    Heading {
        rank: HeadingRank,
        paragraph: &'a Paragraph,
    },
    Plain(&'a Paragraph),
    Table(&'a Table),
}

impl<'a> BlockItem<'a> {
    pub fn paragraph(&self) -> Option<&'a Paragraph> {
        match self {
            BlockItem::Heading { paragraph, .. } => Some(paragraph),
            BlockItem::Plain(paragraph) => Some(paragraph),
            BlockItem::Table(_) => None,
        }
    }

    /// Trimmed text of paragraph blocks; `None` for tables.
    pub fn text(&self) -> Option<String> {
        self.paragraph().map(|p| p.text().trim().to_string())
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, BlockItem::Heading { .. })
    }

    pub fn heading_rank(&self) -> Option<HeadingRank> {
        match self {
            BlockItem::Heading { rank, .. } => Some(*rank),
            _ => None,
        }
    }
}

/// An item together with its position in the block sequence.
#[derive(Debug, Clone, Copy)]
pub struct Located<'a, T> {
    pub index: usize,
    pub item: &'a T,
}

/// When a collecting scope closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosePolicy {
    /// A heading closes when its rank is at or above `limit`, or at or above
    /// the rank of the heading that opened the scope. Unranked headings never
    /// close.
    RankAtMost { limit: u32 },
    /// Any heading-class block closes.
    AnyHeading,
}

/// Scope state for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Seeking,
    Collecting {
        opener: Option<HeadingRank>,
        collected: usize,
    },
    Closed,
}

/// What the caller should do with the block just fed to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeStep {
    /// Outside any scope; ignore.
    Skip,
    /// This block matched the target and opened the scope.
    Opened,
    /// Inside the scope; the caller may collect it.
    Inside,
    /// The scope is (or just became) closed.
    Closed,
}

/// Drives the `Seeking → Collecting → Closed` machine over block items.
#[derive(Debug, Clone)]
pub struct ScopeScanner<'t> {
    target: &'t str,
    mode: MatchMode,
    policy: ClosePolicy,
    quota: Option<usize>,
    state: ScopeState,
}

impl<'t> ScopeScanner<'t> {
    pub fn new(target: &'t str, mode: MatchMode, policy: ClosePolicy) -> Self {
        Self {
            target,
            mode,
            policy,
            quota: None,
            state: ScopeState::Seeking,
        }
    }

    /// Close the scope after `quota` items have been recorded.
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        if quota == 0 {
            self.state = ScopeState::Closed;
        }
        self
    }

    pub fn state(&self) -> ScopeState {
        self.state
    }

    pub fn advance(&mut self, item: &BlockItem<'_>) -> ScopeStep {
        match self.state {
            ScopeState::Closed => ScopeStep::Closed,
            ScopeState::Seeking => {
                let matched = item
                    .paragraph()
                    .map(|p| self.mode.matches(&p.text(), self.target))
                    .unwrap_or(false);
                if matched {
                    self.state = ScopeState::Collecting {
                        opener: item.heading_rank(),
                        collected: 0,
                    };
                    ScopeStep::Opened
                } else {
                    ScopeStep::Skip
                }
            }
            ScopeState::Collecting { opener, .. } => {
                if self.closes(item, opener) {
                    self.state = ScopeState::Closed;
                    ScopeStep::Closed
                } else {
                    ScopeStep::Inside
                }
            }
        }
    }

    /// Count one collected item against the quota.
    pub fn record(&mut self) {
        if let ScopeState::Collecting { opener, collected } = self.state {
            let collected = collected + 1;
            self.state = match self.quota {
                Some(quota) if collected >= quota => ScopeState::Closed,
                _ => ScopeState::Collecting { opener, collected },
            };
        }
    }

    fn closes(&self, item: &BlockItem<'_>, opener: Option<HeadingRank>) -> bool {
        let Some(rank) = item.heading_rank() else {
            return false;
        };
        match self.policy {
            ClosePolicy::AnyHeading => true,
            ClosePolicy::RankAtMost { limit } => match rank {
                HeadingRank::Unranked => false,
                HeadingRank::Level(level) => {
                    let opener_level = opener.and_then(HeadingRank::level).unwrap_or(0);
                    level <= limit || level <= opener_level
                }
            },
        }
    }
}

/// Read-only view over a document's blocks, classified once.
#[derive(Debug, Clone)]
pub struct Navigator<'a> {
    items: Vec<BlockItem<'a>>,
    conventions: &'a HeadingConventions,
}

impl<'a> Navigator<'a> {
    pub fn new(document: &'a Document, conventions: &'a HeadingConventions) -> Self {
        let items = document
            .blocks
            .iter()
            .map(|block| match block {
                Block::Table(table) => BlockItem::Table(table),
                Block::Paragraph(paragraph) => match conventions.rank(paragraph.style()) {
                    Some(rank) => BlockItem::Heading { rank, paragraph },
                    None => BlockItem::Plain(paragraph),
                },
            })
            .collect();

        Self { items, conventions }
    }

    pub fn items(&self) -> &[BlockItem<'a>] {
        &self.items
    }

    pub fn conventions(&self) -> &HeadingConventions {
        self.conventions
    }

    /// Index of the first paragraph block whose text matches `target`.
    pub fn find_heading(&self, target: &str, mode: MatchMode) -> Option<usize> {
        self.items.iter().position(|item| {
            item.paragraph()
                .map(|p| mode.matches(&p.text(), target))
                .unwrap_or(false)
        })
    }

    /// Up to `max_count` paragraphs following the first block matching
    /// `target`. Spacer paragraphs (no runs) are skipped without counting;
    /// tables are ignored. Empty when nothing matches.
    pub fn paragraphs_after(
        &self,
        target: &str,
        mode: MatchMode,
        max_count: usize,
    ) -> Vec<Located<'a, Paragraph>> {
        let policy = ClosePolicy::RankAtMost {
            limit: self.conventions.closing_rank(),
        };
        let mut scanner = ScopeScanner::new(target, mode, policy).with_quota(max_count);
        let mut found = Vec::new();

        for (index, item) in self.items.iter().enumerate() {
            match scanner.advance(item) {
                ScopeStep::Closed => break,
                ScopeStep::Skip | ScopeStep::Opened => continue,
                ScopeStep::Inside => {}
            }
            let Some(paragraph) = item.paragraph() else {
                continue;
            };
            if paragraph.is_structurally_empty() {
                continue;
            }
            found.push(Located { index, item: paragraph });
            scanner.record();
        }

        found
    }

    /// Tables between the first paragraph whose text equals `heading_text`
    /// and the next heading-class block.
    pub fn tables_under(&self, heading_text: &str) -> Vec<Located<'a, Table>> {
        let mut scanner = ScopeScanner::new(heading_text, MatchMode::Exact, ClosePolicy::AnyHeading);
        let mut found = Vec::new();

        for (index, item) in self.items.iter().enumerate() {
            match scanner.advance(item) {
                ScopeStep::Closed => break,
                ScopeStep::Inside => {
                    if let BlockItem::Table(table) = item {
                        found.push(Located { index, item: *table });
                    }
                }
                ScopeStep::Skip | ScopeStep::Opened => {}
            }
        }

        found
    }

    /// Text of the closest heading strictly before `block_index`.
    pub fn nearest_preceding_heading(&self, block_index: usize) -> Option<String> {
        let end = block_index.min(self.items.len());
        self.items[..end]
            .iter()
            .rev()
            .find(|item| item.is_heading())
            .and_then(BlockItem::text)
    }

    /// 1-based ordinal of a paragraph block among all paragraphs.
    pub fn paragraph_number(&self, block_index: usize) -> usize {
        let end = (block_index + 1).min(self.items.len());
        self.items[..end]
            .iter()
            .filter(|item| item.paragraph().is_some())
            .count()
    }

    /// 1-based ordinal of a table block among all tables.
    pub fn table_number(&self, block_index: usize) -> usize {
        let end = (block_index + 1).min(self.items.len());
        self.items[..end]
            .iter()
            .filter(|item| matches!(item, BlockItem::Table(_)))
            .count()
    }
}
