//! Table rules: empty cells and per-column allowed values.

use tracing::debug;

use crate::config::{ColumnValueCheck, TableRule};
use crate::document::Table;
use crate::finding::{Finding, FindingKind, Location};
use crate::navigator::MatchMode;

use super::{CheckContext, Checker};

/// Checks tables located by heading text and index.
pub struct TableChecker<'r> {
    rules: &'r [TableRule],
}

impl<'r> TableChecker<'r> {
    pub fn new(rules: &'r [TableRule]) -> Self {
        Self { rules }
    }

    fn check_rule(&self, ctx: &CheckContext<'_>, rule: &TableRule) -> Vec<Finding> {
        let heading = rule.heading_text.trim();
        let table_location = Location::Table {
            heading: heading.to_string(),
            index: rule.table_index,
        };

        if ctx.navigator.find_heading(heading, MatchMode::Exact).is_none() {
            return vec![Finding::fail(
                FindingKind::Table,
                format!("heading '{}' not found", heading),
                Location::Heading(heading.to_string()),
            )];
        }

        let tables = ctx.navigator.tables_under(heading);
        let Some(located) = tables.get(rule.table_index) else {
            return vec![Finding::fail(
                FindingKind::Table,
                format!(
                    "table #{} not found under heading '{}' ({} table(s) present)",
                    rule.table_index,
                    heading,
                    tables.len()
                ),
                table_location,
            )
            .with_detail("tables_found", tables.len())];
        };
        let table = located.item;

        let mut failures = Vec::new();

        if rule.all_cells_not_empty {
            if let Some(finding) = empty_cells(table, rule, heading) {
                failures.push(finding);
            }
        }

        if let Some(check) = &rule.column_value_check {
            if let Some(finding) = column_values(table, check, rule, heading) {
                failures.push(finding);
            }
        }

        if failures.is_empty() {
            vec![Finding::pass(
                FindingKind::Table,
                format!("table #{} under heading '{}' passed", rule.table_index, heading),
                table_location,
            )]
        } else {
            failures
        }
    }
}

/// Every empty cell outside the allowlisted columns, 1-based.
fn empty_cells(table: &Table, rule: &TableRule, heading: &str) -> Option<Finding> {
    let header = table.header().unwrap_or(&[]);
    let allowed_column = |col: usize| {
        header
            .get(col)
            .map(|h| rule.allow_empty_columns.iter().any(|a| a.trim() == h.trim()))
            .unwrap_or(false)
    };

    let cells: Vec<(usize, usize)> = table
        .rows
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(move |(_, cell)| cell.trim().is_empty())
                .map(move |(c, _)| (r, c))
        })
        .filter(|(_, c)| !allowed_column(*c))
        .map(|(r, c)| (r + 1, c + 1))
        .collect();

    let (row, column) = *cells.first()?;
    let listing: Vec<String> = cells.iter().map(|(r, c)| format!("({}, {})", r, c)).collect();
    let positions: Vec<serde_json::Value> = cells
        .iter()
        .map(|(r, c)| serde_json::json!({ "row": r, "column": c }))
        .collect();

    Some(
        Finding::fail(
            FindingKind::Table,
            format!(
                "table #{} under heading '{}' has {} empty cell(s) at (row, column): {}",
                rule.table_index,
                heading,
                cells.len(),
                listing.join(", ")
            ),
            Location::Cell {
                heading: heading.to_string(),
                table_index: rule.table_index,
                row,
                column,
            },
        )
        .with_detail("empty_cells", positions),
    )
}

/// Values outside the allowed set in the checked column.
fn column_values(
    table: &Table,
    check: &ColumnValueCheck,
    rule: &TableRule,
    heading: &str,
) -> Option<Finding> {
    let table_location = Location::Table {
        heading: heading.to_string(),
        index: rule.table_index,
    };

    let Some(col) = table.column_index(&check.column_header) else {
        return Some(Finding::fail(
            FindingKind::Table,
            format!(
                "column '{}' not found in table #{} under heading '{}'",
                check.column_header.trim(),
                rule.table_index,
                heading
            ),
            table_location,
        ));
    };

    let invalid: Vec<(usize, String)> = table
        .rows
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(r, row)| {
            let value = row.get(col).map(|v| v.trim()).unwrap_or("");
            let allowed = check.allowed_values.iter().any(|a| a.trim() == value);
            (!allowed).then(|| (r + 1, value.to_string()))
        })
        .collect();

    let (row, _) = invalid.first()?;
    let listing: Vec<String> = invalid
        .iter()
        .map(|(r, v)| format!("row {}: '{}'", r, v))
        .collect();
    let entries: Vec<serde_json::Value> = invalid
        .iter()
        .map(|(r, v)| serde_json::json!({ "row": r, "value": v }))
        .collect();

    Some(
        Finding::fail(
            FindingKind::Table,
            format!(
                "column '{}' in table #{} under heading '{}' has disallowed values ({}); allowed: {}",
                check.column_header.trim(),
                rule.table_index,
                heading,
                listing.join(", "),
                check.allowed_values.join(", ")
            ),
            Location::Cell {
                heading: heading.to_string(),
                table_index: rule.table_index,
                row: *row,
                column: col + 1,
            },
        )
        .with_detail("invalid_values", entries),
    )
}

impl Checker for TableChecker<'_> {
    fn name(&self) -> &'static str {
        "table"
    }

    fn description(&self) -> &'static str {
        "Do the tables under each heading have filled cells and allowed values?"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Vec<Finding> {
        if self.rules.is_empty() {
            return vec![Finding::pass(
                FindingKind::Table,
                "no table rules configured",
                Location::Configuration,
            )];
        }

        let findings: Vec<Finding> = self
            .rules
            .iter()
            .flat_map(|rule| self.check_rule(ctx, rule))
            .collect();

        debug!(
            rules = self.rules.len(),
            failed = findings.iter().filter(|f| !f.passed).count(),
            "table check done"
        );
        findings
    }
}
