//! Rule-driven lookup-and-update engine
//!
//! A rule says: when the search column of a row holds `search_value`, the
//! update column of the same row must hold `target_value`. Rules sharing a
//! `(search_column, update_column)` pair are served by one pass over the rows
//! through an exact-match lookup on the normalized (trimmed, lowercased)
//! search text.

use crate::column::{column_to_letters, letters_to_column};
use crate::error::{Error, Result};
use crate::outcome::ItemCounts;
use crate::scan::{touch_rows, ScanOptions};
use crate::sheet::normalize_sheet_name;
use crate::workbook::Sheet;
use std::collections::{BTreeSet, HashMap};

/// Name given to rules configured without one
pub const UNNAMED_RULE: &str = "Unnamed rule";

/// One search-and-update rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRule {
    pub name: String,
    /// Zero-based column searched for `search_value`
    pub search_column: u32,
    pub search_value: String,
    /// Zero-based column rewritten to `target_value`
    pub update_column: u32,
    pub target_value: String,
}

impl UpdateRule {
    /// Create a rule from column letters
    pub fn new(
        name: impl Into<String>,
        search_column: &str,
        search_value: impl Into<String>,
        update_column: &str,
        target_value: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let column = |letters: &str, role: &str| {
            letters_to_column(letters).map_err(|e| {
                Error::configuration(format!("rule '{}' has an invalid {}: {}", name, role, e))
            })
        };

        Ok(Self {
            search_column: column(search_column, "search_column")?,
            update_column: column(update_column, "update_column")?,
            search_value: search_value.into(),
            target_value: target_value.into(),
            name,
        })
    }
}

/// Normalize cell or rule text for matching
pub fn normalize_value(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Rules sharing one `(search_column, update_column)` pair
#[derive(Debug, Clone)]
pub struct RuleGroup<'a> {
    pub search_column: u32,
    pub update_column: u32,
    rules: Vec<&'a UpdateRule>,
    lookup: HashMap<String, &'a UpdateRule>,
}

impl<'a> RuleGroup<'a> {
    fn new(search_column: u32, update_column: u32) -> Self {
        Self {
            search_column,
            update_column,
            rules: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    fn push(&mut self, rule: &'a UpdateRule) {
        // Later rules win on a duplicate normalized search value
        self.lookup.insert(normalize_value(&rule.search_value), rule);
        self.rules.push(rule);
    }

    /// Rules in the group, in configuration order
    pub fn rules(&self) -> &[&'a UpdateRule] {
        &self.rules
    }

    /// Rule matching a search cell's text, if any
    pub fn find(&self, search_text: &str) -> Option<&'a UpdateRule> {
        self.lookup.get(&normalize_value(search_text)).copied()
    }

    /// `"A -> Z"` description of the column pair
    pub fn describe(&self) -> String {
        format!(
            "{} -> {}",
            column_to_letters(self.search_column),
            column_to_letters(self.update_column)
        )
    }
}

/// Group rules by column pair, keeping first-appearance order of the pairs
pub fn group_rules(rules: &[UpdateRule]) -> Vec<RuleGroup<'_>> {
    let mut groups: Vec<RuleGroup<'_>> = Vec::new();

    for rule in rules {
        let key = (rule.search_column, rule.update_column);
        let index = match groups
            .iter()
            .position(|g| (g.search_column, g.update_column) == key)
        {
            Some(index) => index,
            None => {
                groups.push(RuleGroup::new(key.0, key.1));
                groups.len() - 1
            }
        };
        groups[index].push(rule);
    }

    groups
}

/// Counters from a rule pass over one sheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateStats {
    /// Cells updated per rule name
    pub counts: ItemCounts,
    /// Zero-based rows that had a cell updated
    pub affected_rows: BTreeSet<u32>,
    /// Rows scanned per group
    pub rows_scanned: u32,
    /// Column-pair groups
    pub groups: usize,
    /// Cells that could not be read or written
    pub cells_failed: usize,
    /// Rows skipped after an error other than a cell access failure
    pub rows_failed: usize,
}

impl UpdateStats {
    /// Total cells updated
    pub fn total(&self) -> usize {
        self.counts.total()
    }
}

/// Apply a sheet's rules
///
/// Each column-pair group scans the first `options.max_rows` rows once. The
/// update cell is only written when its trimmed text differs from the trimmed
/// target, so a second run over the same sheet changes nothing.
pub fn update_sheet(
    sheet: &mut dyn Sheet,
    rules: &[UpdateRule],
    options: &ScanOptions,
) -> Result<UpdateStats> {
    let mut stats = UpdateStats {
        counts: ItemCounts::with_labels(rules.iter().map(|r| r.name.as_str())),
        ..Default::default()
    };

    let region = sheet.used_region()?;
    if region.is_empty() {
        log::info!("Sheet appears empty, skipping");
        return Ok(stats);
    }

    let rows = options.rows_to_process(region.rows);
    log::info!(
        "Sheet has {} rows x {} columns; processing first {} rows",
        region.rows,
        region.cols,
        rows
    );

    let groups = group_rules(rules);
    log::info!(
        "{} rules grouped into {} column pair(s)",
        rules.len(),
        groups.len()
    );
    stats.rows_scanned = rows;
    stats.groups = groups.len();

    for group in &groups {
        log::info!(
            "Processing column pair: {} ({} rules)",
            group.describe(),
            group.rules().len()
        );

        for row in 0..rows {
            match update_row(sheet, group, row) {
                Ok(Some(rule)) => {
                    stats.counts.add(rule.name.as_str(), 1);
                    stats.affected_rows.insert(row);
                }
                Ok(None) => {}
                Err(e @ Error::CellAccess { .. }) => {
                    stats.cells_failed += 1;
                    log::debug!("Skipping cell: {}", e);
                }
                Err(e) => {
                    stats.rows_failed += 1;
                    log::warn!("Error processing row {}: {}", row + 1, e);
                }
            }
        }

        for rule in group.rules() {
            let count = stats.counts.get(&rule.name);
            if count > 0 {
                log::info!("  '{}': {} updates", rule.name, count);
            }
        }
    }

    if !stats.affected_rows.is_empty() {
        log::info!(
            "Setting row heights for {} affected rows",
            stats.affected_rows.len()
        );
        touch_rows(sheet, &stats.affected_rows, options);
    }
    if stats.cells_failed > 0 {
        log::warn!(
            "{} cells could not be read or written and were skipped",
            stats.cells_failed
        );
    }

    Ok(stats)
}

/// Check one row against a group; returns the rule that rewrote a cell
fn update_row<'a>(
    sheet: &mut dyn Sheet,
    group: &RuleGroup<'a>,
    row: u32,
) -> Result<Option<&'a UpdateRule>> {
    let search = sheet.read_cell(row, group.search_column)?;
    let search_text = search.display_text();
    if search_text.is_empty() {
        return Ok(None);
    }

    let Some(rule) = group.find(&search_text) else {
        return Ok(None);
    };

    let current = sheet.read_cell(row, group.update_column)?.display_text();
    if current.trim() == rule.target_value.trim() {
        return Ok(None);
    }

    sheet.write_cell(row, group.update_column, &rule.target_value)?;
    Ok(Some(rule))
}

/// Rules organised by the sheet they apply to
///
/// Sheet names are matched after normalization (see
/// [`normalize_sheet_name`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRules {
    entries: Vec<SheetRuleEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SheetRuleEntry {
    key: String,
    sheet_name: String,
    rules: Vec<UpdateRule>,
}

impl SheetRules {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for a sheet
    pub fn push(&mut self, sheet_name: &str, rule: UpdateRule) {
        let key = normalize_sheet_name(sheet_name);
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.rules.push(rule),
            None => self.entries.push(SheetRuleEntry {
                key,
                sheet_name: sheet_name.to_string(),
                rules: vec![rule],
            }),
        }
    }

    /// Rules for a sheet name
    pub fn for_sheet(&self, sheet_name: &str) -> Option<&[UpdateRule]> {
        let key = normalize_sheet_name(sheet_name);
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.rules.as_slice())
    }

    /// Iterate over `(sheet name, rules)` in first-appearance order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[UpdateRule])> {
        self.entries
            .iter()
            .map(|e| (e.sheet_name.as_str(), e.rules.as_slice()))
    }

    /// Number of sheets with rules
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no rules are configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of rules
    pub fn rule_count(&self) -> usize {
        self.entries.iter().map(|e| e.rules.len()).sum()
    }

    /// Every rule name in configuration order
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|e| e.rules.iter().map(|r| r.name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySheet;
    use pretty_assertions::assert_eq;

    fn rule(name: &str, search_col: &str, search: &str, update_col: &str, target: &str) -> UpdateRule {
        UpdateRule::new(name, search_col, search, update_col, target).unwrap()
    }

    #[test]
    fn test_rule_columns() {
        let r = rule("price", "A", "Product123", "Z", "99.99");
        assert_eq!(r.search_column, 0);
        assert_eq!(r.update_column, 25);

        let err = UpdateRule::new("bad", "A1", "x", "B", "y").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_group_rules_by_column_pair() {
        let rules = vec![
            rule("r1", "A", "x", "B", "1"),
            rule("r2", "C", "x", "D", "2"),
            rule("r3", "A", "y", "B", "3"),
        ];
        let groups = group_rules(&rules);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].describe(), "A -> B");
        assert_eq!(groups[0].rules().len(), 2);
        assert_eq!(groups[0].find("  X ").unwrap().name, "r1");
        assert_eq!(groups[0].find("y").unwrap().name, "r3");
        assert!(groups[0].find("z").is_none());
        assert_eq!(groups[1].describe(), "C -> D");
    }

    #[test]
    fn test_duplicate_search_value_last_wins() {
        let rules = vec![
            rule("first", "A", "Widget", "B", "old"),
            rule("second", "A", " widget ", "B", "new"),
        ];
        let groups = group_rules(&rules);
        assert_eq!(groups[0].find("WIDGET").unwrap().name, "second");

        let mut sheet = MemorySheet::new("S").with_cell(0, 0, "widget");
        let stats = update_sheet(&mut sheet, &rules, &ScanOptions::default()).unwrap();
        assert_eq!(sheet.text(0, 1), "new");
        assert_eq!(stats.counts.get("first"), 0);
        assert_eq!(stats.counts.get("second"), 1);
    }

    #[test]
    fn test_update_sheet_single_pass() {
        let rules = vec![rule("r1", "A", "x", "B", "one"), rule("r2", "A", "y", "B", "two")];
        let mut sheet = MemorySheet::new("S")
            .with_cell(0, 0, "X")
            .with_cell(0, 1, "stale")
            .with_cell(1, 0, "y")
            .with_cell(1, 1, "two")
            .with_cell(2, 0, "z")
            .with_cell(2, 1, "keep");

        let stats = update_sheet(&mut sheet, &rules, &ScanOptions::default()).unwrap();

        assert_eq!(stats.groups, 1);
        assert_eq!(stats.total(), 1);
        assert_eq!(stats.counts.iter().collect::<Vec<_>>(), vec![("r1", 1), ("r2", 0)]);
        assert_eq!(sheet.text(0, 1), "one");
        assert_eq!(sheet.text(1, 1), "two");
        assert_eq!(sheet.text(2, 1), "keep");
        assert_eq!(stats.affected_rows, BTreeSet::from([0]));
        assert_eq!(sheet.row_height(0), Some(16.0));
        assert_eq!(sheet.row_height(1), None);
    }

    #[test]
    fn test_update_is_idempotent() {
        let rules = vec![rule("r1", "A", "x", "B", "  one ")];
        let mut sheet = MemorySheet::new("S").with_cell(0, 0, "x");

        let first = update_sheet(&mut sheet, &rules, &ScanOptions::default()).unwrap();
        let second = update_sheet(&mut sheet, &rules, &ScanOptions::default()).unwrap();
        assert_eq!(first.total(), 1);
        assert_eq!(second.total(), 0);
    }

    #[test]
    fn test_numeric_search_cells_match_display_text() {
        let rules = vec![rule("sku", "A", "1001", "C", "discontinued")];
        let mut sheet = MemorySheet::new("S")
            .with_cell(0, 0, 1001.0)
            .with_cell(0, 1, "unrelated");

        let stats = update_sheet(&mut sheet, &rules, &ScanOptions::default()).unwrap();
        assert_eq!(stats.total(), 1);
        assert_eq!(sheet.text(0, 2), "discontinued");
    }

    #[test]
    fn test_update_respects_row_cap() {
        let rules = vec![rule("r", "A", "x", "B", "done")];
        let mut sheet = MemorySheet::new("S");
        for row in 0..10_000 {
            sheet.set(row, 0, "x");
        }

        let stats = update_sheet(&mut sheet, &rules, &ScanOptions::default().with_max_rows(50)).unwrap();
        assert_eq!(stats.rows_scanned, 50);
        assert_eq!(stats.total(), 50);
        assert_eq!(sheet.text(50, 1), "");
    }

    #[test]
    fn test_failing_row_does_not_stop_the_pass() {
        let rules = vec![rule("r", "A", "x", "B", "done")];
        let mut sheet = MemorySheet::new("S")
            .with_cell(0, 0, "x")
            .with_cell(1, 0, "x")
            .with_cell(2, 0, "x");
        sheet.break_row(1);

        let stats = update_sheet(&mut sheet, &rules, &ScanOptions::default()).unwrap();

        assert_eq!(stats.total(), 2);
        assert_eq!(stats.rows_failed, 1);
        assert_eq!(stats.affected_rows, BTreeSet::from([0, 2]));
        assert_eq!(sheet.text(0, 1), "done");
        assert_eq!(sheet.text(2, 1), "done");
        assert_eq!(sheet.row_height(2), Some(16.0));
    }

    #[test]
    fn test_protected_sheet_counts_nothing() {
        let rules = vec![rule("r", "A", "x", "B", "done")];
        let mut sheet = MemorySheet::new("S").with_cell(0, 0, "x");
        sheet.protect("secret");

        let stats = update_sheet(&mut sheet, &rules, &ScanOptions::default()).unwrap();
        assert_eq!(stats.total(), 0);
        assert_eq!(stats.cells_failed, 1);
        assert_eq!(sheet.text(0, 1), "");
    }

    #[test]
    fn test_sheet_rules_lookup() {
        let mut sheet_rules = SheetRules::new();
        sheet_rules.push("Price List", rule("a", "A", "x", "B", "1"));
        sheet_rules.push("price  list", rule("b", "A", "y", "B", "2"));
        sheet_rules.push("Stock", rule("c", "A", "z", "B", "3"));

        assert_eq!(sheet_rules.len(), 2);
        assert_eq!(sheet_rules.rule_count(), 3);
        assert_eq!(sheet_rules.for_sheet("PRICE LIST").unwrap().len(), 2);
        assert!(sheet_rules.for_sheet("Other").is_none());
        assert_eq!(sheet_rules.rule_names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
