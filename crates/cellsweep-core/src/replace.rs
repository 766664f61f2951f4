//! Chunked find/replace engine
//!
//! Scans a bounded region of a sheet and applies a list of case-insensitive
//! replacement pairs to every literal text cell in the targeted columns.
//!
//! Pairs apply in declaration order to the progressively modified value, so
//! `[("A", "B"), ("B", "C")]` turns `"A"` into `"C"` and counts one match for
//! each pair. A cell is written at most once, whatever the number of pairs
//! that matched.

use crate::column::ColumnSelection;
use crate::error::{Error, Result};
use crate::outcome::{CellOutcome, ItemCounts, OutcomeKind};
use crate::scan::{row_chunks, touch_rows, ScanOptions, LARGE_SHEET_CELLS, PROGRESS_EVERY_CHUNKS};
use crate::workbook::Sheet;
use regex::{NoExpand, Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

/// A find/replace pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementPair {
    /// Text to look for (matched case-insensitively)
    pub find: String,
    /// Literal replacement text
    pub replace: String,
}

impl ReplacementPair {
    /// Create a new pair
    pub fn new<F: Into<String>, R: Into<String>>(find: F, replace: R) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

impl fmt::Display for ReplacementPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' -> '{}'", self.find, self.replace)
    }
}

/// Result of applying all pairs to one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Final text after every pair
    pub text: String,
    /// Matches per pair, in pair order
    pub counts: Vec<usize>,
}

/// Compiled replacement pairs
#[derive(Debug, Clone)]
pub struct Replacer {
    pairs: Vec<(ReplacementPair, Regex)>,
}

impl Replacer {
    /// Compile replacement pairs
    ///
    /// The find text is matched literally; an empty find text is rejected
    /// because it would match between every character.
    pub fn new(pairs: &[ReplacementPair]) -> Result<Self> {
        let pairs = pairs
            .iter()
            .map(|pair| {
                if pair.find.is_empty() {
                    return Err(Error::configuration(format!(
                        "replacement pair {} has an empty find text",
                        pair
                    )));
                }
                let regex = RegexBuilder::new(&regex::escape(&pair.find))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        Error::configuration(format!("cannot compile {}: {}", pair, e))
                    })?;
                Ok((pair.clone(), regex))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { pairs })
    }

    /// The pairs in application order
    pub fn pairs(&self) -> impl Iterator<Item = &ReplacementPair> {
        self.pairs.iter().map(|(pair, _)| pair)
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no pairs
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Zeroed counters labelled by find text
    pub fn empty_counts(&self) -> ItemCounts {
        ItemCounts::with_labels(self.pairs().map(|p| p.find.as_str()))
    }

    /// Apply every pair in order; `None` when nothing matched
    ///
    /// # Examples
    /// ```
    /// use cellsweep_core::{ReplacementPair, Replacer};
    ///
    /// let replacer = Replacer::new(&[ReplacementPair::new("foo", "bar")]).unwrap();
    /// let result = replacer.apply("Foo and foo").unwrap();
    /// assert_eq!(result.text, "bar and bar");
    /// assert_eq!(result.counts, vec![2]);
    /// ```
    pub fn apply(&self, text: &str) -> Option<Replacement> {
        let mut current = text.to_string();
        let mut counts = vec![0; self.pairs.len()];
        let mut modified = false;

        for ((pair, regex), count) in self.pairs.iter().zip(counts.iter_mut()) {
            let matches = regex.find_iter(&current).count();
            if matches > 0 {
                current = regex
                    .replace_all(&current, NoExpand(&pair.replace))
                    .into_owned();
                *count = matches;
                modified = true;
            }
        }

        modified.then_some(Replacement {
            text: current,
            counts,
        })
    }
}

/// Counters from a find/replace scan of one sheet
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceStats {
    /// Matches replaced per find text
    pub counts: ItemCounts,
    /// Zero-based rows that had at least one cell rewritten
    pub affected_rows: BTreeSet<u32>,
    /// Rows scanned
    pub rows_scanned: u32,
    /// Columns scanned
    pub columns: Vec<u32>,
    /// Cells rewritten
    pub cells_changed: usize,
    /// Cells that could not be read or written
    pub cells_failed: usize,
    /// Chunks processed
    pub chunks: usize,
    /// Chunks with at least one change
    pub chunks_with_changes: usize,
    /// Rows skipped after an error other than a cell access failure
    pub rows_failed: usize,
    /// Chunks with at least one skipped row
    pub chunks_failed: usize,
}

impl ReplaceStats {
    fn new(replacer: &Replacer) -> Self {
        Self {
            counts: replacer.empty_counts(),
            affected_rows: BTreeSet::new(),
            rows_scanned: 0,
            columns: Vec::new(),
            cells_changed: 0,
            cells_failed: 0,
            chunks: 0,
            chunks_with_changes: 0,
            rows_failed: 0,
            chunks_failed: 0,
        }
    }

    /// Total matches replaced
    pub fn total(&self) -> usize {
        self.counts.total()
    }
}

#[derive(Debug, Default)]
struct ChunkStats {
    counts: Vec<usize>,
    affected_rows: BTreeSet<u32>,
    cells_changed: usize,
    cells_failed: usize,
    rows_failed: usize,
}

/// Run the replacement pairs over a sheet
///
/// Only the first `options.max_rows` rows are scanned. Columns come from
/// `columns`, clipped to the used width, or the first `options.column_cap`
/// columns when unrestricted. Failing cells are skipped, and a row that fails
/// for any other reason is skipped on its own; the changes already made in
/// the chunk are still counted. Only an unreadable used region is reported as
/// an error.
pub fn replace_in_sheet(
    sheet: &mut dyn Sheet,
    replacer: &Replacer,
    columns: &ColumnSelection,
    options: &ScanOptions,
) -> Result<ReplaceStats> {
    let mut stats = ReplaceStats::new(replacer);

    let region = sheet.used_region()?;
    if region.is_empty() {
        log::info!("Sheet appears empty, skipping");
        return Ok(stats);
    }

    let rows = options.rows_to_process(region.rows);
    let cols = columns.resolve(region.cols, options.column_cap);
    let target_cells = rows as u64 * cols.len() as u64;

    log::info!(
        "Sheet has {} rows x {} columns; processing first {} rows ({} target cells)",
        region.rows,
        region.cols,
        rows,
        target_cells
    );
    if target_cells > LARGE_SHEET_CELLS {
        log::info!("Large sheet detected - proceeding with controlled scan");
    }

    stats.rows_scanned = rows;
    stats.columns = cols;

    for (start, end) in row_chunks(rows) {
        stats.chunks += 1;
        if stats.chunks % PROGRESS_EVERY_CHUNKS == 0 {
            log::info!("Progress: {}/{} rows processed", end, rows);
        }

        let chunk = replace_in_chunk(sheet, replacer, start..end, &stats.columns);
        if chunk.cells_changed > 0 {
            stats.chunks_with_changes += 1;
        }
        if chunk.rows_failed > 0 {
            stats.chunks_failed += 1;
            log::warn!(
                "Rows {}-{}: {} rows skipped after errors",
                start + 1,
                end,
                chunk.rows_failed
            );
        }
        for (pair, count) in replacer.pairs().zip(&chunk.counts) {
            stats.counts.add(pair.find.as_str(), *count);
        }
        stats.affected_rows.extend(chunk.affected_rows);
        stats.cells_changed += chunk.cells_changed;
        stats.cells_failed += chunk.cells_failed;
        stats.rows_failed += chunk.rows_failed;
    }

    if stats.cells_changed > 0 {
        touch_rows(sheet, &stats.affected_rows, options);
        log::info!(
            "Completed: {} replacements in {}/{} chunks",
            stats.total(),
            stats.chunks_with_changes,
            stats.chunks
        );
    } else {
        log::info!("Completed: No text requiring replacement found");
    }
    if stats.cells_failed > 0 {
        log::warn!(
            "{} cells could not be read or written and were skipped",
            stats.cells_failed
        );
    }

    Ok(stats)
}

fn replace_in_chunk(
    sheet: &mut dyn Sheet,
    replacer: &Replacer,
    rows: Range<u32>,
    cols: &[u32],
) -> ChunkStats {
    let mut chunk = ChunkStats {
        counts: vec![0; replacer.len()],
        ..Default::default()
    };

    for row in rows {
        if let Err(e) = replace_in_row(sheet, replacer, row, cols, &mut chunk) {
            chunk.rows_failed += 1;
            log::warn!("Skipping row {}: {}", row + 1, e);
        }
    }

    chunk
}

/// Apply the pairs across one row, recording each change as it is written
fn replace_in_row(
    sheet: &mut dyn Sheet,
    replacer: &Replacer,
    row: u32,
    cols: &[u32],
    chunk: &mut ChunkStats,
) -> Result<()> {
    for &col in cols {
        let outcome = replace_cell(sheet, replacer, row, col, &mut chunk.counts)?;
        if outcome.changed {
            chunk.cells_changed += 1;
            chunk.affected_rows.insert(row);
        } else if outcome.kind == OutcomeKind::Failed {
            chunk.cells_failed += 1;
            if let Some(detail) = &outcome.detail {
                log::debug!("Skipping cell: {}", detail);
            }
        }
    }
    Ok(())
}

/// Apply the pairs to one cell
///
/// Cell-level access errors become a failed [`CellOutcome`]; anything else
/// is returned as an error and skips the rest of the row. Match counts are only
/// added once the write has succeeded.
fn replace_cell(
    sheet: &mut dyn Sheet,
    replacer: &Replacer,
    row: u32,
    col: u32,
    counts: &mut [usize],
) -> Result<CellOutcome> {
    let value = match sheet.read_cell(row, col) {
        Ok(value) => value,
        Err(e @ Error::CellAccess { .. }) => return Ok(CellOutcome::failed(e.to_string())),
        Err(e) => return Err(e),
    };

    let Some(text) = value.as_text() else {
        return Ok(CellOutcome::ineligible());
    };
    if text.trim().is_empty() {
        return Ok(CellOutcome::ineligible());
    }

    let Some(replacement) = replacer.apply(text) else {
        return Ok(CellOutcome::unchanged());
    };

    match sheet.write_cell(row, col, &replacement.text) {
        Ok(()) => {
            for (total, n) in counts.iter_mut().zip(&replacement.counts) {
                *total += n;
            }
            Ok(CellOutcome::changed())
        }
        Err(e @ Error::CellAccess { .. }) => Ok(CellOutcome::failed(e.to_string())),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySheet;
    use crate::workbook::CellValue;
    use pretty_assertions::assert_eq;

    fn replacer(pairs: &[(&str, &str)]) -> Replacer {
        let pairs: Vec<_> = pairs
            .iter()
            .map(|(f, r)| ReplacementPair::new(*f, *r))
            .collect();
        Replacer::new(&pairs).unwrap()
    }

    #[test]
    fn test_apply_case_insensitive() {
        let result = replacer(&[("foo", "bar")]).apply("Foo and foo").unwrap();
        assert_eq!(result.text, "bar and bar");
        assert_eq!(result.counts, vec![2]);
    }

    #[test]
    fn test_apply_chains_pairs() {
        let result = replacer(&[("A", "B"), ("B", "C")]).apply("A").unwrap();
        assert_eq!(result.text, "C");
        assert_eq!(result.counts, vec![1, 1]);
    }

    #[test]
    fn test_apply_no_match() {
        assert_eq!(replacer(&[("foo", "bar")]).apply("nothing here"), None);
    }

    #[test]
    fn test_apply_is_literal() {
        let result = replacer(&[("a.c", "$1 (x)")]).apply("abc a.c").unwrap();
        assert_eq!(result.text, "abc $1 (x)");
        assert_eq!(result.counts, vec![1]);
    }

    #[test]
    fn test_empty_find_rejected() {
        let err = Replacer::new(&[ReplacementPair::new("", "x")]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_replace_in_sheet_targets_columns() {
        let mut sheet = MemorySheet::new("Data")
            .with_cell(0, 0, "Elite model")
            .with_cell(0, 1, "Elite model")
            .with_cell(1, 0, "ELITE MODEL range")
            .with_cell(2, 0, 12.0)
            .with_cell(3, 0, "   ");

        let columns = ColumnSelection::parse(Some("A")).unwrap();
        let stats = replace_in_sheet(
            &mut sheet,
            &replacer(&[("Elite model", "E Line model")]),
            &columns,
            &ScanOptions::default(),
        )
        .unwrap();

        assert_eq!(stats.total(), 2);
        assert_eq!(stats.cells_changed, 2);
        assert_eq!(sheet.text(0, 0), "E Line model");
        assert_eq!(sheet.text(1, 0), "E Line model range");
        // Column B is not targeted
        assert_eq!(sheet.text(0, 1), "Elite model");
        assert_eq!(sheet.get(2, 0), CellValue::Number(12.0));
        assert_eq!(stats.affected_rows, BTreeSet::from([0, 1]));
        assert_eq!(sheet.row_height(0), Some(16.0));
        assert_eq!(sheet.row_height(2), None);
    }

    #[test]
    fn test_row_cap() {
        let mut sheet = MemorySheet::new("Big");
        for row in 0..10_000 {
            sheet.set(row, 0, "foo");
        }

        let stats = replace_in_sheet(
            &mut sheet,
            &replacer(&[("foo", "bar")]),
            &ColumnSelection::All,
            &ScanOptions::default(),
        )
        .unwrap();

        assert_eq!(stats.rows_scanned, 300);
        assert_eq!(stats.total(), 300);
        assert_eq!(sheet.text(299, 0), "bar");
        assert_eq!(sheet.text(300, 0), "foo");
        assert_eq!(sheet.text(9_999, 0), "foo");
    }

    #[test]
    fn test_default_column_cap() {
        let mut sheet = MemorySheet::new("Wide")
            .with_cell(0, 107, "foo")
            .with_cell(0, 108, "foo");

        let stats = replace_in_sheet(
            &mut sheet,
            &replacer(&[("foo", "bar")]),
            &ColumnSelection::All,
            &ScanOptions::default(),
        )
        .unwrap();

        assert_eq!(stats.columns.len(), 108);
        assert_eq!(sheet.text(0, 107), "bar");
        assert_eq!(sheet.text(0, 108), "foo");
    }

    #[test]
    fn test_formulas_are_not_rewritten() {
        let formula = CellValue::Formula {
            text: "\"foo\"".into(),
            cached_value: Some(Box::new(CellValue::text("foo"))),
        };
        let mut sheet = MemorySheet::new("F").with_cell(0, 0, formula.clone());

        let stats = replace_in_sheet(
            &mut sheet,
            &replacer(&[("foo", "bar")]),
            &ColumnSelection::All,
            &ScanOptions::default(),
        )
        .unwrap();

        assert_eq!(stats.total(), 0);
        assert_eq!(sheet.get(0, 0), formula);
    }

    #[test]
    fn test_failing_cells_are_skipped() {
        let mut sheet = MemorySheet::new("S")
            .with_cell(0, 0, "foo")
            .with_cell(1, 0, "foo");
        sheet.make_unreadable(0, 0);

        let stats = replace_in_sheet(
            &mut sheet,
            &replacer(&[("foo", "bar")]),
            &ColumnSelection::All,
            &ScanOptions::default(),
        )
        .unwrap();

        assert_eq!(stats.cells_failed, 1);
        assert_eq!(stats.total(), 1);
        assert_eq!(sheet.text(1, 0), "bar");
    }

    #[test]
    fn test_failing_row_is_skipped_alone() {
        let mut sheet = MemorySheet::new("S")
            .with_cell(0, 0, "foo")
            .with_cell(1, 0, "foo")
            .with_cell(2, 0, "foo")
            .with_cell(3, 0, "foo");
        sheet.break_row(1);

        let stats = replace_in_sheet(
            &mut sheet,
            &replacer(&[("foo", "bar")]),
            &ColumnSelection::All,
            &ScanOptions::default(),
        )
        .unwrap();

        assert_eq!(stats.total(), 3);
        assert_eq!(stats.rows_failed, 1);
        assert_eq!(stats.chunks_failed, 1);
        assert_eq!(stats.affected_rows, BTreeSet::from([0, 2, 3]));
        assert_eq!(sheet.text(0, 0), "bar");
        assert_eq!(sheet.get(1, 0), CellValue::text("foo"));
        assert_eq!(sheet.text(3, 0), "bar");
        assert_eq!(sheet.row_height(0), Some(16.0));
        assert_eq!(sheet.row_height(1), None);
    }

    #[test]
    fn test_unreadable_region_fails_the_sheet() {
        let mut sheet = MemorySheet::new("S").with_cell(0, 0, "foo");
        sheet.fail_used_region();

        let err = replace_in_sheet(
            &mut sheet,
            &replacer(&[("foo", "bar")]),
            &ColumnSelection::All,
            &ScanOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::SheetAccess { .. }));
        assert_eq!(sheet.text(0, 0), "foo");
    }

    #[test]
    fn test_protected_cells_not_counted() {
        let mut sheet = MemorySheet::new("S")
            .with_cell(0, 0, "foo")
            .with_cell(1, 0, "foo foo");
        sheet.protect("secret");
        sheet.unlock_cell(1, 0);

        let stats = replace_in_sheet(
            &mut sheet,
            &replacer(&[("foo", "bar")]),
            &ColumnSelection::All,
            &ScanOptions::default(),
        )
        .unwrap();

        assert_eq!(stats.total(), 2);
        assert_eq!(stats.cells_failed, 1);
        assert_eq!(sheet.text(0, 0), "foo");
        assert_eq!(sheet.text(1, 0), "bar bar");
    }

    #[test]
    fn test_empty_sheet() {
        let mut sheet = MemorySheet::new("Empty");
        let stats = replace_in_sheet(
            &mut sheet,
            &replacer(&[("foo", "bar")]),
            &ColumnSelection::All,
            &ScanOptions::default(),
        )
        .unwrap();
        assert_eq!(stats.rows_scanned, 0);
        assert_eq!(stats.counts.iter().collect::<Vec<_>>(), vec![("foo", 0)]);
    }
}
