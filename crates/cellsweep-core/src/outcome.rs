//! Per-layer outcomes
//!
//! Every layer (cell, sheet, file) reports what happened to it instead of
//! raising: the lenient skip-and-continue policy lives in these values and
//! the counts are aggregated upward into a run summary.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// What happened to one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// Processed (with or without changes)
    Success,
    /// Deliberately not processed, or processing was not possible but harmless
    Skipped,
    /// Processing failed
    Failed,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Skipped => "skipped",
            OutcomeKind::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of examining one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellOutcome {
    pub kind: OutcomeKind,
    /// Whether the cell was rewritten
    pub changed: bool,
    pub detail: Option<String>,
}

impl CellOutcome {
    /// Cell examined, nothing to do
    pub fn unchanged() -> Self {
        Self {
            kind: OutcomeKind::Success,
            changed: false,
            detail: None,
        }
    }

    /// Cell rewritten
    pub fn changed() -> Self {
        Self {
            kind: OutcomeKind::Success,
            changed: true,
            detail: None,
        }
    }

    /// Cell not eligible (not text, blank, ...)
    pub fn ineligible() -> Self {
        Self {
            kind: OutcomeKind::Skipped,
            changed: false,
            detail: None,
        }
    }

    /// Cell could not be read or written
    pub fn failed<S: Into<String>>(detail: S) -> Self {
        Self {
            kind: OutcomeKind::Failed,
            changed: false,
            detail: Some(detail.into()),
        }
    }
}

/// Ordered per-item counters (per replacement pair, per rule)
///
/// Items keep their first-appearance order; adding to an existing label
/// accumulates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCounts {
    items: Vec<(String, usize)>,
}

impl ItemCounts {
    /// Create empty counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create counters initialized to zero for every label
    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = Self::new();
        for label in labels {
            counts.add(label, 0);
        }
        counts
    }

    /// Add `n` to a label, creating it if needed
    pub fn add<S: Into<String>>(&mut self, label: S, n: usize) {
        let label = label.into();
        match self.items.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += n,
            None => self.items.push((label, n)),
        }
    }

    /// Merge another set of counters into this one
    pub fn merge(&mut self, other: &ItemCounts) {
        for (label, n) in &other.items {
            self.add(label.as_str(), *n);
        }
    }

    /// Count for a label (0 when absent)
    pub fn get(&self, label: &str) -> usize {
        self.items
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |(_, n)| *n)
    }

    /// Sum of all counters
    pub fn total(&self) -> usize {
        self.items.iter().map(|(_, n)| n).sum()
    }

    /// Iterate over `(label, count)` in first-appearance order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.items.iter().map(|(l, n)| (l.as_str(), *n))
    }

    /// Iterate over labels with a non-zero count
    pub fn non_zero(&self) -> impl Iterator<Item = (&str, usize)> {
        self.iter().filter(|(_, n)| *n > 0)
    }

    /// `'label': n` list of the non-zero counters
    pub fn describe(&self) -> String {
        self.non_zero()
            .map(|(label, n)| format!("'{}': {}", label, n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Outcome of processing one sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetOutcome {
    pub sheet: String,
    pub kind: OutcomeKind,
    /// Cells changed in this sheet
    pub changes: usize,
    pub counts: ItemCounts,
    pub detail: Option<String>,
}

impl SheetOutcome {
    /// Sheet processed
    pub fn success<S: Into<String>>(sheet: S, counts: ItemCounts) -> Self {
        Self {
            sheet: sheet.into(),
            kind: OutcomeKind::Success,
            changes: counts.total(),
            counts,
            detail: None,
        }
    }

    /// Sheet skipped by configuration
    pub fn skipped<S: Into<String>, D: Into<String>>(sheet: S, detail: D) -> Self {
        Self {
            sheet: sheet.into(),
            kind: OutcomeKind::Skipped,
            changes: 0,
            counts: ItemCounts::new(),
            detail: Some(detail.into()),
        }
    }

    /// Sheet processing failed
    pub fn failed<S: Into<String>, D: Into<String>>(sheet: S, detail: D) -> Self {
        Self {
            sheet: sheet.into(),
            kind: OutcomeKind::Failed,
            changes: 0,
            counts: ItemCounts::new(),
            detail: Some(detail.into()),
        }
    }
}

/// Outcome of processing one workbook file
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub file: PathBuf,
    pub kind: OutcomeKind,
    /// Changes saved (or that would have been saved in a dry run)
    pub changes: usize,
    pub counts: ItemCounts,
    pub sheets: Vec<SheetOutcome>,
    pub duration: Duration,
    pub detail: Option<String>,
}

impl FileOutcome {
    /// Build a file outcome from its sheet outcomes
    pub fn from_sheets(file: PathBuf, sheets: Vec<SheetOutcome>) -> Self {
        let mut counts = ItemCounts::new();
        for sheet in &sheets {
            counts.merge(&sheet.counts);
        }
        Self {
            file,
            kind: OutcomeKind::Success,
            changes: counts.total(),
            counts,
            sheets,
            duration: Duration::ZERO,
            detail: None,
        }
    }

    /// File failed before or while saving
    pub fn failed<D: Into<String>>(file: PathBuf, detail: D) -> Self {
        Self {
            file,
            kind: OutcomeKind::Failed,
            changes: 0,
            counts: ItemCounts::new(),
            sheets: Vec::new(),
            duration: Duration::ZERO,
            detail: Some(detail.into()),
        }
    }

    /// Check if the file counts as a success
    pub fn is_success(&self) -> bool {
        self.kind != OutcomeKind::Failed
    }

    /// File name for display
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string())
    }
}
