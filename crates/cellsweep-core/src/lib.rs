//! # cellsweep-core
//!
//! Core logic for the cellsweep workbook batch editor.
//!
//! This crate provides:
//! - [`ColumnSelection`] - Parsing of spreadsheet-style column specs (`"A,C:E,G"`)
//! - [`Sheet`], [`Workbook`], [`Backend`] - The narrow capability interface a
//!   spreadsheet back-end implements
//! - [`replace_in_sheet`] - Bounded, chunked find/replace over a sheet
//! - [`update_sheet`] - Rule-grouped lookup-and-update over a sheet
//! - [`SheetOutcome`], [`FileOutcome`] - Per-layer results aggregated upward
//!
//! ## Example
//!
//! ```rust
//! use cellsweep_core::{ColumnSelection, ReplacementPair, Replacer};
//! use cellsweep_core::memory::MemorySheet;
//! use cellsweep_core::{replace_in_sheet, ScanOptions};
//!
//! let mut sheet = MemorySheet::new("Data").with_cell(0, 0, "Foo and foo");
//! let replacer = Replacer::new(&[ReplacementPair::new("foo", "bar")]).unwrap();
//!
//! let stats = replace_in_sheet(
//!     &mut sheet,
//!     &replacer,
//!     &ColumnSelection::All,
//!     &ScanOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(stats.total(), 2);
//! assert_eq!(sheet.text(0, 0), "bar and bar");
//! ```

pub mod column;
pub mod error;
pub mod gate;
pub mod memory;
pub mod outcome;
pub mod replace;
pub mod rules;
pub mod scan;
pub mod sheet;
pub mod workbook;

// Re-exports for convenience
pub use column::{column_to_letters, letters_to_column, parse_column_spec, ColumnSelection};
pub use error::{Error, Result};
pub use gate::{lift_protection, replace_eligibility, update_eligibility, Eligibility};
pub use outcome::{CellOutcome, FileOutcome, ItemCounts, OutcomeKind, SheetOutcome};
pub use replace::{replace_in_sheet, ReplaceStats, Replacement, ReplacementPair, Replacer};
pub use rules::{group_rules, update_sheet, RuleGroup, SheetRules, UpdateRule, UpdateStats};
pub use scan::ScanOptions;
pub use sheet::{normalize_sheet_name, sheet_names_match, SheetConfig, SheetConfigs};
pub use workbook::{Backend, CellValue, Sheet, UsedRegion, Workbook};

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
