//! # cellsweep
//!
//! Batch editing of spreadsheet workbooks.
//!
//! Two kinds of run share the same pipeline:
//!
//! - **replace**: case-insensitive find/replace pairs applied to text cells,
//!   optionally limited to configured sheets and columns
//! - **update**: rules that look a value up in one column and set the cell of
//!   another column in the same row
//!
//! Every workbook in a directory is opened, each eligible sheet is scanned
//! (first 300 rows by default), and the workbook is saved in place only when
//! something changed.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cellsweep::config::{ConfigFile, Platform};
//! use cellsweep::{discover_workbooks, run, XlsxBackend};
//! use std::path::Path;
//!
//! let config = ConfigFile::load(Path::new("config.json"))?
//!     .update_config(Platform::current())?;
//! let backend = XlsxBackend::new();
//! let files = discover_workbooks(&backend, Path::new("/srv/sheets"))?;
//!
//! let summary = run(&backend, &files, &config);
//! for line in summary.report_lines() {
//!     println!("{}", line);
//! }
//! # Ok::<(), cellsweep::Error>(())
//! ```

pub mod backup;
pub mod config;
pub mod discovery;
pub mod error;
pub mod pipeline;
pub mod summary;

pub use config::{ReplaceConfig, RunSettings, UpdateConfig};
pub use discovery::discover_workbooks;
pub use error::{Error, Result};
pub use pipeline::{process_file, run, Job};
pub use summary::RunSummary;

// Re-export the pieces callers need without depending on the member crates
pub use cellsweep_core::{
    column_to_letters, Backend, ColumnSelection, FileOutcome, ItemCounts, OutcomeKind, SheetOutcome,
};
pub use cellsweep_xlsx::XlsxBackend;
