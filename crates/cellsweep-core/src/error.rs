//! Error types for cellsweep-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning and rewriting workbooks
///
/// The variants follow the layer they abort: configuration errors stop the
/// whole run, workbook errors fail one file, sheet errors skip one sheet and
/// cell errors skip one cell.
#[derive(Debug, Error)]
pub enum Error {
    /// Column spec could not be parsed
    #[error("Malformed column spec '{spec}': {reason}")]
    MalformedColumnSpec { spec: String, reason: String },

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The workbook back-end cannot be started or used
    #[error("Workbook back-end unavailable: {0}")]
    BackendUnavailable(String),

    /// Workbook could not be opened
    #[error("Failed to open workbook '{path}': {reason}")]
    WorkbookOpen { path: String, reason: String },

    /// Sheet could not be read or is otherwise inaccessible
    #[error("Sheet '{sheet}' is not accessible: {reason}")]
    SheetAccess { sheet: String, reason: String },

    /// Single cell could not be read or written
    #[error("Cell {cell} is not accessible: {reason}")]
    CellAccess { cell: String, reason: String },

    /// Workbook could not be saved
    #[error("Failed to save workbook '{path}': {reason}")]
    Save { path: String, reason: String },
}

impl Error {
    /// Create a malformed column spec error
    pub fn malformed_spec<S: Into<String>, R: Into<String>>(spec: S, reason: R) -> Self {
        Error::MalformedColumnSpec {
            spec: spec.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error with a message
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a sheet access error
    pub fn sheet_access<S: Into<String>, R: Into<String>>(sheet: S, reason: R) -> Self {
        Error::SheetAccess {
            sheet: sheet.into(),
            reason: reason.into(),
        }
    }

    /// Create a cell access error for a zero-based cell position
    pub fn cell_access<R: Into<String>>(row: u32, col: u32, reason: R) -> Self {
        Error::CellAccess {
            cell: format!("{}{}", crate::column::column_to_letters(col), row + 1),
            reason: reason.into(),
        }
    }

    /// Whether this error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::MalformedColumnSpec { .. }
        )
    }
}
