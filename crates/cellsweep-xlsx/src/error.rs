//! XLSX back-end error types

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for XLSX back-end operations
pub type XlsxResult<T> = std::result::Result<T, XlsxBackendError>;

/// Errors raised while opening or saving a workbook file
#[derive(Debug, Error)]
pub enum XlsxBackendError {
    /// The file could not be read as a workbook
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: umya_spreadsheet::XlsxError,
    },

    /// The workbook could not be written back
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: umya_spreadsheet::XlsxError,
    },

    /// File format this back-end cannot rewrite
    #[error("unsupported workbook format: '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },
}

impl XlsxBackendError {
    /// Path of the workbook involved
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } | Self::UnsupportedFormat { path } => {
                path
            }
        }
    }
}

impl From<XlsxBackendError> for cellsweep_core::Error {
    fn from(err: XlsxBackendError) -> Self {
        let path = err.path().display().to_string();
        let reason = match &err {
            XlsxBackendError::Read { source, .. } | XlsxBackendError::Write { source, .. } => {
                source.to_string()
            }
            XlsxBackendError::UnsupportedFormat { .. } => {
                "legacy .xls workbooks cannot be rewritten; save as .xlsx".to_string()
            }
        };

        match err {
            XlsxBackendError::Write { .. } => cellsweep_core::Error::Save { path, reason },
            _ => cellsweep_core::Error::WorkbookOpen { path, reason },
        }
    }
}
