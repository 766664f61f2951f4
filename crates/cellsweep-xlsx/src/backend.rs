//! Back-end opening `.xlsx` / `.xlsm` files with umya-spreadsheet

use crate::error::{XlsxBackendError, XlsxResult};
use crate::sheet::XlsxSheet;
use cellsweep_core::{Backend, Result, Sheet, Workbook};
use std::path::{Path, PathBuf};
use umya_spreadsheet::Spreadsheet;

/// Extensions this back-end can read and write back
pub const WRITABLE_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

/// File back-end over umya-spreadsheet
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxBackend;

impl XlsxBackend {
    /// Create a new back-end
    pub fn new() -> Self {
        Self
    }

    /// Read a workbook file
    pub fn read(&self, path: &Path) -> XlsxResult<XlsxWorkbook> {
        if !is_writable(path) {
            return Err(XlsxBackendError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }

        let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|source| {
            XlsxBackendError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        log::debug!(
            "Read '{}' ({} sheets)",
            path.display(),
            book.get_sheet_collection_no_check().len()
        );

        Ok(XlsxWorkbook {
            path: path.to_path_buf(),
            book,
        })
    }
}

fn is_writable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            WRITABLE_EXTENSIONS
                .iter()
                .any(|w| ext.eq_ignore_ascii_case(w))
        })
}

impl Backend for XlsxBackend {
    type Workbook = XlsxWorkbook;

    fn name(&self) -> &str {
        "xlsx"
    }

    fn supports_extension(&self, extension: &str) -> bool {
        matches!(
            extension.to_ascii_lowercase().as_str(),
            "xlsx" | "xlsm" | "xls"
        )
    }

    fn open(&self, path: &Path) -> Result<XlsxWorkbook> {
        Ok(self.read(path)?)
    }
}

/// A workbook loaded into memory; [`Workbook::save`] writes it back in place
pub struct XlsxWorkbook {
    path: PathBuf,
    book: Spreadsheet,
}

impl XlsxWorkbook {
    /// Path the workbook was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Underlying spreadsheet
    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.book
    }

    /// Write the workbook back to its path
    pub fn write(&self) -> XlsxResult<()> {
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.path).map_err(|source| {
            XlsxBackendError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }
}

impl Workbook for XlsxWorkbook {
    fn sheet_count(&self) -> usize {
        self.book.get_sheet_collection_no_check().len()
    }

    fn with_sheet<R, F>(&mut self, index: usize, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn Sheet) -> R,
    {
        let worksheet = self.book.get_sheet_collection_mut().get_mut(index)?;
        Some(f(&mut XlsxSheet::new(worksheet)))
    }

    fn save(&mut self) -> Result<()> {
        self.write()?;
        log::debug!("Wrote '{}'", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        let backend = XlsxBackend::new();
        assert!(backend.supports_extension("xlsx"));
        assert!(backend.supports_extension("XLSM"));
        assert!(backend.supports_extension("xls"));
        assert!(!backend.supports_extension("csv"));
    }

    #[test]
    fn test_legacy_xls_cannot_be_opened() {
        let err = XlsxBackend::new()
            .open(Path::new("old.xls"))
            .err()
            .unwrap();
        assert!(matches!(err, cellsweep_core::Error::WorkbookOpen { .. }));
        assert!(err.to_string().contains("old.xls"));
    }
}
