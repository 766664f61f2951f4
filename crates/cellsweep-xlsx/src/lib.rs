//! # cellsweep-xlsx
//!
//! Workbook back-end for cellsweep over `umya-spreadsheet`.
//!
//! `.xlsx` and `.xlsm` files are read fully into memory, edited through the
//! [`cellsweep_core::Sheet`] capability and written back in place. Legacy
//! `.xls` files are discovered but reported as unopenable.

pub mod backend;
pub mod error;

mod sheet;

pub use backend::{XlsxBackend, XlsxWorkbook, WRITABLE_EXTENSIONS};
pub use error::{XlsxBackendError, XlsxResult};
pub use sheet::XlsxSheet;
