//! Workbook capability interface
//!
//! The engines never talk to a file format or an automation session directly.
//! They consume the narrow set of operations below, so any spreadsheet library
//! able to open, read, write and save cells can back a run.
//!
//! Positions are zero-based (`row 0, col 0` is `A1`).

use crate::error::Result;
use std::fmt;
use std::path::Path;

/// Value read from a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell (no value)
    Empty,
    /// Plain text
    Text(String),
    /// Numeric value
    Number(f64),
    /// Boolean value
    Boolean(bool),
    /// Error value (#VALUE!, #REF!, etc.)
    Error(String),
    /// Formula with its last cached result
    Formula {
        /// Formula text without the leading `=`
        text: String,
        /// Last calculated value (if any)
        cached_value: Option<Box<CellValue>>,
    },
}

impl CellValue {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Plain text content, if this is a literal text cell
    ///
    /// Formula results are deliberately excluded: rewriting them would
    /// replace the formula with a constant.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text as a user would see it in the cell
    ///
    /// Formulas show their cached result; integral numbers drop the fraction.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Error(e) => e.clone(),
            CellValue::Formula { cached_value, .. } => cached_value
                .as_deref()
                .map(CellValue::display_text)
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_text())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// Extent of the used part of a sheet, anchored at `A1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsedRegion {
    /// Number of used rows
    pub rows: u32,
    /// Number of used columns
    pub cols: u32,
}

impl UsedRegion {
    /// Create a new region
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Check if the region holds no cells
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

/// One worksheet of an open workbook
pub trait Sheet {
    /// Sheet name as stored in the workbook
    fn name(&self) -> &str;

    /// Used region of the sheet
    fn used_region(&self) -> Result<UsedRegion>;

    /// Read a cell
    fn read_cell(&self, row: u32, col: u32) -> Result<CellValue>;

    /// Overwrite a cell with text
    fn write_cell(&mut self, row: u32, col: u32, text: &str) -> Result<()>;

    /// Set the display height of a row
    fn set_row_height(&mut self, row: u32, height: f64) -> Result<()>;

    /// Whether the sheet contents are write-protected
    fn is_protected(&self) -> bool;

    /// Try to lift write-protection with a password
    fn unprotect(&mut self, password: &str) -> Result<()>;
}

/// An open workbook, exclusively owned by the code processing its file
pub trait Workbook {
    /// Number of sheets
    fn sheet_count(&self) -> usize;

    /// Run `f` on a sheet by index; `None` when there is no such sheet
    fn with_sheet<R, F>(&mut self, index: usize, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn Sheet) -> R;

    /// Save the workbook back to where it was opened from
    fn save(&mut self) -> Result<()>;

    /// Release the workbook; dropping it has the same effect
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Something that can open workbooks from disk
pub trait Backend {
    /// Workbook type produced by this back-end
    type Workbook: Workbook;

    /// Short name used in logs
    fn name(&self) -> &str;

    /// Check that the back-end can be used at all
    fn check_available(&self) -> Result<()> {
        Ok(())
    }

    /// Whether a file extension (lowercase, without the dot) can be opened
    fn supports_extension(&self, extension: &str) -> bool;

    /// Open a workbook for reading and writing
    fn open(&self, path: &Path) -> Result<Self::Workbook>;
}
