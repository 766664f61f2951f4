//! `Sheet` capability over a umya-spreadsheet worksheet
//!
//! umya addresses cells as `(column, row)` starting at 1; the engines use
//! zero-based `(row, col)`.

use cellsweep_core::{CellValue, Error, Result, Sheet, UsedRegion};
use umya_spreadsheet::{Cell, Worksheet};

/// Convert a umya cell into a core value
pub(crate) fn cell_value(cell: &Cell) -> CellValue {
    let raw = cell.get_value();
    let value = match cell.get_data_type() {
        _ if raw.is_empty() => CellValue::Empty,
        "n" => raw
            .parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or_else(|_| CellValue::text(raw.as_ref())),
        "b" => CellValue::Boolean(raw.eq_ignore_ascii_case("true") || raw == "1"),
        "e" => CellValue::Error(raw.into_owned()),
        _ => CellValue::Text(raw.into_owned()),
    };

    if cell.is_formula() {
        CellValue::Formula {
            text: cell.get_formula().to_string(),
            cached_value: (!value.is_empty()).then(|| Box::new(value)),
        }
    } else {
        value
    }
}

/// A worksheet of an open [`XlsxWorkbook`](crate::XlsxWorkbook)
pub struct XlsxSheet<'a> {
    worksheet: &'a mut Worksheet,
}

impl<'a> XlsxSheet<'a> {
    /// Wrap a worksheet
    pub fn new(worksheet: &'a mut Worksheet) -> Self {
        Self { worksheet }
    }

    /// Password-free protection can be lifted; anything else stays
    fn has_password(&self) -> bool {
        self.worksheet
            .get_sheet_protection()
            .map_or(false, |protection| {
                !protection.get_password_raw().is_empty()
                    || !protection.get_hash_value().is_empty()
            })
    }
}

impl Sheet for XlsxSheet<'_> {
    fn name(&self) -> &str {
        self.worksheet.get_name()
    }

    fn used_region(&self) -> Result<UsedRegion> {
        let (cols, rows) = self.worksheet.get_highest_column_and_row();
        Ok(UsedRegion::new(rows, cols))
    }

    fn read_cell(&self, row: u32, col: u32) -> Result<CellValue> {
        Ok(self
            .worksheet
            .get_cell((col + 1, row + 1))
            .map_or(CellValue::Empty, cell_value))
    }

    fn write_cell(&mut self, row: u32, col: u32, text: &str) -> Result<()> {
        if self.is_protected() {
            return Err(Error::cell_access(row, col, "sheet is protected"));
        }
        self.worksheet
            .get_cell_mut((col + 1, row + 1))
            .set_value_string(text);
        Ok(())
    }

    fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        if self.is_protected() {
            return Err(Error::sheet_access(self.name(), "sheet is protected"));
        }
        let dimension = self.worksheet.get_row_dimension_mut(&(row + 1));
        dimension.set_height(height);
        dimension.set_custom_height(true);
        Ok(())
    }

    fn is_protected(&self) -> bool {
        self.worksheet
            .get_sheet_protection()
            .map_or(false, |protection| *protection.get_sheet())
    }

    fn unprotect(&mut self, password: &str) -> Result<()> {
        if !self.is_protected() {
            return Ok(());
        }
        if !password.is_empty() || self.has_password() {
            return Err(Error::sheet_access(
                self.name(),
                "sheet is protected with a password",
            ));
        }
        log::debug!("Removing password-free protection from '{}'", self.name());
        self.worksheet.remove_sheet_protection();
        Ok(())
    }
}
