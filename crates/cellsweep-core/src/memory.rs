//! In-memory workbook back-end
//!
//! Holds workbooks as plain maps keyed by path. Used to exercise the engines
//! and pipelines without touching a file format, and to model behaviour that
//! is awkward to produce on disk (protected sheets, failing saves).

use crate::error::{Error, Result};
use crate::workbook::{Backend, CellValue, Sheet, UsedRegion, Workbook};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A worksheet held in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    name: String,
    cells: BTreeMap<(u32, u32), CellValue>,
    row_heights: BTreeMap<u32, f64>,
    /// `Some(password)` while protected
    protection: Option<String>,
    /// Cells writable even while protected
    unlocked: BTreeSet<(u32, u32)>,
    /// Cells whose reads fail
    unreadable: BTreeSet<(u32, u32)>,
    /// Rows whose reads fail with a sheet-level error
    broken_rows: BTreeSet<u32>,
    /// Whether the used region cannot be determined
    broken_region: bool,
}

impl MemorySheet {
    /// Create an empty sheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style cell setter
    pub fn with_cell<V: Into<CellValue>>(mut self, row: u32, col: u32, value: V) -> Self {
        self.set(row, col, value);
        self
    }

    /// Set a cell value
    pub fn set<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) {
        let value = value.into();
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    /// Get a cell value (`Empty` when unset)
    pub fn get(&self, row: u32, col: u32) -> CellValue {
        self.cells
            .get(&(row, col))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    /// Text of a cell as displayed
    pub fn text(&self, row: u32, col: u32) -> String {
        self.get(row, col).display_text()
    }

    /// Custom height of a row, if one was set
    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    /// Rows with a custom height
    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    /// Protect the sheet with a password (`""` for no password)
    pub fn protect<S: Into<String>>(&mut self, password: S) {
        self.protection = Some(password.into());
    }

    /// Allow writes to a cell while the sheet is protected
    pub fn unlock_cell(&mut self, row: u32, col: u32) {
        self.unlocked.insert((row, col));
    }

    /// Make reads of a cell fail
    pub fn make_unreadable(&mut self, row: u32, col: u32) {
        self.unreadable.insert((row, col));
    }

    /// Make reads anywhere in a row fail with a sheet-level error
    pub fn break_row(&mut self, row: u32) {
        self.broken_rows.insert(row);
    }

    /// Make the used region unreadable
    pub fn fail_used_region(&mut self) {
        self.broken_region = true;
    }

    fn is_locked(&self, row: u32, col: u32) -> bool {
        self.protection.is_some() && !self.unlocked.contains(&(row, col))
    }
}

impl Sheet for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn used_region(&self) -> Result<UsedRegion> {
        if self.broken_region {
            return Err(Error::sheet_access(&self.name, "used range unavailable"));
        }
        let mut region = UsedRegion::default();
        for &(row, col) in self.cells.keys() {
            region.rows = region.rows.max(row + 1);
            region.cols = region.cols.max(col + 1);
        }
        Ok(region)
    }

    fn read_cell(&self, row: u32, col: u32) -> Result<CellValue> {
        if self.broken_rows.contains(&row) {
            return Err(Error::sheet_access(
                &self.name,
                format!("row {} unavailable", row + 1),
            ));
        }
        if self.unreadable.contains(&(row, col)) {
            return Err(Error::cell_access(row, col, "cell cannot be read"));
        }
        Ok(self.get(row, col))
    }

    fn write_cell(&mut self, row: u32, col: u32, text: &str) -> Result<()> {
        if self.is_locked(row, col) {
            return Err(Error::cell_access(row, col, "sheet is protected"));
        }
        self.set(row, col, CellValue::text(text));
        Ok(())
    }

    fn set_row_height(&mut self, row: u32, height: f64) -> Result<()> {
        if self.protection.is_some() {
            return Err(Error::sheet_access(&self.name, "sheet is protected"));
        }
        self.row_heights.insert(row, height);
        Ok(())
    }

    fn is_protected(&self) -> bool {
        self.protection.is_some()
    }

    fn unprotect(&mut self, password: &str) -> Result<()> {
        match &self.protection {
            Some(expected) if expected != password => {
                Err(Error::sheet_access(&self.name, "incorrect password"))
            }
            _ => {
                self.protection = None;
                Ok(())
            }
        }
    }
}

type Store = Rc<RefCell<BTreeMap<PathBuf, StoredWorkbook>>>;

#[derive(Debug, Clone, Default)]
struct StoredWorkbook {
    sheets: Vec<MemorySheet>,
    fail_open: bool,
    fail_save: bool,
    saves: usize,
}

/// Back-end whose "files" live in a shared in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Store,
    unavailable: bool,
}

impl MemoryBackend {
    /// Create an empty back-end
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a back-end that reports itself unavailable
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    /// Register a workbook under a path
    pub fn insert<P: Into<PathBuf>>(&self, path: P, sheets: Vec<MemorySheet>) {
        self.store.borrow_mut().insert(
            path.into(),
            StoredWorkbook {
                sheets,
                ..Default::default()
            },
        );
    }

    /// Make opening the workbook at `path` fail
    pub fn fail_open<P: AsRef<Path>>(&self, path: P) {
        if let Some(stored) = self.store.borrow_mut().get_mut(path.as_ref()) {
            stored.fail_open = true;
        }
    }

    /// Make saving the workbook at `path` fail
    pub fn fail_save<P: AsRef<Path>>(&self, path: P) {
        if let Some(stored) = self.store.borrow_mut().get_mut(path.as_ref()) {
            stored.fail_save = true;
        }
    }

    /// Saved sheets of a workbook
    pub fn sheets<P: AsRef<Path>>(&self, path: P) -> Option<Vec<MemorySheet>> {
        self.store
            .borrow()
            .get(path.as_ref())
            .map(|stored| stored.sheets.clone())
    }

    /// Saved copy of a sheet by name
    pub fn sheet<P: AsRef<Path>>(&self, path: P, name: &str) -> Option<MemorySheet> {
        self.sheets(path)?.into_iter().find(|s| s.name == name)
    }

    /// Number of successful saves of a workbook
    pub fn save_count<P: AsRef<Path>>(&self, path: P) -> usize {
        self.store
            .borrow()
            .get(path.as_ref())
            .map_or(0, |stored| stored.saves)
    }
}

impl Backend for MemoryBackend {
    type Workbook = MemoryWorkbook;

    fn name(&self) -> &str {
        "memory"
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(Error::BackendUnavailable(
                "in-memory back-end disabled".into(),
            ));
        }
        Ok(())
    }

    fn supports_extension(&self, extension: &str) -> bool {
        matches!(extension, "xlsx" | "xlsm" | "xls")
    }

    fn open(&self, path: &Path) -> Result<MemoryWorkbook> {
        self.check_available()?;
        let store = self.store.borrow();
        let stored = store.get(path).ok_or_else(|| Error::WorkbookOpen {
            path: path.display().to_string(),
            reason: "no such workbook".into(),
        })?;
        if stored.fail_open {
            return Err(Error::WorkbookOpen {
                path: path.display().to_string(),
                reason: "workbook is corrupt".into(),
            });
        }

        Ok(MemoryWorkbook {
            path: path.to_path_buf(),
            sheets: stored.sheets.clone(),
            store: Rc::clone(&self.store),
        })
    }
}

/// An open in-memory workbook; edits become visible in the back-end on save
#[derive(Debug)]
pub struct MemoryWorkbook {
    path: PathBuf,
    sheets: Vec<MemorySheet>,
    store: Store,
}

impl MemoryWorkbook {
    /// Current (possibly unsaved) sheets
    pub fn sheets(&self) -> &[MemorySheet] {
        &self.sheets
    }
}

impl Workbook for MemoryWorkbook {
    fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn with_sheet<R, F>(&mut self, index: usize, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn Sheet) -> R,
    {
        self.sheets.get_mut(index).map(|s| f(s as &mut dyn Sheet))
    }

    fn save(&mut self) -> Result<()> {
        let mut store = self.store.borrow_mut();
        let stored = store.entry(self.path.clone()).or_default();
        if stored.fail_save {
            return Err(Error::Save {
                path: self.path.display().to_string(),
                reason: "file is read-only".into(),
            });
        }
        stored.sheets = self.sheets.clone();
        stored.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_used_region_tracks_extent() {
        let sheet = MemorySheet::new("Data")
            .with_cell(0, 0, "a")
            .with_cell(9, 3, 1.0);
        assert_eq!(sheet.used_region().unwrap(), UsedRegion::new(10, 4));
        assert!(MemorySheet::new("Empty").used_region().unwrap().is_empty());
    }

    #[test]
    fn test_protection() {
        let mut sheet = MemorySheet::new("Locked").with_cell(0, 0, "a");
        sheet.protect("secret");
        sheet.unlock_cell(1, 0);

        assert!(sheet.write_cell(0, 0, "b").is_err());
        assert!(sheet.write_cell(1, 0, "b").is_ok());
        assert!(sheet.unprotect("").is_err());
        assert!(sheet.is_protected());

        sheet.unprotect("secret").unwrap();
        assert!(sheet.write_cell(0, 0, "b").is_ok());
    }

    #[test]
    fn test_injected_sheet_failures() {
        let mut sheet = MemorySheet::new("S").with_cell(0, 0, "a").with_cell(1, 0, "b");
        sheet.break_row(1);

        assert_eq!(sheet.read_cell(0, 0).unwrap(), CellValue::text("a"));
        assert!(matches!(
            sheet.read_cell(1, 0),
            Err(Error::SheetAccess { .. })
        ));

        sheet.fail_used_region();
        assert!(matches!(
            sheet.used_region(),
            Err(Error::SheetAccess { .. })
        ));
    }

    #[test]
    fn test_edits_visible_after_save() {
        let backend = MemoryBackend::new();
        backend.insert("book.xlsx", vec![MemorySheet::new("S").with_cell(0, 0, "old")]);

        let mut wb = backend.open(Path::new("book.xlsx")).unwrap();
        wb.with_sheet(0, |s| s.write_cell(0, 0, "new"))
            .unwrap()
            .unwrap();
        assert!(wb.with_sheet(1, |_| ()).is_none());
        assert_eq!(backend.sheet("book.xlsx", "S").unwrap().text(0, 0), "old");

        wb.save().unwrap();
        assert_eq!(backend.sheet("book.xlsx", "S").unwrap().text(0, 0), "new");
        assert_eq!(backend.save_count("book.xlsx"), 1);
    }

    #[test]
    fn test_open_failures() {
        let backend = MemoryBackend::new();
        assert!(backend.open(Path::new("missing.xlsx")).is_err());

        backend.insert("bad.xlsx", vec![]);
        backend.fail_open("bad.xlsx");
        assert!(matches!(
            backend.open(Path::new("bad.xlsx")),
            Err(Error::WorkbookOpen { .. })
        ));

        assert!(MemoryBackend::unavailable().check_available().is_err());
    }
}
