//! Scan bounds shared by both engines

use crate::workbook::Sheet;
use std::collections::BTreeSet;

/// Rows scanned per sheet unless configured otherwise
pub const DEFAULT_MAX_ROWS: u32 = 300;

/// Columns scanned when a sheet has no column restriction (`A:DD`)
pub const DEFAULT_COLUMN_CAP: u32 = 108;

/// Height given to every row that had a cell rewritten
pub const TOUCHED_ROW_HEIGHT: f64 = 16.0;

/// Target cell count above which a scan is reported as large
pub const LARGE_SHEET_CELLS: u64 = 50_000;

/// Chunks between two progress messages
pub const PROGRESS_EVERY_CHUNKS: usize = 10;

/// Options bounding a sheet scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    /// Maximum number of rows scanned from the top of the sheet
    pub max_rows: u32,
    /// Column cap applied when no column restriction is configured
    pub column_cap: u32,
    /// Height applied to rewritten rows (`None` leaves row heights alone)
    pub touched_row_height: Option<f64>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            column_cap: DEFAULT_COLUMN_CAP,
            touched_row_height: Some(TOUCHED_ROW_HEIGHT),
        }
    }
}

impl ScanOptions {
    /// Options with a different row cap
    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Rows actually scanned for a sheet with `used_rows` rows
    pub fn rows_to_process(&self, used_rows: u32) -> u32 {
        used_rows.min(self.max_rows)
    }
}

/// Rows per chunk for a scan of `rows` rows
///
/// Larger scans use smaller chunks so progress is reported more often and a
/// failing chunk loses less work.
pub fn chunk_size(rows: u32) -> u32 {
    if rows > 100_000 {
        500
    } else if rows > 10_000 {
        1_000
    } else {
        5_000
    }
}

/// Split `0..rows` into consecutive `[start, end)` chunks
pub fn row_chunks(rows: u32) -> impl Iterator<Item = (u32, u32)> {
    let size = chunk_size(rows);
    (0..rows)
        .step_by(size as usize)
        .map(move |start| (start, start.saturating_add(size).min(rows)))
}

/// Give every rewritten row the configured height
///
/// Purely cosmetic: failures are logged at debug level and ignored.
pub fn touch_rows(sheet: &mut dyn Sheet, rows: &BTreeSet<u32>, options: &ScanOptions) {
    let Some(height) = options.touched_row_height else {
        return;
    };

    for &row in rows {
        if let Err(e) = sheet.set_row_height(row, height) {
            log::debug!("Could not set height of row {}: {}", row + 1, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySheet;

    #[test]
    fn test_chunk_size_steps() {
        assert_eq!(chunk_size(0), 5_000);
        assert_eq!(chunk_size(10_000), 5_000);
        assert_eq!(chunk_size(10_001), 1_000);
        assert_eq!(chunk_size(100_000), 1_000);
        assert_eq!(chunk_size(100_001), 500);
    }

    #[test]
    fn test_row_chunks_cover_rows() {
        let chunks: Vec<_> = row_chunks(12_500).collect();
        assert_eq!(chunks.len(), 13);
        assert_eq!(chunks[0], (0, 1_000));
        assert_eq!(chunks[12], (12_000, 12_500));

        assert_eq!(row_chunks(300).collect::<Vec<_>>(), vec![(0, 300)]);
        assert_eq!(row_chunks(0).count(), 0);
    }

    #[test]
    fn test_rows_to_process() {
        let options = ScanOptions::default();
        assert_eq!(options.rows_to_process(10_000), 300);
        assert_eq!(options.rows_to_process(12), 12);
        assert_eq!(options.with_max_rows(20_000).rows_to_process(10_000), 10_000);
    }

    #[test]
    fn test_touch_rows() {
        let mut sheet = MemorySheet::new("S");
        let rows: BTreeSet<u32> = [1, 4].into_iter().collect();

        touch_rows(&mut sheet, &rows, &ScanOptions::default());
        assert_eq!(sheet.row_height(1), Some(TOUCHED_ROW_HEIGHT));
        assert_eq!(sheet.row_height(4), Some(TOUCHED_ROW_HEIGHT));
        assert_eq!(sheet.row_height(0), None);

        let mut untouched = MemorySheet::new("S");
        let options = ScanOptions {
            touched_row_height: None,
            ..Default::default()
        };
        touch_rows(&mut untouched, &rows, &options);
        assert!(untouched.custom_row_heights().is_empty());
    }
}
