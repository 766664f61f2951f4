//! Timestamped workbook backups

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Directory created next to the workbooks
pub const BACKUP_DIR: &str = "backups";

/// Timestamp format prefixed to backup file names
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Backup location for a workbook at a given time
pub fn backup_path(file: &Path, at: &DateTime<Local>) -> PathBuf {
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    dir.join(BACKUP_DIR)
        .join(format!("{}_{}", at.format(BACKUP_TIMESTAMP_FORMAT), name))
}

/// Copy a workbook into the sibling `backups` directory
pub fn create_backup(file: &Path) -> Result<PathBuf> {
    let target = backup_path(file, &Local::now());
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    std::fs::copy(file, &target).map_err(|e| Error::io(file, e))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            backup_path(Path::new("/data/book.xlsx"), &at),
            PathBuf::from("/data/backups/20240309_140507_book.xlsx")
        );
    }

    #[test]
    fn test_create_backup_copies_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("book.xlsx");
        std::fs::write(&file, b"workbook bytes").unwrap();

        let backup = create_backup(&file).unwrap();
        assert_eq!(backup.parent().unwrap(), dir.path().join(BACKUP_DIR));
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_book.xlsx"));
        assert_eq!(std::fs::read(&backup).unwrap(), b"workbook bytes");
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(create_backup(&dir.path().join("missing.xlsx")).is_err());
    }
}
