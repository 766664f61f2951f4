//! Workbook file discovery

use crate::error::{Error, Result};
use cellsweep_core::Backend;
use std::path::{Path, PathBuf};

/// Prefix of the lock files spreadsheet applications leave next to open workbooks
pub const LOCK_FILE_PREFIX: &str = "~$";

/// Files listed by name before the rest are summarized
pub const LISTED_FILES: usize = 5;

/// Check if a file name looks like a workbook the back-end handles
pub fn is_workbook_name<B: Backend>(backend: &B, name: &str) -> bool {
    if name.starts_with(LOCK_FILE_PREFIX) {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| backend.supports_extension(&ext.to_ascii_lowercase()))
}

/// Workbook files directly inside `dir`, sorted by name
pub fn discover_workbooks<B: Backend>(backend: &B, dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::configuration(format!(
            "Directory does not exist: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        if is_workbook_name(backend, &name.to_string_lossy()) {
            files.push(path);
        }
    }
    files.sort();

    log::info!(
        "Found {} workbook files (temporary files starting with {} are ignored)",
        files.len(),
        LOCK_FILE_PREFIX
    );
    for file in files.iter().take(LISTED_FILES) {
        log::info!("  {}", display_name(file));
    }
    if files.len() > LISTED_FILES {
        log::info!("  ... and {} more", files.len() - LISTED_FILES);
    }

    Ok(files)
}

/// File name of a path for messages
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
