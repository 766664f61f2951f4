//! Per-file processing
//!
//! A [`Job`] knows how to process one sheet; [`process_file`] wraps it with
//! the file-level steps (backup, open, save-if-changed, close) and [`run`]
//! drives a list of files into a [`RunSummary`].
//!
//! Failures never escape a file: an unopenable or unsavable workbook becomes
//! a failed [`FileOutcome`] and the run moves on.

use crate::backup::create_backup;
use crate::config::{ReplaceConfig, RunSettings, UpdateConfig};
use crate::discovery::display_name;
use crate::summary::RunSummary;
use cellsweep_core::{
    lift_protection, replace_eligibility, replace_in_sheet, update_eligibility, update_sheet,
    Backend, Eligibility, FileOutcome, OutcomeKind, Sheet, SheetOutcome, Workbook,
};
use std::path::Path;
use std::time::Instant;

/// Sheet-level work applied to every sheet of every file
pub trait Job {
    /// Noun used for changes in messages ("replacements", "updates")
    fn noun(&self) -> &'static str;

    /// Run-wide settings
    fn settings(&self) -> &RunSettings;

    /// Process one sheet; never fails, failures are reported in the outcome
    fn process_sheet(&self, file: &str, sheet: &mut dyn Sheet) -> SheetOutcome;
}

impl Job for ReplaceConfig {
    fn noun(&self) -> &'static str {
        "replacements"
    }

    fn settings(&self) -> &RunSettings {
        &self.settings
    }

    fn process_sheet(&self, file: &str, sheet: &mut dyn Sheet) -> SheetOutcome {
        let name = sheet.name().to_string();
        let columns = match replace_eligibility(&name, &self.sheets) {
            Eligibility::Eligible(columns) => columns,
            Eligibility::Skipped(reason) => {
                log::info!("Skipping sheet '{}' ({})", name, reason);
                return SheetOutcome::skipped(name, reason);
            }
        };

        match columns.indices() {
            Some(indices) => log::info!(
                "Target columns: {} (indices {:?})",
                columns.letters(),
                indices
            ),
            None => log::info!("Target columns: all (first {})", self.settings.scan.column_cap),
        }

        lift_protection(sheet);

        match replace_in_sheet(sheet, &self.replacer, &columns, &self.settings.scan) {
            Ok(stats) => {
                report_sheet(&name, stats.total(), self.noun(), &stats.counts.describe());
                SheetOutcome::success(name, stats.counts)
            }
            Err(e) => {
                log::error!("Error processing sheet '{}' in {}: {}", name, file, e);
                SheetOutcome::failed(name, e.to_string())
            }
        }
    }
}

impl Job for UpdateConfig {
    fn noun(&self) -> &'static str {
        "updates"
    }

    fn settings(&self) -> &RunSettings {
        &self.settings
    }

    fn process_sheet(&self, file: &str, sheet: &mut dyn Sheet) -> SheetOutcome {
        let name = sheet.name().to_string();
        let rules = match update_eligibility(&name, &self.rules) {
            Eligibility::Eligible(rules) => rules,
            Eligibility::Skipped(reason) => {
                log::info!("Skipping sheet '{}' ({})", name, reason);
                return SheetOutcome::skipped(name, reason);
            }
        };

        lift_protection(sheet);

        match update_sheet(sheet, rules, &self.settings.scan) {
            Ok(stats) => {
                report_sheet(&name, stats.total(), self.noun(), &stats.counts.describe());
                SheetOutcome::success(name, stats.counts)
            }
            Err(e) => {
                log::error!("Error processing sheet '{}' in {}: {}", name, file, e);
                SheetOutcome::failed(name, e.to_string())
            }
        }
    }
}

fn report_sheet(sheet: &str, changes: usize, noun: &str, breakdown: &str) {
    if changes > 0 {
        log::info!("Sheet '{}': {} {} made ({})", sheet, changes, noun, breakdown);
    } else {
        log::info!("Sheet '{}': no changes needed", sheet);
    }
}

/// Process one workbook file
///
/// The workbook is saved only when something changed (and not in a dry run).
/// Change counts are kept only if the save succeeded; a failed save turns the
/// whole file into a failure.
pub fn process_file<B: Backend, J: Job>(backend: &B, path: &Path, job: &J) -> FileOutcome {
    let started = Instant::now();
    let mut outcome = process_file_inner(backend, path, job);
    outcome.duration = started.elapsed();
    log::info!(
        "Processing time: {:.1} seconds",
        outcome.duration.as_secs_f64()
    );
    outcome
}

fn process_file_inner<B: Backend, J: Job>(backend: &B, path: &Path, job: &J) -> FileOutcome {
    let file = display_name(path);
    let settings = job.settings();

    if settings.enable_backups && !settings.dry_run {
        match create_backup(path) {
            Ok(backup) => log::info!("Backup created: {}", display_name(&backup)),
            Err(e) => log::error!("Failed to create backup for {}: {}", file, e),
        }
    }

    let mut workbook = match backend.open(path) {
        Ok(workbook) => workbook,
        Err(e) => {
            log::error!("Error processing {}: {}", file, e);
            return FileOutcome::failed(path.to_path_buf(), e.to_string());
        }
    };

    let count = workbook.sheet_count();
    log::info!("Found {} sheets to process", count);

    let mut sheets = Vec::with_capacity(count);
    for index in 0..count {
        let Some(sheet_outcome) = workbook.with_sheet(index, |sheet| {
            log::info!("Sheet {}/{}: {}", index + 1, count, sheet.name());
            job.process_sheet(&file, sheet)
        }) else {
            continue;
        };
        if sheet_outcome.kind == OutcomeKind::Failed {
            log::warn!(
                "Sheet '{}' in {} was not processed",
                sheet_outcome.sheet,
                file
            );
        }
        sheets.push(sheet_outcome);
    }

    let mut outcome = FileOutcome::from_sheets(path.to_path_buf(), sheets);

    if outcome.changes == 0 {
        log::info!("No changes needed");
    } else if settings.dry_run {
        log::info!(
            "Dry run: {} {} found, workbook not saved",
            outcome.changes,
            job.noun()
        );
    } else {
        log::info!("Saving changes");
        match workbook.save() {
            Ok(()) => log::info!("SUCCESS: {} total {} saved", outcome.changes, job.noun()),
            Err(e) => {
                log::error!("Error saving {}: {}", file, e);
                outcome = FileOutcome::failed(path.to_path_buf(), e.to_string());
            }
        }
    }

    if let Err(e) = workbook.close() {
        log::warn!("Cleanup warning for {}: {}", file, e);
    }

    outcome
}

/// Process every file in order and summarize
///
/// The configured delay is applied between files.
pub fn run<B: Backend, J: Job>(backend: &B, files: &[std::path::PathBuf], job: &J) -> RunSummary {
    let settings = job.settings();
    let mut summary = RunSummary::new(job.noun(), settings.dry_run);
    let started = Instant::now();

    for (i, path) in files.iter().enumerate() {
        log::info!("File {}/{}: {}", i + 1, files.len(), display_name(path));
        summary.files.push(process_file(backend, path, job));

        if !settings.process_delay.is_zero() && i + 1 < files.len() {
            std::thread::sleep(settings.process_delay);
        }
    }

    summary.duration = started.elapsed();
    summary
}
