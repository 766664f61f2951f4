//! End-of-run summary

use cellsweep_core::{FileOutcome, ItemCounts};
use std::fmt::Write as _;
use std::time::Duration;

/// Width of the `=` rules framing summary blocks
pub const RULE_WIDTH: usize = 60;

/// Outcomes of every file in a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub files: Vec<FileOutcome>,
    pub duration: Duration,
    /// Noun used for changes ("replacements", "updates")
    pub noun: &'static str,
    pub dry_run: bool,
}

impl RunSummary {
    /// Create an empty summary
    pub fn new(noun: &'static str, dry_run: bool) -> Self {
        Self {
            files: Vec::new(),
            duration: Duration::ZERO,
            noun,
            dry_run,
        }
    }

    /// Files processed
    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    /// Files that did not fail
    pub fn successful(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    /// Files that failed
    pub fn failed(&self) -> usize {
        self.total_files() - self.successful()
    }

    /// Check if any file failed
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Changes across successful files
    pub fn total_changes(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.is_success())
            .map(|f| f.changes)
            .sum()
    }

    /// Per-item counts merged across successful files
    pub fn counts(&self) -> ItemCounts {
        let mut counts = ItemCounts::new();
        for file in self.files.iter().filter(|f| f.is_success()) {
            counts.merge(&file.counts);
        }
        counts
    }

    /// Failed files with their error detail
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.is_success())
    }

    /// Lines of the summary shown at the end of a run
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "=".repeat(RULE_WIDTH),
            "PROCESSING COMPLETE!".to_string(),
            format!(
                "Total processing time: {:.1} seconds",
                self.duration.as_secs_f64()
            ),
            format!("Total files processed: {}", self.total_files()),
            format!("Successful: {}", self.successful()),
            format!("Failed: {}", self.failed()),
        ];

        let changes = if self.dry_run {
            format!("Total {} found (dry run, nothing saved): {}", self.noun, self.total_changes())
        } else {
            format!("Total {} made: {}", self.noun, self.total_changes())
        };
        lines.push(changes);

        let counts = self.counts();
        if counts.total() > 0 {
            lines.push(String::new());
            lines.push("Breakdown:".to_string());
            for (label, n) in counts.non_zero() {
                lines.push(format!("  '{}': {} {}", label, n, self.noun));
            }
        }

        if self.has_failures() {
            lines.push(String::new());
            lines.push(format!(
                "{} file(s) failed to process. Check the error log for details.",
                self.failed()
            ));
            for file in self.failures() {
                lines.push(format!(
                    "  {}: {}",
                    file.file_name(),
                    file.detail.as_deref().unwrap_or("unknown error")
                ));
            }
        } else {
            lines.push(String::new());
            lines.push("All files processed successfully!".to_string());
        }

        lines
    }

    /// Block appended to the error log when the run ends
    pub fn error_log_block(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut block = String::new();
        let _ = writeln!(block);
        let _ = writeln!(block, "{}", rule);
        let _ = writeln!(block, "ERROR SUMMARY");
        let _ = writeln!(block, "{}", rule);
        let _ = writeln!(block, "Total files processed: {}", self.total_files());
        let _ = writeln!(block, "Successful: {}", self.successful());
        let _ = writeln!(block, "Failed: {}", self.failed());
        let _ = writeln!(block);
        if self.has_failures() {
            let _ = writeln!(block, "{} file(s) encountered errors.", self.failed());
            let _ = writeln!(block, "See error messages above for details.");
        } else {
            let _ = writeln!(block, "No errors occurred during processing!");
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellsweep_core::SheetOutcome;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn summary() -> RunSummary {
        let mut counts = ItemCounts::with_labels(["foo", "baz"]);
        counts.add("foo", 3);

        let mut summary = RunSummary::new("replacements", false);
        summary.files.push(FileOutcome::from_sheets(
            PathBuf::from("a.xlsx"),
            vec![SheetOutcome::success("S", counts)],
        ));
        summary
            .files
            .push(FileOutcome::failed(PathBuf::from("dir/b.xlsx"), "cannot open"));
        summary.duration = Duration::from_millis(2_500);
        summary
    }

    #[test]
    fn test_totals() {
        let summary = summary();
        assert_eq!(summary.total_files(), 2);
        assert_eq!(summary.successful(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total_changes(), 3);
        assert_eq!(summary.counts().describe(), "'foo': 3");
    }

    #[test]
    fn test_report_lines() {
        let lines = summary().report_lines();
        assert!(lines.contains(&"Total processing time: 2.5 seconds".to_string()));
        assert!(lines.contains(&"Total replacements made: 3".to_string()));
        assert!(lines.contains(&"  'foo': 3 replacements".to_string()));
        assert!(!lines.iter().any(|l| l.contains("'baz'")));
        assert!(lines.contains(&"  b.xlsx: cannot open".to_string()));
    }

    #[test]
    fn test_error_log_block() {
        let block = summary().error_log_block();
        assert!(block.contains("ERROR SUMMARY"));
        assert!(block.contains("1 file(s) encountered errors."));

        let clean = RunSummary::new("updates", false).error_log_block();
        assert!(clean.contains("No errors occurred during processing!"));
    }
}
