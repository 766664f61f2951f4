//! Run logger
//!
//! Every record goes to stderr and to `<prefix>_log_<ts>.txt`; error records
//! also go to `<prefix>_errors_<ts>.txt`, which starts with a header block and
//! ends with the run summary block.

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Timestamp format of log lines
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Timestamp format of log file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Paths of the two log files of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub main: PathBuf,
    pub errors: PathBuf,
}

impl LogPaths {
    /// Log file paths for a prefix and file-name timestamp
    pub fn new(dir: &Path, prefix: &str, timestamp: &str) -> Self {
        Self {
            main: dir.join(format!("{}_log_{}.txt", prefix, timestamp)),
            errors: dir.join(format!("{}_errors_{}.txt", prefix, timestamp)),
        }
    }

    /// Append a block of text to the error log
    pub fn append_to_errors(&self, text: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.errors)?;
        file.write_all(text.as_bytes())
    }
}

/// Format one log line
pub fn format_line(level: Level, message: &str) -> String {
    format!(
        "{} - {} - {}",
        Local::now().format(LINE_TIMESTAMP_FORMAT),
        level,
        message
    )
}

/// Header written at the top of the error log
pub fn error_log_header(title: &str) -> String {
    let rule = "=".repeat(60);
    format!("{}\n{}\n{}\n\n", rule, title, rule)
}

/// `log::Log` implementation writing to stderr and the run's log files
pub struct RunLogger {
    level: LevelFilter,
    main: Mutex<File>,
    errors: Mutex<File>,
    echo: bool,
}

impl RunLogger {
    /// Create both log files (the error log gets its header)
    pub fn create(paths: &LogPaths, title: &str, level: LevelFilter) -> io::Result<Self> {
        let main = File::create(&paths.main)?;
        let mut errors = File::create(&paths.errors)?;
        errors.write_all(error_log_header(title).as_bytes())?;

        Ok(Self {
            level,
            main: Mutex::new(main),
            errors: Mutex::new(errors),
            echo: true,
        })
    }

    /// Stop echoing records to stderr
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Install as the global logger
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_logger(Box::leak(Box::new(self)))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(record.level(), &record.args().to_string());
        if self.echo {
            eprintln!("{}", line);
        }
        if let Ok(mut file) = self.main.lock() {
            let _ = writeln!(file, "{}", line);
        }
        if record.level() == Level::Error {
            if let Ok(mut file) = self.errors.lock() {
                let _ = writeln!(file, "{}", line);
            }
        }
    }

    fn flush(&self) {
        for file in [&self.main, &self.errors] {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}
