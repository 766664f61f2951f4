//! cellsweep CLI - batch find/replace and rule-driven updates in workbooks

mod logging;

use anyhow::{bail, Context, Result};
use cellsweep::config::{default_config_path, ConfigFile, PairEntry, Platform, SheetArg};
use cellsweep::{discover_workbooks, run, Backend, ColumnSelection, Job, RunSummary, XlsxBackend};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use logging::{LogPaths, RunLogger, FILE_TIMESTAMP_FORMAT};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cellsweep")]
#[command(
    author,
    version,
    about = "Batch find/replace and rule-driven cell updates across workbooks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace text in every workbook of a directory
    Replace {
        #[command(flatten)]
        run: RunArgs,

        /// Replacement pair as FIND=REPLACE (repeatable, applied in order)
        #[arg(short, long = "pair", value_name = "FIND=REPLACE")]
        pairs: Vec<PairEntry>,

        /// Sheet to process as NAME=COLUMNS, e.g. "Orders=A,C:E" (repeatable)
        #[arg(short, long = "sheet", value_name = "NAME=COLUMNS")]
        sheets: Vec<SheetArg>,
    },

    /// Apply the search-and-update rules of a configuration file
    Update {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Show the columns a column spec selects
    Columns {
        /// Column spec such as "A,C:E,G"
        spec: String,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with the workbooks (overrides folder_paths)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Rows scanned per sheet (overrides max_rows_to_process)
    #[arg(long)]
    max_rows: Option<u32>,

    /// Copy each workbook into a `backups` directory before editing
    #[arg(long)]
    backup: bool,

    /// Scan and report without saving anything
    #[arg(long)]
    dry_run: bool,

    /// Directory for the log files (default: current directory)
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Log debug details
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replace { run, pairs, sheets } => replace(run, pairs, sheets),
        Commands::Update { run } => update(run),
        Commands::Columns { spec } => show_columns(&spec),
    }
}

fn replace(args: RunArgs, pairs: Vec<PairEntry>, sheets: Vec<SheetArg>) -> Result<ExitCode> {
    let logs = start_logging(&args, "cellsweep_replace", "CELLSWEEP REPLACE - ERROR LOG")?;

    let mut file = match &args.config {
        Some(path) => load_config(path)?,
        None => ConfigFile::default(),
    };
    for pair in pairs {
        file.add_pair(pair);
    }
    for sheet in sheets {
        file.add_sheet(sheet);
    }
    apply_overrides(&mut file, &args);

    let mut config = file
        .replace_config(Platform::current())
        .map_err(fatal)
        .context("Invalid replace configuration")?;
    config.settings.dry_run = args.dry_run;
    let directory = resolve_directory(&args, config.directory.as_deref())?;

    log::info!("Replacement pairs:");
    for pair in config.replacer.pairs() {
        log::info!("  {}", pair);
    }
    if config.sheets.is_empty() {
        log::info!("No sheet configuration: every sheet, every column");
    } else {
        for sheet in config.sheets.iter() {
            let state = if sheet.enabled { "" } else { " (disabled)" };
            log::info!("  '{}': columns {}{}", sheet.name, sheet.columns, state);
        }
    }

    execute(&directory, &config, &logs)
}

fn update(args: RunArgs) -> Result<ExitCode> {
    let logs = start_logging(&args, "cellsweep_update", "CELLSWEEP UPDATE - ERROR LOG")?;

    let path = args.config.clone().unwrap_or_else(default_config_path);
    let mut file = load_config(&path)?;
    apply_overrides(&mut file, &args);

    let mut config = file
        .update_config(Platform::current())
        .map_err(fatal)
        .context("Invalid update configuration")?;
    config.settings.dry_run = args.dry_run;
    let directory = resolve_directory(&args, config.directory.as_deref())?;

    log::info!("Active rules by sheet:");
    for (sheet, rules) in config.rules.iter() {
        log::info!("  '{}': {} rule(s)", sheet, rules.len());
        for rule in rules {
            log::info!("    - {}", rule.name);
        }
    }

    execute(&directory, &config, &logs)
}

fn show_columns(spec: &str) -> Result<ExitCode> {
    let columns = ColumnSelection::parse(Some(spec))
        .with_context(|| format!("Invalid column spec '{}'", spec))?;

    match columns.indices() {
        Some(indices) => {
            println!("Columns: {}", columns.letters());
            println!("Indices: {:?}", indices);
            if indices.is_empty() {
                println!("(the column spec selects no columns; reversed ranges such as C:A are empty)");
            }
        }
        None => println!("Columns: all"),
    }
    Ok(ExitCode::SUCCESS)
}

/// Create the log files and install the logger
fn start_logging(args: &RunArgs, prefix: &str, title: &str) -> Result<LogPaths> {
    std::fs::create_dir_all(&args.log_dir)
        .with_context(|| format!("Failed to create log directory '{}'", args.log_dir.display()))?;

    let timestamp = Local::now().format(FILE_TIMESTAMP_FORMAT).to_string();
    let paths = LogPaths::new(&args.log_dir, prefix, &timestamp);
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    RunLogger::create(&paths, title, level)
        .with_context(|| format!("Failed to create log files in '{}'", args.log_dir.display()))?
        .install()
        .context("Failed to install logger")?;

    log::info!("Running on: {}", std::env::consts::OS);
    log::info!("Main log: {}", paths.main.display());
    log::info!("Error log: {}", paths.errors.display());
    Ok(paths)
}

fn load_config(path: &Path) -> Result<ConfigFile> {
    ConfigFile::load(path)
        .map_err(fatal)
        .with_context(|| format!("Failed to load configuration from '{}'", path.display()))
}

fn apply_overrides(file: &mut ConfigFile, args: &RunArgs) {
    if let Some(max_rows) = args.max_rows {
        file.general_settings.max_rows_to_process = max_rows;
    }
    if args.backup {
        file.general_settings.enable_backups = true;
    }
}

fn resolve_directory(args: &RunArgs, configured: Option<&Path>) -> Result<PathBuf> {
    match args.dir.as_deref().or(configured) {
        Some(dir) => Ok(dir.to_path_buf()),
        None => {
            let platform = Platform::current().key();
            log::error!("No folder path configured for {}", platform);
            bail!(
                "No folder path configured for {} (set folder_paths.{} or pass --dir)",
                platform,
                platform
            )
        }
    }
}

/// Log a fatal error before handing it to anyhow
fn fatal(err: cellsweep::Error) -> cellsweep::Error {
    log::error!("{}", err);
    err
}

fn execute<J: Job>(directory: &Path, job: &J, logs: &LogPaths) -> Result<ExitCode> {
    let backend = XlsxBackend::new();
    backend
        .check_available()
        .map_err(cellsweep::Error::from)
        .map_err(fatal)
        .context("Workbook back-end unavailable")?;

    log::info!("Looking for workbook files in: {}", directory.display());
    let files = discover_workbooks(&backend, directory)
        .map_err(fatal)
        .context("Cannot list workbook files")?;
    if files.is_empty() {
        log::info!("No workbook files found");
    }
    if job.settings().dry_run {
        log::info!("Dry run: workbooks will not be saved");
    }

    let summary = run(&backend, &files, job);
    finish(&summary, logs);

    Ok(if summary.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn finish(summary: &RunSummary, logs: &LogPaths) {
    for line in summary.report_lines() {
        log::info!("{}", line);
    }
    log::info!("Log files created:");
    log::info!("  Main log: {}", logs.main.display());
    log::info!("  Error log: {}", logs.errors.display());

    log::logger().flush();
    if let Err(e) = logs.append_to_errors(&summary.error_log_block()) {
        log::warn!("Could not write the error log summary: {}", e);
    }
}
