//! JSON configuration
//!
//! A configuration file is deserialized into [`ConfigFile`] (every section is
//! optional) and then validated into an immutable [`ReplaceConfig`] or
//! [`UpdateConfig`] that is passed by reference to the pipeline.
//!
//! ```json
//! {
//!   "general_settings": {
//!     "enable_backups": true,
//!     "max_rows_to_process": 300,
//!     "process_delay_seconds": 0
//!   },
//!   "folder_paths": { "windows": "C:\\Sheets", "mac": "/Users/me/Sheets", "linux": "/srv/sheets" },
//!   "search_and_update_rules": [
//!     {
//!       "name": "Price Update",
//!       "sheet_name": "Price List",
//!       "search_column": "A",
//!       "search_value": "Product123",
//!       "update_column": "Z",
//!       "target_value": 99.99,
//!       "enabled": true
//!     }
//!   ],
//!   "replacement_pairs": [{ "find": "foo", "replace": "bar" }],
//!   "sheets": { "Orders": { "columns": "A,C:E", "enabled": true } }
//! }
//! ```

use crate::error::{Error, Result};
use cellsweep_core::rules::UNNAMED_RULE;
use cellsweep_core::scan::DEFAULT_MAX_ROWS;
use cellsweep_core::{
    sheet_names_match, ReplacementPair, Replacer, ScanOptions, SheetConfig, SheetConfigs,
    SheetRules, UpdateRule,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Operating system family used to pick a folder path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Mac,
    Linux,
}

impl Platform {
    /// Platform of the running process
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value; anything unknown counts as Linux
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "macos" => Platform::Mac,
            _ => Platform::Linux,
        }
    }

    /// Key used in `folder_paths`
    pub fn key(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Mac => "mac",
            Platform::Linux => "linux",
        }
    }
}

/// `general_settings` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    pub enable_backups: bool,
    pub max_rows_to_process: u32,
    pub process_delay_seconds: f64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            enable_backups: false,
            max_rows_to_process: DEFAULT_MAX_ROWS,
            process_delay_seconds: 0.0,
        }
    }
}

/// `folder_paths` section: one input directory per platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderPaths {
    pub windows: Option<String>,
    pub mac: Option<String>,
    pub linux: Option<String>,
}

impl FolderPaths {
    /// Configured directory for a platform (blank entries count as missing)
    pub fn for_platform(&self, platform: Platform) -> Option<PathBuf> {
        let path = match platform {
            Platform::Windows => &self.windows,
            Platform::Mac => &self.mac,
            Platform::Linux => &self.linux,
        };
        path.as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

/// One entry of `search_and_update_rules`
///
/// Search and target values may be written as JSON strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleEntry {
    pub name: Option<String>,
    pub sheet_name: Option<String>,
    pub search_column: Option<String>,
    pub search_value: Option<Value>,
    pub update_column: Option<String>,
    pub target_value: Option<Value>,
    pub enabled: bool,
}

impl Default for RuleEntry {
    fn default() -> Self {
        Self {
            name: None,
            sheet_name: None,
            search_column: None,
            search_value: None,
            update_column: None,
            target_value: None,
            enabled: true,
        }
    }
}

impl RuleEntry {
    fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNNAMED_RULE)
    }

    fn to_rule(&self) -> Result<(String, UpdateRule)> {
        let name = self.display_name();
        let sheet_name = required_text(self.sheet_name.as_deref(), name, "sheet_name")?;
        let search_column = required_text(self.search_column.as_deref(), name, "search_column")?;
        let update_column = required_text(self.update_column.as_deref(), name, "update_column")?;
        let search_value = value_text(self.search_value.as_ref(), name, "search_value")?;
        let target_value = value_text(self.target_value.as_ref(), name, "target_value")?;

        let rule = UpdateRule::new(name, search_column, search_value, update_column, target_value)?;
        Ok((sheet_name.to_string(), rule))
    }
}

fn required_text<'a>(value: Option<&'a str>, rule: &str, field: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(Error::configuration(format!(
            "rule '{}' is missing '{}'",
            rule, field
        ))),
    }
}

fn value_text(value: Option<&Value>, rule: &str, field: &str) -> Result<String> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        None | Some(Value::Null) => Err(Error::configuration(format!(
            "rule '{}' is missing '{}'",
            rule, field
        ))),
        Some(_) => Err(Error::configuration(format!(
            "rule '{}': '{}' must be text or a number",
            rule, field
        ))),
    }
}

/// One entry of `replacement_pairs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairEntry {
    pub find: String,
    #[serde(default)]
    pub replace: String,
}

impl FromStr for PairEntry {
    type Err = Error;

    /// Parse `FIND=REPLACE`
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((find, replace)) if !find.is_empty() => Ok(Self {
                find: find.to_string(),
                replace: replace.to_string(),
            }),
            _ => Err(Error::configuration(format!(
                "expected FIND=REPLACE, got '{}'",
                s
            ))),
        }
    }
}

/// One entry of `sheets`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetEntry {
    /// Column spec such as `"A,C:E"`; absent means every column
    pub columns: Option<String>,
    pub enabled: bool,
}

impl Default for SheetEntry {
    fn default() -> Self {
        Self {
            columns: None,
            enabled: true,
        }
    }
}

/// A `NAME=COLUMNS` sheet argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetArg {
    pub name: String,
    pub entry: SheetEntry,
}

impl FromStr for SheetArg {
    type Err = Error;

    /// Parse `NAME=COLUMNS`, or a bare `NAME` for every column
    fn from_str(s: &str) -> Result<Self> {
        let (name, columns) = match s.split_once('=') {
            Some((name, columns)) => (name, Some(columns.trim().to_string())),
            None => (s, None),
        };
        if name.trim().is_empty() {
            return Err(Error::configuration(format!(
                "expected NAME=COLUMNS, got '{}'",
                s
            )));
        }

        Ok(Self {
            name: name.trim().to_string(),
            entry: SheetEntry {
                columns: columns.filter(|c| !c.is_empty()),
                enabled: true,
            },
        })
    }
}

/// Configuration file as written on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub general_settings: GeneralSettings,
    pub folder_paths: FolderPaths,
    pub search_and_update_rules: Vec<RuleEntry>,
    pub replacement_pairs: Vec<PairEntry>,
    /// Sheet entries in declaration order
    pub sheets: IndexMap<String, SheetEntry>,
}

impl ConfigFile {
    /// Parse a configuration document
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::configuration(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::io(path, e)
            }
        })?;

        let config = Self::from_json(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Add a replacement pair (after those from the file)
    pub fn add_pair(&mut self, pair: PairEntry) {
        self.replacement_pairs.push(pair);
    }

    /// Add a sheet entry, replacing any entry for the same normalized name
    pub fn add_sheet(&mut self, sheet: SheetArg) {
        self.sheets
            .retain(|name, _| !sheet_names_match(name, &sheet.name));
        self.sheets.insert(sheet.name, sheet.entry);
    }

    /// Validate as a find/replace configuration
    pub fn replace_config(&self, platform: Platform) -> Result<ReplaceConfig> {
        let settings = RunSettings::from_general(&self.general_settings)?;

        if self.replacement_pairs.is_empty() {
            return Err(Error::configuration("no replacement pairs configured"));
        }
        let pairs: Vec<ReplacementPair> = self
            .replacement_pairs
            .iter()
            .map(|p| ReplacementPair::new(p.find.as_str(), p.replace.as_str()))
            .collect();
        let replacer = Replacer::new(&pairs)?;

        // First declared entry wins among names that normalize alike
        let mut sheets = SheetConfigs::new();
        for (name, entry) in &self.sheets {
            if name.trim().is_empty() {
                return Err(Error::configuration("sheet entry with an empty name"));
            }
            if let Some(earlier) = sheets.get(name) {
                log::warn!(
                    "Sheet entry '{}' matches earlier entry '{}' and is ignored",
                    name,
                    earlier.name
                );
                continue;
            }
            let config = SheetConfig::new(name.as_str(), entry.columns.as_deref())?
                .with_enabled(entry.enabled);
            sheets.insert(config);
        }

        Ok(ReplaceConfig {
            settings,
            directory: self.folder_paths.for_platform(platform),
            replacer,
            sheets,
        })
    }

    /// Validate as a rule-update configuration
    ///
    /// Disabled rules are dropped; at least one enabled rule is required.
    pub fn update_config(&self, platform: Platform) -> Result<UpdateConfig> {
        let settings = RunSettings::from_general(&self.general_settings)?;

        let mut rules = SheetRules::new();
        for entry in &self.search_and_update_rules {
            if !entry.enabled {
                log::debug!("Rule '{}' is disabled", entry.display_name());
                continue;
            }
            let (sheet_name, rule) = entry.to_rule()?;
            rules.push(&sheet_name, rule);
        }

        if rules.is_empty() {
            return Err(Error::configuration(
                "No enabled rules found in configuration (search_and_update_rules)",
            ));
        }

        Ok(UpdateConfig {
            settings,
            directory: self.folder_paths.for_platform(platform),
            rules,
        })
    }
}

/// Where `update` looks for its configuration by default
///
/// `config.json` next to the executable when it exists there, otherwise in
/// the current directory.
pub fn default_config_path() -> PathBuf {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)));

    match beside_exe {
        Some(path) if path.is_file() => path,
        _ => PathBuf::from(CONFIG_FILE_NAME),
    }
}

/// Settings shared by both run kinds
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub enable_backups: bool,
    pub scan: ScanOptions,
    /// Pause between two files
    pub process_delay: Duration,
    /// Run the engines but never save
    pub dry_run: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            enable_backups: false,
            scan: ScanOptions::default(),
            process_delay: Duration::ZERO,
            dry_run: false,
        }
    }
}

impl RunSettings {
    fn from_general(general: &GeneralSettings) -> Result<Self> {
        if general.max_rows_to_process == 0 {
            return Err(Error::configuration(
                "max_rows_to_process must be at least 1",
            ));
        }
        let process_delay = Duration::try_from_secs_f64(general.process_delay_seconds)
            .map_err(|e| {
                Error::configuration(format!(
                    "process_delay_seconds must be a reasonable non-negative number ({})",
                    e
                ))
            })?;

        Ok(Self {
            enable_backups: general.enable_backups,
            scan: ScanOptions::default().with_max_rows(general.max_rows_to_process),
            process_delay,
            dry_run: false,
        })
    }
}

/// Validated find/replace configuration
#[derive(Debug, Clone)]
pub struct ReplaceConfig {
    pub settings: RunSettings,
    /// Input directory for the current platform, if configured
    pub directory: Option<PathBuf>,
    pub replacer: Replacer,
    /// Per-sheet targeting; empty means every sheet, every column
    pub sheets: SheetConfigs,
}

/// Validated rule-update configuration
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    pub settings: RunSettings,
    /// Input directory for the current platform, if configured
    pub directory: Option<PathBuf>,
    pub rules: SheetRules,
}
