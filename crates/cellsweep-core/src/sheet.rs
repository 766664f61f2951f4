//! Sheet names and per-sheet configuration

use crate::column::ColumnSelection;
use crate::error::Result;
use unicode_normalization::UnicodeNormalization as _;

/// Normalize a sheet name for comparison
///
/// Applies Unicode NFKC, trims, collapses inner whitespace runs to a single
/// space and lowercases, so `"Ｓｕｂ  Categories "` matches `"sub categories"`.
pub fn normalize_sheet_name(name: &str) -> String {
    let normalized: String = name.nfkc().collect();
    normalized
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compare two sheet names after normalization
pub fn sheet_names_match(a: &str, b: &str) -> bool {
    normalize_sheet_name(a) == normalize_sheet_name(b)
}

/// Targeting for one configured sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    /// Sheet name as written in the configuration
    pub name: String,
    /// Columns to scan
    pub columns: ColumnSelection,
    /// Disabled sheets are skipped
    pub enabled: bool,
}

impl SheetConfig {
    /// Create an enabled sheet configuration from an optional column spec
    pub fn new<S: Into<String>>(name: S, columns: Option<&str>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            columns: ColumnSelection::parse(columns)?,
            enabled: true,
        })
    }

    /// Builder-style toggle for `enabled`
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Ordered collection of sheet configurations with normalized lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetConfigs {
    entries: Vec<(String, SheetConfig)>,
}

impl SheetConfigs {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration; a later entry for the same normalized name replaces the earlier one
    pub fn insert(&mut self, config: SheetConfig) {
        let key = normalize_sheet_name(&config.name);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = config,
            None => self.entries.push((key, config)),
        }
    }

    /// Find the configuration for a sheet name
    pub fn get(&self, sheet_name: &str) -> Option<&SheetConfig> {
        let key = normalize_sheet_name(sheet_name);
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, c)| c)
    }

    /// Check if no sheets are configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of configured sheets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over configurations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SheetConfig> {
        self.entries.iter().map(|(_, c)| c)
    }
}

impl FromIterator<SheetConfig> for SheetConfigs {
    fn from_iter<I: IntoIterator<Item = SheetConfig>>(iter: I) -> Self {
        let mut configs = Self::new();
        for config in iter {
            configs.insert(config);
        }
        configs
    }
}
