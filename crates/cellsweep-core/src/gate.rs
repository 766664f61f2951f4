//! Sheet eligibility checks run before either engine

use crate::column::ColumnSelection;
use crate::rules::{SheetRules, UpdateRule};
use crate::sheet::SheetConfigs;
use crate::workbook::Sheet;

/// Whether a sheet should be processed, and with what
#[derive(Debug, Clone, PartialEq)]
pub enum Eligibility<T> {
    /// Process the sheet with the given input
    Eligible(T),
    /// Leave the sheet alone for the given reason
    Skipped(String),
}

impl<T> Eligibility<T> {
    /// Check if the sheet should be processed
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible(_))
    }
}

/// Columns to scan for a find/replace run, if the sheet is eligible
///
/// With no sheet configuration at all every sheet is eligible with no column
/// restriction.
pub fn replace_eligibility(sheet_name: &str, configs: &SheetConfigs) -> Eligibility<ColumnSelection> {
    if configs.is_empty() {
        return Eligibility::Eligible(ColumnSelection::All);
    }

    match configs.get(sheet_name) {
        None => Eligibility::Skipped("not in sheet configuration".into()),
        Some(config) if !config.enabled => Eligibility::Skipped("disabled in configuration".into()),
        Some(config) => Eligibility::Eligible(config.columns.clone()),
    }
}

/// Rules to apply for an update run, if the sheet is eligible
pub fn update_eligibility<'a>(sheet_name: &str, rules: &'a SheetRules) -> Eligibility<&'a [UpdateRule]> {
    match rules.for_sheet(sheet_name) {
        Some(rules) if !rules.is_empty() => Eligibility::Eligible(rules),
        _ => Eligibility::Skipped("no rules configured".into()),
    }
}

/// Try to remove write protection with an empty password
///
/// Returns `false` when the sheet stays protected; processing continues and
/// individual writes may fail.
pub fn lift_protection(sheet: &mut dyn Sheet) -> bool {
    if !sheet.is_protected() {
        return true;
    }

    log::info!("Sheet '{}' is protected, attempting to unprotect", sheet.name());
    match sheet.unprotect("") {
        Ok(()) => {
            log::info!("Sheet '{}' unprotected", sheet.name());
            true
        }
        Err(e) => {
            log::warn!(
                "Could not unprotect sheet '{}' ({}); changes may be skipped",
                sheet.name(),
                e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySheet;
    use crate::sheet::SheetConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_replace_without_configuration() {
        let configs = SheetConfigs::new();
        assert_eq!(
            replace_eligibility("Anything", &configs),
            Eligibility::Eligible(ColumnSelection::All)
        );
    }

    #[test]
    fn test_replace_with_configuration() {
        let configs: SheetConfigs = [
            SheetConfig::new("Data", Some("A,C")).unwrap(),
            SheetConfig::new("Archive", None).unwrap().with_enabled(false),
        ]
        .into_iter()
        .collect();

        match replace_eligibility(" data ", &configs) {
            Eligibility::Eligible(columns) => assert_eq!(columns.letters(), "A, C"),
            other => panic!("expected eligible, got {:?}", other),
        }
        assert!(!replace_eligibility("Archive", &configs).is_eligible());
        assert!(!replace_eligibility("Other", &configs).is_eligible());
    }

    #[test]
    fn test_update_eligibility() {
        let mut rules = SheetRules::new();
        rules.push(
            "Prices",
            UpdateRule::new("r", "A", "x", "B", "y").unwrap(),
        );

        assert!(update_eligibility("PRICES", &rules).is_eligible());
        assert_eq!(
            update_eligibility("Stock", &rules),
            Eligibility::Skipped("no rules configured".into())
        );
    }

    #[test]
    fn test_lift_protection() {
        let mut open = MemorySheet::new("Open");
        assert!(lift_protection(&mut open));

        let mut blank = MemorySheet::new("Blank");
        blank.protect("");
        assert!(lift_protection(&mut blank));
        assert!(!blank.is_protected());

        let mut locked = MemorySheet::new("Locked");
        locked.protect("secret");
        assert!(!lift_protection(&mut locked));
        assert!(locked.is_protected());
    }
}
