//! Engine tests driven through the in-memory back-end.
//!
//! Each test builds a workbook in a `MemoryBackend`, opens it through the
//! `Backend` trait, runs the gate and an engine over every sheet, saves, and
//! asserts against the saved copy.

use cellsweep_core::memory::{MemoryBackend, MemorySheet};
use cellsweep_core::{
    lift_protection, replace_eligibility, replace_in_sheet, update_eligibility, update_sheet,
    Backend, Eligibility, ReplacementPair, Replacer, ScanOptions, SheetConfig, SheetConfigs,
    Sheet, SheetRules, UpdateRule, Workbook,
};
use pretty_assertions::assert_eq;
use std::path::Path;

fn replace_workbook(
    backend: &MemoryBackend,
    path: &str,
    replacer: &Replacer,
    configs: &SheetConfigs,
) -> usize {
    let mut workbook = backend.open(Path::new(path)).expect("open");
    let mut total = 0;

    for index in 0..workbook.sheet_count() {
        total += workbook
            .with_sheet(index, |sheet| {
                let Eligibility::Eligible(columns) = replace_eligibility(sheet.name(), configs)
                else {
                    return 0;
                };
                lift_protection(sheet);
                replace_in_sheet(sheet, replacer, &columns, &ScanOptions::default())
                    .expect("replace")
                    .total()
            })
            .expect("sheet");
    }

    if total > 0 {
        workbook.save().expect("save");
    }
    total
}

#[test]
fn test_replace_across_sheets_with_targeting() {
    let backend = MemoryBackend::new();
    backend.insert(
        "book.xlsx",
        vec![
            MemorySheet::new("Orders")
                .with_cell(0, 0, "Foo and foo")
                .with_cell(0, 1, "foo")
                .with_cell(0, 2, "FOO"),
            MemorySheet::new("Notes").with_cell(0, 0, "foo"),
            MemorySheet::new("Archive").with_cell(0, 0, "foo"),
        ],
    );

    let configs: SheetConfigs = [
        SheetConfig::new("orders", Some("A,C")).unwrap(),
        SheetConfig::new("Notes", None).unwrap(),
        SheetConfig::new("Archive", None).unwrap().with_enabled(false),
    ]
    .into_iter()
    .collect();
    let replacer = Replacer::new(&[ReplacementPair::new("foo", "bar")]).unwrap();

    let total = replace_workbook(&backend, "book.xlsx", &replacer, &configs);
    assert_eq!(total, 4);

    let orders = backend.sheet("book.xlsx", "Orders").unwrap();
    assert_eq!(orders.text(0, 0), "bar and bar");
    assert_eq!(orders.text(0, 1), "foo");
    assert_eq!(orders.text(0, 2), "bar");
    assert_eq!(backend.sheet("book.xlsx", "Notes").unwrap().text(0, 0), "bar");
    assert_eq!(backend.sheet("book.xlsx", "Archive").unwrap().text(0, 0), "foo");
    assert_eq!(backend.save_count("book.xlsx"), 1);
}

#[test]
fn test_protected_sheet_does_not_fail_the_workbook() {
    let backend = MemoryBackend::new();
    let mut locked = MemorySheet::new("Locked")
        .with_cell(0, 0, "foo")
        .with_cell(1, 0, "foo");
    locked.protect("secret");
    locked.unlock_cell(1, 0);
    backend.insert(
        "book.xlsx",
        vec![locked, MemorySheet::new("Open").with_cell(0, 0, "foo")],
    );

    let replacer = Replacer::new(&[ReplacementPair::new("foo", "bar")]).unwrap();
    let total = replace_workbook(&backend, "book.xlsx", &replacer, &SheetConfigs::new());

    assert_eq!(total, 2);
    let locked = backend.sheet("book.xlsx", "Locked").unwrap();
    assert_eq!(locked.text(0, 0), "foo");
    assert_eq!(locked.text(1, 0), "bar");
}

#[test]
fn test_nothing_to_change_means_no_save() {
    let backend = MemoryBackend::new();
    backend.insert("book.xlsx", vec![MemorySheet::new("S").with_cell(0, 0, "clean")]);

    let replacer = Replacer::new(&[ReplacementPair::new("foo", "bar")]).unwrap();
    assert_eq!(
        replace_workbook(&backend, "book.xlsx", &replacer, &SheetConfigs::new()),
        0
    );
    assert_eq!(backend.save_count("book.xlsx"), 0);
}

#[test]
fn test_rules_per_sheet() {
    let backend = MemoryBackend::new();
    backend.insert(
        "prices.xlsx",
        vec![
            MemorySheet::new("Price List")
                .with_cell(0, 0, "Product123")
                .with_cell(1, 0, "other"),
            MemorySheet::new("Stock").with_cell(0, 0, "Product123"),
        ],
    );

    let mut rules = SheetRules::new();
    rules.push(
        "price list",
        UpdateRule::new("Price Update", "A", "product123", "Z", "99.99").unwrap(),
    );

    let mut workbook = backend.open(Path::new("prices.xlsx")).unwrap();
    let mut total = 0;
    for index in 0..workbook.sheet_count() {
        total += workbook
            .with_sheet(index, |sheet| match update_eligibility(sheet.name(), &rules) {
                Eligibility::Eligible(sheet_rules) => {
                    update_sheet(sheet, sheet_rules, &ScanOptions::default())
                        .unwrap()
                        .total()
                }
                Eligibility::Skipped(_) => 0,
            })
            .unwrap();
    }
    workbook.save().unwrap();

    assert_eq!(total, 1);
    let prices = backend.sheet("prices.xlsx", "Price List").unwrap();
    assert_eq!(prices.text(0, 25), "99.99");
    assert_eq!(prices.text(1, 25), "");
    assert_eq!(backend.sheet("prices.xlsx", "Stock").unwrap().text(0, 25), "");
}
