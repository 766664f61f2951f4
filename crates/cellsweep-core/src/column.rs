//! Column letters and column-spec parsing
//!
//! Column specs use the spreadsheet style column syntax:
//!
//! - a single column: `"A"`, `"Z"`, `"AA"`
//! - an inclusive range: `"A:C"`
//! - a comma separated list mixing both: `"A,C:E,G"`
//!
//! Letters are converted with bijective base-26 numbering (A=0, Z=25, AA=26).

use crate::error::{Error, Result};
use crate::MAX_COLS;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
pub fn column_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col as u64 + 1;

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
///
/// Letters are case-insensitive and surrounding whitespace is ignored.
pub fn letters_to_column(letters: &str) -> Result<u32> {
    let letters = letters.trim();
    if letters.is_empty() {
        return Err(Error::malformed_spec(letters, "empty column letters"));
    }

    let mut col: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::malformed_spec(
                letters,
                format!("invalid column letter '{}'", c),
            ));
        }
        col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if col > MAX_COLS as u64 {
            return Err(Error::malformed_spec(
                letters,
                format!("column is beyond {}", column_to_letters(MAX_COLS - 1)),
            ));
        }
    }

    Ok((col - 1) as u32)
}

/// The set of columns a scan is allowed to touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelection {
    /// No restriction: every column is eligible (subject to the engine's cap)
    All,
    /// Only these zero-based column indices (may be empty)
    Only(BTreeSet<u32>),
}

impl ColumnSelection {
    /// Parse an optional column spec
    ///
    /// `None`, `""` and whitespace-only specs mean "no restriction", which is
    /// kept distinct from an explicit empty set (e.g. from a reversed range).
    ///
    /// # Examples
    /// ```
    /// use cellsweep_core::ColumnSelection;
    ///
    /// let cols = ColumnSelection::parse(Some("A,C:E,G")).unwrap();
    /// assert_eq!(cols.indices(), Some(vec![0, 2, 3, 4, 6]));
    ///
    /// assert_eq!(ColumnSelection::parse(None).unwrap(), ColumnSelection::All);
    /// ```
    pub fn parse(spec: Option<&str>) -> Result<Self> {
        match spec {
            Some(spec) if !spec.trim().is_empty() => parse_column_spec(spec).map(Self::Only),
            _ => Ok(Self::All),
        }
    }

    /// Whether the selection is unrestricted
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Ascending column indices, or `None` for [`ColumnSelection::All`]
    pub fn indices(&self) -> Option<Vec<u32>> {
        match self {
            Self::All => None,
            Self::Only(set) => Some(set.iter().copied().collect()),
        }
    }

    /// Check if a column is part of the selection
    pub fn contains(&self, col: u32) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(&col),
        }
    }

    /// Resolve the concrete columns to scan in a sheet `available_cols` wide
    ///
    /// Explicit selections are clipped to the sheet width; `All` becomes the
    /// first `min(available_cols, default_cap)` columns.
    pub fn resolve(&self, available_cols: u32, default_cap: u32) -> Vec<u32> {
        match self {
            Self::All => (0..available_cols.min(default_cap)).collect(),
            Self::Only(set) => set
                .iter()
                .copied()
                .take_while(|&col| col < available_cols)
                .collect(),
        }
    }

    /// Column letters for display (`"ALL"` when unrestricted)
    pub fn letters(&self) -> String {
        match self {
            Self::All => "ALL".to_string(),
            Self::Only(set) => set
                .iter()
                .map(|&col| column_to_letters(col))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl FromStr for ColumnSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(Some(s))
    }
}

impl fmt::Display for ColumnSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letters())
    }
}

/// Parse a non-empty column spec into a set of zero-based column indices
///
/// A reversed range such as `"C:A"` contributes nothing rather than failing.
pub fn parse_column_spec(spec: &str) -> Result<BTreeSet<u32>> {
    let mut columns = BTreeSet::new();

    for part in spec.split(',').map(str::trim) {
        if part.is_empty() {
            return Err(Error::malformed_spec(spec, "empty column entry"));
        }

        match part.split_once(':') {
            Some((start, end)) => {
                if end.contains(':') {
                    return Err(Error::malformed_spec(
                        spec,
                        format!("range '{}' has more than one ':'", part),
                    ));
                }
                let start = letters_to_column(start)
                    .map_err(|e| reword(spec, part, e))?;
                let end = letters_to_column(end).map_err(|e| reword(spec, part, e))?;
                columns.extend(start..=end);
            }
            None => {
                columns.insert(letters_to_column(part).map_err(|e| reword(spec, part, e))?);
            }
        }
    }

    Ok(columns)
}

/// Report letter errors against the whole spec rather than one fragment
fn reword(spec: &str, part: &str, err: Error) -> Error {
    match err {
        Error::MalformedColumnSpec { reason, .. } => {
            Error::malformed_spec(spec, format!("{} in '{}'", reason, part))
        }
        other => other,
    }
}
