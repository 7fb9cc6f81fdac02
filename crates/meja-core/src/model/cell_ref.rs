//! Cell reference parsing and formatting.
//!
//! Converts between spreadsheet-style references ("A1", "$B$2", "'Data'!C3")
//! and zero-indexed row/column coordinates.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{MejaError, Result};

static A1_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:'(?<quoted>(?:[^']|'')+)'|(?<plain>[A-Za-z0-9_.]+))!)?\$?(?<letters>[A-Za-z]+)\$?(?<numbers>[0-9]+)$")
        .ok()
});

/// Options controlling how a reference is rendered by [`CellRef::display_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefOption {
    /// Prefix the row with `$`.
    FixRow,
    /// Prefix the column with `$`.
    FixColumn,
    /// Prefix the reference with the quoted sheet name.
    WithSheet,
}

/// A reference to a cell by row and column indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a plain A1 reference. `$` markers are accepted and ignored.
    pub fn parse(name: &str) -> Result<CellRef> {
        match Self::parse_qualified(name)? {
            (None, cell) => Ok(cell),
            (Some(_), _) => Err(MejaError::InvalidCellRef(name.to_string())),
        }
    }

    /// Parse a reference that may carry a sheet prefix (`'My Sheet'!A1` or `Data!A1`).
    pub fn parse_qualified(name: &str) -> Result<(Option<String>, CellRef)> {
        let invalid = || MejaError::InvalidCellRef(name.to_string());
        let re = A1_PATTERN.as_ref().ok_or_else(invalid)?;
        let caps = re.captures(name.trim()).ok_or_else(invalid)?;

        let sheet = caps
            .name("quoted")
            .map(|m| m.as_str().replace("''", "'"))
            .or_else(|| caps.name("plain").map(|m| m.as_str().to_string()));

        let col = column_number(&caps["letters"]).map_err(|_| invalid())?;
        let row = caps["numbers"]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(invalid)?;

        Ok((sheet, CellRef::new(row, col)))
    }

    /// Render the reference, honouring `$` and sheet-prefix options.
    pub fn display_with(&self, options: &[RefOption], sheet_name: &str) -> String {
        let mut out = String::new();
        if options.contains(&RefOption::WithSheet) {
            out.push('\'');
            out.push_str(&sheet_name.replace('\'', "''"));
            out.push_str("'!");
        }
        if options.contains(&RefOption::FixColumn) {
            out.push('$');
        }
        out.push_str(&column_name(self.col));
        if options.contains(&RefOption::FixRow) {
            out.push('$');
        }
        out.push_str(&row_name(self.row));
        out
    }
}

/// Convert a column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
pub fn column_name(col: usize) -> String {
    let mut result = String::new();
    let mut n = col as u128 + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// Convert spreadsheet-style letters back to a column index. Case-insensitive.
pub fn column_number(name: &str) -> Result<usize> {
    let invalid = || MejaError::InvalidColumnName(name.to_string());
    if name.is_empty() {
        return Err(invalid());
    }
    let mut acc = 0usize;
    for c in name.bytes() {
        if !c.is_ascii_alphabetic() {
            return Err(invalid());
        }
        let digit = (c.to_ascii_uppercase() - b'A') as usize + 1;
        acc = acc
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(invalid)?;
    }
    Ok(acc - 1)
}

/// Row names are 1-based.
pub fn row_name(row: usize) -> String {
    (row + 1).to_string()
}

impl std::str::FromStr for CellRef {
    type Err = MejaError;

    fn from_str(s: &str) -> Result<Self> {
        CellRef::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), row_name(self.row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_column_number_inverts_column_name() {
        for col in [0, 1, 25, 26, 27, 51, 52, 701, 702, 16383] {
            assert_eq!(column_number(&column_name(col)).unwrap(), col);
        }
        assert_eq!(column_number("aa").unwrap(), 26);
    }

    #[test]
    fn test_column_number_rejects_garbage() {
        assert!(column_number("").is_err());
        assert!(column_number("A1").is_err());
        assert!(column_number(&"Z".repeat(40)).is_err());
    }

    #[test]
    fn test_parse_a1() {
        assert_eq!(CellRef::parse("A1").unwrap(), CellRef::new(0, 0));
        assert_eq!(CellRef::parse("b3").unwrap(), CellRef::new(2, 1));
        assert_eq!(CellRef::parse("$AA$10").unwrap(), CellRef::new(9, 26));
        assert!(CellRef::parse("A0").is_err());
        assert!(CellRef::parse("1A").is_err());
        assert!(CellRef::parse("Sheet1!A1").is_err());
    }

    #[test]
    fn test_parse_qualified() {
        let (sheet, cell) = CellRef::parse_qualified("'My ''Data'''!C4").unwrap();
        assert_eq!(sheet.as_deref(), Some("My 'Data'"));
        assert_eq!(cell, CellRef::new(3, 2));

        let (sheet, cell) = CellRef::parse_qualified("Data!A2").unwrap();
        assert_eq!(sheet.as_deref(), Some("Data"));
        assert_eq!(cell, CellRef::new(1, 0));
    }

    #[test]
    fn test_display_with_options() {
        let cell = CellRef::new(4, 2);
        assert_eq!(cell.to_string(), "C5");
        assert_eq!(cell.display_with(&[RefOption::FixRow], "S"), "C$5");
        assert_eq!(cell.display_with(&[RefOption::FixColumn], "S"), "$C5");
        assert_eq!(
            cell.display_with(
                &[RefOption::FixRow, RefOption::FixColumn, RefOption::WithSheet],
                "Sheet 1"
            ),
            "'Sheet 1'!$C$5"
        );
    }
}
