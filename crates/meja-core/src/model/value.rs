//! Cell values and their types.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// The type of a cell's content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellType {
    Blank,
    Boolean,
    Error,
    Formula,
    Numeric,
    Date,
    DateTime,
    Text,
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellType::Blank => "BLANK",
            CellType::Boolean => "BOOLEAN",
            CellType::Error => "ERROR",
            CellType::Formula => "FORMULA",
            CellType::Numeric => "NUMERIC",
            CellType::Date => "DATE",
            CellType::DateTime => "DATE_TIME",
            CellType::Text => "TEXT",
        };
        f.write_str(name)
    }
}

/// Text shown for cells of type [`CellType::Error`].
pub const ERROR_TEXT: &str = "#ERROR";

/// The content of a cell.
///
/// Formulas are stored without the leading `=` and are never evaluated.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Blank,
    Boolean(bool),
    Error,
    Formula(String),
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl CellValue {
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Blank => CellType::Blank,
            CellValue::Boolean(_) => CellType::Boolean,
            CellValue::Error => CellType::Error,
            CellValue::Formula(_) => CellType::Formula,
            CellValue::Number(_) => CellType::Numeric,
            CellValue::Date(_) => CellType::Date,
            CellValue::DateTime(_) => CellType::DateTime,
            CellValue::Text(_) => CellType::Text,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    /// A formula value; an empty expression yields [`CellValue::Blank`].
    pub fn formula(expr: impl Into<String>) -> CellValue {
        let expr = expr.into();
        let expr = expr.strip_prefix('=').map(str::to_string).unwrap_or(expr);
        if expr.trim().is_empty() {
            CellValue::Blank
        } else {
            CellValue::Formula(expr)
        }
    }

    /// The text form used when editing: formulas get their `=` back.
    pub fn to_input_string(&self) -> Option<String> {
        match self {
            CellValue::Formula(expr) => Some(format!("={expr}")),
            CellValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<f32> for CellValue {
    fn from(n: f32) -> Self {
        CellValue::Number(n as f64)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for CellValue {
            fn from(n: $t) -> Self {
                CellValue::Number(n as f64)
            }
        })*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize);

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Blank
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Blank)
    }
}
