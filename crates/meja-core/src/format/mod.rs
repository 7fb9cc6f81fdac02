//! Locale-aware display and parsing of cell values.
//!
//! - [`Locale`] - separators, month names and default date layouts
//! - [`NumberPattern`] - `0.00` / `#,##0` style numeric patterns
//! - [`DatePattern`] - `yyyy-MM-dd` style date patterns
//! - [`format_value`] - display text for a cell value under a data format

mod date;
mod locale;
mod number;

pub use date::DatePattern;
pub use locale::{Locale, LocaleSymbols};
pub use number::{DEFAULT_NUMBER_PATTERN, NumberPattern, format_number, parse_number};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::model::{CellValue, ERROR_TEXT};

/// Date layouts accepted when importing text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DateFormat {
    #[default]
    LocaleShort,
    LocaleLong,
    Iso,
}

impl DateFormat {
    pub fn pattern(&self, locale: Locale) -> &'static str {
        match self {
            DateFormat::LocaleShort => locale.symbols().short_date,
            DateFormat::LocaleLong => locale.symbols().long_date,
            DateFormat::Iso => "yyyy-MM-dd",
        }
    }

    /// Parse a date, or a date followed by `HH:mm[:ss]`.
    pub fn parse(&self, text: &str, locale: Locale) -> Option<CellValue> {
        let date_pattern = DatePattern::parse(self.pattern(locale))?;
        if let Some(dt) = date_pattern.parse_date_time(text, locale) {
            return Some(CellValue::Date(dt.date()));
        }
        for time in ["HH:mm:ss", "HH:mm"] {
            let sep = if *self == DateFormat::Iso { "'T'" } else { " " };
            for sep in [sep, " "] {
                let combined = format!("{}{sep}{time}", self.pattern(locale));
                if let Some(dt) = DatePattern::parse(&combined)
                    .and_then(|p| p.parse_date_time(text, locale))
                {
                    return Some(CellValue::DateTime(dt));
                }
            }
        }
        None
    }
}

impl std::str::FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "localeshort" | "short" => Ok(DateFormat::LocaleShort),
            "localelong" | "long" => Ok(DateFormat::LocaleLong),
            "iso" | "isodate" => Ok(DateFormat::Iso),
            other => Err(format!("unknown date format '{other}'")),
        }
    }
}

/// `true`/`false`, case-insensitive.
pub fn parse_boolean(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Whether a data format means "use the default".
fn is_general(data_format: &str) -> bool {
    let f = data_format.trim();
    f.is_empty() || f.eq_ignore_ascii_case("general")
}

/// Display text for `value` under `data_format`.
///
/// A data format that does not fit the value is logged and the locale
/// default is used instead.
pub fn format_value(value: &CellValue, data_format: &str, locale: Locale) -> String {
    match value {
        CellValue::Blank => String::new(),
        CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        CellValue::Error => ERROR_TEXT.to_string(),
        CellValue::Formula(expr) => format!("={expr}"),
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) => {
            if !is_general(data_format) {
                match NumberPattern::parse(data_format) {
                    Some(pattern) => return pattern.format(*n, locale),
                    None => warn!(data_format, "invalid number format, using default"),
                }
            }
            format_number(*n, locale)
        }
        CellValue::Date(d) => format_date_time(
            &d.and_time(chrono::NaiveTime::MIN),
            data_format,
            locale,
            locale.symbols().medium_date,
        ),
        CellValue::DateTime(dt) => {
            format_date_time(dt, data_format, locale, locale.symbols().medium_date_time)
        }
    }
}

fn format_date_time(
    value: &NaiveDateTime,
    data_format: &str,
    locale: Locale,
    default_pattern: &str,
) -> String {
    if !is_general(data_format) {
        match DatePattern::parse(data_format) {
            Some(pattern) => return pattern.format(value, locale),
            None => warn!(data_format, "invalid date format, using default"),
        }
    }
    match DatePattern::parse(default_pattern) {
        Some(pattern) => pattern.format(value, locale),
        None => value.to_string(),
    }
}

/// Format a date with the locale's medium layout.
pub fn format_date(date: NaiveDate, locale: Locale) -> String {
    format_value(&CellValue::Date(date), "", locale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_value_defaults() {
        assert_eq!(format_value(&CellValue::Blank, "", Locale::Us), "");
        assert_eq!(format_value(&CellValue::Boolean(true), "", Locale::Us), "TRUE");
        assert_eq!(format_value(&CellValue::Error, "", Locale::Us), "#ERROR");
        assert_eq!(
            format_value(&CellValue::Formula("A1*2".into()), "", Locale::Us),
            "=A1*2"
        );
        assert_eq!(format_value(&CellValue::Number(123.5), "", Locale::France), "123,5");
        assert_eq!(format_date(date(2023, 1, 1), Locale::Us), "Jan 1, 2023");
        assert_eq!(format_date(date(2023, 1, 1), Locale::Germany), "01.01.2023");
        assert_eq!(format_date(date(2023, 1, 1), Locale::France), "1 janv. 2023");
    }

    #[test]
    fn test_format_value_with_data_format() {
        assert_eq!(format_value(&CellValue::Number(0.5), "0.00", Locale::Us), "0.50");
        assert_eq!(format_value(&CellValue::Number(0.5), "General", Locale::Us), "0.5");
        assert_eq!(
            format_value(&CellValue::Date(date(2024, 3, 7)), "dd/MM/yyyy", Locale::Us),
            "07/03/2024"
        );
    }

    #[test]
    fn test_bad_data_format_falls_back() {
        assert_eq!(format_value(&CellValue::Number(2.5), "yyyy", Locale::Us), "2.5");
        assert_eq!(
            format_value(&CellValue::Date(date(2024, 3, 7)), "0.00", Locale::Root),
            "2024-03-07"
        );
    }

    #[test]
    fn test_date_format_parse() {
        assert_eq!(
            DateFormat::Iso.parse("2023-05-06", Locale::Root),
            Some(CellValue::Date(date(2023, 5, 6)))
        );
        assert_eq!(
            DateFormat::LocaleShort.parse("06.05.23", Locale::Germany),
            Some(CellValue::Date(date(2023, 5, 6)))
        );
        assert_eq!(
            DateFormat::Iso.parse("2023-05-06T10:30", Locale::Root),
            Some(CellValue::DateTime(date(2023, 5, 6).and_hms_opt(10, 30, 0).unwrap()))
        );
        assert_eq!(DateFormat::Iso.parse("hello", Locale::Root), None);
        assert_eq!("iso".parse::<DateFormat>(), Ok(DateFormat::Iso));
        assert_eq!("LOCALE_LONG".parse::<DateFormat>(), Ok(DateFormat::LocaleLong));
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(parse_boolean("TRUE"), Some(true));
        assert_eq!(parse_boolean("False"), Some(false));
        assert_eq!(parse_boolean("yes"), None);
    }
}
