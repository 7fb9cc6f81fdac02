//! CSV import/export.

use ::csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use std::io::{Read, Write};
use tracing::debug;

use super::{WorkbookReader, WorkbookWriter};
use crate::error::{MejaError, Result};
use crate::format::{DateFormat, Locale, parse_boolean, parse_number};
use crate::model::{CellValue, Sheet, Workbook};

/// Options shared by [`CsvReader`] and [`CsvWriter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field separator; `None` picks `;` for locales that use a decimal
    /// comma and `,` otherwise.
    pub separator: Option<char>,
    /// Text delimiter (quote character).
    pub delimiter: char,
    pub locale: Locale,
    pub date_format: DateFormat,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            separator: Some(','),
            delimiter: '"',
            locale: Locale::default(),
            date_format: DateFormat::default(),
        }
    }
}

impl CsvOptions {
    pub fn effective_separator(&self) -> char {
        match self.separator {
            Some(c) => c,
            None if self.locale.decimal_separator() == ',' => ';',
            None => ',',
        }
    }

    fn bytes(&self) -> Result<(u8, u8)> {
        let sep = self.effective_separator();
        let to_byte = |c: char, what: &str| {
            u8::try_from(c).ok().filter(u8::is_ascii).ok_or_else(|| MejaError::Format {
                format: "CSV",
                message: format!("{what} must be an ASCII character, got {c:?}"),
            })
        };
        Ok((to_byte(sep, "separator")?, to_byte(self.delimiter, "delimiter")?))
    }
}

/// Interpret a CSV field.
///
/// Tried in order: empty gives blank, `=expr` a formula, `true`/`false` a
/// boolean, then a locale number, then a date, otherwise text. Digit strings
/// with leading zeros (like "007") stay text.
pub fn parse_cell_value(field: &str, options: &CsvOptions) -> CellValue {
    if field.is_empty() {
        return CellValue::Blank;
    }
    if field.len() > 1 && field.starts_with('=') {
        return CellValue::formula(field);
    }
    if let Some(b) = parse_boolean(field.trim()) {
        return CellValue::Boolean(b);
    }
    // Keep explicit surrounding whitespace.
    if field != field.trim() {
        return CellValue::Text(field.to_string());
    }
    let has_leading_zero = field.starts_with('0')
        && field.chars().nth(1).is_some_and(|c| c.is_ascii_digit());
    if !has_leading_zero && let Some(n) = parse_number(field, options.locale) {
        return CellValue::Number(n);
    }
    if let Some(date) = options.date_format.parse(field, options.locale) {
        return date;
    }
    CellValue::Text(field.to_string())
}

/// Reads a single-sheet workbook named after the source.
#[derive(Clone, Debug, Default)]
pub struct CsvReader {
    pub options: CsvOptions,
}

impl CsvReader {
    pub fn new(options: CsvOptions) -> Self {
        CsvReader { options }
    }
}

impl WorkbookReader for CsvReader {
    fn read(&self, input: &mut dyn Read, name: &str) -> Result<Workbook> {
        let (sep, quote) = self.options.bytes()?;
        let mut reader = ReaderBuilder::new()
            .delimiter(sep)
            .quote(quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        let mut workbook = Workbook::new(self.options.locale);
        let sheet_name = if name.trim().is_empty() { "Sheet1" } else { name };
        let handle = workbook.create_sheet(sheet_name)?;
        let mut sheet = handle.write();
        let mut rows = 0usize;
        for record in reader.records() {
            let record = record?;
            let values: Vec<CellValue> = record
                .iter()
                .map(|field| parse_cell_value(field, &self.options))
                .collect();
            sheet.create_row(values)?;
            rows += 1;
        }
        debug!(rows, sheet = sheet_name, "read CSV");
        drop(sheet);
        Ok(workbook)
    }
}

/// Writes every sheet as CSV display text, each followed by an empty line.
#[derive(Clone, Debug, Default)]
pub struct CsvWriter {
    pub options: CsvOptions,
}

impl CsvWriter {
    pub fn new(options: CsvOptions) -> Self {
        CsvWriter { options }
    }

    fn write_sheet(&self, sheet: &Sheet, output: &mut dyn Write, sep: u8, quote: u8) -> Result<()> {
        let ctx = crate::model::DisplayContext {
            styles: sheet.styles(),
            locale: self.options.locale,
        };
        let mut writer = WriterBuilder::new()
            .delimiter(sep)
            .quote(quote)
            .quote_style(QuoteStyle::Necessary)
            .from_writer(output);

        let columns = sheet.column_count();
        for row in sheet.rows() {
            let fields: Vec<String> = (0..columns)
                .map(|j| row.cell(j).map(|cell| cell.display(&ctx)).unwrap_or_default())
                .collect();
            writer.write_record(&fields)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl WorkbookWriter for CsvWriter {
    fn write(&self, workbook: &Workbook, output: &mut dyn Write) -> Result<()> {
        let (sep, quote) = self.options.bytes()?;
        for handle in workbook.sheets() {
            let sheet = handle.read();
            self.write_sheet(&sheet, output, sep, quote)?;
            writeln!(output)?;
            debug!(sheet = sheet.name(), rows = sheet.row_count(), "wrote CSV sheet");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn opts(locale: Locale) -> CsvOptions {
        CsvOptions {
            locale,
            ..CsvOptions::default()
        }
    }

    #[test]
    fn test_parse_cell_value_order() {
        let o = opts(Locale::Us);
        assert_eq!(parse_cell_value("", &o), CellValue::Blank);
        assert_eq!(parse_cell_value("=A1+B1", &o), CellValue::Formula("A1+B1".into()));
        assert_eq!(parse_cell_value("=", &o), CellValue::Text("=".into()));
        assert_eq!(parse_cell_value("TRUE", &o), CellValue::Boolean(true));
        assert_eq!(parse_cell_value("false", &o), CellValue::Boolean(false));
        assert_eq!(parse_cell_value("1,234.5", &o), CellValue::Number(1234.5));
        assert_eq!(parse_cell_value("007", &o), CellValue::Text("007".into()));
        assert_eq!(parse_cell_value("0.5", &o), CellValue::Number(0.5));
        assert_eq!(
            parse_cell_value("1/2/23", &o),
            CellValue::Date(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap())
        );
        assert_eq!(parse_cell_value("  hi  ", &o), CellValue::Text("  hi  ".into()));
        assert_eq!(parse_cell_value("hello", &o), CellValue::Text("hello".into()));
    }

    #[test]
    fn test_parse_cell_value_german() {
        let o = opts(Locale::Germany);
        assert_eq!(parse_cell_value("123,5", &o), CellValue::Number(123.5));
        assert_eq!(
            parse_cell_value("06.05.23", &o),
            CellValue::Date(NaiveDate::from_ymd_opt(2023, 5, 6).unwrap())
        );
    }

    #[test]
    fn test_locale_dependent_separator() {
        let mut o = opts(Locale::Germany);
        o.separator = None;
        assert_eq!(o.effective_separator(), ';');
        o.locale = Locale::Us;
        assert_eq!(o.effective_separator(), ',');
        o.separator = Some('\u{e9}');
        assert!(o.bytes().is_err());
    }

    #[test]
    fn test_read_csv() {
        let data = "name,qty,ok\n\"Smith, J\",3,true\nshort\n";
        let reader = CsvReader::new(opts(Locale::Us));
        let workbook = reader.read(&mut data.as_bytes(), "orders").unwrap();
        assert_eq!(workbook.sheet_count(), 1);
        let sheet = workbook.sheet(0).unwrap().read();
        assert_eq!(sheet.name(), "orders");
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.column_count(), 3);
        assert_eq!(sheet.display(1, 0), "Smith, J");
        assert_eq!(sheet.cell(1, 1).unwrap().number().unwrap(), 3.0);
        assert!(sheet.cell(1, 2).unwrap().boolean().unwrap());
        assert_eq!(sheet.row(2).unwrap().column_count(), 1);
    }

    #[test]
    fn test_write_csv() {
        let mut workbook = Workbook::new(Locale::Us);
        let handle = workbook.create_sheet("S").unwrap();
        {
            let mut sheet = handle.write();
            sheet.create_row([CellValue::from("a,b"), CellValue::from(1.5)]).unwrap();
            sheet.create_row([CellValue::from(true)]).unwrap();
            sheet.cell_mut(2, 1).unwrap().set_formula("A1*2");
        }
        let mut out = Vec::new();
        CsvWriter::new(opts(Locale::Us)).write(&workbook, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\"a,b\",1.5\nTRUE,\n,=A1*2\n\n"
        );
    }

    #[test]
    fn test_write_csv_german_semicolon() {
        let mut workbook = Workbook::new(Locale::Germany);
        let handle = workbook.create_sheet("S").unwrap();
        handle.update(|s| s.create_row([2.5, 3.0])).unwrap();
        let options = CsvOptions {
            separator: None,
            ..opts(Locale::Germany)
        };
        let mut out = Vec::new();
        CsvWriter::new(options).write(&workbook, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "2,5;3\n\n");
    }

    #[test]
    fn test_write_csv_every_sheet() {
        let mut workbook = Workbook::new(Locale::Us);
        workbook.create_sheet("A").unwrap().update(|s| s.set(0, 0, "first")).unwrap();
        workbook
            .create_sheet("B")
            .unwrap()
            .update(|s| s.create_row(["second", "row"]))
            .unwrap();
        let mut out = Vec::new();
        CsvWriter::new(opts(Locale::Us)).write(&workbook, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "first\n\nsecond,row\n\n");
    }

    #[test]
    fn test_read_skips_sheet_separator() {
        let input = "a,1\nb,2\n\n";
        let workbook = CsvReader::new(opts(Locale::Us))
            .read(&mut input.as_bytes(), "S")
            .unwrap();
        assert_eq!(workbook.sheet(0).unwrap().read().row_count(), 2);
    }
}
