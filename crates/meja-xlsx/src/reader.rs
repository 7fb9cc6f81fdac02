use calamine::{Data, Range, Reader, Sheets, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime};
use meja_core::io::WorkbookReader;
use meja_core::{CellValue, Locale, RectangularRegion, Workbook};
use std::io::{Cursor, Read};
use tracing::{debug, warn};

use crate::error::{Result, XlsxError};
use crate::serial::from_excel_serial;

/// Reads `.xlsx`, `.xlsm` and `.xls` workbooks.
///
/// Formulas replace the cached values of their cells. Merged regions are
/// restored for `.xlsx`.
#[derive(Clone, Copy, Debug, Default)]
pub struct XlsxReader {
    pub locale: Locale,
}

impl XlsxReader {
    pub fn new(locale: Locale) -> Self {
        XlsxReader { locale }
    }

    pub fn read_bytes(&self, data: Vec<u8>) -> Result<Workbook> {
        let mut source = open_workbook_auto_from_rs(Cursor::new(data))?;
        let names = source.sheet_names();
        if names.is_empty() {
            return Err(XlsxError::NoSheets);
        }

        let mut merged: Vec<(String, (u32, u32), (u32, u32))> = Vec::new();
        if let Sheets::Xlsx(xlsx) = &mut source {
            xlsx.load_merged_regions()?;
            merged = xlsx
                .merged_regions()
                .iter()
                .map(|(sheet, _, dim)| (sheet.clone(), dim.start, dim.end))
                .collect();
        }

        let mut workbook = Workbook::new(self.locale);
        for name in &names {
            let values = source.worksheet_range(name)?;
            let formulas = match source.worksheet_formula(name) {
                Ok(formulas) => Some(formulas),
                Err(e) => {
                    warn!(sheet = %name, error = %e, "could not read formulas");
                    None
                }
            };

            let handle = workbook.create_sheet(name)?;
            let mut sheet = handle.write();
            for (i, j, data) in absolute_cells(&values) {
                sheet.set(i, j, cell_value(data))?;
            }
            if let Some(formulas) = &formulas {
                for (i, j, expr) in absolute_cells(formulas) {
                    sheet.cell_mut(i, j)?.set_formula(expr);
                }
            }
            for (_, start, end) in merged.iter().filter(|(sheet, _, _)| sheet == name) {
                let region = RectangularRegion::new(
                    start.0 as usize,
                    start.1 as usize,
                    end.0 as usize,
                    end.1 as usize,
                )?;
                if let Err(e) = sheet.add_merged_region(region) {
                    warn!(sheet = %name, %region, error = %e, "skipping merged region");
                }
            }
            debug!(
                sheet = %name,
                rows = sheet.row_count(),
                merged = sheet.merged_regions().len(),
                "read worksheet"
            );
        }
        Ok(workbook)
    }
}

impl WorkbookReader for XlsxReader {
    fn read(&self, input: &mut dyn Read, _name: &str) -> meja_core::Result<Workbook> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        Ok(self.read_bytes(data)?)
    }
}

/// Non-empty cells of `range` with sheet coordinates.
///
/// calamine reports positions relative to `range.start()`.
fn absolute_cells<T>(range: &Range<T>) -> impl Iterator<Item = (usize, usize, &T)>
where
    T: calamine::CellType,
{
    let (row0, col0) = range.start().unwrap_or((0, 0));
    range
        .used_cells()
        .map(move |(i, j, v)| (row0 as usize + i, col0 as usize + j, v))
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Blank,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Error(_) => CellValue::Error,
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            from_excel_serial(serial).unwrap_or(CellValue::Number(serial))
        }
        Data::DateTimeIso(s) => iso_date_time(s),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn iso_date_time(s: &str) -> CellValue {
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return CellValue::DateTime(dt);
    }
    if let Ok(date) = s.parse::<NaiveDate>() {
        return CellValue::Date(date);
    }
    CellValue::Text(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_mapping() {
        assert_eq!(cell_value(&Data::Int(4)), CellValue::Number(4.0));
        assert_eq!(cell_value(&Data::String(String::new())), CellValue::Blank);
        assert_eq!(
            cell_value(&Data::String("x".into())),
            CellValue::Text("x".into())
        );
        assert_eq!(
            cell_value(&Data::DateTimeIso("2024-03-01".into())),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(
            cell_value(&Data::DateTimeIso("2024-03-01T08:30:00".into())),
            CellValue::DateTime(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(8, 30, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = XlsxReader::default()
            .read_bytes(b"not a workbook".to_vec())
            .unwrap_err();
        assert!(matches!(err, XlsxError::Read(_)));
    }
}
