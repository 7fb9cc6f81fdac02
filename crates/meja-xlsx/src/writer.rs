use meja_core::format::{DatePattern, NumberPattern};
use meja_core::io::WorkbookWriter;
use meja_core::model::style::{BorderStyle, Color, Direction, FillPattern, HAlign, VAlign};
use meja_core::model::{Cell, DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT, ERROR_TEXT, has_uri_scheme};
use meja_core::{CellRef, CellStyle, CellValue, Locale, Sheet, Workbook};
use rust_xlsxwriter::{
    Format, FormatAlign, FormatBorder, FormatUnderline, Url, Workbook as XlsxWorkbook, Worksheet,
};
use std::collections::HashMap;
use std::io::Write;
use tracing::{debug, warn};

use crate::error::{Result, XlsxError};
use crate::serial::to_excel_serial;

const MAX_ROW: usize = 1_048_575;
const MAX_COLUMN: usize = 16_383;

/// Writes `.xlsx` workbooks.
#[derive(Clone, Copy, Debug, Default)]
pub struct XlsxWriter;

impl XlsxWriter {
    pub fn write_buffer(&self, workbook: &Workbook) -> Result<Vec<u8>> {
        let mut out = XlsxWorkbook::new();
        let current = workbook.current_sheet_index();
        for (index, handle) in workbook.sheets().enumerate() {
            let sheet = handle.read();
            let worksheet = out.add_worksheet();
            worksheet.set_name(sheet.name())?;
            if current == Some(index) {
                worksheet.set_active(true);
            }
            write_sheet(worksheet, &sheet)?;
        }
        Ok(out.save_to_buffer()?)
    }
}

impl WorkbookWriter for XlsxWriter {
    fn write(&self, workbook: &Workbook, output: &mut dyn Write) -> meja_core::Result<()> {
        let buffer = self.write_buffer(workbook)?;
        output.write_all(&buffer)?;
        Ok(())
    }
}

fn excel_position(pos: CellRef) -> Result<(u32, u16)> {
    if pos.row > MAX_ROW || pos.col > MAX_COLUMN {
        return Err(XlsxError::CellOutOfRange(pos));
    }
    Ok((pos.row as u32, pos.col as u16))
}

fn write_sheet(ws: &mut Worksheet, sheet: &Sheet) -> Result<()> {
    let mut formats = FormatCache::new(sheet);

    for region in sheet.merged_regions() {
        let (r1, c1) = excel_position(region.top_left())?;
        let (r2, c2) = excel_position(region.bottom_right())?;
        let format = match sheet.cell(region.first_row, region.first_column) {
            Some(cell) => formats.get(cell).clone(),
            None => Format::new(),
        };
        ws.merge_range(r1, c1, r2, c2, "", &format)?;
    }

    let ctx = sheet.display_context();
    let mut cells = 0usize;
    for row in sheet.rows() {
        for cell in row.cells() {
            if cell.is_covered() {
                continue;
            }
            let (r, c) = excel_position(cell.position())?;
            let format = formats.get(cell);
            match cell.value() {
                CellValue::Blank if cell.style_name().is_empty() => continue,
                CellValue::Blank => {
                    ws.write_blank(r, c, format)?;
                }
                CellValue::Boolean(b) => {
                    ws.write_boolean_with_format(r, c, *b, format)?;
                }
                CellValue::Error => {
                    ws.write_string_with_format(r, c, ERROR_TEXT, format)?;
                }
                CellValue::Formula(expr) => {
                    ws.write_formula_with_format(r, c, expr.as_str(), format)?;
                }
                CellValue::Number(n) => {
                    ws.write_number_with_format(r, c, *n, format)?;
                }
                CellValue::Date(date) => {
                    let serial = to_excel_serial(date.and_time(chrono::NaiveTime::MIN));
                    ws.write_number_with_format(r, c, serial, format)?;
                }
                CellValue::DateTime(dt) => {
                    ws.write_number_with_format(r, c, to_excel_serial(*dt), format)?;
                }
                CellValue::Text(text) => {
                    ws.write_string_with_format(r, c, text, format)?;
                }
            }
            if let Some(link) = cell.hyperlink()
                && !cell.value().is_blank()
            {
                let url = Url::new(excel_link(link)).set_text(cell.display(&ctx));
                if let Err(e) = ws.write_url_with_format(r, c, url, format) {
                    warn!(cell = %cell.position(), error = %e, "hyperlink not written");
                }
            }
            cells += 1;
        }
    }

    for j in 0..sheet.column_count() {
        let width = sheet.column_width(j);
        if width != DEFAULT_COLUMN_WIDTH {
            let (_, c) = excel_position(CellRef::new(0, j))?;
            ws.set_column_width(c, points_to_character_width(width))?;
        }
    }
    for i in 0..sheet.row_count() {
        let height = sheet.row_height(i);
        if height != DEFAULT_ROW_HEIGHT {
            let (r, _) = excel_position(CellRef::new(i, 0))?;
            ws.set_row_height(r, height)?;
        }
    }

    let (split_row, split_column) = sheet.split();
    if split_row > 0 || split_column > 0 {
        let (r, c) = excel_position(CellRef::new(split_row, split_column))?;
        ws.set_freeze_panes(r, c)?;
    }

    if let Some(filter_row) = sheet.auto_filter_row() {
        let last_row = filter_row.max(sheet.row_count().saturating_sub(1));
        let last_column = sheet.column_count().saturating_sub(1);
        let (r1, c1) = excel_position(CellRef::new(filter_row, 0))?;
        let (r2, c2) = excel_position(CellRef::new(last_row, last_column))?;
        ws.autofilter(r1, c1, r2, c2)?;
    }

    ws.set_zoom(((sheet.zoom() * 100.0).round() as u16).clamp(10, 400));
    debug!(sheet = sheet.name(), cells, "wrote worksheet");
    Ok(())
}

/// Excel column widths count characters of the default font: 7px each
/// plus 5px padding.
fn points_to_character_width(points: f32) -> f64 {
    let pixels = f64::from(points) * 4.0 / 3.0;
    ((pixels - 5.0) / 7.0).max(0.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ValueKind {
    Plain,
    Date,
    DateTime,
}

/// Formats per style name and value kind.
struct FormatCache<'a> {
    sheet: &'a Sheet,
    formats: HashMap<(String, ValueKind), Format>,
}

impl<'a> FormatCache<'a> {
    fn new(sheet: &'a Sheet) -> Self {
        FormatCache {
            sheet,
            formats: HashMap::new(),
        }
    }

    fn get(&mut self, cell: &Cell) -> &Format {
        let kind = match cell.value() {
            CellValue::Date(_) => ValueKind::Date,
            CellValue::DateTime(_) => ValueKind::DateTime,
            _ => ValueKind::Plain,
        };
        let sheet = self.sheet;
        self.formats
            .entry((cell.style_name().to_string(), kind))
            .or_insert_with(|| {
                let style = sheet.styles().get(cell.style_name());
                cell_format(&style, kind, sheet.locale())
            })
    }
}

fn cell_format(style: &CellStyle, kind: ValueKind, locale: Locale) -> Format {
    let mut format = base_format(style);
    let data_format = style.data_format.trim();
    match kind {
        ValueKind::Plain => {
            if !data_format.eq_ignore_ascii_case("general")
                && NumberPattern::parse(data_format).is_some()
            {
                format = format.set_num_format(data_format);
            }
        }
        ValueKind::Date | ValueKind::DateTime => {
            let pattern = if DatePattern::parse(data_format).is_some() {
                data_format
            } else if kind == ValueKind::Date {
                locale.symbols().medium_date
            } else {
                locale.symbols().medium_date_time
            };
            format = format.set_num_format(excel_date_format(pattern));
        }
    }
    format
}

fn base_format(style: &CellStyle) -> Format {
    let font = &style.font;
    let mut format = Format::new()
        .set_font_name(font.family.as_str())
        .set_font_size(font.size);
    if font.bold {
        format = format.set_bold();
    }
    if font.italic {
        format = format.set_italic();
    }
    if font.underline {
        format = format.set_underline(FormatUnderline::Single);
    }
    if font.strike_through {
        format = format.set_font_strikethrough();
    }
    if font.color != Color::BLACK {
        format = format.set_font_color(font.color.to_rgb_u32());
    }

    format = match style.h_align {
        HAlign::Left => format.set_align(FormatAlign::Left),
        HAlign::Center => format.set_align(FormatAlign::Center),
        HAlign::Right => format.set_align(FormatAlign::Right),
        HAlign::Justify => format.set_align(FormatAlign::Justify),
        HAlign::Automatic => format,
    };
    format = match style.v_align {
        VAlign::Top => format.set_align(FormatAlign::Top),
        VAlign::Middle => format.set_align(FormatAlign::VerticalCenter),
        VAlign::Bottom => format.set_align(FormatAlign::Bottom),
        VAlign::Justify => format.set_align(FormatAlign::VerticalJustify),
        VAlign::Distributed => format.set_align(FormatAlign::VerticalDistributed),
    };

    if style.fill_pattern == FillPattern::Solid && !style.fill_bg_color.is_transparent() {
        format = format.set_background_color(style.fill_bg_color.to_rgb_u32());
    }
    if style.wrap {
        format = format.set_text_wrap();
    }
    if style.rotation != 0 {
        format = format.set_rotation(style.rotation);
    }

    for direction in Direction::ALL {
        let border = style.border(direction);
        if border.is_none() {
            continue;
        }
        let kind = border_kind(&border);
        let color = border.color.to_rgb_u32();
        format = match direction {
            Direction::North => format.set_border_top(kind).set_border_top_color(color),
            Direction::East => format.set_border_right(kind).set_border_right_color(color),
            Direction::South => format.set_border_bottom(kind).set_border_bottom_color(color),
            Direction::West => format.set_border_left(kind).set_border_left_color(color),
        };
    }
    format
}

fn border_kind(border: &BorderStyle) -> FormatBorder {
    if border.width <= 1.0 {
        FormatBorder::Thin
    } else if border.width <= 2.0 {
        FormatBorder::Medium
    } else {
        FormatBorder::Thick
    }
}

/// Translate a date pattern (`dd.MM.yyyy HH:mm`) into an Excel number
/// format (`dd.mm.yyyy hh:mm`).
pub(crate) fn excel_date_format(pattern: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            let mut literal = String::new();
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        literal.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                literal.push(chars[i]);
                i += 1;
            }
            i += 1;
            if literal.is_empty() {
                out.push('\'');
            } else {
                out.push('"');
                out.push_str(&literal);
                out.push('"');
            }
            continue;
        }
        if !c.is_ascii_alphabetic() {
            out.push(c);
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && chars[i] == c {
            i += 1;
        }
        let count = i - start;
        match c {
            'y' if count <= 2 => out.push_str("yy"),
            'y' => out.push_str("yyyy"),
            'M' => out.push_str(&"m".repeat(count.min(4))),
            'd' => out.push_str(&"d".repeat(count.min(2))),
            'E' if count < 4 => out.push_str("ddd"),
            'E' => out.push_str("dddd"),
            'H' | 'h' => out.push_str(&"h".repeat(count.min(2))),
            'm' => out.push_str(&"m".repeat(count.min(2))),
            's' => out.push_str(&"s".repeat(count.min(2))),
            'S' => out.push_str(&"0".repeat(count)),
            'a' => out.push_str("AM/PM"),
            other => {
                out.push('"');
                out.push_str(&other.to_string().repeat(count));
                out.push('"');
            }
        }
    }
    out
}

/// Links without a scheme are files relative to the workbook.
fn excel_link(link: &str) -> String {
    if has_uri_scheme(link) {
        link.to_string()
    } else {
        format!("external:{link}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_date_format() {
        assert_eq!(excel_date_format("dd.MM.yyyy"), "dd.mm.yyyy");
        assert_eq!(excel_date_format("MMM d, yyyy"), "mmm d, yyyy");
        assert_eq!(excel_date_format("M/d/yy h:mm a"), "m/d/yy h:mm AM/PM");
        assert_eq!(
            excel_date_format("yyyy-MM-dd'T'HH:mm:ss"),
            "yyyy-mm-dd\"T\"hh:mm:ss"
        );
        assert_eq!(excel_date_format("EEEE, d MMMM"), "dddd, d mmmm");
        assert_eq!(excel_date_format("HH:mm:ss.SSS"), "hh:mm:ss.000");
    }

    #[test]
    fn test_column_width_conversion() {
        // 80pt = 106.67px
        let chars = points_to_character_width(80.0);
        assert!((chars - 14.52).abs() < 0.01);
        assert_eq!(points_to_character_width(0.0), 0.0);
    }

    #[test]
    fn test_rejects_cells_beyond_limits() {
        assert!(excel_position(CellRef::new(MAX_ROW, MAX_COLUMN)).is_ok());
        assert!(matches!(
            excel_position(CellRef::new(0, MAX_COLUMN + 1)),
            Err(XlsxError::CellOutOfRange(_))
        ));
    }

    #[test]
    fn test_relative_links_become_external() {
        assert_eq!(excel_link("https://example.com"), "https://example.com");
        assert_eq!(excel_link("mailto:me@example.com"), "mailto:me@example.com");
        assert_eq!(excel_link("other.xlsx"), "external:other.xlsx");
        assert_eq!(excel_link("../docs/a.xlsx"), "external:../docs/a.xlsx");
        assert_eq!(excel_link("C:\\data\\a.xlsx"), "external:C:\\data\\a.xlsx");
    }
}
