//! A single grid cell.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::Path;

use super::cell_ref::CellRef;
use super::style::{CellStyle, DEFAULT_STYLE, StyleRegistry};
use super::value::{CellType, CellValue};
use crate::error::{MejaError, Result};
use crate::format::{Locale, format_value};

/// Highest usable column index.
pub const MAX_COLUMN_NUMBER: usize = 0xEF_FFFF;
/// Widest allowed merge.
pub const MAX_HORIZONTAL_SPAN: usize = 0xEFFF;
/// Tallest allowed merge.
pub const MAX_VERTICAL_SPAN: usize = 0xEF_FFFF;

/// What a cell needs from its sheet to render itself.
#[derive(Clone, Copy)]
pub struct DisplayContext<'a> {
    pub styles: &'a StyleRegistry,
    pub locale: Locale,
}

/// A cell of a sheet.
///
/// Cells outside merges have span (1,1) and are their own logical cell. The
/// top-left cell of a merge spans the whole region; the other cells of the
/// region have span (0,0), no value, and point at the top-left cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) value: CellValue,
    pub(crate) style: String,
    pub(crate) hyperlink: Option<String>,
    pub(crate) span_x: usize,
    pub(crate) span_y: usize,
    pub(crate) logical: CellRef,
}

impl Cell {
    pub(crate) fn new(row: usize, col: usize) -> Cell {
        Cell {
            row,
            col,
            value: CellValue::Blank,
            style: DEFAULT_STYLE.to_string(),
            hyperlink: None,
            span_x: 1,
            span_y: 1,
            logical: CellRef::new(row, col),
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column(&self) -> usize {
        self.col
    }

    pub fn position(&self) -> CellRef {
        CellRef::new(self.row, self.col)
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn cell_type(&self) -> CellType {
        self.value.cell_type()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_blank()
    }

    pub fn style_name(&self) -> &str {
        &self.style
    }

    pub fn hyperlink(&self) -> Option<&str> {
        self.hyperlink.as_deref()
    }

    pub fn span_x(&self) -> usize {
        self.span_x
    }

    pub fn span_y(&self) -> usize {
        self.span_y
    }

    pub fn is_merged(&self) -> bool {
        self.span_x != 1 || self.span_y != 1
    }

    /// The cell that carries the value for this position.
    pub fn logical_cell(&self) -> CellRef {
        self.logical
    }

    /// Whether this cell is covered by a merge it does not start.
    pub fn is_covered(&self) -> bool {
        self.logical != self.position()
    }

    fn mismatch(&self, expected: CellType) -> MejaError {
        MejaError::CellTypeMismatch {
            cell: self.position(),
            expected,
            actual: self.cell_type(),
        }
    }

    pub fn boolean(&self) -> Result<bool> {
        match self.value {
            CellValue::Boolean(b) => Ok(b),
            _ => Err(self.mismatch(CellType::Boolean)),
        }
    }

    pub fn number(&self) -> Result<f64> {
        match self.value {
            CellValue::Number(n) => Ok(n),
            _ => Err(self.mismatch(CellType::Numeric)),
        }
    }

    pub fn date(&self) -> Result<NaiveDate> {
        match self.value {
            CellValue::Date(d) => Ok(d),
            _ => Err(self.mismatch(CellType::Date)),
        }
    }

    /// Date-time of the cell. Plain dates are taken at midnight.
    pub fn date_time(&self) -> Result<NaiveDateTime> {
        match self.value {
            CellValue::DateTime(dt) => Ok(dt),
            CellValue::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            _ => Err(self.mismatch(CellType::DateTime)),
        }
    }

    /// Formula expression without the leading `=`.
    pub fn formula(&self) -> Result<&str> {
        match &self.value {
            CellValue::Formula(expr) => Ok(expr),
            _ => Err(self.mismatch(CellType::Formula)),
        }
    }

    /// Text content; blank cells yield the empty string.
    pub fn text(&self) -> Result<&str> {
        match &self.value {
            CellValue::Text(s) => Ok(s),
            CellValue::Blank => Ok(""),
            _ => Err(self.mismatch(CellType::Text)),
        }
    }

    /// Display text using the cell's style and the sheet locale.
    pub fn display(&self, ctx: &DisplayContext<'_>) -> String {
        let style = ctx.styles.get(&self.style);
        format_value(&self.value, &style.data_format, ctx.locale)
    }

    /// The hyperlink as an absolute target.
    ///
    /// Links with a URI scheme are returned unchanged. Relative links are
    /// resolved against the directory of `base`.
    pub fn resolved_hyperlink(&self, base: Option<&Path>) -> Result<Option<String>> {
        let Some(link) = self.hyperlink.as_deref() else {
            return Ok(None);
        };
        if has_uri_scheme(link) {
            return Ok(Some(link.to_string()));
        }
        let base = base.ok_or_else(|| MejaError::UnresolvableHyperlink(link.to_string()))?;
        let dir = base.parent().unwrap_or(base);
        Ok(Some(dir.join(link).display().to_string()))
    }

    /// Space the cell's text needs as `(width, height)`, including padding
    /// and the style's text rotation.
    pub fn calc_cell_dimension(&self, style: &CellStyle, locale: Locale) -> (f32, f32) {
        let text = format_value(&self.value, &style.data_format, locale);
        let (w, h) = style.font.text_dimension(&text);
        let width = w + style.font.size;
        let height = h + style.font.space_width();
        if style.rotation == 0 {
            return (width, height);
        }
        let theta = (style.rotation as f32).to_radians();
        let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
        (width * cos + height * sin, width * sin + height * cos)
    }
}

/// Whether `link` starts with a URI scheme such as `https:` or `mailto:`.
pub fn has_uri_scheme(link: &str) -> bool {
    let Some((scheme, _)) = link.split_once(':') else {
        return false;
    };
    // Single letters are drive names, not schemes.
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cell_is_unmerged_blank() {
        let cell = Cell::new(2, 3);
        assert!(cell.is_empty());
        assert!(!cell.is_merged());
        assert!(!cell.is_covered());
        assert_eq!(cell.logical_cell(), CellRef::new(2, 3));
        assert_eq!(cell.text().unwrap(), "");
    }

    #[test]
    fn test_typed_getters_reject_wrong_type() {
        let mut cell = Cell::new(0, 0);
        cell.value = CellValue::Number(1.5);
        assert_eq!(cell.number().unwrap(), 1.5);
        let err = cell.boolean().unwrap_err();
        assert!(matches!(
            err,
            MejaError::CellTypeMismatch {
                expected: CellType::Boolean,
                actual: CellType::Numeric,
                ..
            }
        ));
        assert!(cell.text().is_err());
        assert!(cell.formula().is_err());
        assert!(cell.date().is_err());
    }

    #[test]
    fn test_date_time_accepts_dates() {
        let mut cell = Cell::new(0, 0);
        let d = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        cell.value = CellValue::Date(d);
        assert_eq!(cell.date_time().unwrap(), d.and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_hyperlink_resolution() {
        let mut cell = Cell::new(0, 0);
        assert_eq!(cell.resolved_hyperlink(None).unwrap(), None);

        cell.hyperlink = Some("https://example.com/x".into());
        assert_eq!(
            cell.resolved_hyperlink(None).unwrap().as_deref(),
            Some("https://example.com/x")
        );

        cell.hyperlink = Some("other.xlsx".into());
        assert!(matches!(
            cell.resolved_hyperlink(None),
            Err(MejaError::UnresolvableHyperlink(_))
        ));
        let base = Path::new("/data/books/main.xlsx");
        let resolved = cell.resolved_hyperlink(Some(base)).unwrap().unwrap();
        assert_eq!(Path::new(&resolved), Path::new("/data/books/other.xlsx"));
    }

    #[test]
    fn test_calc_cell_dimension_rotates() {
        let mut cell = Cell::new(0, 0);
        cell.value = CellValue::Text("abcd".into());
        let style = CellStyle::default();
        let (w, h) = cell.calc_cell_dimension(&style, Locale::Root);
        assert!((w - 34.0).abs() < 1e-3);
        assert!((h - 18.0).abs() < 1e-3);

        let rotated = CellStyle {
            rotation: 90,
            ..CellStyle::default()
        };
        let (rw, rh) = cell.calc_cell_dimension(&rotated, Locale::Root);
        assert!((rw - h).abs() < 1e-3);
        assert!((rh - w).abs() < 1e-3);
    }

    #[test]
    fn test_display_uses_style_data_format() {
        let styles = StyleRegistry::new();
        styles.update("money", |s| s.data_format = "0.00".into());
        let mut cell = Cell::new(0, 0);
        cell.value = CellValue::Number(3.0);
        let ctx = DisplayContext {
            styles: &styles,
            locale: Locale::Germany,
        };
        assert_eq!(cell.display(&ctx), "3");
        cell.style = "money".into();
        assert_eq!(cell.display(&ctx), "3,00");
    }
}
