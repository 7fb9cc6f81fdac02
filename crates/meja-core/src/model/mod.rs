//! The spreadsheet document model.
//!
//! - [`Workbook`] - ordered sheets, shared styles, locale and location
//! - [`Sheet`] / [`SheetHandle`] - rows, merged regions and view state behind a lock
//! - [`Row`], [`Cell`], [`CellMut`] - grid elements and write access to them
//! - [`CellRef`], [`RectangularRegion`] - coordinates in A1 notation
//! - [`CellStyle`] and its value types

mod cell;
mod cell_ref;
mod handle;
mod region;
mod row;
mod search;
mod sheet;
pub mod style;
mod value;
mod workbook;

pub use cell::{
    Cell, DisplayContext, MAX_COLUMN_NUMBER, MAX_HORIZONTAL_SPAN, MAX_VERTICAL_SPAN, has_uri_scheme,
};
pub use cell_ref::{CellRef, RefOption, column_name, column_number, row_name};
pub use handle::{SheetHandle, SheetWriteGuard};
pub use region::RectangularRegion;
pub use row::Row;
pub use search::{SearchOptions, SearchSettings};
pub use sheet::{CellMut, DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT, Sheet};
pub use style::{
    BorderStyle, CellStyle, Color, DEFAULT_STYLE, Direction, FillPattern, Font, HAlign,
    StyleRegistry, VAlign,
};
pub use value::{CellType, CellValue, ERROR_TEXT};
pub use workbook::Workbook;
