//! meja-core - UI-agnostic spreadsheet model, events and storage.
//!
//! A [`Workbook`] owns its sheets through [`SheetHandle`]s. Each sheet sits
//! behind its own read/write lock, and the events a mutation produces are
//! delivered once the write guard is released.

pub mod error;
pub mod event;
pub mod format;
pub mod io;
pub mod model;
pub mod view;

pub use error::{MejaError, Result};
pub use event::{EventBus, SheetEvent, SubscriptionId, WorkbookEvent};
pub use format::Locale;
pub use model::{
    Cell, CellMut, CellRef, CellStyle, CellType, CellValue, RectangularRegion, RefOption, Row,
    SearchOptions, SearchSettings, Sheet, SheetHandle, Workbook,
};
