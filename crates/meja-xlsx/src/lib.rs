//! meja-xlsx - Excel files for the Meja spreadsheet model.
//!
//! [`XlsxReader`] loads `.xlsx` and `.xls` through calamine, [`XlsxWriter`]
//! saves `.xlsx` through rust_xlsxwriter. Both plug into
//! `meja_core::io::{read_file, write_file}`.

pub mod error;
mod reader;
mod serial;
mod writer;

pub use error::{Result, XlsxError};
pub use reader::XlsxReader;
pub use serial::{from_excel_serial, to_excel_serial};
pub use writer::XlsxWriter;
