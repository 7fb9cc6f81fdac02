//! Error types for the Excel bridge.

use meja_core::{CellRef, MejaError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XlsxError {
    #[error(transparent)]
    Meja(#[from] MejaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read workbook: {0}")]
    Read(#[from] calamine::Error),

    #[error("Failed to read merged regions: {0}")]
    MergedRegions(#[from] calamine::XlsxError),

    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("Cell {0} is beyond the sheet limits of the XLSX format")]
    CellOutOfRange(CellRef),

    #[error("Workbook contains no sheets")]
    NoSheets,
}

pub type Result<T> = std::result::Result<T, XlsxError>;

impl From<XlsxError> for MejaError {
    fn from(err: XlsxError) -> Self {
        match err {
            XlsxError::Meja(inner) => inner,
            XlsxError::Io(inner) => MejaError::Io(inner),
            other => MejaError::Format {
                format: "XLSX",
                message: other.to_string(),
            },
        }
    }
}
