//! Error types for Meja core.

use thiserror::Error;

use crate::model::{CellRef, CellType, RectangularRegion};

/// Errors that can occur in the Meja document model and its storage backends.
#[derive(Error, Debug)]
pub enum MejaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Cell {cell} is of type {actual}, not {expected}")]
    CellTypeMismatch {
        cell: CellRef,
        expected: CellType,
        actual: CellType,
    },

    #[error("Merged region {region} overlaps existing region {existing}")]
    MergeOverlap {
        region: RectangularRegion,
        existing: RectangularRegion,
    },

    #[error("Cell {0} is already merged")]
    AlreadyMerged(CellRef),

    #[error("Cell {0} is not the top left cell of a merged region")]
    NotTopLeft(CellRef),

    #[error("No merged region starts at {0}")]
    NotMerged(CellRef),

    #[error("Invalid span {span_x}x{span_y}")]
    InvalidSpan { span_x: usize, span_y: usize },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid zoom factor {0}")]
    InvalidZoom(f32),

    #[error("Invalid size {0}")]
    InvalidSize(f32),

    #[error("Column {0} is out of range")]
    ColumnOutOfRange(usize),

    #[error("Sheet index {index} out of range (workbook has {count} sheets)")]
    SheetIndexOutOfRange { index: usize, count: usize },

    #[error("No sheet named '{0}'")]
    NoSuchSheet(String),

    #[error("A sheet named '{0}' already exists")]
    DuplicateSheetName(String),

    #[error("Invalid column name '{0}'")]
    InvalidColumnName(String),

    #[error("Invalid cell reference '{0}'")]
    InvalidCellRef(String),

    #[error("Cannot resolve relative hyperlink '{0}' without a workbook location")]
    UnresolvableHyperlink(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("{format} error: {message}")]
    Format {
        format: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, MejaError>;
