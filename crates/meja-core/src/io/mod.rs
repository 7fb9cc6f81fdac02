//! Reading and writing workbooks.
//!
//! Formats implement [`WorkbookReader`] and/or [`WorkbookWriter`]. CSV, HTML
//! and Markdown live here; Excel support is provided by the `meja-xlsx`
//! crate through the same traits.

pub mod csv;
pub mod html;
pub mod md;

pub use self::csv::{CsvOptions, CsvReader, CsvWriter, parse_cell_value};
pub use html::HtmlWriter;
pub use md::MarkdownWriter;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

use crate::error::{MejaError, Result};
use crate::model::Workbook;

pub trait WorkbookReader {
    /// Read a workbook. `name` identifies the source, e.g. the file stem,
    /// for formats that do not store sheet names.
    fn read(&self, input: &mut dyn Read, name: &str) -> Result<Workbook>;
}

pub trait WorkbookWriter {
    fn write(&self, workbook: &Workbook, output: &mut dyn Write) -> Result<()>;
}

/// File types recognised by extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    Csv,
    Html,
    Markdown,
    Xlsx,
    Xls,
}

impl FileType {
    pub fn from_path(path: &Path) -> Result<FileType> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(FileType::Csv),
            "html" | "htm" => Ok(FileType::Html),
            "md" | "markdown" => Ok(FileType::Markdown),
            "xlsx" | "xlsm" => Ok(FileType::Xlsx),
            "xls" => Ok(FileType::Xls),
            _ => Err(MejaError::UnsupportedFileType(path.display().to_string())),
        }
    }

    pub fn can_read(&self) -> bool {
        matches!(self, FileType::Csv | FileType::Xlsx | FileType::Xls)
    }

    pub fn can_write(&self) -> bool {
        !matches!(self, FileType::Xls)
    }
}

/// Read `path` with `reader` and record it as the workbook's location.
pub fn read_file(reader: &dyn WorkbookReader, path: &Path) -> Result<Workbook> {
    debug!(path = %path.display(), "reading workbook");
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1");
    let mut input = BufReader::new(File::open(path)?);
    let mut workbook = reader.read(&mut input, name)?;
    workbook.set_location(Some(path.to_path_buf()));
    Ok(workbook)
}

/// Write `workbook` to `path` with `writer`.
pub fn write_file(writer: &dyn WorkbookWriter, workbook: &Workbook, path: &Path) -> Result<()> {
    debug!(path = %path.display(), "writing workbook");
    let mut output = BufWriter::new(File::create(path)?);
    writer.write(workbook, &mut output)?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_path(Path::new("a.CSV")).unwrap(), FileType::Csv);
        assert_eq!(FileType::from_path(Path::new("a.htm")).unwrap(), FileType::Html);
        assert_eq!(FileType::from_path(Path::new("dir/a.xlsx")).unwrap(), FileType::Xlsx);
        assert_eq!(FileType::from_path(Path::new("a.xls")).unwrap(), FileType::Xls);
        assert!(matches!(
            FileType::from_path(Path::new("a.grd")),
            Err(MejaError::UnsupportedFileType(_))
        ));
        assert!(FileType::from_path(Path::new("noext")).is_err());
        assert!(!FileType::Xls.can_write());
        assert!(!FileType::Html.can_read());
    }
}
