//! Picking readers and writers by file extension.

use anyhow::{Context, Result, bail};
use meja_core::Workbook;
use meja_core::io::{
    CsvReader, CsvWriter, FileType, HtmlWriter, MarkdownWriter, WorkbookReader, WorkbookWriter,
    read_file, write_file,
};
use meja_xlsx::{XlsxReader, XlsxWriter};
use std::path::Path;
use tracing::info;

use crate::config::MejaConfig;

fn reader_for(file_type: FileType, config: &MejaConfig) -> Option<Box<dyn WorkbookReader>> {
    match file_type {
        FileType::Csv => Some(Box::new(CsvReader::new(config.csv))),
        FileType::Xlsx | FileType::Xls => Some(Box::new(XlsxReader::new(config.locale))),
        FileType::Html | FileType::Markdown => None,
    }
}

fn writer_for(file_type: FileType, config: &MejaConfig) -> Option<Box<dyn WorkbookWriter>> {
    match file_type {
        FileType::Csv => Some(Box::new(CsvWriter::new(config.csv))),
        FileType::Html => Some(Box::new(HtmlWriter::default())),
        FileType::Markdown => Some(Box::new(MarkdownWriter)),
        FileType::Xlsx => Some(Box::new(XlsxWriter)),
        FileType::Xls => None,
    }
}

/// Open a workbook. A workbook without sheets gets an empty `Sheet1`.
pub fn open(path: &Path, config: &MejaConfig) -> Result<Workbook> {
    let file_type = FileType::from_path(path)?;
    let Some(reader) = reader_for(file_type, config) else {
        bail!("cannot read {:?} files: {}", file_type, path.display());
    };
    let mut workbook = read_file(reader.as_ref(), path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if workbook.sheet_count() == 0 {
        workbook.create_sheet("Sheet1")?;
    }
    info!(path = %path.display(), sheets = workbook.sheet_count(), "opened workbook");
    Ok(workbook)
}

pub fn save(workbook: &Workbook, path: &Path, config: &MejaConfig) -> Result<()> {
    let file_type = FileType::from_path(path)?;
    let Some(writer) = writer_for(file_type, config) else {
        bail!("cannot write {:?} files: {}", file_type, path.display());
    };
    write_file(writer.as_ref(), workbook, path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "saved workbook");
    Ok(())
}

/// Read `input` and write it to `output`, both chosen by extension.
pub fn convert(input: &Path, output: &Path, config: &MejaConfig) -> Result<()> {
    let workbook = open(input, config)?;
    save(&workbook, output, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_to_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.md");
        std::fs::write(&input, "a,b\n1,2\n").unwrap();

        convert(&input, &output, &MejaConfig::default()).unwrap();
        let md = std::fs::read_to_string(&output).unwrap();
        assert!(md.starts_with("# in\n"));
        assert!(md.contains("| 2 | 1 | 2 |"));
    }

    #[test]
    fn test_unsupported_directions() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("in.html");
        std::fs::write(&html, "<table></table>").unwrap();
        assert!(open(&html, &MejaConfig::default()).is_err());

        let workbook = Workbook::default();
        let err = save(&workbook, &dir.path().join("out.xls"), &MejaConfig::default()).unwrap_err();
        assert!(err.to_string().contains("cannot write"));
    }
}
