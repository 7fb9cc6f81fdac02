//! Markdown export functionality

use std::io::Write;

use super::WorkbookWriter;
use crate::error::Result;
use crate::model::{Sheet, Workbook, column_name};

/// Writes every sheet as a markdown table under its own heading.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownWriter;

impl WorkbookWriter for MarkdownWriter {
    fn write(&self, workbook: &Workbook, output: &mut dyn Write) -> Result<()> {
        for (index, handle) in workbook.sheets().enumerate() {
            if index > 0 {
                writeln!(output)?;
            }
            write_sheet(output, &handle.read())?;
        }
        Ok(())
    }
}

/// Write one sheet as a markdown table
fn write_sheet(out: &mut dyn Write, sheet: &Sheet) -> Result<()> {
    writeln!(out, "# {}", escape_markdown(sheet.name()))?;
    writeln!(out)?;

    let Some((max_row, max_col)) = find_grid_bounds(sheet) else {
        writeln!(out, "*Empty sheet*")?;
        return Ok(());
    };

    // Header row with column letters
    write!(out, "|   |")?;
    for col in 0..=max_col {
        write!(out, " {} |", column_name(col))?;
    }
    writeln!(out)?;

    write!(out, "|---|")?;
    for _ in 0..=max_col {
        write!(out, "---|")?;
    }
    writeln!(out)?;

    for row in 0..=max_row {
        write!(out, "| {} |", row + 1)?;
        for col in 0..=max_col {
            // Covered cells of a merge stay empty.
            let text = match sheet.cell(row, col) {
                Some(cell) if !cell.is_covered() => cell.display(&sheet.display_context()),
                _ => String::new(),
            };
            write!(out, " {} |", escape_markdown(&text))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Last row and column holding a non-empty cell.
fn find_grid_bounds(sheet: &Sheet) -> Option<(usize, usize)> {
    let mut bounds: Option<(usize, usize)> = None;
    for row in sheet.rows() {
        for cell in row.cells().filter(|c| !c.is_empty()) {
            let (r, c) = bounds.unwrap_or((0, 0));
            bounds = Some((r.max(cell.row()), c.max(cell.column())));
        }
    }
    bounds
}

/// Escape special markdown characters in cell content
fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ").replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Locale;

    #[test]
    fn test_markdown_export() {
        let mut wb = Workbook::new(Locale::Us);
        let s = wb.create_sheet("Prices").unwrap();
        s.update(|sheet| -> Result<()> {
            sheet.create_row(["Item", "Cost"])?;
            sheet.create_row([crate::model::CellValue::from("a|b"), 2.5.into()])?;
            Ok(())
        })
        .unwrap();
        wb.create_sheet("Blank").unwrap();

        let mut out = Vec::new();
        MarkdownWriter.write(&wb, &mut out).unwrap();
        let expected = "# Prices\n\n\
            |   | A | B |\n\
            |---|---|---|\n\
            | 1 | Item | Cost |\n\
            | 2 | a\\|b | 2.5 |\n\
            \n# Blank\n\n*Empty sheet*\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
}
