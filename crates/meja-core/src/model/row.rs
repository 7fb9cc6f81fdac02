//! A row of cells.

use super::cell::{Cell, DisplayContext};
use super::search::SearchSettings;

/// Cells of one row, stored densely from column 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub(crate) index: usize,
    pub(crate) cells: Vec<Cell>,
}

impl Row {
    pub(crate) fn new(index: usize) -> Row {
        Row {
            index,
            cells: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn column_count(&self) -> usize {
        self.cells.len()
    }

    pub fn first_cell_num(&self) -> usize {
        0
    }

    /// Index of the last cell, `None` for an empty row.
    pub fn last_cell_num(&self) -> Option<usize> {
        self.cells.len().checked_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    /// Make sure cells `0..=col` exist. Returns the previous cell count.
    pub(crate) fn reserve(&mut self, col: usize) -> usize {
        let old = self.cells.len();
        if col >= old {
            let row = self.index;
            self.cells.extend((old..=col).map(|j| Cell::new(row, j)));
        }
        old
    }

    /// Find the first cell at or after `start_col` matching `text`, wrapping
    /// around to the start of the row.
    pub fn find(
        &self,
        text: &str,
        settings: &SearchSettings,
        start_col: usize,
        ctx: &DisplayContext<'_>,
    ) -> Option<usize> {
        let n = self.cells.len();
        if n == 0 {
            return None;
        }
        (0..n)
            .map(|k| (start_col + k) % n)
            .find(|&j| cell_matches(&self.cells[j], text, settings, ctx))
    }
}

/// The text a search compares against.
pub(crate) fn cell_matches(
    cell: &Cell,
    text: &str,
    settings: &SearchSettings,
    ctx: &DisplayContext<'_>,
) -> bool {
    if cell.is_covered() {
        return false;
    }
    let haystack = match cell.formula() {
        Ok(expr) if settings.search_formula => expr.to_string(),
        _ => cell.display(ctx),
    };
    settings.matches(&haystack, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Locale;
    use crate::model::search::SearchOptions;
    use crate::model::style::StyleRegistry;
    use crate::model::value::CellValue;

    fn row_of(values: &[CellValue]) -> Row {
        let mut row = Row::new(0);
        row.reserve(values.len().saturating_sub(1));
        for (cell, value) in row.cells.iter_mut().zip(values) {
            cell.value = value.clone();
        }
        row
    }

    #[test]
    fn test_reserve_creates_dense_cells() {
        let mut row = Row::new(4);
        assert_eq!(row.last_cell_num(), None);
        assert_eq!(row.reserve(2), 0);
        assert_eq!(row.column_count(), 3);
        assert_eq!(row.last_cell_num(), Some(2));
        assert_eq!(row.cell(2).unwrap().position().to_string(), "C5");
        assert_eq!(row.reserve(1), 3);
        assert_eq!(row.column_count(), 3);
    }

    #[test]
    fn test_find_wraps_around() {
        let styles = StyleRegistry::new();
        let ctx = DisplayContext {
            styles: &styles,
            locale: Locale::Root,
        };
        let row = row_of(&[
            CellValue::from("apple"),
            CellValue::from("banana"),
            CellValue::formula("SUM(A1:B1)"),
            CellValue::from("Apple pie"),
        ]);
        let plain = SearchSettings::default();
        assert_eq!(row.find("apple", &plain, 1, &ctx), Some(0));
        assert_eq!(row.find("Apple", &plain, 0, &ctx), Some(3));

        let ignore = SearchSettings::of(&[SearchOptions::IgnoreCase]);
        assert_eq!(row.find("APPLE", &ignore, 1, &ctx), Some(3));
        assert_eq!(row.find("sum", &ignore, 0, &ctx), Some(2));

        let formula = SearchSettings::of(&[SearchOptions::SearchFormulaText, SearchOptions::MatchCompleteText]);
        assert_eq!(row.find("SUM(A1:B1)", &formula, 0, &ctx), Some(2));
        assert_eq!(row.find("=SUM(A1:B1)", &formula, 0, &ctx), None);
        assert_eq!(row.find("cherry", &plain, 0, &ctx), None);
    }
}
