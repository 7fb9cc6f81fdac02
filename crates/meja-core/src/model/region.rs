//! Rectangular cell regions with inclusive bounds.

use std::fmt;

use super::cell_ref::CellRef;
use crate::error::{MejaError, Result};

/// A rectangular block of cells, `first..=last` in both directions.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct RectangularRegion {
    pub first_row: usize,
    pub first_column: usize,
    pub last_row: usize,
    pub last_column: usize,
}

impl RectangularRegion {
    pub fn new(
        first_row: usize,
        first_column: usize,
        last_row: usize,
        last_column: usize,
    ) -> Result<Self> {
        if last_row < first_row || last_column < first_column {
            return Err(MejaError::InvalidRegion(format!(
                "({first_row},{first_column})..({last_row},{last_column})"
            )));
        }
        Ok(RectangularRegion {
            first_row,
            first_column,
            last_row,
            last_column,
        })
    }

    /// Region of `span_y` rows and `span_x` columns starting at `top_left`.
    pub fn spanning(top_left: CellRef, span_x: usize, span_y: usize) -> Result<Self> {
        if span_x == 0 || span_y == 0 {
            return Err(MejaError::InvalidSpan { span_x, span_y });
        }
        let invalid = || MejaError::InvalidSpan { span_x, span_y };
        let last_row = top_left.row.checked_add(span_y - 1).ok_or_else(invalid)?;
        let last_column = top_left.col.checked_add(span_x - 1).ok_or_else(invalid)?;
        Self::new(top_left.row, top_left.col, last_row, last_column)
    }

    pub fn top_left(&self) -> CellRef {
        CellRef::new(self.first_row, self.first_column)
    }

    pub fn bottom_right(&self) -> CellRef {
        CellRef::new(self.last_row, self.last_column)
    }

    pub fn row_span(&self) -> usize {
        self.last_row - self.first_row + 1
    }

    pub fn column_span(&self) -> usize {
        self.last_column - self.first_column + 1
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_column..=self.last_column).contains(&col)
    }

    pub fn intersects(&self, other: &RectangularRegion) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_column <= other.last_column
            && other.first_column <= self.last_column
    }

    /// All cells of the region in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.first_row..=self.last_row)
            .flat_map(move |row| (self.first_column..=self.last_column).map(move |col| CellRef::new(row, col)))
    }
}

impl std::str::FromStr for RectangularRegion {
    type Err = MejaError;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = match s.split_once(':') {
            Some((a, b)) => (CellRef::parse(a)?, CellRef::parse(b)?),
            None => {
                let cell = CellRef::parse(s)?;
                (cell, cell)
            }
        };
        RectangularRegion::new(
            start.row.min(end.row),
            start.col.min(end.col),
            start.row.max(end.row),
            start.col.max(end.col),
        )
    }
}

impl fmt::Display for RectangularRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.top_left(), self.bottom_right())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(s: &str) -> RectangularRegion {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let r = region("B2:D5");
        assert_eq!((r.first_row, r.first_column, r.last_row, r.last_column), (1, 1, 4, 3));
        assert_eq!(r.to_string(), "B2:D5");
        assert_eq!(region("D5:B2"), r);
        assert_eq!(r.row_span(), 4);
        assert_eq!(r.column_span(), 3);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(RectangularRegion::new(3, 0, 2, 0).is_err());
        assert!(RectangularRegion::spanning(CellRef::new(0, 0), 0, 2).is_err());
        assert!(matches!(
            RectangularRegion::spanning(CellRef::new(0, 1), usize::MAX, 1),
            Err(MejaError::InvalidSpan { .. })
        ));
        assert!(matches!(
            RectangularRegion::spanning(CellRef::new(2, 0), 1, usize::MAX),
            Err(MejaError::InvalidSpan { .. })
        ));
    }

    #[test]
    fn test_contains_and_intersects() {
        let r = region("B2:C3");
        assert!(r.contains(1, 1));
        assert!(r.contains(2, 2));
        assert!(!r.contains(0, 1));
        assert!(!r.contains(3, 2));

        assert!(r.intersects(&region("C3:E5")));
        assert!(r.intersects(&region("A1:D4")));
        assert!(!r.intersects(&region("D1:D9")));
        assert!(!r.intersects(&region("A4:C4")));
    }

    #[test]
    fn test_cells_row_major() {
        let cells: Vec<String> = region("A1:B2").cells().map(|c| c.to_string()).collect();
        assert_eq!(cells, ["A1", "B1", "A2", "B2"]);
    }
}
