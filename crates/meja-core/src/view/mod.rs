//! Sheet layout geometry for renderers.
//!
//! [`SheetLayout`] turns column widths and row heights into positions at the
//! sheet's zoom. [`quadrants`] splits the visible area at the freeze position
//! into the four frozen/scrolling segments.

use std::ops::Range;

use crate::model::{CellRef, DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT, Sheet};

/// An axis-aligned rectangle in zoomed points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Prefix sums of column widths and row heights.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetLayout {
    zoom: f32,
    column_pos: Vec<f32>,
    row_pos: Vec<f32>,
}

fn prefix_sums(sizes: impl Iterator<Item = f32>) -> Vec<f32> {
    let mut pos = vec![0.0];
    let mut acc = 0.0;
    for size in sizes {
        acc += size;
        pos.push(acc);
    }
    pos
}

/// Position of `index` given prefix sums; beyond the end, `default` per step.
fn position(pos: &[f32], index: usize, default: f32) -> f32 {
    match pos.get(index) {
        Some(p) => *p,
        None => {
            let last = pos.len() - 1;
            pos[last] + (index - last) as f32 * default
        }
    }
}

/// Index whose span contains `offset`.
fn index_at(pos: &[f32], offset: f32, default: f32) -> usize {
    if offset <= 0.0 {
        return 0;
    }
    let last = pos.len() - 1;
    if offset >= pos[last] {
        return last + ((offset - pos[last]) / default) as usize;
    }
    pos.partition_point(|p| *p <= offset).saturating_sub(1)
}

impl SheetLayout {
    pub fn new(sheet: &Sheet) -> SheetLayout {
        let zoom = sheet.zoom();
        SheetLayout {
            zoom,
            column_pos: prefix_sums((0..sheet.column_count()).map(|j| sheet.column_width(j) * zoom)),
            row_pos: prefix_sums((0..sheet.row_count()).map(|i| sheet.row_height(i) * zoom)),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn column_x(&self, j: usize) -> f32 {
        position(&self.column_pos, j, DEFAULT_COLUMN_WIDTH * self.zoom)
    }

    pub fn row_y(&self, i: usize) -> f32 {
        position(&self.row_pos, i, DEFAULT_ROW_HEIGHT * self.zoom)
    }

    pub fn column_width(&self, j: usize) -> f32 {
        self.column_x(j + 1) - self.column_x(j)
    }

    pub fn row_height(&self, i: usize) -> f32 {
        self.row_y(i + 1) - self.row_y(i)
    }

    pub fn column_at(&self, x: f32) -> usize {
        index_at(&self.column_pos, x, DEFAULT_COLUMN_WIDTH * self.zoom)
    }

    pub fn row_at(&self, y: f32) -> usize {
        index_at(&self.row_pos, y, DEFAULT_ROW_HEIGHT * self.zoom)
    }

    /// Area of (i, j). A merged cell covers its whole region; a covered
    /// cell reports the area of the merge it belongs to.
    pub fn cell_rect(&self, sheet: &Sheet, i: usize, j: usize) -> Rect {
        let (origin, span_x, span_y) = match sheet.logical_cell(i, j) {
            Some(cell) => (cell.position(), cell.span_x().max(1), cell.span_y().max(1)),
            None => (CellRef::new(i, j), 1, 1),
        };
        let x = self.column_x(origin.col);
        let y = self.row_y(origin.row);
        Rect {
            x,
            y,
            width: self.column_x(origin.col + span_x) - x,
            height: self.row_y(origin.row + span_y) - y,
        }
    }
}

/// One of the four areas of a split view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// The rows and columns shown in one quadrant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub quadrant: Quadrant,
    pub rows: Range<usize>,
    pub columns: Range<usize>,
}

/// Split the view at `split` (frozen rows, frozen columns).
///
/// `scroll` is the first row and column of the scrolling area and is
/// clamped to the split. `visible` is how many rows and columns fit.
/// Empty segments are omitted.
pub fn quadrants(
    split: (usize, usize),
    scroll: (usize, usize),
    visible: (usize, usize),
) -> Vec<Segment> {
    let (split_row, split_col) = split;
    let (vis_rows, vis_cols) = visible;
    let frozen_rows = split_row.min(vis_rows);
    let frozen_cols = split_col.min(vis_cols);
    let scroll_row = scroll.0.max(split_row);
    let scroll_col = scroll.1.max(split_col);

    let top = 0..frozen_rows;
    let bottom = scroll_row..scroll_row + (vis_rows - frozen_rows);
    let left = 0..frozen_cols;
    let right = scroll_col..scroll_col + (vis_cols - frozen_cols);

    [
        (Quadrant::TopLeft, top.clone(), left.clone()),
        (Quadrant::TopRight, top, right.clone()),
        (Quadrant::BottomLeft, bottom.clone(), left),
        (Quadrant::BottomRight, bottom, right),
    ]
    .into_iter()
    .filter(|(_, rows, columns)| !rows.is_empty() && !columns.is_empty())
    .map(|(quadrant, rows, columns)| Segment {
        quadrant,
        rows,
        columns,
    })
    .collect()
}
