//! Sheets: rows of cells, merged regions and view state.
//!
//! Every mutation queues [`SheetEvent`]s on the sheet. A [`SheetHandle`]
//! drains and publishes them once its write guard is released; code that
//! owns a bare `Sheet` can collect them with [`Sheet::take_events`].
//!
//! [`SheetHandle`]: super::handle::SheetHandle

use std::sync::Arc;
use tracing::debug;

use super::cell::{Cell, DisplayContext, MAX_COLUMN_NUMBER, MAX_HORIZONTAL_SPAN, MAX_VERTICAL_SPAN};
use super::cell_ref::CellRef;
use super::region::RectangularRegion;
use super::row::{Row, cell_matches};
use super::search::SearchSettings;
use super::style::{BorderStyle, CellStyle, Direction, StyleRegistry};
use super::value::CellValue;
use crate::error::{MejaError, Result};
use crate::event::SheetEvent;
use crate::format::Locale;

/// Width of columns without an explicit width, in points.
pub const DEFAULT_COLUMN_WIDTH: f32 = 80.0;
/// Height of rows without an explicit height, in points.
pub const DEFAULT_ROW_HEIGHT: f32 = 12.0;

#[derive(Debug)]
pub struct Sheet {
    name: String,
    rows: Vec<Row>,
    column_count: usize,
    merged: Vec<RectangularRegion>,
    column_widths: Vec<Option<f32>>,
    row_heights: Vec<Option<f32>>,
    split: (usize, usize),
    auto_filter_row: Option<usize>,
    zoom: f32,
    current: Option<CellRef>,
    styles: Arc<StyleRegistry>,
    locale: Locale,
    pending: Vec<SheetEvent>,
}

impl Sheet {
    /// A standalone sheet with its own style registry.
    pub fn new(name: impl Into<String>) -> Sheet {
        Sheet::with_styles(name, Arc::new(StyleRegistry::new()), Locale::default())
    }

    pub fn with_styles(name: impl Into<String>, styles: Arc<StyleRegistry>, locale: Locale) -> Sheet {
        Sheet {
            name: name.into(),
            rows: Vec::new(),
            column_count: 0,
            merged: Vec::new(),
            column_widths: Vec::new(),
            row_heights: Vec::new(),
            split: (0, 0),
            auto_filter_row: None,
            zoom: 1.0,
            current: None,
            styles,
            locale,
            pending: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn styles(&self) -> &Arc<StyleRegistry> {
        &self.styles
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        if self.locale != locale {
            self.locale = locale;
            self.emit(SheetEvent::LayoutChanged);
        }
    }

    pub fn display_context(&self) -> DisplayContext<'_> {
        DisplayContext {
            styles: &self.styles,
            locale: self.locale,
        }
    }

    pub(crate) fn emit(&mut self, event: SheetEvent) {
        self.pending.push(event);
    }

    /// Drain the events queued by mutations so far.
    pub fn take_events(&mut self) -> Vec<SheetEvent> {
        std::mem::take(&mut self.pending)
    }

    // ---- rows and cells ----

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Highest used column + 1.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn first_row_num(&self) -> usize {
        0
    }

    /// `None` for a sheet without rows.
    pub fn last_row_num(&self) -> Option<usize> {
        self.rows.len().checked_sub(1)
    }

    pub fn row(&self, i: usize) -> Option<&Row> {
        self.rows.get(i)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn cell(&self, i: usize, j: usize) -> Option<&Cell> {
        self.rows.get(i)?.cell(j)
    }

    /// The cell carrying the value for position (i, j).
    pub fn logical_cell(&self, i: usize, j: usize) -> Option<&Cell> {
        let logical = self.cell(i, j)?.logical_cell();
        self.cell(logical.row, logical.col)
    }

    /// Display text of (i, j); covered cells show their merge's value.
    pub fn display(&self, i: usize, j: usize) -> String {
        self.logical_cell(i, j)
            .map(|cell| cell.display(&self.display_context()))
            .unwrap_or_default()
    }

    pub fn cell_style(&self, i: usize, j: usize) -> Arc<CellStyle> {
        match self.logical_cell(i, j) {
            Some(cell) => self.styles.get(cell.style_name()),
            None => self.styles.default_style(),
        }
    }

    /// Mutable access to (i, j). Rows and cells are created on demand.
    pub fn cell_mut(&mut self, i: usize, j: usize) -> Result<CellMut<'_>> {
        if j > MAX_COLUMN_NUMBER {
            return Err(MejaError::ColumnOutOfRange(j));
        }
        self.reserve(i, j);
        Ok(CellMut {
            sheet: self,
            row: i,
            col: j,
        })
    }

    /// Set the value of (i, j).
    pub fn set(&mut self, i: usize, j: usize, value: impl Into<CellValue>) -> Result<()> {
        self.cell_mut(i, j)?.set(value);
        Ok(())
    }

    /// Append a row after the last one. Returns its index.
    pub fn create_row<I, V>(&mut self, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let index = self.rows.len();
        self.reserve_row(index);
        for (j, value) in values.into_iter().enumerate() {
            self.set(index, j, value)?;
        }
        Ok(index)
    }

    fn reserve_row(&mut self, i: usize) {
        let old = self.rows.len();
        if i >= old {
            self.rows.extend((old..=i).map(Row::new));
            self.emit(SheetEvent::RowsAdded {
                first: old,
                last: i + 1,
            });
        }
    }

    fn reserve(&mut self, i: usize, j: usize) {
        self.reserve_row(i);
        self.rows[i].reserve(j);
        if j >= self.column_count {
            let old = self.column_count;
            self.column_count = j + 1;
            self.emit(SheetEvent::ColumnsAdded {
                first: old,
                last: j + 1,
            });
        }
    }

    fn store_value(&mut self, i: usize, j: usize, value: CellValue) {
        let cell = &mut self.rows[i].cells[j];
        if cell.value == value {
            return;
        }
        let old = std::mem::replace(&mut cell.value, value.clone());
        self.emit(SheetEvent::CellValueChanged {
            cell: CellRef::new(i, j),
            old,
            new: value,
        });
    }

    fn store_style(&mut self, i: usize, j: usize, style: &str) {
        let cell = &mut self.rows[i].cells[j];
        if cell.style == style {
            return;
        }
        let old = std::mem::replace(&mut cell.style, style.to_string());
        self.emit(SheetEvent::CellStyleChanged {
            cell: CellRef::new(i, j),
            old,
            new: style.to_string(),
        });
    }

    /// Copy values, styles and hyperlinks of `source` into row `i`.
    ///
    /// Cells covered by a merge in row `i` are skipped so the merge keeps
    /// the value of its top-left cell.
    pub fn copy_row_from(&mut self, i: usize, source: &Row) -> Result<()> {
        self.reserve_row(i);
        for cell in source.cells() {
            let j = cell.column();
            if self.cell(i, j).is_some_and(Cell::is_covered) {
                continue;
            }
            self.cell_mut(i, j)?.copy_from(cell);
        }
        Ok(())
    }

    // ---- merged regions ----

    pub fn merged_regions(&self) -> &[RectangularRegion] {
        &self.merged
    }

    pub fn merged_region_at(&self, i: usize, j: usize) -> Option<&RectangularRegion> {
        self.merged.iter().find(|r| r.contains(i, j))
    }

    /// Merge the cells of `region`. The top-left cell keeps its value and
    /// spans the region; all other cells are cleared.
    pub fn add_merged_region(&mut self, region: RectangularRegion) -> Result<()> {
        let (span_x, span_y) = (region.column_span(), region.row_span());
        if span_x == 1 && span_y == 1 {
            return Err(MejaError::InvalidRegion(format!("{region} is a single cell")));
        }
        if span_x > MAX_HORIZONTAL_SPAN
            || span_y > MAX_VERTICAL_SPAN
            || region.last_column > MAX_COLUMN_NUMBER
        {
            return Err(MejaError::InvalidSpan { span_x, span_y });
        }
        if let Some(existing) = self.merged.iter().find(|m| m.intersects(&region)) {
            return Err(MejaError::MergeOverlap {
                region,
                existing: *existing,
            });
        }

        for i in region.first_row..=region.last_row {
            self.reserve(i, region.last_column);
        }
        let top_left = region.top_left();
        let mut cleared = Vec::new();
        for pos in region.cells() {
            let cell = &mut self.rows[pos.row].cells[pos.col];
            cell.logical = top_left;
            if pos == top_left {
                cell.span_x = span_x;
                cell.span_y = span_y;
            } else {
                cell.span_x = 0;
                cell.span_y = 0;
                cell.hyperlink = None;
                let old = std::mem::take(&mut cell.value);
                if !old.is_blank() {
                    cleared.push(SheetEvent::CellValueChanged {
                        cell: pos,
                        old,
                        new: CellValue::Blank,
                    });
                }
            }
        }
        self.pending.extend(cleared);
        self.merged.push(region);
        debug!(sheet = %self.name, %region, "added merged region");
        self.emit(SheetEvent::LayoutChanged);
        Ok(())
    }

    /// Dissolve the merge whose top-left cell is `top_left`.
    pub fn remove_merged_region(&mut self, top_left: CellRef) -> Result<RectangularRegion> {
        let index = self
            .merged
            .iter()
            .position(|r| r.top_left() == top_left)
            .ok_or(MejaError::NotMerged(top_left))?;
        let region = self.merged.remove(index);
        for pos in region.cells() {
            if let Some(cell) = self
                .rows
                .get_mut(pos.row)
                .and_then(|row| row.cells.get_mut(pos.col))
            {
                cell.span_x = 1;
                cell.span_y = 1;
                cell.logical = pos;
            }
        }
        debug!(sheet = %self.name, %region, "removed merged region");
        self.emit(SheetEvent::LayoutChanged);
        Ok(region)
    }

    // ---- view state ----

    pub fn current_cell(&self) -> Option<CellRef> {
        self.current
    }

    /// Move the cursor to the logical cell of (i, j). Returns whether it moved.
    pub fn set_current_cell(&mut self, i: usize, j: usize) -> bool {
        let target = self
            .cell(i, j)
            .map(Cell::logical_cell)
            .unwrap_or(CellRef::new(i, j));
        if self.current == Some(target) {
            return false;
        }
        let old = self.current.replace(target);
        self.emit(SheetEvent::ActiveCellChanged {
            old,
            new: Some(target),
        });
        true
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) -> Result<()> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(MejaError::InvalidZoom(zoom));
        }
        if zoom != self.zoom {
            let old = std::mem::replace(&mut self.zoom, zoom);
            self.emit(SheetEvent::ZoomChanged { old, new: zoom });
        }
        Ok(())
    }

    /// `(row, column)` of the split; rows above and columns left of it are frozen.
    pub fn split(&self) -> (usize, usize) {
        self.split
    }

    pub fn split_row(&self) -> usize {
        self.split.0
    }

    pub fn split_column(&self) -> usize {
        self.split.1
    }

    pub fn split_at(&mut self, i: usize, j: usize) {
        if self.split != (i, j) {
            let old = std::mem::replace(&mut self.split, (i, j));
            self.emit(SheetEvent::SplitChanged { old, new: (i, j) });
        }
    }

    pub fn auto_filter_row(&self) -> Option<usize> {
        self.auto_filter_row
    }

    pub fn set_auto_filter_row(&mut self, row: Option<usize>) {
        self.auto_filter_row = row;
    }

    pub fn column_width(&self, j: usize) -> f32 {
        self.column_widths
            .get(j)
            .copied()
            .flatten()
            .unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    pub fn row_height(&self, i: usize) -> f32 {
        self.row_heights
            .get(i)
            .copied()
            .flatten()
            .unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    pub fn set_column_width(&mut self, j: usize, width: f32) -> Result<()> {
        if store_size(&mut self.column_widths, j, width)? {
            self.emit(SheetEvent::LayoutChanged);
        }
        Ok(())
    }

    pub fn set_row_height(&mut self, i: usize, height: f32) -> Result<()> {
        if store_size(&mut self.row_heights, i, height)? {
            self.emit(SheetEvent::LayoutChanged);
        }
        Ok(())
    }

    fn widest_in_column(&self, j: usize) -> Option<f32> {
        self.rows
            .iter()
            .filter_map(|row| row.cell(j))
            .filter(|cell| !cell.is_empty() && cell.span_x() == 1)
            .map(|cell| {
                let style = self.styles.get(cell.style_name());
                cell.calc_cell_dimension(&style, self.locale).0
            })
            .reduce(f32::max)
    }

    /// Fit column `j` to its widest non-empty, unmerged cell.
    pub fn auto_size_column(&mut self, j: usize) -> Result<()> {
        match self.widest_in_column(j) {
            Some(width) => self.set_column_width(j, width),
            None => Ok(()),
        }
    }

    pub fn auto_size_columns(&mut self) -> Result<()> {
        let mut changed = false;
        for j in 0..self.column_count {
            if let Some(width) = self.widest_in_column(j) {
                changed |= store_size(&mut self.column_widths, j, width)?;
            }
        }
        if changed {
            self.emit(SheetEvent::LayoutChanged);
        }
        Ok(())
    }

    /// Fit row `i` to its tallest non-empty, unmerged cell.
    pub fn auto_size_row(&mut self, i: usize) -> Result<()> {
        let Some(row) = self.rows.get(i) else {
            return Ok(());
        };
        let tallest = row
            .cells()
            .filter(|cell| !cell.is_empty() && cell.span_y() == 1)
            .map(|cell| {
                let style = self.styles.get(cell.style_name());
                cell.calc_cell_dimension(&style, self.locale).1
            })
            .reduce(f32::max);
        match tallest {
            Some(height) => self.set_row_height(i, height),
            None => Ok(()),
        }
    }

    /// Border drawn on side `direction` of (i, j). North and west borders
    /// may come from the neighbouring cell's opposite side.
    pub fn effective_border_style(&self, i: usize, j: usize, direction: Direction) -> BorderStyle {
        let own = self.cell_style(i, j).border(direction);
        let neighbour = match direction {
            Direction::North => i.checked_sub(1).map(|r| (r, j)),
            Direction::West => j.checked_sub(1).map(|c| (i, c)),
            Direction::East | Direction::South => None,
        };
        if let Some((r, c)) = neighbour
            && self.cell(r, c).is_some()
        {
            let border = self.cell_style(r, c).border(direction.inverse());
            if !border.is_none() {
                return border;
            }
        }
        own
    }

    // ---- whole-sheet operations ----

    /// Remove all content, merges, sizes and the cursor.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.merged.clear();
        self.column_widths.clear();
        self.row_heights.clear();
        self.column_count = 0;
        self.auto_filter_row = None;
        if let Some(old) = self.current.take() {
            self.emit(SheetEvent::ActiveCellChanged {
                old: Some(old),
                new: None,
            });
        }
        self.emit(SheetEvent::LayoutChanged);
    }

    /// Replace this sheet's content with a copy of `other`: rows, merged
    /// regions, sizes, split and auto-filter row. Name and zoom are kept.
    pub fn copy_from(&mut self, other: &Sheet) -> Result<()> {
        self.clear();
        for row in other.rows() {
            self.copy_row_from(row.index(), row)?;
        }
        for region in other.merged_regions() {
            self.add_merged_region(*region)?;
        }
        self.column_widths = other.column_widths.clone();
        self.row_heights = other.row_heights.clone();
        self.split_at(other.split.0, other.split.1);
        self.auto_filter_row = other.auto_filter_row;
        self.emit(SheetEvent::LayoutChanged);
        Ok(())
    }

    /// First cell matching `text` in row-major order, wrapping around.
    ///
    /// With `search_from_current` the search starts after the current cell.
    pub fn find(&self, text: &str, settings: &SearchSettings) -> Option<CellRef> {
        let positions: Vec<CellRef> = self
            .rows
            .iter()
            .flat_map(|row| row.cells().map(Cell::position))
            .collect();
        if positions.is_empty() {
            return None;
        }
        let start = match (settings.search_from_current, self.current) {
            (true, Some(current)) => positions.partition_point(|p| *p <= current),
            _ => 0,
        };
        let ctx = self.display_context();
        let n = positions.len();
        (0..n).map(|k| positions[(start + k) % n]).find(|p| {
            cell_matches(&self.rows[p.row].cells[p.col], text, settings, &ctx)
        })
    }

    /// [`Sheet::find`], moving the current cell to the match when
    /// `update_current` is set.
    pub fn find_and_update(&mut self, text: &str, settings: &SearchSettings) -> Option<CellRef> {
        let found = self.find(text, settings)?;
        if settings.update_current {
            self.set_current_cell(found.row, found.col);
        }
        Some(found)
    }

    /// Every cell matching `text`, in row-major order.
    pub fn find_all(&self, text: &str, settings: &SearchSettings) -> Vec<CellRef> {
        let ctx = self.display_context();
        self.rows
            .iter()
            .flat_map(|row| row.cells())
            .filter(|cell| cell_matches(cell, text, settings, &ctx))
            .map(Cell::position)
            .collect()
    }
}

/// Store a width or height. Returns whether the stored value changed.
fn store_size(sizes: &mut Vec<Option<f32>>, index: usize, size: f32) -> Result<bool> {
    if !size.is_finite() || size < 0.0 {
        return Err(MejaError::InvalidSize(size));
    }
    if sizes.len() <= index {
        sizes.resize(index + 1, None);
    }
    let changed = sizes[index] != Some(size);
    sizes[index] = Some(size);
    Ok(changed)
}

/// Write access to one cell of a sheet.
///
/// Value, style and hyperlink changes go to the logical cell, so writing
/// to any cell of a merge changes the merge's value.
pub struct CellMut<'a> {
    sheet: &'a mut Sheet,
    row: usize,
    col: usize,
}

impl CellMut<'_> {
    pub fn position(&self) -> CellRef {
        CellRef::new(self.row, self.col)
    }

    pub fn cell(&self) -> &Cell {
        &self.sheet.rows[self.row].cells[self.col]
    }

    fn target(&self) -> CellRef {
        self.cell().logical_cell()
    }

    pub fn set(&mut self, value: impl Into<CellValue>) -> &mut Self {
        let t = self.target();
        self.sheet.store_value(t.row, t.col, value.into());
        self
    }

    /// Set a formula; a leading `=` is optional.
    pub fn set_formula(&mut self, expr: &str) -> &mut Self {
        self.set(CellValue::formula(expr))
    }

    pub fn set_error(&mut self) -> &mut Self {
        self.set(CellValue::Error)
    }

    pub fn clear(&mut self) -> &mut Self {
        self.set(CellValue::Blank)
    }

    pub fn set_style(&mut self, style: &str) -> &mut Self {
        let t = self.target();
        self.sheet.store_style(t.row, t.col, style);
        self
    }

    pub fn set_hyperlink(&mut self, link: impl Into<String>) -> &mut Self {
        let t = self.target();
        self.sheet.rows[t.row].cells[t.col].hyperlink = Some(link.into());
        self
    }

    pub fn clear_hyperlink(&mut self) -> &mut Self {
        let t = self.target();
        self.sheet.rows[t.row].cells[t.col].hyperlink = None;
        self
    }

    /// Copy value, style and hyperlink from `other`.
    pub fn copy_from(&mut self, other: &Cell) -> &mut Self {
        self.set(other.value().clone());
        self.set_style(other.style_name());
        match other.hyperlink() {
            Some(link) => self.set_hyperlink(link),
            None => self.clear_hyperlink(),
        }
    }

    /// Merge this cell with the `span_x` columns and `span_y` rows it starts.
    /// A 1x1 merge does nothing.
    pub fn merge(&mut self, span_x: usize, span_y: usize) -> Result<()> {
        if span_x < 1 || span_y < 1 {
            return Err(MejaError::InvalidSpan { span_x, span_y });
        }
        if span_x == 1 && span_y == 1 {
            return Ok(());
        }
        if self.cell().is_merged() {
            return Err(MejaError::AlreadyMerged(self.position()));
        }
        let region = RectangularRegion::spanning(self.position(), span_x, span_y)?;
        self.sheet.add_merged_region(region)
    }

    /// Dissolve the merge this cell starts. Unmerged cells are left alone.
    pub fn unmerge(&mut self) -> Result<()> {
        if !self.cell().is_merged() {
            return Ok(());
        }
        if self.cell().is_covered() {
            return Err(MejaError::NotTopLeft(self.position()));
        }
        self.sheet.remove_merged_region(self.position()).map(|_| ())
    }
}
