//! UI rendering

use super::app::{App, Mode};
use meja_core::model::style::HAlign;
use meja_core::view::{Quadrant, Segment, SheetLayout, quadrants};
use meja_core::{CellRef, CellType};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::ops::Range;

pub(crate) const FORMULA_BAR_HEIGHT: u16 = 3;
pub(crate) const GRID_MIN_HEIGHT: u16 = 5;
pub(crate) const STATUS_BAR_HEIGHT: u16 = 1;
pub(crate) const ROW_HEADER_WIDTH: u16 = 5;
pub(crate) const GRID_COLUMN_SPACING: u16 = 1;

/// Points of column width shown per terminal column.
const POINTS_PER_CHAR: f32 = 8.0;
const MIN_COLUMN_CHARS: u16 = 3;
const MAX_COLUMN_CHARS: u16 = 60;

pub(crate) fn split_main_chunks(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(FORMULA_BAR_HEIGHT),
            Constraint::Min(GRID_MIN_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Terminal columns for `col`, with the viewer `scale` applied to the layout.
pub(crate) fn column_chars(layout: &SheetLayout, col: usize, scale: f32) -> u16 {
    ((layout.column_width(col) * scale / POINTS_PER_CHAR).round() as u16)
        .clamp(MIN_COLUMN_CHARS, MAX_COLUMN_CHARS)
}

/// How many columns fit in `available` terminal columns, frozen ones first.
pub(crate) fn fitting_columns(
    layout: &SheetLayout,
    split_col: usize,
    viewport_col: usize,
    available: u16,
    scale: f32,
) -> usize {
    let mut used: u32 = 0;
    let mut count = 0;
    for col in (0..split_col).chain(viewport_col.max(split_col)..) {
        let width = u32::from(column_chars(layout, col, scale) + GRID_COLUMN_SPACING);
        if count > 0 && used + width > u32::from(available) {
            break;
        }
        used += width;
        count += 1;
    }
    count
}

/// Indices along one axis: the frozen segment, then the scrolling one.
fn axis_indices(
    segments: &[Segment],
    leading: [Quadrant; 2],
    trailing: [Quadrant; 2],
    range: impl Fn(&Segment) -> Range<usize>,
) -> Vec<usize> {
    let pick = |wanted: [Quadrant; 2]| {
        segments
            .iter()
            .find(|s| wanted.contains(&s.quadrant))
            .map(&range)
            .unwrap_or(0..0)
    };
    pick(leading).chain(pick(trailing)).collect()
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = split_main_chunks(f.area());

    let grid_area = chunks[1];
    let layout = SheetLayout::new(&app.sheet.read());
    let split_col = app.sheet.read().split_column();
    let available_width = grid_area.width.saturating_sub(ROW_HEADER_WIDTH + 2);
    app.visible_rows = (grid_area.height.saturating_sub(3) as usize).max(1);
    app.visible_cols =
        fitting_columns(&layout, split_col, app.viewport_col, available_width, app.view_scale).max(1);
    app.update_viewport();

    draw_formula_bar(f, app, chunks[0]);
    draw_grid(f, app, &layout, grid_area);
    draw_status_bar(f, app, chunks[2]);
}

fn with_cursor(prefix: &str, buffer: &str, cursor: usize) -> String {
    let (before, after) = buffer.split_at(cursor.min(buffer.len()));
    format!("{prefix}{before}│{after}")
}

fn draw_formula_bar(f: &mut Frame, app: &App, area: Rect) {
    let cell_ref = app.current_cell_ref();
    let content = match app.mode {
        Mode::Edit => with_cursor(&format!("{cell_ref}: "), &app.edit_buffer, app.edit_cursor),
        Mode::Search => with_cursor("/", &app.search_buffer, app.search_buffer.len()),
        Mode::Command => with_cursor(":", &app.command_buffer, app.command_buffer.len()),
        Mode::Normal => {
            let sheet = app.sheet.read();
            match sheet.logical_cell(cell_ref.row, cell_ref.col) {
                Some(cell) if !cell.is_empty() => {
                    let text = cell
                        .value()
                        .to_input_string()
                        .unwrap_or_else(|| cell.display(&sheet.display_context()));
                    format!("{cell_ref}: {text}")
                }
                _ => format!("{cell_ref}: (empty)"),
            }
        }
    };

    let title = match app.mode {
        Mode::Edit => " Edit ",
        Mode::Search => " Search ",
        Mode::Command => " Command ",
        Mode::Normal => " Cell ",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(match app.mode {
            Mode::Edit => Color::Yellow,
            Mode::Search => Color::Magenta,
            Mode::Command => Color::Cyan,
            Mode::Normal => Color::White,
        }));

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn header_style(active: bool, frozen: bool) -> Style {
    if active {
        Style::default()
            .fg(Color::Black)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else if frozen {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_grid(f: &mut Frame, app: &App, layout: &SheetLayout, area: Rect) {
    let sheet = app.sheet.read();
    let ctx = sheet.display_context();
    let (split_row, split_col) = sheet.split();
    let segments = quadrants(
        (split_row, split_col),
        (app.viewport_row, app.viewport_col),
        (app.visible_rows, app.visible_cols),
    );
    let rows = axis_indices(
        &segments,
        [Quadrant::TopLeft, Quadrant::TopRight],
        [Quadrant::BottomLeft, Quadrant::BottomRight],
        |s| s.rows.clone(),
    );
    let cols = axis_indices(
        &segments,
        [Quadrant::TopLeft, Quadrant::BottomLeft],
        [Quadrant::TopRight, Quadrant::BottomRight],
        |s| s.columns.clone(),
    );

    let cursor = app.current_cell_ref();
    let cursor_region = sheet.merged_region_at(cursor.row, cursor.col).copied();
    let under_cursor = |row: usize, col: usize| match &cursor_region {
        Some(region) => region.contains(row, col),
        None => CellRef::new(row, col) == cursor,
    };

    let mut header_cells = vec![Cell::from(" ")];
    for &col in &cols {
        let style = header_style(col == cursor.col, col < split_col);
        header_cells.push(Cell::from(meja_core::model::column_name(col)).style(style));
    }
    let header = Row::new(header_cells).height(1);

    let mut table_rows = Vec::with_capacity(rows.len());
    for &row in &rows {
        let mut cells = Vec::with_capacity(cols.len() + 1);
        cells.push(
            Cell::from(format!("{}", row + 1)).style(header_style(row == cursor.row, row < split_row)),
        );
        for &col in &cols {
            let (text, cell_type) = match sheet.cell(row, col) {
                Some(cell) if !cell.is_covered() => (cell.display(&ctx), cell.cell_type()),
                _ => (String::new(), CellType::Blank),
            };
            let alignment = match sheet.cell_style(row, col).effective_h_align(cell_type) {
                HAlign::Right => Alignment::Right,
                HAlign::Center => Alignment::Center,
                _ => Alignment::Left,
            };
            let style = if under_cursor(row, col) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if cell_type == CellType::Error {
                Style::default().fg(Color::Red)
            } else if cell_type == CellType::Formula {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            cells.push(Cell::from(Line::from(text).alignment(alignment)).style(style));
        }
        table_rows.push(Row::new(cells));
    }

    let mut widths = vec![Constraint::Length(ROW_HEADER_WIDTH)];
    widths.extend(
        cols.iter()
            .map(|&col| Constraint::Length(column_chars(layout, col, app.view_scale))),
    );

    let title = format!(" {} ", sheet.name());
    let table = Table::new(table_rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(GRID_COLUMN_SPACING);

    f.render_widget(table, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let mode = match app.mode {
        Mode::Normal => "NORMAL",
        Mode::Edit => "EDIT",
        Mode::Search => "SEARCH",
        Mode::Command => "COMMAND",
    };
    let message = app.status_message.clone().unwrap_or_else(|| {
        "Enter:edit /:search n:next f:freeze +/-:zoom Tab:sheet :w save q:quit".to_string()
    });

    let (index, count) = app.sheet_position();
    let zoom = app.display_zoom();
    let split = app.sheet.read().split();
    let mut info = format!("sheet {index}/{count}  zoom {:.0}%", zoom * 100.0);
    if split != (0, 0) {
        info.push_str(&format!("  frozen {}", CellRef::new(split.0, split.1)));
    }
    if app.is_modified() {
        info.push_str("  [+]");
    }

    let used = mode.len() + info.len() + 4;
    let padding = (area.width as usize).saturating_sub(used + message.chars().count());
    let line = Line::from(vec![
        Span::styled(
            format!(" {mode} "),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::raw(message),
        Span::raw(" ".repeat(padding)),
        Span::styled(info, Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use meja_core::Sheet;

    #[test]
    fn test_column_chars_follow_zoom() {
        let mut sheet = Sheet::new("S");
        sheet.set(0, 2, "x").unwrap();
        sheet.set_column_width(1, 16.0).unwrap();
        let layout = SheetLayout::new(&sheet);
        assert_eq!(column_chars(&layout, 0, 1.0), 10);
        assert_eq!(column_chars(&layout, 1, 1.0), MIN_COLUMN_CHARS);
        assert_eq!(column_chars(&layout, 0, 1.5), 15);

        sheet.set_zoom(2.0).unwrap();
        let zoomed = SheetLayout::new(&sheet);
        assert_eq!(column_chars(&zoomed, 0, 1.0), 20);
    }

    #[test]
    fn test_fitting_columns_counts_frozen_first() {
        let sheet = Sheet::new("S");
        let layout = SheetLayout::new(&sheet);
        // each default column takes 10 + 1
        assert_eq!(fitting_columns(&layout, 0, 0, 33, 1.0), 3);
        assert_eq!(fitting_columns(&layout, 2, 5, 33, 1.0), 3);
        assert_eq!(fitting_columns(&layout, 0, 0, 2, 1.0), 1);
        // doubled: 20 + 1 each
        assert_eq!(fitting_columns(&layout, 0, 0, 33, 2.0), 1);
    }

    #[test]
    fn test_axis_indices_put_frozen_first() {
        let segments = quadrants((1, 1), (5, 3), (4, 3));
        let rows = axis_indices(
            &segments,
            [Quadrant::TopLeft, Quadrant::TopRight],
            [Quadrant::BottomLeft, Quadrant::BottomRight],
            |s| s.rows.clone(),
        );
        assert_eq!(rows, [0, 5, 6, 7]);
        let cols = axis_indices(
            &segments,
            [Quadrant::TopLeft, Quadrant::BottomLeft],
            [Quadrant::TopRight, Quadrant::BottomRight],
            |s| s.columns.clone(),
        );
        assert_eq!(cols, [0, 3, 4]);
    }
}
