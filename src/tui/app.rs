//! Viewer state and the operations bound to keys.

use anyhow::Result;
use meja_core::event::SheetEvent;
use meja_core::format::{DatePattern, format_number};
use meja_core::io::{CsvOptions, parse_cell_value};
use meja_core::model::{ERROR_TEXT, MAX_COLUMN_NUMBER};
use meja_core::{CellRef, CellValue, SearchOptions, SearchSettings, SheetHandle, SubscriptionId, Workbook};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::config::MejaConfig;
use crate::convert;

const ZOOM_STEP: f32 = 0.25;
const MIN_ZOOM: f32 = 0.25;
const MAX_ZOOM: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Edit,
    Search,
    Command,
}

pub struct App {
    pub workbook: Workbook,
    /// The sheet on screen; always the workbook's current sheet.
    pub sheet: SheetHandle,
    pub path: PathBuf,
    pub config: MejaConfig,
    pub mode: Mode,
    pub cursor_row: usize,
    pub cursor_col: usize,
    /// First row and column of the scrolling area (at or past the split).
    pub viewport_row: usize,
    pub viewport_col: usize,
    pub visible_rows: usize,
    pub visible_cols: usize,
    pub edit_buffer: String,
    /// Byte offset into `edit_buffer`.
    pub edit_cursor: usize,
    pub search_buffer: String,
    pub last_search: Option<String>,
    pub command_buffer: String,
    pub status_message: Option<String>,
    pub should_quit: bool,
    /// Viewer scale on top of the sheet's own zoom; never stored in the sheet.
    pub view_scale: f32,
    modified: Arc<AtomicBool>,
    subscription: Option<(SheetHandle, SubscriptionId)>,
}

impl App {
    pub fn open(path: &Path, config: MejaConfig) -> Result<App> {
        let workbook = convert::open(path, &config)?;
        Ok(App::new(workbook, path.to_path_buf(), config))
    }

    /// `workbook` must contain at least one sheet.
    pub fn new(mut workbook: Workbook, path: PathBuf, config: MejaConfig) -> App {
        if workbook.sheet_count() == 0
            && let Err(e) = workbook.create_sheet("Sheet1")
        {
            warn!(error = %e, "could not create a sheet");
        }
        let sheet = match workbook.current_sheet() {
            Some(handle) => handle.clone(),
            None => SheetHandle::new(meja_core::Sheet::new("Sheet1")),
        };
        let view_scale = config.default_zoom;
        let mut app = App {
            workbook,
            sheet,
            path,
            config,
            mode: Mode::Normal,
            cursor_row: 0,
            cursor_col: 0,
            viewport_row: 0,
            viewport_col: 0,
            visible_rows: 20,
            visible_cols: 8,
            edit_buffer: String::new(),
            edit_cursor: 0,
            search_buffer: String::new(),
            last_search: None,
            command_buffer: String::new(),
            status_message: None,
            should_quit: false,
            view_scale,
            modified: Arc::new(AtomicBool::new(false)),
            subscription: None,
        };
        app.show_current_sheet();
        app
    }

    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::Relaxed)
    }

    /// Zoom shown on screen: the sheet's zoom times the viewer scale.
    pub fn display_zoom(&self) -> f32 {
        self.sheet.read().zoom() * self.view_scale
    }

    pub fn current_cell_ref(&self) -> CellRef {
        CellRef::new(self.cursor_row, self.cursor_col)
    }

    pub fn sheet_position(&self) -> (usize, usize) {
        (
            self.workbook.current_sheet_index().unwrap_or(0) + 1,
            self.workbook.sheet_count(),
        )
    }

    /// Restore the cursor of the current sheet and watch it for edits.
    fn show_current_sheet(&mut self) {
        if let Some((handle, id)) = self.subscription.take() {
            handle.unsubscribe(id);
        }
        let flag = Arc::clone(&self.modified);
        let id = self.sheet.subscribe(move |event: &SheetEvent| {
            if !matches!(event, SheetEvent::ActiveCellChanged { .. }) {
                flag.store(true, Ordering::Relaxed);
            }
        });
        self.subscription = Some((self.sheet.clone(), id));

        let current = self.sheet.read().current_cell().unwrap_or(CellRef::new(0, 0));
        let (split_row, split_col) = self.sheet.read().split();
        self.viewport_row = split_row;
        self.viewport_col = split_col;
        self.set_cursor(current.row, current.col);
    }

    /// Place the cursor on the logical cell of (row, col).
    pub fn set_cursor(&mut self, row: usize, col: usize) {
        let pos = {
            let mut sheet = self.sheet.write();
            sheet.set_current_cell(row, col);
            sheet.current_cell().unwrap_or(CellRef::new(row, col))
        };
        self.cursor_row = pos.row;
        self.cursor_col = pos.col;
        self.update_viewport();
    }

    /// Move by (dx, dy). Moves start at the edge of a merged region so the
    /// cursor leaves it in one step.
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let (row, col) = {
            let sheet = self.sheet.read();
            let (r, c) = (self.cursor_row, self.cursor_col);
            let (first_row, first_col, last_row, last_col) = match sheet.merged_region_at(r, c) {
                Some(region) => (
                    region.first_row,
                    region.first_column,
                    region.last_row,
                    region.last_column,
                ),
                None => (r, c, r, c),
            };
            let step = |first: usize, last: usize, current: usize, delta: i32| match delta {
                d if d > 0 => last.saturating_add(d as usize),
                d if d < 0 => first.saturating_sub(d.unsigned_abs() as usize),
                _ => current,
            };
            (
                step(first_row, last_row, r, dy),
                step(first_col, last_col, c, dx).min(MAX_COLUMN_NUMBER),
            )
        };
        self.set_cursor(row, col);
    }

    /// Keep the cursor inside the scrolling area unless it sits in the
    /// frozen rows or columns.
    pub fn update_viewport(&mut self) {
        let (split_row, split_col) = self.sheet.read().split();
        let scroll_rows = self.visible_rows.saturating_sub(split_row).max(1);
        let scroll_cols = self.visible_cols.saturating_sub(split_col).max(1);
        self.viewport_row = self.viewport_row.max(split_row);
        self.viewport_col = self.viewport_col.max(split_col);

        if self.cursor_col >= split_col {
            if self.cursor_col < self.viewport_col {
                self.viewport_col = self.cursor_col;
            } else if self.cursor_col >= self.viewport_col + scroll_cols {
                self.viewport_col = self.cursor_col + 1 - scroll_cols;
            }
        }
        if self.cursor_row >= split_row {
            if self.cursor_row < self.viewport_row {
                self.viewport_row = self.cursor_row;
            } else if self.cursor_row >= self.viewport_row + scroll_rows {
                self.viewport_row = self.cursor_row + 1 - scroll_rows;
            }
        }
    }

    // ---- editing ----

    pub fn enter_edit_mode(&mut self) {
        self.edit_buffer = {
            let sheet = self.sheet.read();
            sheet
                .logical_cell(self.cursor_row, self.cursor_col)
                .map(|cell| edit_text(cell.value(), &self.config.csv))
                .unwrap_or_default()
        };
        self.edit_cursor = self.edit_buffer.len();
        self.mode = Mode::Edit;
    }

    pub fn commit_edit(&mut self) {
        let value = parse_cell_value(&self.edit_buffer, &self.config.csv);
        let result = self
            .sheet
            .write()
            .set(self.cursor_row, self.cursor_col, value);
        self.mode = Mode::Normal;
        match result {
            Ok(()) => self.move_cursor(0, 1),
            Err(e) => self.status_message = Some(format!("Error: {e}")),
        }
    }

    pub fn cancel(&mut self) {
        self.mode = Mode::Normal;
        self.edit_buffer.clear();
        self.search_buffer.clear();
        self.command_buffer.clear();
    }

    pub fn clear_cell(&mut self) {
        let result = self
            .sheet
            .write()
            .set(self.cursor_row, self.cursor_col, CellValue::Blank);
        if let Err(e) = result {
            self.status_message = Some(format!("Error: {e}"));
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.edit_buffer.insert(self.edit_cursor, c);
        self.edit_cursor += c.len_utf8();
    }

    pub fn delete_char_before_cursor(&mut self) {
        if let Some(c) = self.edit_buffer[..self.edit_cursor].chars().next_back() {
            self.edit_cursor -= c.len_utf8();
            self.edit_buffer.remove(self.edit_cursor);
        }
    }

    pub fn edit_cursor_left(&mut self) {
        if let Some(c) = self.edit_buffer[..self.edit_cursor].chars().next_back() {
            self.edit_cursor -= c.len_utf8();
        }
    }

    pub fn edit_cursor_right(&mut self) {
        if let Some(c) = self.edit_buffer[self.edit_cursor..].chars().next() {
            self.edit_cursor += c.len_utf8();
        }
    }

    // ---- search ----

    pub fn start_search(&mut self) {
        self.search_buffer.clear();
        self.mode = Mode::Search;
    }

    pub fn commit_search(&mut self) {
        self.mode = Mode::Normal;
        let text = std::mem::take(&mut self.search_buffer);
        if !text.is_empty() {
            self.last_search = Some(text);
        }
        self.find_next();
    }

    /// Search after the cursor, wrapping around the sheet.
    pub fn find_next(&mut self) {
        let Some(text) = self.last_search.clone() else {
            self.status_message = Some("No previous search".to_string());
            return;
        };
        let settings = SearchSettings::of(&[
            SearchOptions::IgnoreCase,
            SearchOptions::SearchFromCurrent,
            SearchOptions::UpdateCurrentCellWhenFound,
        ]);
        let found = self.sheet.write().find_and_update(&text, &settings);
        match found {
            Some(pos) => {
                self.set_cursor(pos.row, pos.col);
                self.status_message = Some(format!("Found '{text}' at {pos}"));
            }
            None => self.status_message = Some(format!("No match for '{text}'")),
        }
    }

    // ---- view ----

    /// Freeze rows above and columns left of the cursor, or unfreeze when
    /// already frozen there.
    pub fn toggle_freeze(&mut self) {
        let (row, col) = (self.cursor_row, self.cursor_col);
        let split = {
            let mut sheet = self.sheet.write();
            if sheet.split() == (row, col) {
                sheet.split_at(0, 0);
            } else {
                sheet.split_at(row, col);
            }
            sheet.split()
        };
        self.status_message = Some(if split == (0, 0) {
            "Panes unfrozen".to_string()
        } else {
            format!("Frozen at {}", CellRef::new(split.0, split.1))
        });
        self.update_viewport();
    }

    pub fn zoom_by(&mut self, delta: f32) {
        let mut sheet = self.sheet.write();
        let zoom = (sheet.zoom() + delta * ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        if let Err(e) = sheet.set_zoom(zoom) {
            warn!(error = %e, "zoom rejected");
        }
    }

    pub fn next_sheet(&mut self, forward: bool) {
        let count = self.workbook.sheet_count();
        if count < 2 {
            return;
        }
        let current = self.workbook.current_sheet_index().unwrap_or(0);
        let next = if forward {
            (current + 1) % count
        } else {
            (current + count - 1) % count
        };
        if let Err(e) = self.workbook.set_current_sheet(next) {
            self.status_message = Some(format!("Error: {e}"));
            return;
        }
        if let Some(handle) = self.workbook.current_sheet() {
            self.sheet = handle.clone();
        }
        debug!(sheet = %self.sheet.name(), "switched sheet");
        self.show_current_sheet();
    }

    // ---- commands ----

    pub fn start_command(&mut self) {
        self.command_buffer.clear();
        self.mode = Mode::Command;
    }

    pub fn commit_command(&mut self) {
        self.mode = Mode::Normal;
        let command = std::mem::take(&mut self.command_buffer);
        self.execute_command(command.trim());
    }

    /// `w [path]`, `q`, `q!`, `wq` and `x`.
    pub fn execute_command(&mut self, command: &str) {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (command, None),
        };
        match name {
            "w" => {
                self.save(arg.map(PathBuf::from));
            }
            "wq" | "x" => {
                if self.save(arg.map(PathBuf::from)) {
                    self.should_quit = true;
                }
            }
            "q" => self.quit(false),
            "q!" => self.quit(true),
            "" => {}
            other => self.status_message = Some(format!("Unknown command: {other}")),
        }
    }

    pub fn quit(&mut self, force: bool) {
        if self.is_modified() && !force {
            self.status_message =
                Some("No write since last change (use :q! to discard)".to_string());
        } else {
            self.should_quit = true;
        }
    }

    /// Write the workbook, to `target` when given. Returns whether it worked.
    pub fn save(&mut self, target: Option<PathBuf>) -> bool {
        let path = target.unwrap_or_else(|| self.path.clone());
        match convert::save(&self.workbook, &path, &self.config) {
            Ok(()) => {
                self.modified.store(false, Ordering::Relaxed);
                self.workbook.set_location(Some(path.clone()));
                self.status_message = Some(format!("Written {}", path.display()));
                self.path = path;
                true
            }
            Err(e) => {
                self.status_message = Some(format!("Error: {e:#}"));
                false
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some((handle, id)) = self.subscription.take() {
            handle.unsubscribe(id);
        }
    }
}

/// Text offered for editing. It parses back to the same value.
fn edit_text(value: &CellValue, options: &CsvOptions) -> String {
    let locale = options.locale;
    let date_pattern = || DatePattern::parse(options.date_format.pattern(locale));
    match value {
        CellValue::Blank => String::new(),
        CellValue::Boolean(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
        CellValue::Error => ERROR_TEXT.to_string(),
        CellValue::Formula(expr) => format!("={expr}"),
        CellValue::Number(n) => format_number(*n, locale),
        CellValue::Date(date) => match (date_pattern(), date.and_hms_opt(0, 0, 0)) {
            (Some(pattern), Some(midnight)) => pattern.format(&midnight, locale),
            _ => date.to_string(),
        },
        CellValue::DateTime(dt) => match date_pattern() {
            Some(pattern) => format!("{} {}", pattern.format(dt, locale), dt.format("%H:%M:%S")),
            None => dt.to_string(),
        },
        CellValue::Text(s) => s.clone(),
    }
}
