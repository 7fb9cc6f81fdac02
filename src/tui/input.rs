use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use std::io;

use super::app::{App, Mode};
use super::ui;

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if let Event::Key(key) = event::read()? {
            // Only process key press events (Windows reports Press + Release)
            if key.kind != KeyEventKind::Press {
                continue;
            }
            handle_key(app, key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

pub fn handle_key(app: &mut App, key: KeyEvent) {
    match app.mode {
        Mode::Normal => handle_normal_key(app, key),
        Mode::Edit => handle_edit_key(app, key),
        Mode::Search | Mode::Command => handle_line_key(app, key),
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    app.status_message = None;
    let page = app.visible_rows.max(1) as i32;
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.move_cursor(-1, 0),
        KeyCode::Right | KeyCode::Char('l') => app.move_cursor(1, 0),
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(0, -1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(0, 1),
        KeyCode::PageUp => app.move_cursor(0, -page),
        KeyCode::PageDown => app.move_cursor(0, page),
        KeyCode::Home => app.set_cursor(app.cursor_row, 0),
        KeyCode::Enter | KeyCode::Char('e') | KeyCode::F(2) => app.enter_edit_mode(),
        KeyCode::Delete | KeyCode::Char('x') => app.clear_cell(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('n') => app.find_next(),
        KeyCode::Char('f') => app.toggle_freeze(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_by(1.0),
        KeyCode::Char('-') => app.zoom_by(-1.0),
        KeyCode::Tab => app.next_sheet(true),
        KeyCode::BackTab => app.next_sheet(false),
        KeyCode::Char(':') => app.start_command(),
        KeyCode::Char('q') => app.quit(false),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(false),
        _ => {}
    }
}

fn handle_edit_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel(),
        KeyCode::Enter => app.commit_edit(),
        KeyCode::Backspace => app.delete_char_before_cursor(),
        KeyCode::Left => app.edit_cursor_left(),
        KeyCode::Right => app.edit_cursor_right(),
        KeyCode::Home => app.edit_cursor = 0,
        KeyCode::End => app.edit_cursor = app.edit_buffer.len(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

/// Search and command input: append, backspace, commit or cancel.
fn handle_line_key(app: &mut App, key: KeyEvent) {
    let search = app.mode == Mode::Search;
    match key.code {
        KeyCode::Esc => app.cancel(),
        KeyCode::Enter if search => app.commit_search(),
        KeyCode::Enter => app.commit_command(),
        KeyCode::Backspace => {
            let buffer = if search {
                &mut app.search_buffer
            } else {
                &mut app.command_buffer
            };
            if buffer.pop().is_none() {
                app.cancel();
            }
        }
        KeyCode::Char(c) if search => app.search_buffer.push(c),
        KeyCode::Char(c) => app.command_buffer.push(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MejaConfig;
    use meja_core::{CellRef, CellValue, RectangularRegion, Workbook};
    use std::path::PathBuf;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, press(KeyCode::Char(c)));
        }
    }

    fn app_with(sheets: &[&str], path: PathBuf) -> App {
        let config = MejaConfig::default();
        let mut workbook = Workbook::new(config.locale);
        for name in sheets {
            workbook.create_sheet(name).unwrap();
        }
        App::new(workbook, path, config)
    }

    #[test]
    fn test_edit_commits_parsed_value_and_moves_down() {
        let mut app = app_with(&["S"], PathBuf::from("unused.csv"));
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Edit);
        type_text(&mut app, "42");
        handle_key(&mut app, press(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.current_cell_ref(), CellRef::new(1, 0));
        let sheet = app.sheet.read();
        assert_eq!(sheet.cell(0, 0).unwrap().value(), &CellValue::Number(42.0));
        drop(sheet);
        assert!(app.is_modified());
    }

    #[test]
    fn test_escape_discards_edit() {
        let mut app = app_with(&["S"], PathBuf::from("unused.csv"));
        app.sheet.write().set(0, 0, "keep").unwrap();
        handle_key(&mut app, press(KeyCode::Char('e')));
        assert_eq!(app.edit_buffer, "keep");
        handle_key(&mut app, press(KeyCode::Backspace));
        type_text(&mut app, "ly");
        handle_key(&mut app, press(KeyCode::Esc));

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.sheet.read().display(0, 0), "keep");
    }

    #[test]
    fn test_cursor_snaps_to_merged_region() {
        let mut app = app_with(&["S"], PathBuf::from("unused.csv"));
        app.sheet
            .write()
            .add_merged_region(RectangularRegion::new(0, 1, 1, 2).unwrap())
            .unwrap();

        handle_key(&mut app, press(KeyCode::Right));
        assert_eq!(app.current_cell_ref(), CellRef::new(0, 1));
        handle_key(&mut app, press(KeyCode::Right));
        assert_eq!(app.current_cell_ref(), CellRef::new(0, 3));

        app.set_cursor(1, 2);
        assert_eq!(app.current_cell_ref(), CellRef::new(0, 1));
    }

    #[test]
    fn test_search_and_repeat() {
        let mut app = app_with(&["S"], PathBuf::from("unused.csv"));
        {
            let mut sheet = app.sheet.write();
            sheet.set(1, 0, "Apple").unwrap();
            sheet.set(3, 2, "apple pie").unwrap();
        }
        handle_key(&mut app, press(KeyCode::Char('/')));
        type_text(&mut app, "apple");
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.current_cell_ref(), CellRef::new(1, 0));
        assert_eq!(app.status_message.as_deref(), Some("Found 'apple' at A2"));

        handle_key(&mut app, press(KeyCode::Char('n')));
        assert_eq!(app.current_cell_ref(), CellRef::new(3, 2));

        handle_key(&mut app, press(KeyCode::Char('/')));
        type_text(&mut app, "pear");
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.status_message.as_deref(), Some("No match for 'pear'"));
    }

    #[test]
    fn test_freeze_toggle_and_zoom() {
        let mut app = app_with(&["S"], PathBuf::from("unused.csv"));
        app.set_cursor(2, 1);
        handle_key(&mut app, press(KeyCode::Char('f')));
        assert_eq!(app.sheet.read().split(), (2, 1));
        handle_key(&mut app, press(KeyCode::Char('f')));
        assert_eq!(app.sheet.read().split(), (0, 0));

        handle_key(&mut app, press(KeyCode::Char('+')));
        assert_eq!(app.sheet.read().zoom(), 1.25);
        for _ in 0..10 {
            handle_key(&mut app, press(KeyCode::Char('-')));
        }
        assert_eq!(app.sheet.read().zoom(), 0.25);
    }

    #[test]
    fn test_default_zoom_stays_out_of_the_sheet() {
        let config = MejaConfig {
            default_zoom: 2.0,
            ..MejaConfig::default()
        };
        let mut workbook = Workbook::new(config.locale);
        workbook.create_sheet("S").unwrap();
        let mut app = App::new(workbook, PathBuf::from("unused.csv"), config);

        assert_eq!(app.sheet.read().zoom(), 1.0);
        assert_eq!(app.display_zoom(), 2.0);
        assert!(!app.is_modified());

        handle_key(&mut app, press(KeyCode::Char('+')));
        assert_eq!(app.sheet.read().zoom(), 1.25);
        assert_eq!(app.display_zoom(), 2.5);
    }

    #[test]
    fn test_tab_cycles_sheets() {
        let mut app = app_with(&["One", "Two"], PathBuf::from("unused.csv"));
        assert_eq!(app.sheet_position(), (1, 2));
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.sheet.name(), "Two");
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.sheet.name(), "One");
        handle_key(&mut app, press(KeyCode::BackTab));
        assert_eq!(app.sheet_position(), (2, 2));
    }

    #[test]
    fn test_quit_refuses_unsaved_changes() {
        let mut app = app_with(&["S"], PathBuf::from("unused.csv"));
        app.sheet.write().set(0, 0, 1.5).unwrap();
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert!(app.status_message.as_deref().unwrap().contains(":q!"));

        handle_key(&mut app, press(KeyCode::Char(':')));
        type_text(&mut app, "q!");
        handle_key(&mut app, press(KeyCode::Enter));
        assert!(app.should_quit);
    }

    #[test]
    fn test_write_command_saves_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut app = app_with(&["S"], path.clone());
        app.sheet.write().set(0, 0, "hello").unwrap();
        assert!(app.is_modified());

        handle_key(&mut app, press(KeyCode::Char(':')));
        type_text(&mut app, "w");
        handle_key(&mut app, press(KeyCode::Enter));

        assert!(!app.is_modified());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n\n");
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_unknown_command_reports() {
        let mut app = app_with(&["S"], PathBuf::from("unused.csv"));
        app.execute_command("frobnicate");
        assert_eq!(
            app.status_message.as_deref(),
            Some("Unknown command: frobnicate")
        );
    }
}
