use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, InputMode, View};
use crate::ui::TABLE_BODY_TOP;

/// Where `e` writes the filtered history.
pub const EXPORT_FILE: &str = "scanwatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.confirm.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.confirm_yes();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm_no(),
            _ => {}
        }
        return;
    }

    if app.hosts.column_menu.is_some() {
        handle_column_menu(app, key);
        return;
    }

    match app.input {
        InputMode::Normal => handle_normal(app, key),
        InputMode::HostFilter | InputMode::HistoryFilter(_) => handle_filter_input(app, key),
        InputMode::Interval => handle_interval_input(app, key),
        InputMode::Edit => handle_edit_input(app, key),
    }
}

fn handle_normal(app: &mut App, key: KeyEvent) {
    let now = Instant::now();
    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Hosts),
        KeyCode::Char('2') => app.set_view(View::History),

        // Navigation (left/right moves the column cursor on the host table)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => match app.current_view {
            View::Hosts => app.select_prev_column(),
            View::History => app.prev_view(),
        },
        KeyCode::Right | KeyCode::Char('l') => match app.current_view {
            View::Hosts => app.select_next_column(),
            View::History => app.next_view(),
        },
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Reload
        KeyCode::Char('r') => app.refresh(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Filters
        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Char('c') => app.clear_filter(),

        // Auto-refresh
        KeyCode::Char('a') => app.toggle_auto_refresh(now),
        KeyCode::Char('i') => app.start_interval_input(),

        KeyCode::Char('t') => app.toggle_theme(),

        // Host actions
        KeyCode::Enter if app.current_view == View::Hosts => {
            app.start_edit();
        }
        KeyCode::Char('K') if app.current_view == View::Hosts => {
            app.toggle_known();
        }
        KeyCode::Char('d') => match app.current_view {
            View::Hosts => app.request_delete_host(),
            View::History => app.request_delete_history(),
        },
        KeyCode::Char('D') if app.current_view == View::History => {
            app.request_delete_all_history()
        }

        // Columns
        KeyCode::Char('+') | KeyCode::Char('=') if app.current_view == View::Hosts => {
            app.resize_selected_column(1)
        }
        KeyCode::Char('-') if app.current_view == View::Hosts => app.resize_selected_column(-1),
        KeyCode::Char('v') if app.current_view == View::Hosts => app.open_column_menu(),
        KeyCode::Char('R') if app.current_view == View::Hosts => app.reset_columns(),

        // Export
        KeyCode::Char('e') if app.current_view == View::History => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_history(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while a filter is being typed
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Filters apply as you type; Enter and Esc just stop typing
        KeyCode::Enter | KeyCode::Esc => app.cancel_filter(),

        // Clear and exit
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_filter();
        }

        KeyCode::Tab => app.next_filter_field(),
        KeyCode::Left if app.input == InputMode::HostFilter => app.select_prev_column(),
        KeyCode::Right if app.input == InputMode::HostFilter => app.select_next_column(),

        KeyCode::Backspace => app.filter_pop(),
        KeyCode::Char(c) => app.filter_push(c),

        _ => {}
    }
}

fn handle_interval_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.commit_interval_input(Instant::now());
        }
        KeyCode::Esc => app.cancel_interval_input(),
        KeyCode::Backspace => app.interval_pop(),
        KeyCode::Char(c) => app.interval_push(c),
        _ => {}
    }
}

fn handle_edit_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.commit_edit();
        }
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Backspace => app.edit_pop(),
        KeyCode::Char(c) => app.edit_push(c),
        _ => {}
    }
}

fn handle_column_menu(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.column_menu_step(-1),
        KeyCode::Down | KeyCode::Char('j') => app.column_menu_step(1),
        KeyCode::Char(' ') | KeyCode::Enter => app.column_menu_toggle(),
        KeyCode::Esc | KeyCode::Char('v') | KeyCode::Char('q') => app.close_column_menu(),
        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.show_help || app.confirm.is_some() || app.input != InputMode::Normal {
        return;
    }

    match mouse.kind {
        // Scroll wheel
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        // Click to select
        MouseEventKind::Down(MouseButton::Left) => {
            let clicked_row = mouse.row;

            // Tab bar is row 1, after the header: " 1:Hosts " then "|" then " 2:History "
            if clicked_row == 1 {
                if mouse.column < 9 {
                    app.set_view(View::Hosts);
                } else if mouse.column < 21 {
                    app.set_view(View::History);
                }
                return;
            }

            // The history view has its filter bar above the table
            let body_top = match app.current_view {
                View::Hosts => TABLE_BODY_TOP,
                View::History => TABLE_BODY_TOP + 1,
            };
            if clicked_row >= body_top {
                app.select_row((clicked_row - body_top) as usize);
            }
        }

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{Preferences, ThemeName};
    use crate::source::{ChannelBackend, ChannelHandle, HostRecord, Request, Response};

    fn app() -> (ChannelHandle, App) {
        let (handle, backend) = ChannelBackend::create("test");
        let app = App::new(Box::new(backend), Preferences::in_memory(), ThemeName::Dark);
        (handle, app)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn with_hosts(handle: &mut ChannelHandle, app: &mut App, ips: &[&str]) {
        app.refresh_hosts();
        let (id, req) = handle.next_request().unwrap();
        let hosts = ips
            .iter()
            .map(|ip| HostRecord {
                ip_address: ip.to_string(),
                ..Default::default()
            })
            .collect();
        handle.respond(id, req, Ok(Response::Hosts(hosts)));
        app.drain_completions();
    }

    #[test]
    fn test_quit_and_view_keys() {
        let (_handle, mut app) = app();
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.current_view, View::History);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_view, View::Hosts);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let (_handle, mut app) = app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn test_filter_typing_goes_to_filter() {
        let (mut handle, mut app) = app();
        with_hosts(&mut handle, &mut app, &["10.0.0.1", "10.0.0.2"]);

        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "q.2");
        assert!(app.running);
        assert_eq!(app.filter_text(), Some("q.2"));
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, ".2");
        assert_eq!(app.hosts.visible().len(), 1);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input, InputMode::Normal);
        assert_eq!(app.hosts.visible().len(), 1);
    }

    #[test]
    fn test_history_filter_tab_moves_field() {
        let (_handle, mut app) = app();
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "10.0");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "nas");
        assert_eq!(app.history.filters.ip, "10.0");
        assert_eq!(app.history.filters.hostname, "nas");
    }

    #[test]
    fn test_interval_input_clamps_on_enter() {
        let (_handle, mut app) = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "2x");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.interval_input(), "5");
        assert_eq!(app.scheduler().interval_secs(), 5);
    }

    #[test]
    fn test_interval_escape_restores_value() {
        let (_handle, mut app) = app();
        press(&mut app, KeyCode::Char('i'));
        type_str(&mut app, "99");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.interval_input(), "10");
        assert_eq!(app.input, InputMode::Normal);
    }

    #[test]
    fn test_delete_needs_y() {
        let (mut handle, mut app) = app();
        with_hosts(&mut handle, &mut app, &["10.0.0.1"]);

        press(&mut app, KeyCode::Char('d'));
        assert!(app.confirm.is_some());
        // Other keys are ignored while the dialog is open.
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        assert!(handle.next_request().is_none());

        press(&mut app, KeyCode::Char('y'));
        assert_eq!(
            handle.next_request().map(|(_, r)| r),
            Some(Request::DeleteHost {
                ip: "10.0.0.1".into()
            })
        );
    }

    #[test]
    fn test_column_menu_keys() {
        let (_handle, mut app) = app();
        press(&mut app, KeyCode::Char('v'));
        assert_eq!(app.hosts.column_menu, Some(0));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char(' '));
        assert!(!app.hosts.layout.is_visible(crate::data::HostColumn::Mac));
        press(&mut app, KeyCode::Esc);
        assert!(app.hosts.column_menu.is_none());
    }

    #[test]
    fn test_mouse_click_selects_row() {
        let (mut handle, mut app) = app();
        with_hosts(&mut handle, &mut app, &["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

        let click = |row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click(TABLE_BODY_TOP + 2));
        assert_eq!(app.hosts.selected, 2);
        handle_mouse_event(&mut app, click(TABLE_BODY_TOP + 9));
        assert_eq!(app.hosts.selected, 2);
        handle_mouse_event(&mut app, click(1));
        assert_eq!(app.current_view, View::Hosts);
        let tab = MouseEvent {
            column: 12,
            ..click(1)
        };
        handle_mouse_event(&mut app, tab);
        assert_eq!(app.current_view, View::History);
    }
}
