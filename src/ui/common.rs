//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, help overlay
//! and the confirmation dialog.

use std::time::Instant;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, InputMode, View};
use crate::data::duration::format_duration;

/// Render the header bar.
///
/// Displays: backend, host counts, whether a fetch is running.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let online = app.hosts.records.iter().filter(|h| h.is_online()).count();
    let known = app.hosts.records.iter().filter(|h| h.is_known()).count();
    let total = app.hosts.records.len();

    let (icon, icon_style) = if app.hosts.error.is_some() || app.history.error.is_some() {
        ("●", Style::default().fg(app.theme.error))
    } else if app.is_fetching() {
        ("◌", Style::default().fg(app.theme.pending))
    } else {
        ("●", Style::default().fg(app.theme.online))
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", icon), icon_style),
        Span::styled("SCANWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.source_description().to_string()),
        Span::raw(" │ "),
        Span::styled(format!("{}", total), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" hosts "),
        Span::styled(format!("{}", online), Style::default().fg(app.theme.online)),
        Span::raw(" online "),
        Span::styled(format!("{}", known), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" known │ "),
        Span::raw(format!("{} with history", app.history.snapshot.len())),
    ];
    if app.is_fetching() {
        spans.push(Span::styled(" │ Loading...", Style::default().fg(app.theme.pending)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![Line::from(" 1:Hosts "), Line::from(" 2:History ")];

    let selected = match app.current_view {
        View::Hosts => 0,
        View::History => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Short label for the current view's auto-refresh.
fn refresh_label(app: &App) -> String {
    let scheduler = app.scheduler();
    if app.input == InputMode::Interval {
        format!("every {}_s", app.interval_input())
    } else if let Some(next) = scheduler.time_until_next(Instant::now()) {
        format!(
            "auto {}s, next in {}",
            app.interval_input(),
            format_duration(next)
        )
    } else {
        format!("auto off ({}s)", app.interval_input())
    }
}

/// Render the status bar at the bottom.
///
/// Shows: refresh state, available controls. Temporary messages (action
/// results and errors) take the whole bar while they last.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.input {
        InputMode::HostFilter => "Type to filter column | ←/→:column Enter:apply Esc:done",
        InputMode::HistoryFilter(_) => "Type to filter | Tab:next field Enter:apply Esc:done",
        InputMode::Interval => "Seconds | Enter:apply Esc:cancel",
        InputMode::Edit => "Editing | Enter:save Esc:cancel",
        InputMode::Normal => match app.current_view {
            View::Hosts => "/:filter Enter:edit K:known d:delete v:columns a:auto ?:help q:quit",
            View::History => "/:filter d:delete D:delete all a:auto e:export ?:help q:quit",
        },
    };

    let status = format!(" {} | {} | {}", app.current_view.label(), refresh_label(app), controls);
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Centered rectangle of at most `width` x `height` inside `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab 1/2     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  ←/→ h/l     Select column (Hosts)"),
        Line::from(""),
        section(" Hosts"),
        Line::from("  /           Filter selected column"),
        Line::from("  Enter       Edit Hostname/Note"),
        Line::from("  K           Toggle known"),
        Line::from("  d           Delete host"),
        Line::from("  +/-         Resize column"),
        Line::from("  v           Show/hide columns"),
        Line::from("  R           Reset columns"),
        Line::from(""),
        section(" History"),
        Line::from("  /           Filter (Tab: next field)"),
        Line::from("  d           Delete host history"),
        Line::from("  D           Delete all history"),
        Line::from("  e           Export to JSON"),
        Line::from(""),
        section(" General"),
        Line::from("  c           Clear filters"),
        Line::from("  a           Toggle auto-refresh"),
        Line::from("  i           Set refresh interval"),
        Line::from("  r           Reload now"),
        Line::from("  t           Toggle theme"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let help_height = help_text.len() as u16 + 2;
    let help_area = centered(area, 44, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(Paragraph::new(help_text).block(block), help_area);
}

/// Render the yes/no dialog for a pending destructive action.
pub fn render_confirm(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref confirm) = app.confirm else {
        return;
    };

    let text = vec![
        Line::from(confirm.prompt()),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(app.theme.error).add_modifier(Modifier::BOLD)),
            Span::raw(": yes   "),
            Span::styled("n/Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(": no"),
        ]),
    ];

    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.error));

    let dialog = centered(area, 60, 7);
    frame.render_widget(Clear, dialog);
    frame.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: true }).block(block),
        dialog,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 80, 24);
        let r = centered(area, 40, 10);
        assert_eq!(r, Rect::new(20, 7, 40, 10));

        let small = Rect::new(0, 0, 20, 6);
        let r = centered(small, 40, 10);
        assert!(r.width <= 16 && r.height <= 4);
    }
}
