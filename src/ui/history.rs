//! History view rendering.
//!
//! One row per host with a timeline bar: a `▮` per status event, green for
//! online and red for offline, oldest on the left. When a host has more
//! events than fit, the most recent ones are shown.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Control, HistoryField, InputMode};
use crate::data::{Segment, Timeline, NO_MATCHING_HOSTS_PLACEHOLDER};
use crate::ui::Theme;

/// Timeline marker character.
const MARKER: &str = "▮";

const IP_WIDTH: u16 = 16;
const HOSTNAME_WIDTH: u16 = 20;

/// Render the history view: filter bar, timelines, selected host detail.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Filters
        Constraint::Min(3),    // Timelines
        Constraint::Length(1), // Selected host detail
    ])
    .split(area);

    render_filter_bar(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
    render_detail(frame, app, chunks[2]);
}

fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let editing = match app.input {
        InputMode::HistoryFilter(field) => Some(field),
        _ => None,
    };

    let mut spans = vec![Span::raw(" ")];
    for field in HistoryField::ALL {
        let value = app.history_filter(field);
        let active = editing == Some(field);
        let label_style = if active {
            app.theme.selected_column
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        spans.push(Span::styled(format!("{}:", field.label()), label_style));
        let shown = if active {
            format!("{}_", value)
        } else if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        };
        spans.push(Span::raw(format!(" {}  ", shown)));
    }

    let range = app.history.range();
    if range.start.is_none() && !app.history.filters.start.trim().is_empty() {
        spans.push(Span::styled("(From not understood) ", Style::default().fg(app.theme.error)));
    }
    if range.end.is_none() && !app.history.filters.end.trim().is_empty() {
        spans.push(Span::styled("(To not understood) ", Style::default().fg(app.theme.error)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.history.rows();

    let freshness = app
        .history
        .freshness
        .map(|f| format!(" {} ", f.describe()))
        .unwrap_or_default();
    let position = if rows.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", app.history.selected.min(rows.len() - 1) + 1, rows.len())
    };
    let title = format!(
        " History ({}/{}){} ",
        rows.len(),
        app.history.snapshot.len(),
        position
    );

    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(freshness).right_aligned())
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if let Some(ref err) = app.history.error {
        let paragraph = Paragraph::new(err.as_str())
            .style(Style::default().fg(app.theme.error))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    if rows.is_empty() {
        let paragraph = Paragraph::new(NO_MATCHING_HOSTS_PLACEHOLDER)
            .style(app.theme.muted)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // Borders, highlight symbol and two column gaps.
    let bar_width = area
        .width
        .saturating_sub(2 + 2 + IP_WIDTH + HOSTNAME_WIDTH + 2)
        .max(1) as usize;

    let header = Row::new(vec![
        Cell::from("IP"),
        Cell::from("Hostname"),
        Cell::from("Timeline"),
    ])
    .style(app.theme.header)
    .height(1);

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            let deleting = app.is_pending(&Control::DeleteHistory { ip: row.ip.clone() });
            let ip_style = if deleting { app.theme.muted } else { Style::default() };
            Row::new(vec![
                Cell::from(row.ip.clone()).style(ip_style),
                Cell::from(row.hostname.clone()),
                Cell::from(timeline_line(&row.timeline, bar_width, &app.theme)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(IP_WIDTH),
        Constraint::Length(HOSTNAME_WIDTH),
        Constraint::Fill(1),
    ];

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.history.selected.min(rows.len() - 1)));

    frame.render_stateful_widget(table, area, &mut state);
}

/// The bar for one host, keeping the newest `width` segments.
pub fn timeline_line(timeline: &Timeline, width: usize, theme: &Theme) -> Line<'static> {
    match timeline {
        Timeline::Empty => Line::from(Span::styled(
            timeline.placeholder().unwrap_or_default(),
            theme.muted,
        )),
        Timeline::Segments(segments) => {
            let skip = segments.len().saturating_sub(width);
            Line::from(
                segments[skip..]
                    .iter()
                    .map(|s| Span::styled(MARKER, theme.status_style(s.online)))
                    .collect::<Vec<_>>(),
            )
        }
    }
}

/// Tooltip-style detail for the selected host: its latest event in range.
fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.history.rows();
    let Some(row) = rows.get(app.history.selected) else {
        return;
    };

    let line = match row.timeline.segments().last() {
        Some(Segment {
            online, tooltip, ..
        }) => Line::from(vec![
            Span::raw(format!(" {} ", row.ip)),
            Span::styled(format!("{} ", MARKER), app.theme.status_style(*online)),
            Span::raw(tooltip.clone()),
            Span::styled(
                format!("  ({} events in range)", row.timeline.segments().len()),
                app.theme.muted,
            ),
        ]),
        None => Line::from(Span::styled(format!(" {} no events in range", row.ip), app.theme.muted)),
    };

    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn seg(online: bool, secs: i64) -> Segment {
        Segment {
            online,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            tooltip: String::new(),
        }
    }

    #[test]
    fn test_timeline_line_keeps_newest() {
        let timeline = Timeline::Segments(vec![seg(true, 1), seg(false, 2), seg(true, 3)]);
        let line = timeline_line(&timeline, 2, &Theme::dark());
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].style, Theme::dark().status_style(false));
    }

    #[test]
    fn test_timeline_line_placeholder() {
        let line = timeline_line(&Timeline::Empty, 10, &Theme::dark());
        assert_eq!(line.spans[0].content, "No events in selected range.");
    }
}
