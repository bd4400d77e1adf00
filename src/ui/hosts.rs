//! Host table view rendering.
//!
//! Displays every host that passes the column filters, with the column
//! cursor highlighted in the header, an inline editor for the Hostname and
//! Note columns, and a column picker overlay.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Control, InputMode};
use crate::data::{HostColumn, NO_HOSTS_PLACEHOLDER};
use crate::source::HostRecord;

/// Render the host table.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(title(app))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if let Some(ref err) = app.hosts.error {
        let paragraph = Paragraph::new(err.as_str())
            .style(Style::default().fg(app.theme.error))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let columns = app.hosts.layout.visible_columns();
    let hosts = app.hosts.visible();

    let header = Row::new(columns.iter().map(|c| {
        let style = if *c == app.hosts.selected_column {
            app.theme.selected_column
        } else {
            app.theme.header
        };
        let filter = app.hosts.filters.get(*c);
        let title = if filter.is_empty() {
            c.title().to_string()
        } else {
            format!("{} [{}]", c.title(), filter)
        };
        Cell::from(title).style(style)
    }))
    .height(1);

    let widths: Vec<Constraint> = columns
        .iter()
        .map(|c| Constraint::Length(app.hosts.layout.width(*c)))
        .collect();

    if hosts.is_empty() {
        let inner = block.inner(area);
        let table = Table::new(Vec::<Row>::new(), widths).header(header).block(block);
        frame.render_widget(table, area);

        // Below the header row, so the active filters stay visible.
        if inner.height > 1 {
            let body = Rect::new(inner.x, inner.y + 1, inner.width, inner.height - 1);
            frame.render_widget(Paragraph::new(NO_HOSTS_PLACEHOLDER).style(app.theme.muted), body);
        }
        return;
    }

    let rows: Vec<Row> = hosts
        .iter()
        .enumerate()
        .map(|(i, host)| {
            Row::new(
                columns
                    .iter()
                    .map(|c| cell_for(app, host, *c, i == app.hosts.selected)),
            )
        })
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.hosts.selected.min(hosts.len().saturating_sub(1))));

    frame.render_stateful_widget(table, area, &mut state);
}

fn title(app: &App) -> String {
    let shown = app.hosts.visible().len();
    let total = app.hosts.records.len();

    let position = if shown > 0 {
        format!(" [{}/{}]", app.hosts.selected.min(shown - 1) + 1, shown)
    } else {
        String::new()
    };

    let filter = if app.input == InputMode::HostFilter {
        format!(
            " {}: /{}_",
            app.hosts.selected_column.title(),
            app.hosts.filters.get(app.hosts.selected_column)
        )
    } else if !app.hosts.filters.is_empty() {
        " [c:clear filters]".to_string()
    } else {
        String::new()
    };

    format!(" Hosts ({}/{}){}{} ", shown, total, filter, position)
}

fn cell_for<'a>(app: &App, host: &'a HostRecord, column: HostColumn, selected: bool) -> Cell<'a> {
    let ip = &host.ip_address;

    if let (Some(edit), true) = (app.edit.as_ref(), selected) {
        if edit.ip == *ip && edit.field.column() == column {
            return Cell::from(format!("{}_", edit.buffer))
                .style(Style::default().add_modifier(Modifier::REVERSED));
        }
    }

    match column {
        HostColumn::Known => {
            if app.is_pending(&Control::Known { ip: ip.clone() }) {
                Cell::from("Wait...").style(Style::default().fg(app.theme.pending))
            } else {
                let style = if host.is_known() {
                    Style::default().fg(app.theme.online)
                } else {
                    app.theme.muted
                };
                Cell::from(column.value(host)).style(style)
            }
        }
        HostColumn::Status => {
            Cell::from(column.value(host)).style(app.theme.status_style(host.is_online()))
        }
        HostColumn::Hostname | HostColumn::Note => {
            let saving = column.editable_field().is_some_and(|field| {
                app.is_pending(&Control::Field {
                    ip: ip.clone(),
                    field,
                })
            });
            if saving {
                Cell::from(column.value(host)).style(Style::default().fg(app.theme.pending))
            } else {
                Cell::from(column.value(host))
            }
        }
        HostColumn::Ip if app.is_pending(&Control::DeleteHost { ip: ip.clone() }) => {
            Cell::from(column.value(host)).style(app.theme.muted)
        }
        _ => Cell::from(column.value(host)),
    }
}

/// Checklist of columns, toggled with Space.
///
/// Displayed as a centered modal on top of the table.
pub fn render_column_menu(frame: &mut Frame, app: &App, area: Rect) {
    let cursor = app.hosts.column_menu.unwrap_or(0);
    let items: Vec<ListItem> = HostColumn::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mark = if app.hosts.layout.is_visible(*c) { "[x]" } else { "[ ]" };
            let line = Line::from(vec![
                Span::raw(format!(" {} ", mark)),
                Span::raw(c.title()),
                Span::styled(
                    format!("  {}", app.hosts.layout.width(*c)),
                    app.theme.muted,
                ),
            ]);
            let item = ListItem::new(line);
            if i == cursor {
                item.style(app.theme.selected)
            } else {
                item
            }
        })
        .collect();

    let block = Block::default()
        .title(" Columns [Space:toggle Esc:close] ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let width = 40u16.min(area.width.saturating_sub(4));
    let height = (HostColumn::COUNT as u16 + 2).min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let menu_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, menu_area);
    frame.render_widget(List::new(items).block(block), menu_area);
}
