//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use std::io::IsTerminal;

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::prefs::ThemeName;

/// Color and style theme for the TUI.
///
/// Use [`Theme::from_name()`] with a saved or detected [`ThemeName`].
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Online hosts and timeline markers.
    pub online: Color,
    /// Offline hosts and timeline markers.
    pub offline: Color,
    /// Error text and failed actions.
    pub error: Color,
    /// Pending actions ("Wait...").
    pub pending: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the column cursor in the header row.
    pub selected_column: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Dimmed text such as placeholders.
    pub muted: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            online: Color::Green,
            offline: Color::Red,
            error: Color::LightRed,
            pending: Color::Yellow,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            selected_column: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            muted: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            online: Color::Green,
            offline: Color::Red,
            error: Color::Red,
            pending: Color::Magenta,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            selected_column: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            muted: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    pub fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Light => Self::light(),
            ThemeName::Dark => Self::dark(),
        }
    }

    /// Auto-detect based on terminal background
    pub fn detect_name() -> ThemeName {
        // Querying a non-terminal would just wait for the timeout.
        if !std::io::stdout().is_terminal() {
            return ThemeName::Dark;
        }
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => ThemeName::Light,
            _ => ThemeName::Dark,
        }
    }

    /// Style for an online/offline flag.
    pub fn status_style(&self, online: bool) -> Style {
        if online {
            Style::default().fg(self.online)
        } else {
            Style::default().fg(self.offline)
        }
    }
}
