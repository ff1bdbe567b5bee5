//! Color theme and styling for the editor TUI

use ratatui::style::{Color, Modifier, Style};

/// Editor UI color theme
#[derive(Debug, Clone)]
pub struct MapTheme {
    pub border: Color,
    pub border_focused: Color,
    pub title: Color,
    pub status_text: Color,
    pub cursor: Color,
    pub dimmed: Color,
}

impl Default for MapTheme {
    fn default() -> Self {
        Self {
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            title: Color::Cyan,
            status_text: Color::Gray,
            cursor: Color::Yellow,
            dimmed: Color::DarkGray,
        }
    }
}

impl MapTheme {
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.title)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_style(&self) -> Style {
        Style::default().fg(self.status_text)
    }

    pub fn cursor_style(&self) -> Style {
        Style::default()
            .fg(self.cursor)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dimmed_style(&self) -> Style {
        Style::default().fg(self.dimmed)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }
}

/// Map a scene color onto the terminal.
pub fn tile_color(color: worldsmith_core::Color) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}
