//! The tile panel: contents of the selected tile and the focused
//! instance's available actions.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::ui::theme::MapTheme;

/// One row of the instance list.
pub struct TileEntry {
    pub label: String,
    pub concept: String,
    pub focused: bool,
}

/// Renders the selected tile's instances and, below them, the action list.
pub struct TilePanelWidget<'a> {
    theme: &'a MapTheme,
    title: String,
    entries: Vec<TileEntry>,
    actions: Vec<(String, bool)>,
}

impl<'a> TilePanelWidget<'a> {
    pub fn new(theme: &'a MapTheme) -> Self {
        Self {
            theme,
            title: " Tile ".to_string(),
            entries: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn entries(mut self, entries: Vec<TileEntry>) -> Self {
        self.entries = entries;
        self
    }

    /// `(label, selected)` pairs for the focused instance's actions.
    pub fn actions(mut self, actions: Vec<(String, bool)>) -> Self {
        self.actions = actions;
        self
    }
}

impl Widget for TilePanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut lines: Vec<Line> = Vec::new();

        if self.entries.is_empty() {
            lines.push(Line::from(Span::styled(
                "click a tile to inspect it",
                self.theme.dimmed_style(),
            )));
        }
        for entry in &self.entries {
            let marker = if entry.focused { "> " } else { "  " };
            let style = if entry.focused {
                self.theme.cursor_style()
            } else {
                self.theme.status_style()
            };
            lines.push(Line::from(vec![
                Span::styled(marker.to_string(), style),
                Span::styled(entry.label.clone(), style),
                Span::styled(format!("  [{}]", entry.concept), self.theme.dimmed_style()),
            ]));
        }

        if !self.actions.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "actions (n/p, Enter):",
                self.theme.status_style(),
            )));
            for (label, selected) in &self.actions {
                let marker = if *selected { "> " } else { "  " };
                let style = if *selected {
                    self.theme.cursor_style()
                } else {
                    self.theme.status_style()
                };
                lines.push(Line::from(Span::styled(format!("{marker}{label}"), style)));
            }
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(self.title)
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style(!self.entries.is_empty())),
            )
            .render(area, buf);
    }
}
