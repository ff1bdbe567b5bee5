//! The one-line status bar.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::ui::theme::MapTheme;

pub struct StatusBarWidget<'a> {
    theme: &'a MapTheme,
    message: Option<&'a str>,
    pan: (i32, i32),
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(theme: &'a MapTheme) -> Self {
        Self {
            theme,
            message: None,
            pan: (0, 0),
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }

    pub fn pan(mut self, pan: (i32, i32)) -> Self {
        self.pan = pan;
        self
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let message = self.message.unwrap_or("? for help");
        let line = Line::from(vec![
            Span::styled(format!(" {message}"), self.theme.status_style()),
            Span::styled(
                format!("  |  pan ({}, {})", self.pan.0, self.pan.1),
                self.theme.dimmed_style(),
            ),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}
