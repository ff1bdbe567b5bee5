//! Panel geometry for the editor layout.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// The main layout: title bar, map + tile panel split, status bar.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub title_area: Rect,
    pub map_area: Rect,
    /// Map area minus its border, where scene pixels land.
    pub map_inner: Rect,
    pub side_area: Rect,
    pub status_bar: Rect,
}

impl AppLayout {
    pub fn calculate(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(rows[1]);

        let map_area = columns[0];
        Self {
            title_area: rows[0],
            map_area,
            map_inner: map_area.inner(ratatui::layout::Margin::new(1, 1)),
            side_area: columns[1],
            status_bar: rows[2],
        }
    }
}

/// Fixed-size rect centered in `area`, clamped to fit. Used for overlays.
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
