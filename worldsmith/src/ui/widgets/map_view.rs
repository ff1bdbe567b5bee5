//! The map panel: rasterizes a scene frame into terminal cells.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    widgets::{Block, Borders, Widget},
};
use worldsmith_core::{DrawKind, Frame};

use crate::ui::theme::{tile_color, MapTheme};

/// Draws one scene frame, one terminal cell per scene pixel.
pub struct MapViewWidget<'a> {
    frame: Option<&'a Frame>,
    theme: &'a MapTheme,
    focused: bool,
}

impl<'a> MapViewWidget<'a> {
    pub fn new(frame: Option<&'a Frame>, theme: &'a MapTheme) -> Self {
        Self {
            frame,
            theme,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for MapViewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Map ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(frame) = self.frame else {
            return;
        };

        // Background first, clipped to the scene's own viewport.
        let bg = tile_color(frame.background);
        for row in 0..inner.height.min(frame.viewport.height as u16) {
            for col in 0..inner.width.min(frame.viewport.width as u16) {
                if let Some(cell) = buf.cell_mut((inner.x + col, inner.y + row)) {
                    cell.set_bg(bg);
                }
            }
        }

        // Draw ops are already in paint order; later ops win.
        for op in &frame.ops {
            for dy in 0..op.height as i32 {
                for dx in 0..op.width as i32 {
                    let (sx, sy) = (op.x + dx, op.y + dy);
                    if sx < 0
                        || sy < 0
                        || sx >= i32::from(inner.width)
                        || sy >= i32::from(inner.height)
                    {
                        continue;
                    }
                    let pos = (inner.x + sx as u16, inner.y + sy as u16);
                    let Some(cell) = buf.cell_mut(pos) else {
                        continue;
                    };
                    match op.kind {
                        DrawKind::Sprite(_) => {
                            cell.set_bg(tile_color(op.color));
                        }
                        DrawKind::Overlay => {
                            cell.set_char('░');
                            cell.modifier.insert(Modifier::BOLD);
                        }
                    }
                }
            }
        }
    }
}
