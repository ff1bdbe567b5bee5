//! Render orchestration for the editor TUI

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

use crate::app::App;
use crate::ui::layout::{centered_rect_fixed, AppLayout};
use crate::ui::widgets::{tile_panel::TileEntry, MapViewWidget, StatusBarWidget, TilePanelWidget};

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = AppLayout::calculate(area);

    render_title_bar(frame, app, layout.title_area);

    let map_widget = MapViewWidget::new(app.last_frame.as_ref(), &app.theme)
        .focused(app.selected.is_none());
    frame.render_widget(map_widget, layout.map_area);

    render_tile_panel(frame, app, layout.side_area);

    let pan = app
        .controller
        .scene()
        .map(|scene| scene.pan())
        .unwrap_or((0, 0));
    let status = StatusBarWidget::new(&app.theme)
        .message(app.status_message())
        .pan(pan);
    frame.render_widget(status, layout.status_bar);

    if app.show_help {
        render_help_overlay(frame, app, area);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let instances = app.controller.instances();
    let title = format!(
        " worldsmith — {}x{} map — {} concept(s), {} instance(s)",
        instances.width(),
        instances.height(),
        app.controller.concepts().len(),
        instances.len()
    );
    frame.render_widget(
        Paragraph::new(Span::styled(title, app.theme.title_style())),
        area,
    );
}

fn render_tile_panel(frame: &mut Frame, app: &App, area: Rect) {
    let mut widget = TilePanelWidget::new(&app.theme);

    if let Some(selection) = &app.selected {
        widget = widget.title(format!(" Tile ({}, {}) ", selection.x, selection.y));

        let entries = selection
            .instances
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let instance = app.controller.instances().by_id(*id);
                let concept = instance
                    .and_then(|inst| app.controller.concepts().by_id(inst.concept))
                    .map(|c| c.label.clone())
                    .unwrap_or_else(|| "?".to_string());
                TileEntry {
                    label: instance
                        .map(|inst| inst.label.clone())
                        .unwrap_or_else(|| format!("instance {id}")),
                    concept,
                    focused: i == app.focused_index,
                }
            })
            .collect();
        widget = widget.entries(entries);
    }

    if let Some((_, relations)) = &app.actions {
        let actions = relations
            .iter()
            .enumerate()
            .map(|(i, r)| (r.label.clone(), i == app.action_index))
            .collect();
        widget = widget.actions(actions);
    }

    frame.render_widget(widget, area);
}

fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let rect = centered_rect_fixed(44, 14, area);
    Clear.render(rect, frame.buffer_mut());

    let lines = vec![
        Line::from(""),
        Line::from("  arrows / hjkl   pan the map"),
        Line::from("  mouse click     select a tile"),
        Line::from("  mouse drag      pan the map"),
        Line::from("  J / K           cycle tile instances"),
        Line::from("  a               list actions"),
        Line::from("  n / p, Enter    pick and run an action"),
        Line::from("  d               delete focused instance"),
        Line::from("  Esc             clear selection"),
        Line::from("  ?               close this help"),
        Line::from("  q               quit"),
    ];
    let help = Paragraph::new(lines).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(app.theme.border_style(true)),
    );
    frame.render_widget(help, rect);
}
