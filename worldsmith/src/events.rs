//! Event handling for the world-model editor TUI

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::App;

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Horizontal pan step per keypress, in scene pixels (one tile).
const PAN_X: i32 = 2;
const PAN_Y: i32 = 1;

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

/// Handle a key event
fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Global shortcut (always works)
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    // Help overlay swallows everything except its own toggle
    if app.show_help {
        match key.code {
            KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => app.toggle_help(),
            _ => {}
        }
        return EventResult::NeedsRedraw;
    }

    match key.code {
        KeyCode::Char('q') => EventResult::Quit,
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }

        // Panning
        KeyCode::Char('h') | KeyCode::Left => pan(app, PAN_X, 0),
        KeyCode::Char('l') | KeyCode::Right => pan(app, -PAN_X, 0),
        KeyCode::Char('k') | KeyCode::Up => pan(app, 0, PAN_Y),
        KeyCode::Char('j') | KeyCode::Down => pan(app, 0, -PAN_Y),

        // Tile panel cursor
        KeyCode::Char('J') | KeyCode::Tab => {
            app.focus_next();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('K') | KeyCode::BackTab => {
            app.focus_prev();
            EventResult::NeedsRedraw
        }

        // Action list for the focused instance
        KeyCode::Char('a') => {
            if let Some(id) = app.focused_instance() {
                app.pending_actions = Some(id);
            } else {
                app.set_status("select an instance first");
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char('n') => {
            cycle_action(app, 1);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('p') => {
            cycle_action(app, -1);
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            if let Some((source, relations)) = &app.actions {
                if let Some(relation) = relations.get(app.action_index) {
                    app.pending_execute = Some((relation.clone(), *source));
                }
            }
            EventResult::NeedsRedraw
        }

        // Delete the focused instance
        KeyCode::Char('d') => {
            if let Some(id) = app.focused_instance() {
                app.pending_delete = Some(id);
            }
            EventResult::NeedsRedraw
        }

        KeyCode::Esc => {
            app.selected = None;
            app.actions = None;
            if let Some(scene) = app.controller.scene_mut() {
                scene.clear_overlay();
            }
            EventResult::NeedsRedraw
        }

        _ => EventResult::Continue,
    }
}

fn pan(app: &mut App, dx: i32, dy: i32) -> EventResult {
    if let Some(scene) = app.controller.scene_mut() {
        scene.pan_by(dx, dy);
    }
    EventResult::NeedsRedraw
}

fn cycle_action(app: &mut App, step: isize) {
    if let Some((_, relations)) = &app.actions {
        let n = relations.len();
        if n > 0 {
            let i = app.action_index as isize + step;
            app.action_index = i.rem_euclid(n as isize) as usize;
        }
    }
}

/// Handle a mouse event: click selects a tile, drag pans, movement drives
/// the hover overlay.
fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    let pixel = app.scene_pixel(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some((px, py)) = pixel {
                app.select_at(px, py);
                if let Some(scene) = app.controller.scene_mut() {
                    scene.begin_drag(px, py);
                }
                app.dragging = true;
            }
            EventResult::NeedsRedraw
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if app.dragging {
                if let (Some((px, py)), Some(scene)) = (pixel, app.controller.scene_mut()) {
                    scene.drag_to(px, py);
                }
            }
            EventResult::NeedsRedraw
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if let Some(scene) = app.controller.scene_mut() {
                scene.end_drag();
            }
            app.dragging = false;
            EventResult::NeedsRedraw
        }
        MouseEventKind::Moved => {
            if let Some(scene) = app.controller.scene_mut() {
                match pixel {
                    Some((px, py)) => {
                        scene.hover(px, py);
                    }
                    None => scene.pointer_out(),
                }
            }
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}
