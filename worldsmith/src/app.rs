//! Main application state and logic

use ratatui::layout::Rect;
use worldsmith_client::Client;
use worldsmith_core::{Frame, InstanceId, MapController, Relation, TileSelection};

use crate::ui::layout::AppLayout;
use crate::ui::theme::MapTheme;

/// Main application state
pub struct App {
    pub controller: MapController,
    pub client: Client,
    pub theme: MapTheme,

    // Selection state
    pub selected: Option<TileSelection>,
    pub focused_index: usize,
    pub actions: Option<(InstanceId, Vec<Relation>)>,
    pub action_index: usize,

    // Deferred async work, picked up by the main loop between draws
    pub pending_actions: Option<InstanceId>,
    pub pending_execute: Option<(Relation, InstanceId)>,
    pub pending_delete: Option<InstanceId>,

    // UI state
    pub last_frame: Option<Frame>,
    pub map_area: Rect,
    pub dragging: bool,
    status_message: Option<String>,
    pub show_help: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(controller: MapController, client: Client) -> Self {
        Self {
            controller,
            client,
            theme: MapTheme::default(),
            selected: None,
            focused_index: 0,
            actions: None,
            action_index: 0,
            pending_actions: None,
            pending_execute: None,
            pending_delete: None,
            last_frame: None,
            map_area: Rect::default(),
            dragging: false,
            status_message: None,
            show_help: false,
            should_quit: false,
        }
    }

    /// Recompute panel geometry for the current terminal size. The map
    /// area is remembered so mouse events can be translated to scene
    /// pixels without re-deriving the layout.
    pub fn update_layout(&mut self, area: Rect) {
        self.map_area = AppLayout::calculate(area).map_inner;
    }

    /// Pull the next frame from the render scheduler, keeping the previous
    /// one when rendering is paused.
    pub fn advance_frame(&mut self) {
        if let Some(frame) = self.controller.render() {
            self.last_frame = Some(frame);
        }
    }

    /// Translate a terminal mouse position into scene pixels, if it falls
    /// inside the map panel.
    pub fn scene_pixel(&self, column: u16, row: u16) -> Option<(i32, i32)> {
        let area = self.map_area;
        if column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height
        {
            Some((i32::from(column - area.x), i32::from(row - area.y)))
        } else {
            None
        }
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    // ========================================================================
    // Tile selection
    // ========================================================================

    /// Select the tile under a scene pixel and reset the panel cursor.
    pub fn select_at(&mut self, px: i32, py: i32) {
        self.selected = self.controller.select_tile(px, py);
        self.focused_index = 0;
        self.actions = None;
        self.action_index = 0;

        let summary = self
            .selected
            .as_ref()
            .map(|sel| (sel.x, sel.y, sel.instances.len()));
        match summary {
            Some((x, y, count)) => {
                self.set_status(format!("tile ({x}, {y}): {count} instance(s)"));
                self.highlight_focused();
            }
            None => self.set_status("no tile there"),
        }
    }

    /// The instance the tile panel cursor is on.
    pub fn focused_instance(&self) -> Option<InstanceId> {
        self.selected
            .as_ref()
            .and_then(|sel| sel.instances.get(self.focused_index))
            .copied()
    }

    pub fn focus_next(&mut self) {
        let n = self.selected.as_ref().map_or(0, |sel| sel.instances.len());
        if n > 0 {
            self.focused_index = (self.focused_index + 1) % n;
            self.actions = None;
            self.highlight_focused();
        }
    }

    pub fn focus_prev(&mut self) {
        let n = self.selected.as_ref().map_or(0, |sel| sel.instances.len());
        if n > 0 {
            self.focused_index = (self.focused_index + n - 1) % n;
            self.actions = None;
            self.highlight_focused();
        }
    }

    fn highlight_focused(&mut self) {
        if let Some(id) = self.focused_instance() {
            let _ = self.controller.highlight_instance(id, true);
        }
    }

    // ========================================================================
    // Deferred server work
    // ========================================================================

    /// Fetch the action list for an instance (cached per concept by the
    /// controller).
    pub async fn fetch_actions(&mut self, id: InstanceId) {
        match self.controller.available_actions(&self.client, id).await {
            Ok(actions) if actions.is_empty() => {
                self.actions = Some((id, actions));
                self.set_status("no actions for this instance");
            }
            Ok(actions) => {
                self.set_status(format!("{} action(s)", actions.len()));
                self.actions = Some((id, actions));
                self.action_index = 0;
            }
            Err(e) => self.set_status(format!("actions failed: {e}")),
        }
    }

    /// Execute an action from `source` against the first available target.
    pub async fn run_action(&mut self, relation: Relation, source: InstanceId) {
        let targets = match self
            .controller
            .action_targets(&self.client, source, &relation)
            .await
        {
            Ok(targets) => targets,
            Err(e) => {
                self.set_status(format!("target lookup failed: {e}"));
                return;
            }
        };
        let Some(target) = targets.first() else {
            self.set_status(format!("no targets for \"{}\"", relation.label));
            return;
        };

        match self
            .controller
            .execute_action(&self.client, &relation.label, source, target.id)
            .await
        {
            Ok(()) => {
                self.set_status(format!("{} -[{}]-> {}", source, relation.label, target.id));
                self.refresh_selection();
            }
            Err(e) => self.set_status(format!("action failed: {e}")),
        }
    }

    pub async fn run_delete(&mut self, id: InstanceId) {
        match self.controller.delete_instance(&self.client, id).await {
            Ok(()) => {
                self.set_status(format!("deleted instance {id}"));
                self.refresh_selection();
            }
            Err(e) => self.set_status(format!("delete failed: {e}")),
        }
    }

    /// Re-run the tile hit-test after the scene was rebuilt, so the panel
    /// shows the tile's new contents.
    fn refresh_selection(&mut self) {
        let Some(sel) = self.selected.take() else {
            return;
        };
        let instances = match self.controller.scene() {
            Some(scene) => scene.tiles().bucket(sel.x, sel.y).to_vec(),
            None => Vec::new(),
        };
        self.selected = Some(TileSelection {
            x: sel.x,
            y: sel.y,
            instances,
        });
        self.focused_index = 0;
        self.actions = None;
    }
}
