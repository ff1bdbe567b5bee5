//! The map scene: per-concept layers of tile sprites inside a pannable
//! viewport, plus the hover overlay and pointer hit-testing.
//!
//! No drawing happens here: [`Scene::frame`] produces one deterministic
//! frame (an ordered list of draw ops in screen space) that a front-end
//! rasterizes however it likes, and [`RenderScheduler`] owns the start/stop
//! lifecycle of the render loop.

use crate::model::{Color, Concept, ConceptId, Instance, InstanceId};
use crate::tiles::TileIndex;

/// A size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Scene construction parameters.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    /// Size of the containing view. The scene viewport is the smaller of
    /// this and the full grid extent on each axis.
    pub viewport: PixelSize,
    pub background: Color,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            tile_width: 10,
            tile_height: 10,
            viewport: PixelSize::new(640, 480),
            background: Color::BACKGROUND,
        }
    }
}

impl SceneConfig {
    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    pub fn with_viewport(mut self, viewport: PixelSize) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }
}

/// One tile-sized colored square, positioned in grid pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub instance: InstanceId,
    pub x: u32,
    pub y: u32,
    pub color: Color,
}

/// One rendering container per concept, drawn in ascending z order.
#[derive(Debug, Clone)]
struct Layer {
    concept: ConceptId,
    color: Color,
    z_index: i32,
    sprites: Vec<Sprite>,
}

/// The bucket handed to the rest of the UI when a tile is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSelection {
    pub x: u32,
    pub y: u32,
    pub instances: Vec<InstanceId>,
}

/// A single rendered frame: draw ops in paint order, screen space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub viewport: PixelSize,
    pub background: Color,
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOp {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub color: Color,
    pub kind: DrawKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Sprite(InstanceId),
    /// The translucent hover highlight, always painted last.
    Overlay,
}

/// The pannable map scene.
#[derive(Debug, Clone)]
pub struct Scene {
    tile_width: u32,
    tile_height: u32,
    grid_width: u32,
    grid_height: u32,
    view_width: u32,
    view_height: u32,
    background: Color,
    pan_x: i32,
    pan_y: i32,
    drag: Option<(i32, i32)>,
    overlay: Option<(u32, u32)>,
    layers: Vec<Layer>,
    root_sprites: Vec<Sprite>,
    tiles: TileIndex,
}

impl Scene {
    /// Build an empty scene for a `grid_width` × `grid_height` map.
    ///
    /// The viewport is clamped to the grid's pixel extent per axis; a
    /// viewport smaller than the grid is what enables panning.
    pub fn init(grid_width: u32, grid_height: u32, config: &SceneConfig) -> Self {
        // A zero tile size would make every cell computation divide by
        // zero; the smallest usable tile is one pixel.
        let tile_width = config.tile_width.max(1);
        let tile_height = config.tile_height.max(1);
        let extent_x = grid_width * tile_width;
        let extent_y = grid_height * tile_height;

        Self {
            tile_width,
            tile_height,
            grid_width,
            grid_height,
            view_width: config.viewport.width.min(extent_x),
            view_height: config.viewport.height.min(extent_y),
            background: config.background,
            pan_x: 0,
            pan_y: 0,
            drag: None,
            overlay: None,
            layers: Vec::new(),
            root_sprites: Vec::new(),
            tiles: TileIndex::new(grid_width, grid_height),
        }
    }

    // ========================================================================
    // Layers and sprites
    // ========================================================================

    /// Create one layer per concept, ascending z-index, stable on ties.
    pub fn create_layers<'a>(&mut self, concepts: impl IntoIterator<Item = &'a Concept>) {
        let mut layers: Vec<Layer> = concepts
            .into_iter()
            .map(|concept| Layer {
                concept: concept.id,
                color: concept.display.color,
                z_index: concept.display.z_index,
                sprites: Vec::new(),
            })
            .collect();
        // Vec::sort_by_key is stable, so equal z-indexes keep their
        // insertion order.
        layers.sort_by_key(|layer| layer.z_index);
        self.layers = layers;
    }

    /// The concepts in paint order. Exposed for tests and panel legends.
    pub fn layer_order(&self) -> Vec<ConceptId> {
        self.layers.iter().map(|layer| layer.concept).collect()
    }

    /// Place one instance: a tile-sized sprite in its concept's layer
    /// (falling back to the scene root when no layer exists), and its id
    /// appended to the tile bucket at its coordinates.
    pub fn place_instance(&mut self, instance: &Instance) {
        let x = instance.coordinates.x * self.tile_width;
        let y = instance.coordinates.y * self.tile_height;

        match self
            .layers
            .iter_mut()
            .find(|layer| layer.concept == instance.concept)
        {
            Some(layer) => layer.sprites.push(Sprite {
                instance: instance.id,
                x,
                y,
                color: layer.color,
            }),
            None => self.root_sprites.push(Sprite {
                instance: instance.id,
                x,
                y,
                color: Color::DEFAULT_FILL,
            }),
        }

        self.tiles
            .place(instance.id, instance.coordinates.x, instance.coordinates.y);
    }

    pub fn place_instances<'a>(&mut self, instances: impl IntoIterator<Item = &'a Instance>) {
        for instance in instances {
            self.place_instance(instance);
        }
    }

    pub fn tiles(&self) -> &TileIndex {
        &self.tiles
    }

    // ========================================================================
    // Panning
    // ========================================================================

    /// Full grid size in pixels.
    pub fn grid_pixel_extent(&self) -> (u32, u32) {
        (
            self.grid_width * self.tile_width,
            self.grid_height * self.tile_height,
        )
    }

    pub fn viewport(&self) -> PixelSize {
        PixelSize::new(self.view_width, self.view_height)
    }

    /// Whether the grid extends past the viewport on either axis.
    pub fn pannable(&self) -> bool {
        let (extent_x, extent_y) = self.grid_pixel_extent();
        extent_x > self.view_width || extent_y > self.view_height
    }

    pub fn pan(&self) -> (i32, i32) {
        (self.pan_x, self.pan_y)
    }

    /// Shift the pan offset, clamped so the grid's far edge never crosses
    /// inside the viewport boundary and the origin never goes positive.
    pub fn pan_by(&mut self, dx: i32, dy: i32) {
        let (extent_x, extent_y) = self.grid_pixel_extent();
        self.pan_x = clamp_axis(self.pan_x + dx, extent_x, self.view_width);
        self.pan_y = clamp_axis(self.pan_y + dy, extent_y, self.view_height);
    }

    /// Start a drag at a pointer position. Dragging is only armed when the
    /// grid actually overflows the viewport.
    pub fn begin_drag(&mut self, px: i32, py: i32) {
        if self.pannable() {
            self.drag = Some((px, py));
        }
    }

    /// Continue a drag: pans by the pointer delta since the last position.
    /// Returns `false` when no drag is in progress.
    pub fn drag_to(&mut self, px: i32, py: i32) -> bool {
        let Some((last_x, last_y)) = self.drag else {
            return false;
        };
        self.drag = Some((px, py));
        self.pan_by(px - last_x, py - last_y);
        true
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn drag_active(&self) -> bool {
        self.drag.is_some()
    }

    // ========================================================================
    // Hit testing, hover, selection
    // ========================================================================

    /// The grid cell under a viewport pixel, accounting for the pan offset.
    pub fn cell_at(&self, px: i32, py: i32) -> Option<(u32, u32)> {
        let gx = (px - self.pan_x).div_euclid(self.tile_width as i32);
        let gy = (py - self.pan_y).div_euclid(self.tile_height as i32);
        if gx >= 0 && gy >= 0 && (gx as u32) < self.grid_width && (gy as u32) < self.grid_height {
            Some((gx as u32, gy as u32))
        } else {
            None
        }
    }

    /// Move the hover overlay to the cell under the pointer, clearing it
    /// when the pointer is off the grid.
    pub fn hover(&mut self, px: i32, py: i32) -> Option<(u32, u32)> {
        self.overlay = self.cell_at(px, py);
        self.overlay
    }

    /// Remove the overlay entirely (pointer left the map).
    pub fn pointer_out(&mut self) {
        self.overlay = None;
    }

    pub fn overlay(&self) -> Option<(u32, u32)> {
        self.overlay
    }

    /// Pin the overlay to a specific cell (sibling-panel highlight).
    pub fn set_overlay_cell(&mut self, x: u32, y: u32) {
        if x < self.grid_width && y < self.grid_height {
            self.overlay = Some((x, y));
        }
    }

    pub fn clear_overlay(&mut self) {
        self.overlay = None;
    }

    /// Hit-test a tap to a grid cell and hand back its occupancy bucket.
    pub fn tap(&self, px: i32, py: i32) -> Option<TileSelection> {
        let (x, y) = self.cell_at(px, py)?;
        Some(TileSelection {
            x,
            y,
            instances: self.tiles.bucket(x, y).to_vec(),
        })
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render one frame: root sprites, then each layer in z order, then the
    /// overlay topmost. Ops fully outside the viewport are clipped out.
    pub fn frame(&self) -> Frame {
        let mut ops = Vec::new();

        for sprite in &self.root_sprites {
            self.push_sprite_op(&mut ops, sprite);
        }
        for layer in &self.layers {
            for sprite in &layer.sprites {
                self.push_sprite_op(&mut ops, sprite);
            }
        }

        if let Some((x, y)) = self.overlay {
            let op = DrawOp {
                x: (x * self.tile_width) as i32 + self.pan_x,
                y: (y * self.tile_height) as i32 + self.pan_y,
                width: self.tile_width,
                height: self.tile_height,
                color: Color::rgb(0xff, 0xff, 0xff),
                kind: DrawKind::Overlay,
            };
            if self.visible(&op) {
                ops.push(op);
            }
        }

        Frame {
            viewport: self.viewport(),
            background: self.background,
            ops,
        }
    }

    fn push_sprite_op(&self, ops: &mut Vec<DrawOp>, sprite: &Sprite) {
        let op = DrawOp {
            x: sprite.x as i32 + self.pan_x,
            y: sprite.y as i32 + self.pan_y,
            width: self.tile_width,
            height: self.tile_height,
            color: sprite.color,
            kind: DrawKind::Sprite(sprite.instance),
        };
        if self.visible(&op) {
            ops.push(op);
        }
    }

    fn visible(&self, op: &DrawOp) -> bool {
        op.x + op.width as i32 > 0
            && op.y + op.height as i32 > 0
            && op.x < self.view_width as i32
            && op.y < self.view_height as i32
    }
}

/// Clamp a proposed pan offset so the origin never goes positive and the
/// far edge never pulls inside the viewport boundary. A grid no larger than
/// the viewport does not pan at all.
fn clamp_axis(proposed: i32, extent: u32, view: u32) -> i32 {
    if extent <= view {
        0
    } else {
        proposed.clamp(view as i32 - extent as i32, 0)
    }
}

/// Owns the render loop lifecycle: frames are produced only between
/// `start` and `stop`, and tests can pull exactly one frame at a time.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    running: bool,
    frames: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Produce the next frame, or `None` while stopped.
    pub fn render(&mut self, scene: &Scene) -> Option<Frame> {
        if !self.running {
            return None;
        }
        self.frames += 1;
        Some(scene.frame())
    }
}
