use std::ops::{Add, Sub};
use std::path::PathBuf;

use thiserror::Error;

use super::input::{ActionStates, InputAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// Everything the simulation may read from input during one fixed tick.
/// Edges (presses, typed text, wheel steps) are present for exactly one tick.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    typed_text: String,
    scroll_steps: i32,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        typed_text: String,
        scroll_steps: i32,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            typed_text,
            scroll_steps,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn pressed(&self, action: InputAction) -> bool {
        self.actions.was_pressed(action)
    }

    /// Press edges plus key-repeat presses for this tick.
    pub fn press_count(&self, action: InputAction) -> u32 {
        self.actions.press_count(action)
    }

    pub fn typed_text(&self) -> &str {
        &self.typed_text
    }

    /// Positive steps scroll towards older content.
    pub fn scroll_steps(&self) -> i32 {
        self.scroll_steps
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set_level(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.actions.set_level(action, true);
        self.actions.mark_pressed(action);
        self
    }

    pub fn with_typed_text(mut self, text: &str) -> Self {
        self.typed_text = text.to_string();
        self
    }

    pub fn with_scroll_steps(mut self, scroll_steps: i32) -> Self {
        self.scroll_steps = scroll_steps;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }
}

/// World positions are pixels, y pointing up, origin at the map's bottom-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.25;
pub const CAMERA_ZOOM_MAX: f32 = 4.0;

#[derive(Debug, Clone, Copy)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::default(),
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }
}

impl Camera2D {
    pub fn effective_zoom(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}

/// A tileset image the renderer slices tiles out of.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetRef {
    pub first_gid: u32,
    pub image_path: PathBuf,
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
    pub tile_count: u32,
    pub spacing: u32,
    pub margin: u32,
}

impl TilesetRef {
    /// Source rectangle `(x, y, w, h)` of a local tile id inside the image.
    pub fn source_rect(&self, local_id: u32) -> Option<(u32, u32, u32, u32)> {
        if self.columns == 0 || local_id >= self.tile_count {
            return None;
        }
        let column = local_id % self.columns;
        let row = local_id / self.columns;
        let x = self.margin + column * (self.tile_width + self.spacing);
        let y = self.margin + row * (self.tile_height + self.spacing);
        Some((x, y, self.tile_width, self.tile_height))
    }
}

/// Tile layers in file order (drawn back to front). Row 0 is the top row
/// of the map, as stored in the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    layers: Vec<Vec<u32>>,
    tilesets: Vec<TilesetRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch in layer {layer}: expected {expected}, got {actual}")]
    TileCountMismatch {
        layer: usize,
        expected: usize,
        actual: usize,
    },
}

impl Tilemap {
    pub fn new(
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
        layers: Vec<Vec<u32>>,
        mut tilesets: Vec<TilesetRef>,
    ) -> Result<Self, TilemapError> {
        let expected = width as usize * height as usize;
        for (layer, gids) in layers.iter().enumerate() {
            if gids.len() != expected {
                return Err(TilemapError::TileCountMismatch {
                    layer,
                    expected,
                    actual: gids.len(),
                });
            }
        }
        tilesets.sort_by_key(|tileset| tileset.first_gid);
        Ok(Self {
            width,
            height,
            tile_width,
            tile_height,
            layers,
            tilesets,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn world_size_px(&self) -> Vec2 {
        Vec2::new(
            (self.width * self.tile_width) as f32,
            (self.height * self.tile_height) as f32,
        )
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn gid_at(&self, layer: usize, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.layers.get(layer)?.get(index).copied()
    }

    /// Resolves a global tile id to its tileset and local id; gid 0 is empty.
    pub fn resolve_gid(&self, gid: u32) -> Option<(&TilesetRef, u32)> {
        if gid == 0 {
            return None;
        }
        let tileset = self
            .tilesets
            .iter()
            .rev()
            .find(|tileset| tileset.first_gid <= gid)?;
        Some((tileset, gid - tileset.first_gid))
    }

    pub fn tilesets(&self) -> &[TilesetRef] {
        &self.tilesets
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableKind {
    Placeholder([u8; 4]),
    Sprite(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteInstance {
    pub position: Vec2,
    /// Footprint used for the placeholder when the sprite image is missing.
    pub size: Vec2,
    pub scale: f32,
    pub renderable: RenderableKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugRectKind {
    Wall,
    Transition,
    Item,
    NpcZone,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugRect {
    pub center: Vec2,
    pub size: Vec2,
    pub kind: DebugRectKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptView {
    pub text: String,
    pub anchor: Vec2,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DialoguePanelView {
    pub lines: Vec<String>,
    pub input: String,
    pub line_height_px: u32,
    pub waiting_for_reply: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRow {
    pub label: String,
    pub quantity: u32,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventoryPanelView {
    pub title: String,
    pub empty_label: String,
    pub rows: Vec<InventoryRow>,
}

/// Screen-space UI state, rebuilt by the scene every render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HudView {
    pub fade_alpha: u8,
    pub prompt: Option<PromptView>,
    pub dialogue: Option<DialoguePanelView>,
    pub inventory: Option<InventoryPanelView>,
}

/// The render model a scene publishes for the renderer.
#[derive(Debug, Default)]
pub struct SceneWorld {
    camera: Camera2D,
    tilemap: Option<Tilemap>,
    sprites: Vec<SpriteInstance>,
    debug_rects: Vec<DebugRect>,
    hud: HudView,
}

impl SceneWorld {
    pub fn clear(&mut self) {
        self.tilemap = None;
        self.sprites.clear();
        self.debug_rects.clear();
        self.hud = HudView::default();
        self.camera = Camera2D::default();
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn set_tilemap(&mut self, tilemap: Tilemap) {
        self.tilemap = Some(tilemap);
    }

    pub fn clear_tilemap(&mut self) {
        self.tilemap = None;
    }

    pub fn tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }

    pub fn sprites(&self) -> &[SpriteInstance] {
        &self.sprites
    }

    pub fn set_sprites(&mut self, sprites: Vec<SpriteInstance>) {
        self.sprites = sprites;
    }

    pub fn debug_rects(&self) -> &[DebugRect] {
        &self.debug_rects
    }

    pub fn set_debug_rects(&mut self, rects: Vec<DebugRect>) {
        self.debug_rects = rects;
    }

    pub fn hud(&self) -> &HudView {
        &self.hud
    }

    pub fn set_hud(&mut self, hud: HudView) {
        self.hud = hud;
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    /// Publishes the current state into `world` right before it is drawn.
    fn render(&mut self, world: &mut SceneWorld);
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        self.scene.update(fixed_dt_seconds, input, &mut self.world)
    }

    pub(crate) fn render(&mut self) {
        self.scene.render(&mut self.world);
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }
}
