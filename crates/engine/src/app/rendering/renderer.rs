use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{
    Camera2D, DebugRectKind, DialoguePanelView, HudView, InventoryPanelView, PromptView,
    RenderableKind, SceneWorld, SpriteInstance, Tilemap, Vec2,
};
use crate::sprite_keys::validate_sprite_key;

use super::canvas::Canvas;
use super::font::{draw_text, draw_text_centered, text_width_px, GLYPH_HEIGHT, TEXT_SCALE};
use super::transform::{visible_world_bounds, world_to_screen_f32};
use super::Viewport;

const CLEAR_COLOR: [u8; 4] = [0, 0, 0, 255];
const TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
const TEXT_DIM_COLOR: [u8; 4] = [176, 176, 176, 255];
const BUBBLE_COLOR: [u8; 4] = [0, 0, 0, 180];
const BUBBLE_OFFSET_PX: i32 = 50;
const BUBBLE_HEIGHT_PX: i32 = 40;
const BUBBLE_PADDING_PX: i32 = 12;
const DIALOGUE_MARGIN_PX: i32 = 50;
const DIALOGUE_HEIGHT_RATIO: f32 = 0.40;
const DIALOGUE_BG_COLOR: [u8; 4] = [0, 0, 0, 200];
const DIALOGUE_HISTORY_TOP_PAD_PX: i32 = 20;
const DIALOGUE_TEXT_INSET_PX: i32 = 20;
const INPUT_BOX_INSET_X_PX: i32 = 15;
const INPUT_BOX_BOTTOM_PX: i32 = 10;
const INPUT_BOX_HEIGHT_PX: i32 = 45;
const INVENTORY_PANEL_SIZE: (i32, i32) = (600, 400);
const INVENTORY_BG_COLOR: [u8; 4] = [20, 20, 20, 230];
const INVENTORY_SLOT_PX: i32 = 80;
const INVENTORY_SLOT_PAD_PX: i32 = 20;
const INVENTORY_COLUMNS: i32 = 4;
const INVENTORY_SLOT_COLOR: [u8; 4] = [60, 60, 60, 200];
const TILE_FALLBACK_COLORS: [[u8; 4]; 4] = [
    [74, 112, 56, 255],
    [112, 83, 58, 255],
    [68, 74, 62, 255],
    [96, 96, 104, 255],
];

#[derive(Debug)]
struct LoadedImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl LoadedImage {
    fn is_well_formed(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.rgba.len() >= self.width as usize * self.height as usize * 4
    }
}

/// Software renderer: draws a [`SceneWorld`] into a pixels frame each redraw.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<String, Option<LoadedImage>>,
    tileset_cache: HashMap<PathBuf, Option<LoadedImage>>,
    warned_missing: HashSet<String>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sprite_cache: HashMap::new(),
            tileset_cache: HashMap::new(),
            warned_missing: HashSet::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        let viewport = self.viewport;
        let Self {
            pixels,
            asset_root,
            sprite_cache,
            tileset_cache,
            warned_missing,
            ..
        } = self;
        let mut canvas = Canvas::new(pixels.frame_mut(), viewport.width, viewport.height);
        canvas.clear(CLEAR_COLOR);

        let camera = world.camera();
        if let Some(tilemap) = world.tilemap() {
            draw_tilemap(&mut canvas, tilemap, camera, viewport, tileset_cache, warned_missing);
        }

        let mut assets = SpriteAssets {
            cache: sprite_cache,
            warned: warned_missing,
            asset_root: asset_root.as_path(),
        };
        for sprite in sorted_back_to_front(world.sprites()) {
            draw_sprite_instance(&mut canvas, sprite, camera, viewport, &mut assets);
        }
        for rect in world.debug_rects() {
            let (left, top) = world_to_screen_f32(
                Vec2::new(
                    rect.center.x - rect.size.x * 0.5,
                    rect.center.y + rect.size.y * 0.5,
                ),
                camera,
                viewport,
            );
            let zoom = camera.effective_zoom();
            canvas.outline_rect(
                left.round() as i32,
                top.round() as i32,
                (rect.size.x * zoom).round() as i32,
                (rect.size.y * zoom).round() as i32,
                1,
                debug_rect_color(rect.kind),
            );
        }

        draw_hud(&mut canvas, world.hud(), camera, viewport, &mut assets);
        pixels.render()
    }
}

struct SpriteAssets<'a> {
    cache: &'a mut HashMap<String, Option<LoadedImage>>,
    warned: &'a mut HashSet<String>,
    asset_root: &'a Path,
}

impl SpriteAssets<'_> {
    fn resolve(&mut self, key: &str) -> Option<&LoadedImage> {
        if !self.cache.contains_key(key) {
            let loaded = match validate_sprite_key(key) {
                Ok(()) => {
                    let path = self.asset_root.join(format!("{key}.png"));
                    load_image_rgba(&path).map_err(|reason| (Some(path), reason))
                }
                Err(error) => Err((None, format!("invalid_key:{error}"))),
            };
            let loaded = match loaded {
                Ok(image) => Some(image),
                Err((path, reason)) => {
                    warn_missing_once(self.warned, key, path.as_deref(), &reason);
                    None
                }
            };
            self.cache.insert(key.to_string(), loaded);
        }
        self.cache.get(key).and_then(Option::as_ref)
    }
}

fn sorted_back_to_front(sprites: &[SpriteInstance]) -> Vec<&SpriteInstance> {
    let mut ordered: Vec<&SpriteInstance> = sprites.iter().collect();
    ordered.sort_by(|a, b| b.position.y.total_cmp(&a.position.y));
    ordered
}

fn draw_tilemap(
    canvas: &mut Canvas<'_>,
    tilemap: &Tilemap,
    camera: &Camera2D,
    viewport: Viewport,
    tileset_cache: &mut HashMap<PathBuf, Option<LoadedImage>>,
    warned: &mut HashSet<String>,
) {
    let (tile_w, tile_h) = tilemap.tile_size();
    if tile_w == 0 || tile_h == 0 || tilemap.width() == 0 || tilemap.height() == 0 {
        return;
    }
    let world_h = tilemap.world_size_px().y;
    let (min, max) = visible_world_bounds(camera, viewport);
    let col_start = (min.x / tile_w as f32).floor().max(0.0) as u32;
    let col_end = ((max.x / tile_w as f32).ceil().max(0.0) as u32).min(tilemap.width());
    let row_start = ((world_h - max.y) / tile_h as f32).floor().max(0.0) as u32;
    let row_end = (((world_h - min.y) / tile_h as f32).ceil().max(0.0) as u32).min(tilemap.height());
    let zoom = camera.effective_zoom();

    for tileset in tilemap.tilesets() {
        if !tileset_cache.contains_key(&tileset.image_path) {
            let loaded = match load_image_rgba(&tileset.image_path) {
                Ok(image) => Some(image),
                Err(reason) => {
                    let key = tileset.image_path.display().to_string();
                    warn_missing_once(warned, &key, Some(&tileset.image_path), &reason);
                    None
                }
            };
            tileset_cache.insert(tileset.image_path.clone(), loaded);
        }
    }

    for layer in 0..tilemap.layer_count() {
        for row in row_start..row_end {
            for col in col_start..col_end {
                let Some(gid) = tilemap.gid_at(layer, col, row) else {
                    continue;
                };
                let Some((tileset, local_id)) = tilemap.resolve_gid(gid) else {
                    continue;
                };
                let top_left = Vec2::new(
                    (col * tile_w) as f32,
                    world_h - (row * tile_h) as f32,
                );
                let (sx, sy) = world_to_screen_f32(top_left, camera, viewport);
                let dst = ScreenRect::from_edges(
                    sx,
                    sy,
                    sx + tile_w as f32 * zoom,
                    sy + tile_h as f32 * zoom,
                );
                let image = tileset_cache
                    .get(&tileset.image_path)
                    .and_then(Option::as_ref);
                match (image, tileset.source_rect(local_id)) {
                    (Some(image), Some(source)) => blit_region(canvas, image, source, dst),
                    _ => canvas.fill_rect(
                        dst.left,
                        dst.top,
                        dst.width(),
                        dst.height(),
                        TILE_FALLBACK_COLORS[gid as usize % TILE_FALLBACK_COLORS.len()],
                    ),
                }
            }
        }
    }
}

fn draw_sprite_instance(
    canvas: &mut Canvas<'_>,
    sprite: &SpriteInstance,
    camera: &Camera2D,
    viewport: Viewport,
    assets: &mut SpriteAssets<'_>,
) {
    let zoom = camera.effective_zoom();
    let (cx, cy) = world_to_screen_f32(sprite.position, camera, viewport);
    let image = match &sprite.renderable {
        RenderableKind::Sprite(key) => assets.resolve(key),
        RenderableKind::Placeholder(_) => None,
    };
    match image {
        Some(image) => {
            let scale = normalized_scale(sprite.scale) * zoom;
            let w = image.width as f32 * scale;
            let h = image.height as f32 * scale;
            let dst = ScreenRect::from_edges(cx - w * 0.5, cy - h * 0.5, cx + w * 0.5, cy + h * 0.5);
            blit_region(canvas, image, (0, 0, image.width, image.height), dst);
        }
        None => {
            let color = match sprite.renderable {
                RenderableKind::Placeholder(color) => color,
                RenderableKind::Sprite(_) => [220, 220, 240, 255],
            };
            let w = sprite.size.x * zoom;
            let h = sprite.size.y * zoom;
            let dst = ScreenRect::from_edges(cx - w * 0.5, cy - h * 0.5, cx + w * 0.5, cy + h * 0.5);
            canvas.blend_rect(dst.left, dst.top, dst.width(), dst.height(), color);
        }
    }
}

fn draw_hud(
    canvas: &mut Canvas<'_>,
    hud: &HudView,
    camera: &Camera2D,
    viewport: Viewport,
    assets: &mut SpriteAssets<'_>,
) {
    if hud.fade_alpha > 0 {
        canvas.blend_rect(
            0,
            0,
            viewport.width as i32,
            viewport.height as i32,
            [0, 0, 0, hud.fade_alpha],
        );
    }
    if let Some(prompt) = &hud.prompt {
        draw_prompt_bubble(canvas, prompt, camera, viewport);
    }
    if let Some(dialogue) = &hud.dialogue {
        draw_dialogue_panel(canvas, dialogue);
    }
    if let Some(inventory) = &hud.inventory {
        draw_inventory_panel(canvas, inventory, assets);
    }
}

fn draw_prompt_bubble(
    canvas: &mut Canvas<'_>,
    prompt: &PromptView,
    camera: &Camera2D,
    viewport: Viewport,
) {
    let (ax, ay) = world_to_screen_f32(prompt.anchor, camera, viewport);
    let center_x = ax.round() as i32;
    let center_y = ay.round() as i32 - BUBBLE_OFFSET_PX;
    let width = text_width_px(&prompt.text) + BUBBLE_PADDING_PX * 2;
    canvas.blend_rect(
        center_x - width / 2,
        center_y - BUBBLE_HEIGHT_PX / 2,
        width,
        BUBBLE_HEIGHT_PX,
        BUBBLE_COLOR,
    );
    let glyph_h = GLYPH_HEIGHT * TEXT_SCALE;
    draw_text_centered(canvas, center_x, center_y - glyph_h / 2, &prompt.text, TEXT_COLOR);
}

/// Panel geometry `(x, top, width, height)` for a viewport; the history
/// region is the panel height minus 80 px of input and padding.
fn dialogue_panel_rect(width: u32, height: u32) -> (i32, i32, i32, i32) {
    let panel_w = width as i32 - DIALOGUE_MARGIN_PX * 2;
    let panel_h = (height as f32 * DIALOGUE_HEIGHT_RATIO) as i32;
    let top = height as i32 - DIALOGUE_MARGIN_PX - panel_h;
    (DIALOGUE_MARGIN_PX, top, panel_w, panel_h)
}

fn draw_dialogue_panel(canvas: &mut Canvas<'_>, panel: &DialoguePanelView) {
    let (x, top, w, h) = dialogue_panel_rect(canvas.width(), canvas.height());
    if w <= 0 || h <= 0 {
        return;
    }
    canvas.blend_rect(x, top, w, h, DIALOGUE_BG_COLOR);

    let input_top = top + h - INPUT_BOX_BOTTOM_PX - INPUT_BOX_HEIGHT_PX;
    let input_x = x + INPUT_BOX_INSET_X_PX;
    let input_w = w - INPUT_BOX_INSET_X_PX * 2;
    canvas.outline_rect(input_x, input_top, input_w, INPUT_BOX_HEIGHT_PX, 2, TEXT_COLOR);
    let glyph_h = GLYPH_HEIGHT * TEXT_SCALE;
    let input_text_y = input_top + (INPUT_BOX_HEIGHT_PX - glyph_h) / 2;
    if panel.waiting_for_reply {
        draw_text(canvas, input_x + 10, input_text_y, "...", TEXT_DIM_COLOR);
    } else {
        let visible_input = tail_fitting(&panel.input, input_w - 20);
        draw_text(
            canvas,
            input_x + 10,
            input_text_y,
            &format!("{visible_input}_"),
            TEXT_COLOR,
        );
    }

    let line_height = panel.line_height_px.max(1) as i32;
    let mut y = top + DIALOGUE_HISTORY_TOP_PAD_PX;
    for line in &panel.lines {
        if y + glyph_h > input_top {
            break;
        }
        draw_text(canvas, x + DIALOGUE_TEXT_INSET_PX, y, line, TEXT_COLOR);
        y += line_height;
    }
}

/// Longest suffix of `text` whose rendered width fits in `max_width_px`,
/// leaving one glyph for the caret.
fn tail_fitting(text: &str, max_width_px: i32) -> &str {
    let max_chars = (max_width_px / super::font::GLYPH_ADVANCE_PX - 1).max(0) as usize;
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((index, _)) => &text[index..],
        None => "",
    }
}

fn draw_inventory_panel(
    canvas: &mut Canvas<'_>,
    panel: &InventoryPanelView,
    assets: &mut SpriteAssets<'_>,
) {
    let (w, h) = INVENTORY_PANEL_SIZE;
    let x = (canvas.width() as i32 - w) / 2;
    let y = (canvas.height() as i32 - h) / 2;
    canvas.blend_rect(x, y, w, h, INVENTORY_BG_COLOR);
    canvas.outline_rect(x, y, w, h, 3, TEXT_COLOR);
    draw_text_centered(canvas, x + w / 2, y + 24, &panel.title, TEXT_COLOR);

    if panel.rows.is_empty() {
        draw_text_centered(canvas, x + w / 2, y + h / 2, &panel.empty_label, TEXT_DIM_COLOR);
        return;
    }

    let slot = INVENTORY_SLOT_PX;
    let stride = slot + INVENTORY_SLOT_PAD_PX;
    for (index, row) in panel.rows.iter().enumerate() {
        let col = index as i32 % INVENTORY_COLUMNS;
        let line = index as i32 / INVENTORY_COLUMNS;
        let sx = x + 40 + col * stride;
        let sy = y + 70 + line * (stride + 20);
        if sy + slot > y + h {
            break;
        }
        canvas.blend_rect(sx, sy, slot, slot, INVENTORY_SLOT_COLOR);
        canvas.outline_rect(sx, sy, slot, slot, 2, TEXT_COLOR);

        let icon = row.icon.as_deref().and_then(|key| assets.resolve(key));
        if let Some(icon) = icon {
            let fit = (slot as f32 * 0.8) / icon.width.max(icon.height) as f32;
            let iw = icon.width as f32 * fit;
            let ih = icon.height as f32 * fit;
            let cx = (sx + slot / 2) as f32;
            let cy = (sy + slot / 2) as f32;
            let dst = ScreenRect::from_edges(cx - iw * 0.5, cy - ih * 0.5, cx + iw * 0.5, cy + ih * 0.5);
            blit_region(canvas, icon, (0, 0, icon.width, icon.height), dst);
        }

        let quantity = row.quantity.to_string();
        draw_text(
            canvas,
            sx + slot - 4 - text_width_px(&quantity),
            sy + slot - 4 - GLYPH_HEIGHT * TEXT_SCALE,
            &quantity,
            TEXT_COLOR,
        );
        let label = tail_fitting_head(&row.label, stride - 4);
        draw_text_centered(canvas, sx + slot / 2, sy + slot + 6, label, TEXT_DIM_COLOR);
    }
}

fn tail_fitting_head(text: &str, max_width_px: i32) -> &str {
    let max_chars = (max_width_px / super::font::GLYPH_ADVANCE_PX).max(0) as usize;
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRect {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl ScreenRect {
    fn from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: left.round() as i32,
            top: top.round() as i32,
            right: right.round() as i32,
            bottom: bottom.round() as i32,
        }
    }

    fn width(&self) -> i32 {
        self.right - self.left
    }

    fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Nearest-neighbour scaled copy of `source` (x, y, w, h) into `dst`,
/// alpha-blended, clipped to the canvas.
fn blit_region(
    canvas: &mut Canvas<'_>,
    image: &LoadedImage,
    source: (u32, u32, u32, u32),
    dst: ScreenRect,
) {
    let (src_x, src_y, src_w, src_h) = source;
    if !image.is_well_formed() || src_w == 0 || src_h == 0 {
        return;
    }
    if src_x + src_w > image.width || src_y + src_h > image.height {
        return;
    }
    let dst_w = dst.width();
    let dst_h = dst.height();
    if dst_w <= 0 || dst_h <= 0 {
        return;
    }

    let draw_left = dst.left.max(0);
    let draw_top = dst.top.max(0);
    let draw_right = dst.right.min(canvas.width() as i32);
    let draw_bottom = dst.bottom.min(canvas.height() as i32);
    let step_x = src_w as f32 / dst_w as f32;
    let step_y = src_h as f32 / dst_h as f32;

    for out_y in draw_top..draw_bottom {
        let v = (((out_y - dst.top) as f32 * step_y) as u32).min(src_h - 1) + src_y;
        let row_offset = v as usize * image.width as usize * 4;
        for out_x in draw_left..draw_right {
            let u = (((out_x - dst.left) as f32 * step_x) as u32).min(src_w - 1) + src_x;
            let offset = row_offset + u as usize * 4;
            let color = [
                image.rgba[offset],
                image.rgba[offset + 1],
                image.rgba[offset + 2],
                image.rgba[offset + 3],
            ];
            canvas.blend_pixel(out_x, out_y, color);
        }
    }
}

fn normalized_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn debug_rect_color(kind: DebugRectKind) -> [u8; 4] {
    match kind {
        DebugRectKind::Wall => [255, 80, 80, 255],
        DebugRectKind::Transition => [80, 255, 120, 255],
        DebugRectKind::Item => [255, 210, 70, 255],
        DebugRectKind::NpcZone => [80, 200, 255, 255],
    }
}

fn load_image_rgba(path: &Path) -> Result<LoadedImage, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedImage {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_missing_once(warned: &mut HashSet<String>, key: &str, path: Option<&Path>, reason: &str) {
    if !warned.insert(key.to_string()) {
        return;
    }
    let path_display = path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        asset = key,
        path = %path_display,
        reason = reason,
        "renderer_asset_load_failed_using_placeholder"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite_at(y: f32) -> SpriteInstance {
        SpriteInstance {
            position: Vec2::new(0.0, y),
            size: Vec2::new(8.0, 8.0),
            scale: 1.0,
            renderable: RenderableKind::Placeholder([1, 2, 3, 255]),
        }
    }

    fn checker_image() -> LoadedImage {
        LoadedImage {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 0, 255, 255],
        }
    }

    #[test]
    fn sprites_higher_on_screen_draw_first() {
        let sprites = vec![sprite_at(10.0), sprite_at(50.0), sprite_at(30.0)];
        let order: Vec<f32> = sorted_back_to_front(&sprites)
            .iter()
            .map(|sprite| sprite.position.y)
            .collect();
        assert_eq!(order, vec![50.0, 30.0, 10.0]);
    }

    #[test]
    fn dialogue_panel_matches_layout_heuristic() {
        let (x, top, w, h) = dialogue_panel_rect(1280, 720);
        assert_eq!((x, w, h), (50, 1180, 288));
        assert_eq!(top + h, 720 - 50);
    }

    #[test]
    fn tail_fitting_keeps_end_of_long_input() {
        let advance = super::super::font::GLYPH_ADVANCE_PX;
        assert_eq!(tail_fitting("abcdef", advance * 4), "def");
        assert_eq!(tail_fitting("ab", advance * 4), "ab");
        assert_eq!(tail_fitting_head("éclair", advance * 3), "écl");
    }

    #[test]
    fn blit_scales_nearest_neighbour_and_clips() {
        let mut frame = vec![0u8; 4 * 2 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 2);
        let dst = ScreenRect {
            left: 0,
            top: 0,
            right: 4,
            bottom: 2,
        };
        blit_region(&mut canvas, &checker_image(), (0, 0, 2, 1), dst);

        assert_eq!(&frame[0..4], &[255, 0, 0, 255]);
        assert_eq!(&frame[4..8], &[255, 0, 0, 255]);
        assert_eq!(&frame[8..12], &[0, 0, 255, 255]);
        assert_eq!(&frame[28..32], &[0, 0, 255, 255]);
    }

    #[test]
    fn blit_rejects_source_outside_image() {
        let mut frame = vec![0u8; 4];
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        let dst = ScreenRect {
            left: 0,
            top: 0,
            right: 1,
            bottom: 1,
        };
        blit_region(&mut canvas, &checker_image(), (1, 0, 2, 1), dst);
        assert_eq!(frame, vec![0u8; 4]);
    }

    #[test]
    fn missing_sprite_is_cached_as_absent_and_warned_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = HashMap::new();
        let mut warned = HashSet::new();
        let mut assets = SpriteAssets {
            cache: &mut cache,
            warned: &mut warned,
            asset_root: dir.path(),
        };

        assert!(assets.resolve("npcs/maire").is_none());
        assert!(assets.resolve("npcs/maire").is_none());
        assert!(assets.resolve("../escape").is_none());
        assert_eq!(warned.len(), 2);
        assert_eq!(cache.len(), 2);
    }
}
