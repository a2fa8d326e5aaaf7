mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{world_to_screen_px, Renderer, Viewport};
pub use scene::{
    Camera2D, DebugRect, DebugRectKind, DialoguePanelView, HudView, InputSnapshot,
    InventoryPanelView, InventoryRow, PromptView, RenderableKind, Scene, SceneCommand, SceneWorld,
    SpriteInstance, Tilemap, TilemapError, TilesetRef, Vec2,
};
