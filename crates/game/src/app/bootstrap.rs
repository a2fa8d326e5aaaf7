use engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::agent::{api_key_from_env, reset_all_memories, AgentError, DispatchMode, NpcAgentFactory};
use super::config::{ConfigError, GameConfig};
use super::gameplay::{
    load_quest_catalog, scan_world, validate_catalog, MapSettingsTable, RpgScene, SceneServices,
    TmxMapLoader,
};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Paths(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to set up NPC agents: {0}")]
    Agents(#[from] AgentError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "startup");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "app_paths_resolved");
    let config = GameConfig::load(&paths.config_dir)?;

    if config.reset_npc_memories {
        reset_all_memories(&paths.npc_dir);
    }

    let world = scan_world(&paths.maps_dir);
    let quests = load_quest_catalog(&paths.config_dir);
    let issues = validate_catalog(&quests, &world);
    info!(
        quests = quests.len(),
        items = world.item_ids.len(),
        npcs = world.npc_names.len(),
        issues = issues.len(),
        "quest_catalog_loaded"
    );

    let api_key = match api_key_from_env(&config.llm.api_key_env) {
        Ok(key) => Some(key),
        Err(error) => {
            warn!(error = %error, "llm_api_key_missing_using_offline_replies");
            None
        }
    };
    let agents = NpcAgentFactory::new(paths.npc_dir.clone(), config.llm.clone(), api_key)?;

    let services = SceneServices {
        maps: Box::new(TmxMapLoader::new(paths.maps_dir.clone())),
        agents: Box::new(agents),
        map_settings: MapSettingsTable::load(&paths.config_dir),
        quests,
        dispatch: DispatchMode::Thread,
    };
    let scene = RpgScene::new(&config, services);

    let loop_config = LoopConfig {
        window_title: config.window.title.clone(),
        window_width: config.window.width,
        window_height: config.window.height,
        max_render_fps: config.window.max_render_fps,
        asset_root: paths.assets_dir.clone(),
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config: loop_config,
        scene: Box::new(scene),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
