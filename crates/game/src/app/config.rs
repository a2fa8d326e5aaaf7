use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub(crate) const START_MAP_ENV_VAR: &str = "MEDIEVAL_RPG_START_MAP";
pub(crate) const DEBUG_COLLISION_ENV_VAR: &str = "MEDIEVAL_RPG_DEBUG_COLLISION";
pub(crate) const KEEP_NPC_MEMORY_ENV_VAR: &str = "MEDIEVAL_RPG_KEEP_NPC_MEMORY";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path} at {location}: {message}")]
    Parse {
        path: PathBuf,
        location: String,
        message: String,
    },
}

/// Reads and deserializes a JSON file. A missing file is `Ok(None)`.
pub(crate) fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_json_str(&raw, path).map(Some)
}

pub(crate) fn parse_json_str<T: DeserializeOwned>(raw: &str, path: &Path) -> Result<T, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|error| {
        let location = error.path().to_string();
        let source = error.into_inner();
        ConfigError::Parse {
            path: path.to_path_buf(),
            location: if location.is_empty() {
                ".".to_string()
            } else {
                location
            },
            message: source.to_string(),
        }
    })
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowConfig {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) max_render_fps: Option<u32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "RPG Medieval".to_string(),
            width: 1280,
            height: 720,
            max_render_fps: Some(60),
        }
    }
}

/// Pixel metrics behind the dialogue wrap and scroll heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LayoutConfig {
    pub(crate) font_size_px: f32,
    pub(crate) char_width_ratio: f32,
    pub(crate) line_height_px: u32,
    pub(crate) box_margin_px: u32,
    pub(crate) box_height_ratio: f32,
    pub(crate) text_inset_px: u32,
    pub(crate) input_reserve_px: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size_px: 20.0,
            char_width_ratio: 0.6,
            line_height_px: 24,
            box_margin_px: 50,
            box_height_ratio: 0.40,
            text_inset_px: 20,
            input_reserve_px: 80,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LlmConfig {
    pub(crate) endpoint: String,
    pub(crate) model: String,
    pub(crate) temperature: f32,
    pub(crate) api_key_env: String,
    pub(crate) timeout_secs: u64,
    /// Language the NPCs answer in; spliced into the reply-format rule.
    pub(crate) language: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            api_key_env: "GROQ_KEY".to_string(),
            timeout_secs: 30,
            language: "français".to_string(),
        }
    }
}

impl LlmConfig {
    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) window: WindowConfig,
    pub(crate) start_map: String,
    pub(crate) start_spawn: String,
    /// Alpha units per fixed tick.
    pub(crate) fade_speed: f32,
    pub(crate) debug_collision: bool,
    pub(crate) reset_npc_memories: bool,
    pub(crate) layout: LayoutConfig,
    pub(crate) llm: LlmConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            start_map: "village".to_string(),
            start_spawn: "spawn_player".to_string(),
            fade_speed: 10.0,
            debug_collision: false,
            reset_npc_memories: true,
            layout: LayoutConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl GameConfig {
    /// `config/game.json` if present, defaults otherwise, then environment
    /// overrides. A file that exists but does not parse is an error.
    pub(crate) fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config =
            load_json_file::<GameConfig>(&config_dir.join("game.json"))?.unwrap_or_default();
        config.apply_env_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    pub(crate) fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(map) = lookup(START_MAP_ENV_VAR) {
            let map = map.trim();
            if !map.is_empty() {
                self.start_map = map.to_string();
            }
        }
        if let Some(raw) = lookup(DEBUG_COLLISION_ENV_VAR) {
            match parse_env_flag(&raw) {
                Some(flag) => self.debug_collision = flag,
                None => warn_invalid_flag(DEBUG_COLLISION_ENV_VAR, &raw),
            }
        }
        if let Some(raw) = lookup(KEEP_NPC_MEMORY_ENV_VAR) {
            match parse_env_flag(&raw) {
                Some(keep) => self.reset_npc_memories = !keep,
                None => warn_invalid_flag(KEEP_NPC_MEMORY_ENV_VAR, &raw),
            }
        }
    }
}

fn parse_env_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn warn_invalid_flag(env_var: &str, value: &str) {
    warn!(
        env_var,
        value, "invalid boolean env var value; keeping configured value"
    );
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_game_json_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = load_json_file::<GameConfig>(&dir.path().join("game.json")).expect("load");
        assert!(loaded.is_none());

        let config = GameConfig::default();
        assert_eq!(config.start_map, "village");
        assert_eq!(config.fade_speed, 10.0);
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn partial_game_json_keeps_unspecified_defaults() {
        let raw = r#"{ "start_map": "maison_maire", "llm": { "temperature": 0.2 } }"#;
        let config: GameConfig = parse_json_str(raw, Path::new("game.json")).expect("parse");

        assert_eq!(config.start_map, "maison_maire");
        assert_eq!(config.start_spawn, "spawn_player");
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.llm.api_key_env, "GROQ_KEY");
        assert_eq!(config.layout.line_height_px, 24);
    }

    #[test]
    fn parse_error_reports_json_path() {
        let raw = r#"{ "window": { "width": "wide" } }"#;
        let error = parse_json_str::<GameConfig>(raw, Path::new("game.json")).unwrap_err();

        match error {
            ConfigError::Parse { location, .. } => assert_eq!(location, "window.width"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{ "fade_sped": 5 }"#;
        assert!(parse_json_str::<GameConfig>(raw, Path::new("game.json")).is_err());
    }

    #[test]
    fn env_overrides_apply_and_bad_flags_are_ignored() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (START_MAP_ENV_VAR, " donjon "),
            (DEBUG_COLLISION_ENV_VAR, "yes"),
            (KEEP_NPC_MEMORY_ENV_VAR, "maybe"),
        ]);
        let mut config = GameConfig::default();
        config.apply_env_overrides(|name| vars.get(name).map(|value| value.to_string()));

        assert_eq!(config.start_map, "donjon");
        assert!(config.debug_collision);
        assert!(config.reset_npc_memories);
    }

    #[test]
    fn keep_memory_flag_disables_reset() {
        let mut config = GameConfig::default();
        config.apply_env_overrides(|name| {
            (name == KEEP_NPC_MEMORY_ENV_VAR).then(|| "1".to_string())
        });
        assert!(!config.reset_npc_memories);
    }
}
