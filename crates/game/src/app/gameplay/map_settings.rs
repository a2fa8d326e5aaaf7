use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::app::config::{load_json_file, ConfigError};

pub(crate) const MAP_SETTINGS_FILE: &str = "map_settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MapSettings {
    pub(crate) zoom: f32,
    pub(crate) player_scale: f32,
    /// Pixels per fixed tick.
    pub(crate) player_speed: f32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            player_scale: 1.1,
            player_speed: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapSettingsEntry {
    name: String,
    zoom: Option<f32>,
    player_scale: Option<f32>,
    player_speed: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MapSettingsFile {
    defaults: MapSettings,
    maps: Vec<MapSettingsEntry>,
}

/// Per-map camera zoom and player tuning, keyed by lowercased map name.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MapSettingsTable {
    defaults: MapSettings,
    entries: Vec<MapSettingsEntry>,
}

impl MapSettingsTable {
    /// Falls back to built-in defaults when the file is missing or invalid.
    pub(crate) fn load(config_dir: &Path) -> Self {
        let path = config_dir.join(MAP_SETTINGS_FILE);
        match Self::try_load(&path) {
            Ok(Some(table)) => table,
            Ok(None) => {
                warn!(path = %path.display(), "map_settings_missing_using_defaults");
                Self::default()
            }
            Err(error) => {
                warn!(error = %error, "map_settings_invalid_using_defaults");
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Option<Self>, ConfigError> {
        Ok(load_json_file::<MapSettingsFile>(path)?.map(Self::from_file))
    }

    fn from_file(file: MapSettingsFile) -> Self {
        let entries = file
            .maps
            .into_iter()
            .map(|entry| MapSettingsEntry {
                name: entry.name.trim().to_lowercase(),
                ..entry
            })
            .filter(|entry| !entry.name.is_empty())
            .collect();
        Self {
            defaults: file.defaults,
            entries,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_json(raw: &str) -> Result<Self, ConfigError> {
        crate::app::config::parse_json_str::<MapSettingsFile>(raw, Path::new(MAP_SETTINGS_FILE))
            .map(Self::from_file)
    }

    /// Exact name first, then the longest matching prefix; equal lengths
    /// resolve by declared order.
    pub(crate) fn lookup(&self, map_name: &str) -> MapSettings {
        let name = map_name.trim().to_lowercase();
        let exact = self.entries.iter().find(|entry| entry.name == name);
        let matched = exact.or_else(|| {
            self.entries
                .iter()
                .filter(|entry| name.starts_with(entry.name.as_str()))
                .fold(None, |best: Option<&MapSettingsEntry>, entry| match best {
                    Some(current) if current.name.len() >= entry.name.len() => Some(current),
                    _ => Some(entry),
                })
        });
        match matched {
            Some(entry) => MapSettings {
                zoom: entry.zoom.unwrap_or(self.defaults.zoom),
                player_scale: entry.player_scale.unwrap_or(self.defaults.player_scale),
                player_speed: entry.player_speed.unwrap_or(self.defaults.player_speed),
            },
            None => self.defaults,
        }
    }
}
