mod camera;
mod dialogue;
mod geometry;
mod interaction;
mod inventory;
mod map_settings;
mod movement;
mod player;
mod quest;
mod relations;
pub(crate) mod roster;
mod scene;
mod text_layout;
mod transition;
mod world;

pub(crate) use map_settings::MapSettingsTable;
pub(crate) use quest::{load_quest_catalog, validate_catalog};
pub(crate) use scene::{RpgScene, SceneServices};
pub(crate) use world::{scan_world, TmxMapLoader};

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
