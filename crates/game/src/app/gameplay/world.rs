use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use engine::{load_tmx, TiledError, TiledMap, TiledObject, Tilemap, TilemapError, Vec2};
use thiserror::Error;
use tracing::warn;

use super::geometry::{Rect, Zone};
use super::roster::roster_entry;

const COLLISION_GROUP: &str = "Collision";
const TRANSITIONS_GROUP: &str = "Transitions";
const NPCS_GROUP: &str = "NPCs";
const ITEMS_GROUP: &str = "Items";
const SPAWN_GROUP: &str = "Spawn";

const DEFAULT_NPC_SCALE: f32 = 0.10;
/// NPC interaction square side, per unit of NPC scale.
const NPC_ZONE_SIDE_PER_SCALE: f32 = 400.0;
const DEFAULT_ITEM_SCALE: f32 = 0.8;
/// Pickup box side for point items, per unit of item scale.
const POINT_ITEM_SIDE_PER_SCALE: f32 = 32.0;
const UNKNOWN_ITEM_ID: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Wall {
    pub(crate) rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransitionZone {
    pub(crate) rect: Rect,
    pub(crate) target_map: String,
    pub(crate) target_spawn: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ItemPickup {
    pub(crate) object_id: u32,
    pub(crate) item_id: String,
    pub(crate) rect: Rect,
    pub(crate) scale: f32,
    pub(crate) sprite: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NpcPlacement {
    /// Object name as placed on the map; the dialogue label derives from it.
    pub(crate) name: String,
    pub(crate) position: Vec2,
    pub(crate) scale: f32,
    pub(crate) sprite: String,
    pub(crate) zone: Rect,
}

impl Zone for Wall {
    fn rect(&self) -> Rect {
        self.rect
    }
}

impl Zone for TransitionZone {
    fn rect(&self) -> Rect {
        self.rect
    }
}

impl Zone for ItemPickup {
    fn rect(&self) -> Rect {
        self.rect
    }
}

impl Zone for NpcPlacement {
    fn rect(&self) -> Rect {
        self.zone
    }
}

/// One loaded map. Immutable once built; a map change replaces it whole.
#[derive(Debug, Clone)]
pub(crate) struct MapData {
    pub(crate) name: String,
    pub(crate) world_size: Vec2,
    pub(crate) walls: Vec<Wall>,
    pub(crate) transitions: Vec<TransitionZone>,
    pub(crate) items: Vec<ItemPickup>,
    pub(crate) npcs: Vec<NpcPlacement>,
    /// Requested spawn, else the first spawn, else none.
    pub(crate) spawn: Option<Vec2>,
    pub(crate) tilemap: Option<Tilemap>,
}

impl MapData {
    pub(crate) fn empty(name: &str, world_size: Vec2) -> Self {
        Self {
            name: name.to_string(),
            world_size,
            walls: Vec::new(),
            transitions: Vec::new(),
            items: Vec::new(),
            npcs: Vec::new(),
            spawn: None,
            tilemap: None,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum MapLoadError {
    #[error("map '{name}' not found at {path}")]
    NotFound { name: String, path: PathBuf },
    #[error(transparent)]
    Tiled(#[from] TiledError),
    #[error("map '{name}' has inconsistent tile layers: {source}")]
    Tilemap {
        name: String,
        #[source]
        source: TilemapError,
    },
}

pub(crate) trait MapLoader {
    fn load_map(&self, name: &str, spawn: &str) -> Result<MapData, MapLoadError>;
}

pub(crate) struct TmxMapLoader {
    maps_dir: PathBuf,
}

impl TmxMapLoader {
    pub(crate) fn new(maps_dir: PathBuf) -> Self {
        Self { maps_dir }
    }

    fn map_path(&self, name: &str) -> PathBuf {
        if name.to_lowercase().ends_with(".tmx") {
            self.maps_dir.join(name)
        } else {
            self.maps_dir.join(format!("{name}.tmx"))
        }
    }
}

impl MapLoader for TmxMapLoader {
    fn load_map(&self, name: &str, spawn: &str) -> Result<MapData, MapLoadError> {
        let path = self.map_path(name);
        if !path.is_file() {
            return Err(MapLoadError::NotFound {
                name: name.to_string(),
                path,
            });
        }
        let tiled = load_tmx(&path)?;
        let display_name = name.strip_suffix(".tmx").unwrap_or(name);
        map_from_tiled(display_name, &tiled, spawn)
    }
}

pub(crate) fn map_from_tiled(
    name: &str,
    tiled: &TiledMap,
    spawn: &str,
) -> Result<MapData, MapLoadError> {
    let world_size = tiled.pixel_size();
    let height = world_size.y;
    let tilemap = tiled
        .to_tilemap()
        .map_err(|source| MapLoadError::Tilemap {
            name: name.to_string(),
            source,
        })?;

    let mut map = MapData::empty(name, world_size);
    map.tilemap = Some(tilemap);

    for object in group_objects(tiled, COLLISION_GROUP) {
        let (center, size) = object.world_center_and_size(height);
        map.walls.push(Wall {
            rect: Rect::new(center, size),
        });
    }

    for object in group_objects(tiled, TRANSITIONS_GROUP) {
        let target_map = non_empty_property(object, "target_map");
        let target_spawn = non_empty_property(object, "target_spawn");
        let (Some(target_map), Some(target_spawn)) = (target_map, target_spawn) else {
            warn!(
                map = %name,
                object_id = object.id,
                "transition_zone_missing_target"
            );
            continue;
        };
        let (center, size) = object.world_center_and_size(height);
        map.transitions.push(TransitionZone {
            rect: Rect::new(center, size),
            target_map: target_map.to_string(),
            target_spawn: target_spawn.to_string(),
        });
    }

    for object in group_objects(tiled, NPCS_GROUP) {
        if let Some(npc) = npc_from_object(name, object, height) {
            map.npcs.push(npc);
        }
    }

    for object in group_objects(tiled, ITEMS_GROUP) {
        map.items.push(item_from_object(name, object, height));
    }

    let spawns: Vec<&TiledObject> = group_objects(tiled, SPAWN_GROUP).collect();
    map.spawn = spawns
        .iter()
        .find(|object| object.name == spawn)
        .or_else(|| spawns.first())
        .map(|object| object.world_center_and_size(height).0);

    Ok(map)
}

fn group_objects<'a>(tiled: &'a TiledMap, group: &str) -> impl Iterator<Item = &'a TiledObject> {
    tiled
        .object_group(group)
        .into_iter()
        .flat_map(|group| group.objects.iter())
}

fn non_empty_property<'a>(object: &'a TiledObject, name: &str) -> Option<&'a str> {
    object
        .property(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn scale_property(map: &str, object: &TiledObject, default: f32) -> f32 {
    let Some(raw) = object.property("scale") else {
        return default;
    };
    match raw.trim().parse::<f32>() {
        Ok(scale) if scale.is_finite() && scale > 0.0 => scale,
        _ => {
            warn!(map = %map, object_id = object.id, value = %raw, "object_scale_invalid_using_default");
            default
        }
    }
}

fn npc_from_object(map: &str, object: &TiledObject, height: f32) -> Option<NpcPlacement> {
    let sprite = match non_empty_property(object, "sprite") {
        Some(sprite) => sprite.to_string(),
        None => match roster_entry(&object.name) {
            Some(entry) => entry.sprite.to_string(),
            None => {
                warn!(map = %map, npc = %object.name, "npc_not_in_roster_skipped");
                return None;
            }
        },
    };
    let scale = scale_property(map, object, DEFAULT_NPC_SCALE);
    let (position, _) = object.world_center_and_size(height);
    Some(NpcPlacement {
        name: object.name.clone(),
        position,
        scale,
        sprite,
        zone: Rect::square(position, scale * NPC_ZONE_SIDE_PER_SCALE),
    })
}

fn item_from_object(map: &str, object: &TiledObject, height: f32) -> ItemPickup {
    let item_id = if object.name.trim().is_empty() {
        UNKNOWN_ITEM_ID.to_string()
    } else {
        object.name.trim().to_string()
    };
    let scale = scale_property(map, object, DEFAULT_ITEM_SCALE);
    let (center, size) = object.world_center_and_size(height);
    let size = if size.x > 0.0 && size.y > 0.0 {
        size
    } else {
        let side = POINT_ITEM_SIDE_PER_SCALE * scale;
        Vec2::new(side, side)
    };
    let sprite = non_empty_property(object, "sprite")
        .map(str::to_string)
        .or_else(|| non_empty_property(object, "texture").map(texture_to_sprite_key))
        .unwrap_or_else(|| format!("objet/{item_id}"));
    ItemPickup {
        object_id: object.id,
        item_id,
        rect: Rect::new(center, size),
        scale,
        sprite,
    }
}

/// `assets/objet/planche.png` -> `objet/planche`.
fn texture_to_sprite_key(texture: &str) -> String {
    let key = texture.trim_start_matches("./");
    let key = key.strip_prefix("assets/").unwrap_or(key);
    let key = key.strip_suffix(".png").unwrap_or(key);
    key.to_string()
}

/// Item ids and NPC names placed across every map in a directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct WorldCatalog {
    pub(crate) item_ids: BTreeSet<String>,
    pub(crate) npc_names: BTreeSet<String>,
}

pub(crate) fn scan_world(maps_dir: &Path) -> WorldCatalog {
    let mut catalog = WorldCatalog::default();
    let entries = match fs::read_dir(maps_dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(path = %maps_dir.display(), error = %error, "world_scan_failed");
            return catalog;
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|extension| extension.eq_ignore_ascii_case("tmx"))
        })
        .collect();
    paths.sort();

    for path in paths {
        match load_tmx(&path) {
            Ok(tiled) => {
                for object in group_objects(&tiled, ITEMS_GROUP) {
                    let id = object.name.trim();
                    catalog.item_ids.insert(if id.is_empty() {
                        UNKNOWN_ITEM_ID.to_string()
                    } else {
                        id.to_string()
                    });
                }
                for object in group_objects(&tiled, NPCS_GROUP) {
                    catalog.npc_names.insert(object.name.clone());
                }
            }
            Err(error) => warn!(error = %error, "world_scan_map_skipped"),
        }
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::parse_tmx;

    const SQUARE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="10" height="10" tilewidth="32" tileheight="32" infinite="0">
 <layer id="1" name="sol" width="10" height="10">
  <data encoding="csv">
0,0,0,0,0,0,0,0,0,0,
0,0,0,0,0,0,0,0,0,0,
0,0,0,0,0,0,0,0,0,0,
0,0,0,0,0,0,0,0,0,0,
0,0,0,0,0,0,0,0,0,0,
0,0,0,0,0,0,0,0,0,0,
0,0,0,0,0,0,0,0,0,0,
0,0,0,0,0,0,0,0,0,0,
0,0,0,0,0,0,0,0,0,0,
0,0,0,0,0,0,0,0,0,0
</data>
 </layer>
 <objectgroup id="2" name="Collision">
  <object id="1" x="0" y="0" width="320" height="32"/>
 </objectgroup>
 <objectgroup id="3" name="Transitions">
  <object id="2" name="porte" x="160" y="288" width="32" height="32">
   <properties>
    <property name="target_map" value="maison_maire"/>
    <property name="target_spawn" value="entree"/>
   </properties>
  </object>
  <object id="3" name="cassee" x="0" y="288" width="32" height="32">
   <properties>
    <property name="target_map" value="nulle_part"/>
   </properties>
  </object>
 </objectgroup>
 <objectgroup id="4" name="NPCs">
  <object id="4" name="maire" x="100" y="100">
   <point/>
  </object>
  <object id="5" name="passant" x="200" y="200">
   <point/>
  </object>
  <object id="6" name="la_comtesse" x="50" y="50">
   <properties>
    <property name="scale" value="0.2"/>
   </properties>
   <point/>
  </object>
 </objectgroup>
 <objectgroup id="5" name="Items">
  <object id="7" name="planche" x="64" y="64">
   <point/>
  </object>
  <object id="8" x="96" y="96" width="16" height="16">
   <properties>
    <property name="texture" value="assets/objet/caisse.png"/>
   </properties>
  </object>
 </objectgroup>
 <objectgroup id="6" name="Spawn">
  <object id="9" name="spawn_player" x="16" y="304">
   <point/>
  </object>
  <object id="10" name="entree" x="160" y="160">
   <point/>
  </object>
 </objectgroup>
</map>
"#;

    fn square_map(spawn: &str) -> MapData {
        let tiled = parse_tmx(SQUARE, Path::new("village.tmx")).expect("parse");
        map_from_tiled("village", &tiled, spawn).expect("convert")
    }

    #[test]
    fn walls_and_transitions_convert_to_y_up_zones() {
        let map = square_map("spawn_player");

        assert_eq!(map.world_size, Vec2::new(320.0, 320.0));
        assert_eq!(map.walls.len(), 1);
        assert_eq!(map.walls[0].rect.center, Vec2::new(160.0, 304.0));
        assert_eq!(map.transitions.len(), 1, "zone without spawn is skipped");
        assert_eq!(map.transitions[0].target_map, "maison_maire");
        assert_eq!(map.transitions[0].rect.center, Vec2::new(176.0, 16.0));
    }

    #[test]
    fn npcs_outside_roster_are_skipped_and_zone_follows_scale() {
        let map = square_map("spawn_player");

        let names: Vec<&str> = map.npcs.iter().map(|npc| npc.name.as_str()).collect();
        assert_eq!(names, vec!["maire", "la_comtesse"]);
        assert_eq!(map.npcs[0].zone.size, Vec2::new(40.0, 40.0));
        assert_eq!(map.npcs[0].position, Vec2::new(100.0, 220.0));
        assert_eq!(map.npcs[1].sprite, "npcs/comtesse");
        assert_eq!(map.npcs[1].zone.size, Vec2::new(80.0, 80.0));
    }

    #[test]
    fn items_default_id_sprite_and_size() {
        let map = square_map("spawn_player");

        assert_eq!(map.items[0].item_id, "planche");
        assert_eq!(map.items[0].sprite, "objet/planche");
        assert!((map.items[0].rect.size.x - 25.6).abs() < 1e-4);
        assert_eq!(map.items[1].item_id, "unknown");
        assert_eq!(map.items[1].sprite, "objet/caisse");
        assert_eq!(map.items[1].rect.size, Vec2::new(16.0, 16.0));
    }

    #[test]
    fn spawn_by_name_then_first() {
        assert_eq!(square_map("entree").spawn, Some(Vec2::new(160.0, 160.0)));
        assert_eq!(square_map("absent").spawn, Some(Vec2::new(16.0, 16.0)));
    }

    #[test]
    fn loader_reports_missing_map() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loader = TmxMapLoader::new(dir.path().to_path_buf());

        match loader.load_map("donjon", "spawn") {
            Err(MapLoadError::NotFound { name, path }) => {
                assert_eq!(name, "donjon");
                assert!(path.ends_with("donjon.tmx"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn loader_and_scan_read_maps_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("village.tmx"), SQUARE).expect("write map");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write notes");
        fs::write(dir.path().join("casse.tmx"), "<map").expect("write broken");

        let loader = TmxMapLoader::new(dir.path().to_path_buf());
        let map = loader.load_map("village.tmx", "entree").expect("load");
        assert_eq!(map.name, "village");

        let catalog = scan_world(dir.path());
        assert!(catalog.item_ids.contains("planche"));
        assert!(catalog.item_ids.contains("unknown"));
        assert!(catalog.npc_names.contains("passant"));
    }
}
