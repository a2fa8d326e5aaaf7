//! Orthogonal Tiled (`.tmx`) map loading.
//!
//! Only the pieces a top-down game needs are read: tile layers in CSV or XML
//! encoding, tilesets (inline or external `.tsx`), and object groups with
//! their shapes and custom properties.

mod parser;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::app::{Tilemap, TilemapError, TilesetRef, Vec2};

pub use parser::{load_tmx, parse_tmx};

/// Tile gids carry flip/rotation flags in their top four bits.
pub(crate) const GID_FLAGS_MASK: u32 = 0x0FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiledErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    MissingAttribute,
    InvalidValue,
    UnsupportedEncoding,
    UnsupportedInfinite,
    LayerSizeMismatch,
}

#[derive(Debug, Clone)]
pub struct TiledError {
    pub code: TiledErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for TiledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for TiledError {}

#[derive(Debug, Clone, PartialEq)]
pub struct TiledTileset {
    pub first_gid: u32,
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub spacing: u32,
    pub margin: u32,
    /// Resolved against the file that declared the image.
    pub image_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TiledTileLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    /// Row-major, top row first, flip flags stripped. `0` is empty.
    pub gids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectShape {
    Rectangle,
    Ellipse,
    Point,
    /// Vertices relative to the object's origin.
    Polygon(Vec<(f32, f32)>),
    Polyline(Vec<(f32, f32)>),
    /// Tile object; its origin is the bottom-left corner.
    Tile(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TiledObject {
    pub id: u32,
    pub name: String,
    pub class: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub shape: ObjectShape,
    pub properties: BTreeMap<String, String>,
}

impl TiledObject {
    /// Axis-aligned bounds in map pixels, y down: `(left, top, width, height)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        match &self.shape {
            ObjectShape::Rectangle | ObjectShape::Ellipse => {
                (self.x, self.y, self.width, self.height)
            }
            ObjectShape::Point => (self.x, self.y, 0.0, 0.0),
            ObjectShape::Tile(_) => (self.x, self.y - self.height, self.width, self.height),
            ObjectShape::Polygon(points) | ObjectShape::Polyline(points) => {
                if points.is_empty() {
                    return (self.x, self.y, 0.0, 0.0);
                }
                let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
                let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
                for (px, py) in points {
                    min_x = min_x.min(*px);
                    min_y = min_y.min(*py);
                    max_x = max_x.max(*px);
                    max_y = max_y.max(*py);
                }
                (self.x + min_x, self.y + min_y, max_x - min_x, max_y - min_y)
            }
        }
    }

    /// Center and size in world pixels with y up, for a map `map_height_px` tall.
    pub fn world_center_and_size(&self, map_height_px: f32) -> (Vec2, Vec2) {
        let (left, top, width, height) = self.bounds();
        let center = Vec2::new(left + width * 0.5, map_height_px - top - height * 0.5);
        (center, Vec2::new(width, height))
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TiledObjectGroup {
    pub name: String,
    pub objects: Vec<TiledObject>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TiledMap {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tilesets: Vec<TiledTileset>,
    pub layers: Vec<TiledTileLayer>,
    pub object_groups: Vec<TiledObjectGroup>,
}

impl TiledMap {
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(
            (self.width * self.tile_width) as f32,
            (self.height * self.tile_height) as f32,
        )
    }

    pub fn object_group(&self, name: &str) -> Option<&TiledObjectGroup> {
        self.object_groups.iter().find(|group| group.name == name)
    }

    /// Render model for the visible tile layers. Tilesets without a single
    /// backing image are left out; their gids draw as fallback colours.
    pub fn to_tilemap(&self) -> Result<Tilemap, TilemapError> {
        let tilesets = self
            .tilesets
            .iter()
            .filter_map(|tileset| {
                let image_path = tileset.image_path.clone()?;
                Some(TilesetRef {
                    first_gid: tileset.first_gid,
                    image_path,
                    tile_width: tileset.tile_width,
                    tile_height: tileset.tile_height,
                    columns: tileset.columns,
                    tile_count: tileset.tile_count,
                    spacing: tileset.spacing,
                    margin: tileset.margin,
                })
            })
            .collect();
        let layers = self
            .layers
            .iter()
            .filter(|layer| layer.visible)
            .map(|layer| layer.gids.clone())
            .collect();
        Tilemap::new(
            self.width,
            self.height,
            self.tile_width,
            self.tile_height,
            layers,
            tilesets,
        )
    }
}
