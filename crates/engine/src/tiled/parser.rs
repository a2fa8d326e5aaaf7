use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};

use super::{
    ObjectShape, SourceLocation, TiledError, TiledErrorCode, TiledMap, TiledObject,
    TiledObjectGroup, TiledTileLayer, TiledTileset, GID_FLAGS_MASK,
};

pub fn load_tmx(path: &Path) -> Result<TiledMap, TiledError> {
    let raw = fs::read_to_string(path).map_err(|error| read_error(path, error))?;
    parse_tmx(&raw, path)
}

/// Parses map XML. `path` locates external tilesets and images and is
/// reported in errors; it does not need to exist for maps with inline
/// tilesets.
pub fn parse_tmx(raw: &str, path: &Path) -> Result<TiledMap, TiledError> {
    let ctx = ParseCtx::parse(raw, path)?;
    let root = ctx.doc.root_element();
    if root.tag_name().name() != "map" {
        return Err(ctx.error_at(
            TiledErrorCode::InvalidRoot,
            "root element must be <map>".to_string(),
            root,
        ));
    }
    if ctx.optional_attr::<u8>(root, "infinite")?.unwrap_or(0) != 0 {
        return Err(ctx.error_at(
            TiledErrorCode::UnsupportedInfinite,
            "infinite maps are not supported; disable 'Infinite' in the map properties"
                .to_string(),
            root,
        ));
    }

    let mut map = TiledMap {
        width: ctx.required_attr(root, "width")?,
        height: ctx.required_attr(root, "height")?,
        tile_width: ctx.required_attr(root, "tilewidth")?,
        tile_height: ctx.required_attr(root, "tileheight")?,
        tilesets: Vec::new(),
        layers: Vec::new(),
        object_groups: Vec::new(),
    };

    for child in root.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "tileset" => map.tilesets.push(ctx.parse_tileset_ref(child)?),
            "layer" => map.layers.push(ctx.parse_tile_layer(child)?),
            "objectgroup" => map.object_groups.push(ctx.parse_object_group(child)?),
            "group" => ctx.collect_group(child, &mut map)?,
            _ => {}
        }
    }
    map.tilesets.sort_by_key(|tileset| tileset.first_gid);
    Ok(map)
}

struct ParseCtx<'input> {
    doc: Document<'input>,
    file_path: PathBuf,
}

impl<'input> ParseCtx<'input> {
    fn parse(raw: &'input str, path: &Path) -> Result<Self, TiledError> {
        let doc = Document::parse(raw).map_err(|error| TiledError {
            code: TiledErrorCode::XmlMalformed,
            message: format!("malformed XML: {error}"),
            file_path: path.to_path_buf(),
            location: Some(SourceLocation {
                line: error.pos().row as usize,
                column: error.pos().col as usize,
            }),
        })?;
        Ok(Self {
            doc,
            file_path: path.to_path_buf(),
        })
    }

    fn base_dir(&self) -> &Path {
        self.file_path.parent().unwrap_or_else(|| Path::new(""))
    }

    fn error_at(&self, code: TiledErrorCode, message: String, node: Node<'_, '_>) -> TiledError {
        let pos = self.doc.text_pos_at(node.range().start);
        TiledError {
            code,
            message,
            file_path: self.file_path.clone(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn required_attr<T: FromStr>(&self, node: Node<'_, '_>, name: &str) -> Result<T, TiledError> {
        match self.optional_attr(node, name)? {
            Some(value) => Ok(value),
            None => Err(self.error_at(
                TiledErrorCode::MissingAttribute,
                format!("<{}> is missing attribute '{name}'", node.tag_name().name()),
                node,
            )),
        }
    }

    fn optional_attr<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<Option<T>, TiledError> {
        let Some(raw) = node.attribute(name) else {
            return Ok(None);
        };
        raw.trim().parse::<T>().map(Some).map_err(|_| {
            self.error_at(
                TiledErrorCode::InvalidValue,
                format!(
                    "attribute '{name}' on <{}> has invalid value '{raw}'",
                    node.tag_name().name()
                ),
                node,
            )
        })
    }

    /// Layer groups are flattened in document order.
    fn collect_group(&self, group: Node<'_, '_>, map: &mut TiledMap) -> Result<(), TiledError> {
        for child in group.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "layer" => map.layers.push(self.parse_tile_layer(child)?),
                "objectgroup" => map.object_groups.push(self.parse_object_group(child)?),
                "group" => self.collect_group(child, map)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_tileset_ref(&self, node: Node<'_, '_>) -> Result<TiledTileset, TiledError> {
        let first_gid: u32 = self.required_attr(node, "firstgid")?;
        match node.attribute("source") {
            Some(source) => {
                let tsx_path = self.base_dir().join(source);
                let raw = fs::read_to_string(&tsx_path).map_err(|error| read_error(&tsx_path, error))?;
                let tsx = ParseCtx::parse(&raw, &tsx_path)?;
                let root = tsx.doc.root_element();
                if root.tag_name().name() != "tileset" {
                    return Err(tsx.error_at(
                        TiledErrorCode::InvalidRoot,
                        "root element must be <tileset>".to_string(),
                        root,
                    ));
                }
                tsx.parse_tileset_body(root, first_gid)
            }
            None => self.parse_tileset_body(node, first_gid),
        }
    }

    fn parse_tileset_body(
        &self,
        node: Node<'_, '_>,
        first_gid: u32,
    ) -> Result<TiledTileset, TiledError> {
        let image = node
            .children()
            .find(|child| child.has_tag_name("image"));
        let image_path = match image {
            Some(image) => {
                let source: String = self.required_attr(image, "source")?;
                Some(self.base_dir().join(source))
            }
            None => None,
        };
        Ok(TiledTileset {
            first_gid,
            name: node.attribute("name").unwrap_or_default().to_string(),
            tile_width: self.required_attr(node, "tilewidth")?,
            tile_height: self.required_attr(node, "tileheight")?,
            tile_count: self.optional_attr(node, "tilecount")?.unwrap_or(0),
            columns: self.optional_attr(node, "columns")?.unwrap_or(0),
            spacing: self.optional_attr(node, "spacing")?.unwrap_or(0),
            margin: self.optional_attr(node, "margin")?.unwrap_or(0),
            image_path,
        })
    }

    fn parse_tile_layer(&self, node: Node<'_, '_>) -> Result<TiledTileLayer, TiledError> {
        let width: u32 = self.required_attr(node, "width")?;
        let height: u32 = self.required_attr(node, "height")?;
        let visible = self.optional_attr::<u8>(node, "visible")?.unwrap_or(1) != 0;
        let name = node.attribute("name").unwrap_or_default().to_string();
        let expected = width as usize * height as usize;

        let Some(data) = node.children().find(|child| child.has_tag_name("data")) else {
            return Ok(TiledTileLayer {
                name,
                width,
                height,
                visible,
                gids: vec![0; expected],
            });
        };
        if data.children().any(|child| child.has_tag_name("chunk")) {
            return Err(self.error_at(
                TiledErrorCode::UnsupportedInfinite,
                format!("layer '{name}' stores chunks; only finite maps are supported"),
                data,
            ));
        }

        let gids = match data.attribute("encoding") {
            Some("csv") => self.parse_csv_gids(data)?,
            None => data
                .children()
                .filter(|child| child.has_tag_name("tile"))
                .map(|tile| {
                    self.optional_attr::<u32>(tile, "gid")
                        .map(|gid| gid.unwrap_or(0) & GID_FLAGS_MASK)
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(self.error_at(
                    TiledErrorCode::UnsupportedEncoding,
                    format!(
                        "layer '{name}' uses '{other}' encoding; save the map with CSV layer format"
                    ),
                    data,
                ))
            }
        };

        if gids.len() != expected {
            return Err(self.error_at(
                TiledErrorCode::LayerSizeMismatch,
                format!(
                    "layer '{name}' has {} tiles, expected {expected}",
                    gids.len()
                ),
                data,
            ));
        }
        Ok(TiledTileLayer {
            name,
            width,
            height,
            visible,
            gids,
        })
    }

    fn parse_csv_gids(&self, data: Node<'_, '_>) -> Result<Vec<u32>, TiledError> {
        let text = data.text().unwrap_or_default();
        text.split(',')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .map(|cell| {
                cell.parse::<u32>()
                    .map(|gid| gid & GID_FLAGS_MASK)
                    .map_err(|_| {
                        self.error_at(
                            TiledErrorCode::InvalidValue,
                            format!("invalid gid '{cell}' in CSV layer data"),
                            data,
                        )
                    })
            })
            .collect()
    }

    fn parse_object_group(&self, node: Node<'_, '_>) -> Result<TiledObjectGroup, TiledError> {
        let objects = node
            .children()
            .filter(|child| child.has_tag_name("object"))
            .map(|object| self.parse_object(object))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TiledObjectGroup {
            name: node.attribute("name").unwrap_or_default().to_string(),
            objects,
        })
    }

    fn parse_object(&self, node: Node<'_, '_>) -> Result<TiledObject, TiledError> {
        let mut shape = match self.optional_attr::<u32>(node, "gid")? {
            Some(gid) => ObjectShape::Tile(gid & GID_FLAGS_MASK),
            None => ObjectShape::Rectangle,
        };
        let mut properties = BTreeMap::new();

        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "ellipse" => shape = ObjectShape::Ellipse,
                "point" => shape = ObjectShape::Point,
                "polygon" => shape = ObjectShape::Polygon(self.parse_points(child)?),
                "polyline" => shape = ObjectShape::Polyline(self.parse_points(child)?),
                "properties" => self.parse_properties(child, &mut properties),
                _ => {}
            }
        }

        let class = node
            .attribute("class")
            .or_else(|| node.attribute("type"))
            .unwrap_or_default()
            .to_string();
        Ok(TiledObject {
            id: self.optional_attr(node, "id")?.unwrap_or(0),
            name: node.attribute("name").unwrap_or_default().to_string(),
            class,
            x: self.optional_attr(node, "x")?.unwrap_or(0.0),
            y: self.optional_attr(node, "y")?.unwrap_or(0.0),
            width: self.optional_attr(node, "width")?.unwrap_or(0.0),
            height: self.optional_attr(node, "height")?.unwrap_or(0.0),
            shape,
            properties,
        })
    }

    fn parse_points(&self, node: Node<'_, '_>) -> Result<Vec<(f32, f32)>, TiledError> {
        let raw = node.attribute("points").unwrap_or_default();
        raw.split_whitespace()
            .map(|pair| {
                let parsed = pair
                    .split_once(',')
                    .and_then(|(x, y)| Some((x.parse::<f32>().ok()?, y.parse::<f32>().ok()?)));
                parsed.ok_or_else(|| {
                    self.error_at(
                        TiledErrorCode::InvalidValue,
                        format!("invalid point '{pair}'"),
                        node,
                    )
                })
            })
            .collect()
    }

    /// Multi-line string properties keep their value as element text.
    fn parse_properties(&self, node: Node<'_, '_>, out: &mut BTreeMap<String, String>) {
        for property in node
            .children()
            .filter(|child| child.has_tag_name("property"))
        {
            let Some(name) = property.attribute("name") else {
                continue;
            };
            let value = property
                .attribute("value")
                .or_else(|| property.text())
                .unwrap_or_default();
            out.insert(name.to_string(), value.to_string());
        }
    }
}

fn read_error(path: &Path, error: std::io::Error) -> TiledError {
    TiledError {
        code: TiledErrorCode::ReadFile,
        message: format!("failed to read file: {error}"),
        file_path: path.to_path_buf(),
        location: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VILLAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="3" height="2" tilewidth="16" tileheight="16" infinite="0">
 <tileset firstgid="1" name="terrain" tilewidth="16" tileheight="16" tilecount="4" columns="2">
  <image source="../tiles/terrain.png" width="32" height="32"/>
 </tileset>
 <layer id="1" name="sol" width="3" height="2">
  <data encoding="csv">
1,2,3,
4,2147483649,0
</data>
 </layer>
 <layer id="2" name="deco" width="3" height="2" visible="0">
  <data>
   <tile gid="2"/><tile/><tile/>
   <tile/><tile/><tile gid="3"/>
  </data>
 </layer>
 <objectgroup id="3" name="Collisions">
  <object id="1" x="0" y="0" width="48" height="8"/>
  <object id="2" x="4" y="4">
   <polygon points="0,0 8,0 8,6"/>
  </object>
 </objectgroup>
 <objectgroup id="4" name="NPCs">
  <object id="5" name="maire" type="npc" gid="3" x="16" y="32" width="16" height="16">
   <properties>
    <property name="sprite" value="npcs/maire"/>
    <property name="scale" type="float" value="0.12"/>
   </properties>
  </object>
  <object id="6" name="spawn_auberge" x="24" y="8">
   <point/>
  </object>
 </objectgroup>
</map>
"#;

    #[test]
    fn parses_layers_tilesets_and_objects() {
        let map = parse_tmx(VILLAGE, Path::new("/game/assets/maps/village.tmx")).expect("map");

        assert_eq!((map.width, map.height), (3, 2));
        assert_eq!(map.tilesets.len(), 1);
        assert_eq!(
            map.tilesets[0].image_path,
            Some(PathBuf::from("/game/assets/maps/../tiles/terrain.png"))
        );
        assert_eq!(map.layers[0].gids, vec![1, 2, 3, 4, 1, 0]);
        assert_eq!(map.layers[1].gids, vec![2, 0, 0, 0, 0, 3]);
        assert!(!map.layers[1].visible);

        let collisions = map.object_group("Collisions").expect("collisions");
        assert_eq!(collisions.objects.len(), 2);
        assert_eq!(
            collisions.objects[1].shape,
            ObjectShape::Polygon(vec![(0.0, 0.0), (8.0, 0.0), (8.0, 6.0)])
        );

        let npcs = map.object_group("NPCs").expect("npcs");
        let maire = &npcs.objects[0];
        assert_eq!(maire.name, "maire");
        assert_eq!(maire.class, "npc");
        assert_eq!(maire.shape, ObjectShape::Tile(3));
        assert_eq!(maire.property("sprite"), Some("npcs/maire"));
        assert_eq!(maire.property("scale"), Some("0.12"));
        assert_eq!(npcs.objects[1].shape, ObjectShape::Point);
    }

    #[test]
    fn malformed_xml_reports_line_and_column() {
        let error = parse_tmx("<map>\n<layer></map>", Path::new("broken.tmx")).unwrap_err();

        assert_eq!(error.code, TiledErrorCode::XmlMalformed);
        let location = error.location.expect("location");
        assert_eq!(location.line, 2);
    }

    #[test]
    fn base64_layers_are_rejected_with_guidance() {
        let raw = r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <layer name="sol" width="1" height="1"><data encoding="base64">AQAAAA==</data></layer>
</map>"#;
        let error = parse_tmx(raw, Path::new("b64.tmx")).unwrap_err();

        assert_eq!(error.code, TiledErrorCode::UnsupportedEncoding);
        assert!(error.message.contains("CSV"));
        assert_eq!(error.location.map(|loc| loc.line), Some(2));
    }

    #[test]
    fn missing_map_attribute_is_reported() {
        let raw = r#"<map width="1" tilewidth="16" tileheight="16"></map>"#;
        let error = parse_tmx(raw, Path::new("m.tmx")).unwrap_err();
        assert_eq!(error.code, TiledErrorCode::MissingAttribute);
        assert!(error.to_string().contains("height"));
    }

    #[test]
    fn layer_size_mismatch_is_rejected() {
        let raw = r#"<map width="2" height="2" tilewidth="16" tileheight="16">
 <layer name="sol" width="2" height="2"><data encoding="csv">1,1,1</data></layer>
</map>"#;
        let error = parse_tmx(raw, Path::new("m.tmx")).unwrap_err();
        assert_eq!(error.code, TiledErrorCode::LayerSizeMismatch);
    }

    #[test]
    fn external_tileset_resolves_relative_to_map_and_tsx() {
        let dir = tempfile::tempdir().expect("tempdir");
        let maps = dir.path().join("maps");
        let tilesets = dir.path().join("tilesets");
        fs::create_dir_all(&maps).expect("maps dir");
        fs::create_dir_all(&tilesets).expect("tilesets dir");
        fs::write(
            tilesets.join("interieur.tsx"),
            r#"<?xml version="1.0"?>
<tileset name="interieur" tilewidth="32" tileheight="32" tilecount="8" columns="4" spacing="1" margin="2">
 <image source="interieur.png" width="134" height="68"/>
</tileset>"#,
        )
        .expect("tsx");
        let map_path = maps.join("maison.tmx");
        fs::write(
            &map_path,
            r#"<map width="1" height="1" tilewidth="32" tileheight="32">
 <tileset firstgid="10" source="../tilesets/interieur.tsx"/>
 <layer name="sol" width="1" height="1"><data encoding="csv">10</data></layer>
</map>"#,
        )
        .expect("tmx");

        let map = load_tmx(&map_path).expect("map");
        let tileset = &map.tilesets[0];
        assert_eq!(tileset.first_gid, 10);
        assert_eq!((tileset.tile_width, tileset.columns), (32, 4));
        assert_eq!((tileset.spacing, tileset.margin), (1, 2));
        assert_eq!(
            tileset.image_path,
            Some(maps.join("../tilesets").join("interieur.png"))
        );
    }

    #[test]
    fn missing_external_tileset_is_a_read_error() {
        let raw = r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" source="absent.tsx"/>
</map>"#;
        let dir = tempfile::tempdir().expect("tempdir");
        let error = parse_tmx(raw, &dir.path().join("m.tmx")).unwrap_err();
        assert_eq!(error.code, TiledErrorCode::ReadFile);
        assert!(error.file_path.ends_with("absent.tsx"));
    }
}
