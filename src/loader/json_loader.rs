//! Tiled JSON documents (maps and standalone tilesets) decoded into the IR.
//!
//! Only the fields collision assembly reads are modelled; serde skips the rest
//! (rendering flags, editor metadata and so on).

use crate::error::MapError;
use crate::ir_map::*;
use macroquad::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Default)]
#[serde(default)]
struct MapDoc {
    tilewidth: u32,
    tileheight: u32,
    properties: Vec<PropertyDoc>,
    tilesets: Vec<TilesetDoc>,
    layers: Vec<LayerDoc>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LayerDoc {
    /// "tilelayer", "objectgroup", anything else is skipped.
    #[serde(rename = "type")]
    kind: Option<String>,
    name: String,
    width: usize,
    height: usize,
    data: Vec<u32>,
    objects: Vec<ObjectDoc>,
    offsetx: f32,
    offsety: f32,
    properties: Vec<PropertyDoc>,
}

/// Embedded tileset, or a `{firstgid, source}` pointer to an external one.
#[derive(Deserialize, Default)]
#[serde(default)]
struct TilesetDoc {
    firstgid: Option<u32>,
    source: Option<String>,
    name: String,
    /// Present on atlas tilesets only.
    image: Option<String>,
    tilewidth: u32,
    tileheight: u32,
    tilecount: u32,
    properties: Vec<PropertyDoc>,
    tiles: Vec<TileDoc>,
}

#[derive(Deserialize)]
struct TileDoc {
    id: i64,
    image: Option<String>,
    imagewidth: Option<u32>,
    imageheight: Option<u32>,
    #[serde(default)]
    properties: Vec<PropertyDoc>,
    objectgroup: Option<ObjectGroupDoc>,
}

#[derive(Deserialize)]
struct ObjectGroupDoc {
    #[serde(default)]
    objects: Vec<ObjectDoc>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ObjectDoc {
    id: u32,
    name: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    gid: Option<u32>,
    point: bool,
    ellipse: bool,
    polygon: Option<Vec<PointDoc>>,
    polyline: Option<Vec<PointDoc>>,
    text: Option<JsonValue>,
    properties: Vec<PropertyDoc>,
}

#[derive(Deserialize)]
struct PointDoc {
    x: f32,
    y: f32,
}

#[derive(Deserialize)]
struct PropertyDoc {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    value: JsonValue,
}

impl PropertyDoc {
    /// `None` when the value doesn't match its declared type.
    fn into_entry(self) -> Result<Option<(String, PropertyValue)>, MapError> {
        let value = match self.kind.as_deref() {
            None => infer_value(&self.value),
            Some("bool") => self.value.as_bool().map(PropertyValue::Bool),
            Some("int" | "object") => self.value.as_i64().map(PropertyValue::I64),
            Some("float") => self.value.as_f64().map(|v| PropertyValue::F32(v as f32)),
            Some("string" | "file" | "color" | "class") => {
                self.value.as_str().map(|s| PropertyValue::String(s.to_owned()))
            }
            Some(other) => {
                return Err(MapError::UnsupportedPropertyType {
                    name: self.name,
                    kind: other.to_owned(),
                })
            }
        };
        if value.is_none() {
            log::debug!("property '{}' has no usable value; dropped", self.name);
        }
        Ok(value.map(|v| (self.name, v)))
    }
}

/// Untyped properties (older exports) take the type of their JSON value.
fn infer_value(value: &JsonValue) -> Option<PropertyValue> {
    match value {
        JsonValue::Bool(b) => Some(PropertyValue::Bool(*b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(PropertyValue::I64)
            .or_else(|| n.as_f64().map(|f| PropertyValue::F32(f as f32))),
        JsonValue::String(s) => Some(PropertyValue::String(s.clone())),
        _ => None,
    }
}

fn collect_properties(docs: Vec<PropertyDoc>) -> Result<Properties, MapError> {
    let mut props = Properties::new();
    for doc in docs {
        if let Some((name, value)) = doc.into_entry()? {
            props.insert(name, value);
        }
    }
    Ok(props)
}

impl ObjectDoc {
    fn into_ir(self) -> Result<IrObject, MapError> {
        let points = |pts: Vec<PointDoc>| -> Vec<Vec2> {
            pts.into_iter().map(|p| vec2(p.x, p.y)).collect()
        };
        let shape = match (self.gid, self.polygon, self.polyline) {
            (Some(gid), _, _) => IrObjectShape::Tile { gid },
            (None, Some(pts), _) => IrObjectShape::Polygon(points(pts)),
            (None, None, Some(pts)) => IrObjectShape::Polyline(points(pts)),
            _ if self.point => IrObjectShape::Point,
            _ if self.ellipse => IrObjectShape::Ellipse,
            _ if self.text.is_some() => IrObjectShape::Text,
            _ => IrObjectShape::Rectangle,
        };

        Ok(IrObject {
            id: self.id,
            name: self.name,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            shape,
            properties: collect_properties(self.properties)?,
        })
    }
}

fn objects_to_ir(docs: Vec<ObjectDoc>) -> Result<Vec<IrObject>, MapError> {
    docs.into_iter().map(ObjectDoc::into_ir).collect()
}

impl TileDoc {
    fn into_ir(self) -> Result<IrTileMetadata, MapError> {
        let collision = self.objectgroup.map(|g| g.objects).unwrap_or_default();
        Ok(IrTileMetadata {
            id: self.id,
            image: self.image,
            image_width: self.imagewidth,
            image_height: self.imageheight,
            properties: collect_properties(self.properties)?,
            objects: objects_to_ir(collision)?,
        })
    }
}

impl TilesetDoc {
    fn into_ir(self, first_gid: Option<u32>) -> Result<IrTileset, MapError> {
        let properties = collect_properties(self.properties)?;
        let tiles = self
            .tiles
            .into_iter()
            .map(TileDoc::into_ir)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match self.image {
            Some(image) => IrTileset::Atlas {
                first_gid,
                name: self.name,
                image,
                tile_w: self.tilewidth,
                tile_h: self.tileheight,
                tilecount: self.tilecount,
                properties,
                tiles,
            },
            None => IrTileset::Collection {
                first_gid,
                name: self.name,
                properties,
                tiles,
            },
        })
    }
}

impl LayerDoc {
    fn into_ir(self) -> Result<IrLayer, MapError> {
        let kind = match self.kind.as_deref().unwrap_or("tilelayer") {
            "tilelayer" => IrLayerKind::Tiles {
                width: self.width,
                height: self.height,
                data: self.data,
            },
            "objectgroup" => IrLayerKind::Objects {
                objects: objects_to_ir(self.objects)?,
            },
            _ => IrLayerKind::Unsupported,
        };
        Ok(IrLayer {
            name: self.name,
            offset: vec2(self.offsetx, self.offsety),
            properties: collect_properties(self.properties)?,
            kind,
        })
    }
}

fn parse_doc<T: DeserializeOwned>(txt: &str, path: &Path) -> Result<T, MapError> {
    serde_json::from_str(txt).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_doc<T: DeserializeOwned>(path: &Path) -> Result<T, MapError> {
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_doc(&txt, path)
}

fn require_json(path: &str) -> Result<(), MapError> {
    if Path::new(path).extension().and_then(|e| e.to_str()) == Some("json") {
        Ok(())
    } else {
        Err(MapError::InvalidMap(format!("expected a .json document: {path}")))
    }
}

/// Inline tilesets decode in place; external ones load from `map_dir`. The
/// map's `firstgid` always wins over one stored in the external file.
fn resolve_tileset(doc: TilesetDoc, map_dir: &Path) -> Result<IrTileset, MapError> {
    let first_gid = doc.firstgid;
    match doc.source {
        None => doc.into_ir(first_gid),
        Some(source) => {
            require_json(&source)?;
            let external: TilesetDoc = read_doc(&map_dir.join(&source))?;
            log::debug!("loaded external tileset {source}");
            let first_gid = first_gid.or(external.firstgid);
            external.into_ir(first_gid)
        }
    }
}

fn map_to_ir(doc: MapDoc, map_dir: &Path) -> Result<IrMap, MapError> {
    let tilesets = doc
        .tilesets
        .into_iter()
        .map(|ts| resolve_tileset(ts, map_dir))
        .collect::<Result<Vec<_>, _>>()?;
    let layers = doc
        .layers
        .into_iter()
        .map(LayerDoc::into_ir)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IrMap {
        tile_w: doc.tilewidth,
        tile_h: doc.tileheight,
        properties: collect_properties(doc.properties)?,
        tilesets,
        layers,
    })
}

/// Decode a standalone tileset document. `first_gid` comes from the map that
/// references it, unless the document carries its own `firstgid`.
pub fn decode_tileset_str_to_ir(txt: &str, first_gid: Option<u32>) -> Result<IrTileset, MapError> {
    let doc: TilesetDoc = parse_doc(txt, Path::new("<inline>"))?;
    let first_gid = first_gid.or(doc.firstgid);
    doc.into_ir(first_gid)
}

/// Decode a map document. External tileset `source`s are resolved against `map_dir`.
pub fn decode_map_str_to_ir(txt: &str, map_dir: &Path) -> Result<IrMap, MapError> {
    map_to_ir(parse_doc(txt, Path::new("<inline>"))?, map_dir)
}

/// Read and decode a `.json` map file. Also returns the directory it lives in.
pub fn decode_map_file_to_ir(path: &str) -> Result<(IrMap, PathBuf), MapError> {
    require_json(path)?;
    let p = Path::new(path);
    let doc: MapDoc = read_doc(p)?;
    let map_dir = p
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("./"));
    Ok((map_to_ir(doc, &map_dir)?, map_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mq_tiled_bodies_loader_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    #[test]
    fn external_tileset_brings_collision_groups_and_role_flags() {
        let dir = temp_dir();
        let map_path = dir.join("level.json");
        fs::write(
            &map_path,
            r#"{
              "tilewidth": 40,
              "tileheight": 40,
              "tilesets": [{"firstgid": 3, "source": "obstacles.json"}],
              "layers": [{
                "type": "objectgroup",
                "name": "objects",
                "objects": [{
                  "id": 9, "gid": 3, "x": 100, "y": 200, "width": 20, "height": 20,
                  "properties": [{"name": "is_sensor", "type": "bool", "value": true}]
                }]
              }]
            }"#,
        )
        .expect("failed to write map");
        fs::write(
            dir.join("obstacles.json"),
            r#"{
              "name": "obstacles",
              "firstgid": 99,
              "tiles": [{
                "id": 0,
                "image": "peg.png", "imagewidth": 20, "imageheight": 20,
                "properties": [
                  {"name": "is_bumper", "type": "bool", "value": true},
                  {"name": "restitution", "type": "float", "value": 0.75}
                ],
                "objectgroup": {"objects": [
                  {"id": 1, "x": 0, "y": 0, "width": 20, "height": 20, "ellipse": true}
                ]}
              }]
            }"#,
        )
        .expect("failed to write tileset");

        let (ir, map_dir) = decode_map_file_to_ir(map_path.to_str().expect("path utf8")).expect("decode");
        assert_eq!(map_dir, dir);

        let ts = &ir.tilesets[0];
        // the map's firstgid wins over the one in the tileset file
        assert_eq!(ts.first_gid(), Some(3));
        let IrTileset::Collection { tiles, .. } = ts else {
            panic!("expected image collection");
        };
        assert_eq!(tiles[0].properties.get_bool("is_bumper"), Some(true));
        assert_eq!(tiles[0].properties.get_f32("restitution"), Some(0.75));
        assert_eq!(tiles[0].objects[0].shape, IrObjectShape::Ellipse);

        let IrLayerKind::Objects { objects } = &ir.layers[0].kind else {
            panic!("expected object layer");
        };
        assert_eq!(objects[0].shape, IrObjectShape::Tile { gid: 3 });
        assert_eq!(objects[0].properties.get_bool("is_sensor"), Some(true));
    }

    #[test]
    fn embedded_image_collection_tileset_keeps_collision_objects() {
        let map_json = r#"{
          "tilewidth": 32,
          "tileheight": 32,
          "layers": [],
          "tilesets": [{
            "firstgid": 5,
            "name": "obstacles",
            "tiles": [{
              "id": 2,
              "image": "peg.png",
              "imagewidth": 20,
              "imageheight": 20,
              "objectgroup": {"objects": [
                {"id": 1, "x": 0, "y": 0, "width": 20, "height": 20, "ellipse": true},
                {"id": 2, "x": 2, "y": 4, "polygon": [{"x":0,"y":0},{"x":10,"y":0},{"x":0,"y":10}]},
                {"id": 3, "x": 0, "y": 0, "width": 4, "height": 4}
              ]}
            }]
          }]
        }"#;

        let ir = decode_map_str_to_ir(map_json, Path::new(".")).expect("decode");
        match &ir.tilesets[0] {
            IrTileset::Collection { first_gid, name, tiles, .. } => {
                assert_eq!(*first_gid, Some(5));
                assert_eq!(name, "obstacles");
                assert_eq!(tiles[0].image.as_deref(), Some("peg.png"));
                assert_eq!(tiles[0].image_width, Some(20));
                let shapes: Vec<_> = tiles[0].objects.iter().map(|o| o.shape.clone()).collect();
                assert_eq!(shapes[0], IrObjectShape::Ellipse);
                assert!(matches!(shapes[1], IrObjectShape::Polygon(ref pts) if pts.len() == 3));
                assert_eq!(shapes[2], IrObjectShape::Rectangle);
            }
            IrTileset::Atlas { .. } => panic!("expected image collection"),
        }
    }

    #[test]
    fn atlas_tileset_keeps_grid_size_and_sparse_metadata() {
        let ts = decode_tileset_str_to_ir(
            r#"{
              "name": "walls", "image": "walls.png",
              "tilewidth": 16, "tileheight": 16, "tilecount": 8, "columns": 4,
              "tiles": [{"id": 6, "properties": [{"name": "is_hazard", "value": true}]}]
            }"#,
            Some(1),
        )
        .expect("decode");
        let IrTileset::Atlas { tile_w, tilecount, tiles, .. } = ts else {
            panic!("expected atlas");
        };
        assert_eq!((tile_w, tilecount), (16, 8));
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].id, 6);
        assert_eq!(tiles[0].properties.get_bool("is_hazard"), Some(true));
        assert!(tiles[0].objects.is_empty());
    }

    #[test]
    fn missing_firstgid_survives_decoding_as_none() {
        let ts = decode_tileset_str_to_ir(r#"{"name":"loose","tiles":[]}"#, None).expect("decode");
        assert_eq!(ts.first_gid(), None);

        let ts = decode_tileset_str_to_ir(r#"{"name":"loose","tiles":[]}"#, Some(3)).expect("decode");
        assert_eq!(ts.first_gid(), Some(3));
    }

    #[test]
    fn classifies_point_polyline_text_and_tile_objects() {
        let map_json = r#"{
          "layers": [{
            "type": "objectgroup",
            "name": "objects",
            "offsetx": 3,
            "objects": [
              {"id": 1, "name": "start", "point": true, "x": 10, "y": 20},
              {"id": 2, "polyline": [{"x":0,"y":0},{"x":5,"y":5}]},
              {"id": 3, "text": {"text": "hi"}},
              {"id": 4, "gid": 2147483649, "x": 0, "y": 32, "width": 32, "height": 32}
            ]
          }],
          "tilesets": []
        }"#;

        let ir = decode_map_str_to_ir(map_json, Path::new(".")).expect("decode");
        assert_eq!(ir.layers[0].offset, vec2(3.0, 0.0));
        let IrLayerKind::Objects { objects } = &ir.layers[0].kind else {
            panic!("expected object layer");
        };
        assert_eq!(objects[0].shape, IrObjectShape::Point);
        assert!(matches!(objects[1].shape, IrObjectShape::Polyline(_)));
        assert_eq!(objects[2].shape, IrObjectShape::Text);
        assert_eq!(objects[3].shape, IrObjectShape::Tile { gid: 2_147_483_649 });
    }

    #[test]
    fn untyped_properties_take_their_json_type() {
        let map_json = r#"{
          "layers": [{
            "type": "objectgroup",
            "name": "objects",
            "objects": [{"id": 1, "gid": 1, "properties": [
              {"name": "is_goal", "value": true},
              {"name": "friction", "value": 0.25},
              {"name": "restitution", "value": 1},
              {"name": "label", "value": "exit"},
              {"name": "tint", "value": null}
            ]}]
          }]
        }"#;

        let ir = decode_map_str_to_ir(map_json, Path::new(".")).expect("decode");
        let IrLayerKind::Objects { objects } = &ir.layers[0].kind else {
            panic!("expected object layer");
        };
        let props = &objects[0].properties;
        assert_eq!(props.get_bool("is_goal"), Some(true));
        assert_eq!(props.get_f32("friction"), Some(0.25));
        assert_eq!(props.get("restitution"), Some(&PropertyValue::I64(1)));
        assert_eq!(props.get_f32("restitution"), Some(1.0));
        assert_eq!(props.get_string("label"), Some("exit"));
        assert!(props.get("tint").is_none());
    }

    #[test]
    fn unreadable_level_files_are_typed_errors() {
        let dir = temp_dir();
        let broken = dir.join("broken.json");
        fs::write(&broken, "{ \"layers\": [").expect("failed to write map");
        let err = decode_map_file_to_ir(broken.to_str().expect("path utf8"))
            .err()
            .expect("expected decode error");
        assert!(matches!(err, MapError::Json { ref path, .. } if *path == broken));

        let orphan = dir.join("orphan.json");
        fs::write(&orphan, r#"{"tilesets":[{"firstgid":1,"source":"gone.json"}]}"#)
            .expect("failed to write map");
        let err = decode_map_file_to_ir(orphan.to_str().expect("path utf8"))
            .err()
            .expect("expected decode error");
        assert!(matches!(err, MapError::Io { ref path, .. } if path.ends_with("gone.json")));
    }

    #[test]
    fn rejects_non_json_map_and_tileset_sources() {
        let err = decode_map_file_to_ir("level.tmx").err().expect("expected error");
        assert!(matches!(err, MapError::InvalidMap(_)));

        let map_json = r#"{"layers": [], "tilesets":[{"firstgid":1,"source":"tiles.tsx"}]}"#;
        let err = decode_map_str_to_ir(map_json, Path::new(".")).err().expect("expected error");
        assert!(matches!(err, MapError::InvalidMap(_)));
    }

    #[test]
    fn unknown_property_type_names_the_property() {
        let ts = r#"{"name": "pegs", "tiles": [{"id": 0, "properties": [
          {"name": "bounce_curve", "type": "curve", "value": [0, 1]}
        ]}]}"#;

        let err = decode_tileset_str_to_ir(ts, Some(1)).err().expect("expected decode error");
        assert!(matches!(
            err,
            MapError::UnsupportedPropertyType { ref name, ref kind } if name == "bounce_curve" && kind == "curve"
        ));
    }
}
