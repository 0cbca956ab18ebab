// src/ir_map.rs
use macroquad::prelude::*;
use std::collections::HashMap;

/// Typed value of a Tiled custom property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `bool` property.
    Bool(bool),
    /// `int` / `object` property.
    I64(i64),
    /// `float` property.
    F32(f32),
    /// `string`, `file`, `color` and `class` properties.
    String(String),
}

/// Custom properties keyed by name. Unknown names are kept as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    /// Empty property set.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    /// Raw lookup.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no property is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Boolean property, `None` if absent or of another type.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer property.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer property that fits in an `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// Numeric property; integers are widened.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            PropertyValue::F32(v) => Some(*v),
            PropertyValue::I64(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// String property.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Copy of `self` with every property of `overrides` laid on top.
    pub fn merged_with(&self, overrides: &Properties) -> Properties {
        let mut out = self.clone();
        for (k, v) in &overrides.0 {
            out.0.insert(k.clone(), v.clone());
        }
        out
    }
}

/// Canonical, format-agnostic map.
#[derive(Debug, Clone)]
pub struct IrMap {
    pub tile_w: u32,
    pub tile_h: u32,
    pub properties: Properties,
    pub tilesets: Vec<IrTileset>, // map order; first_gid validated later
    pub layers: Vec<IrLayer>,     // source order
}

/// One tileset referenced by a map.
#[derive(Debug, Clone)]
pub enum IrTileset {
    /// One image atlas with a regular grid. Every index below `tilecount` is a tile.
    Atlas {
        first_gid: Option<u32>,
        name: String,
        image: String,
        tile_w: u32,
        tile_h: u32,
        tilecount: u32,
        properties: Properties,
        tiles: Vec<IrTileMetadata>,
    },
    /// One image per tile; only the listed tiles exist.
    Collection {
        first_gid: Option<u32>,
        name: String,
        properties: Properties,
        tiles: Vec<IrTileMetadata>,
    },
}

impl IrTileset {
    pub fn first_gid(&self) -> Option<u32> {
        match self {
            IrTileset::Atlas { first_gid, .. } | IrTileset::Collection { first_gid, .. } => {
                *first_gid
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            IrTileset::Atlas { name, .. } | IrTileset::Collection { name, .. } => name,
        }
    }
}

/// Per-tile entry of a tileset's `tiles` array.
#[derive(Debug, Clone)]
pub struct IrTileMetadata {
    /// Local index; signed so a bad export can be reported instead of wrapped.
    pub id: i64,
    pub image: Option<String>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub properties: Properties,
    /// Collision object group.
    pub objects: Vec<IrObject>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IrObjectShape {
    /// Tile instance; raw gid including flip flags.
    Tile { gid: u32 },
    Point,
    Rectangle,
    Ellipse,
    /// Vertices relative to the object's x/y.
    Polygon(Vec<Vec2>),
    Polyline(Vec<Vec2>),
    Text,
}

#[derive(Debug, Clone)]
pub struct IrObject {
    pub id: u32,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub shape: IrObjectShape,
    pub properties: Properties,
}

#[derive(Debug, Clone)]
pub enum IrLayerKind {
    Tiles {
        width: usize,
        height: usize,
        data: Vec<u32>, // raw GIDs (including flip flags ok)
    },
    Objects {
        objects: Vec<IrObject>,
    },
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct IrLayer {
    pub name: String,
    pub offset: Vec2, // world offset for this layer
    pub properties: Properties,
    pub kind: IrLayerKind,
}
