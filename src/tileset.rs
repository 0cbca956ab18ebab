use crate::error::MapError;
use crate::gid::TileId;
use crate::ir_map::{IrObject, IrObjectShape, IrTileMetadata, IrTileset, Properties};
use crate::shape::{normalize, CollisionShape, RawShape};
use macroquad::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// One tile definition, keyed in the catalog by its global id.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Global id: local index + the tileset's first gid.
    pub id: u32,
    /// Image path as written in the tileset (relative to it).
    pub image_ref: String,
    /// Native image width.
    pub image_width: u32,
    /// Native image height.
    pub image_height: u32,
    /// Authored collision shapes, in object-group order.
    pub collision_shapes: Vec<CollisionShape>,
    /// Custom properties; unknown names are kept.
    pub properties: Properties,
}

impl Tile {
    /// Native image size.
    pub fn image_size(&self) -> Vec2 {
        vec2(self.image_width as f32, self.image_height as f32)
    }
}

/// Sparse, read-only lookup from global id to [`Tile`].
#[derive(Debug, Clone, Default)]
pub struct TileCatalog {
    tiles: BTreeMap<u32, Tile>,
}

impl TileCatalog {
    /// Build the catalog for every tileset a map references.
    pub fn build(tilesets: &[IrTileset]) -> Result<Self, MapError> {
        let mut tiles = BTreeMap::new();
        for ts in tilesets {
            for tile in parse_tileset(ts)? {
                if tiles.contains_key(&tile.id) {
                    return Err(MapError::MalformedTileset(format!(
                        "tileset '{}' redefines gid {}",
                        ts.name(),
                        tile.id
                    )));
                }
                tiles.insert(tile.id, tile);
            }
        }
        log::debug!(
            "tile catalog holds {} tiles from {} tilesets",
            tiles.len(),
            tilesets.len()
        );
        Ok(Self { tiles })
    }

    /// Lookup by global id; flip flags are ignored.
    pub fn get(&self, gid: TileId) -> Option<&Tile> {
        self.tiles.get(&gid.clean())
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// `true` when no tileset defined any tile.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in ascending gid order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }
}

/// Turn one tileset into its tiles, ordered by global id.
pub fn parse_tileset(ts: &IrTileset) -> Result<Vec<Tile>, MapError> {
    let first_gid = ts.first_gid().ok_or_else(|| {
        MapError::MalformedTileset(format!("tileset '{}' has no firstgid", ts.name()))
    })?;

    let mut tiles: BTreeMap<u32, Tile> = BTreeMap::new();
    match ts {
        IrTileset::Atlas {
            image,
            tile_w,
            tile_h,
            tilecount,
            tiles: meta,
            ..
        } => {
            for local in 0..*tilecount {
                let id = global_id(ts, first_gid, i64::from(local))?;
                tiles.insert(
                    id,
                    Tile {
                        id,
                        image_ref: image.clone(),
                        image_width: *tile_w,
                        image_height: *tile_h,
                        collision_shapes: Vec::new(),
                        properties: Properties::new(),
                    },
                );
            }
            let mut described = BTreeSet::new();
            for m in meta {
                let id = global_id(ts, first_gid, m.id)?;
                if !described.insert(id) {
                    return Err(duplicate_tile(ts, m.id));
                }
                let base = tiles.remove(&id);
                let (image, w, h) = match &base {
                    Some(b) => (b.image_ref.clone(), b.image_width, b.image_height),
                    None => (image.clone(), *tile_w, *tile_h),
                };
                tiles.insert(id, tile_from_meta(id, m, image, w, h)?);
            }
        }
        IrTileset::Collection { tiles: meta, .. } => {
            for m in meta {
                let id = global_id(ts, first_gid, m.id)?;
                if tiles.contains_key(&id) {
                    return Err(duplicate_tile(ts, m.id));
                }
                let image = m.image.clone().unwrap_or_default();
                let w = m.image_width.unwrap_or(0);
                let h = m.image_height.unwrap_or(0);
                tiles.insert(id, tile_from_meta(id, m, image, w, h)?);
            }
        }
    }

    log::debug!("tileset '{}' (firstgid {first_gid}): {} tiles", ts.name(), tiles.len());
    Ok(tiles.into_values().collect())
}

fn duplicate_tile(ts: &IrTileset, local: i64) -> MapError {
    MapError::MalformedTileset(format!(
        "tileset '{}' lists tile {local} more than once",
        ts.name()
    ))
}

fn global_id(ts: &IrTileset, first_gid: u32, local: i64) -> Result<u32, MapError> {
    if local < 0 {
        return Err(MapError::MalformedTileset(format!(
            "tileset '{}' has negative tile index {local}",
            ts.name()
        )));
    }
    u32::try_from(local)
        .ok()
        .and_then(|l| l.checked_add(first_gid))
        .ok_or_else(|| {
            MapError::MalformedTileset(format!(
                "tileset '{}' tile index {local} overflows the gid range",
                ts.name()
            ))
        })
}

fn tile_from_meta(
    id: u32,
    meta: &IrTileMetadata,
    image_ref: String,
    image_width: u32,
    image_height: u32,
) -> Result<Tile, MapError> {
    let image_ref = meta.image.clone().unwrap_or(image_ref);
    let image_width = meta.image_width.unwrap_or(image_width);
    let image_height = meta.image_height.unwrap_or(image_height);
    let reference = vec2(image_width as f32, image_height as f32);
    let mut collision_shapes = Vec::with_capacity(meta.objects.len());
    for obj in &meta.objects {
        match normalize(&raw_shape(obj), reference) {
            Ok(shape) => collision_shapes.push(shape),
            Err(MapError::UnsupportedShape { kind }) => {
                log::warn!(
                    "tile {id}: collision object {} is a {kind}; using the tile bounds instead",
                    obj.id
                );
                collision_shapes.push(CollisionShape::TileBounds);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Tile {
        id,
        image_ref,
        image_width,
        image_height,
        collision_shapes,
        properties: meta.properties.clone(),
    })
}

/// Collision object → raw shape in tile-local coordinates.
pub fn raw_shape(obj: &IrObject) -> RawShape {
    let origin = vec2(obj.x, obj.y);
    let bounds = Rect::new(obj.x, obj.y, obj.width, obj.height);
    match &obj.shape {
        IrObjectShape::Polygon(points) => {
            RawShape::Polygon(points.iter().map(|p| *p + origin).collect())
        }
        IrObjectShape::Ellipse => RawShape::Ellipse(bounds),
        IrObjectShape::Rectangle => RawShape::Rectangle(bounds),
        IrObjectShape::Polyline(_) => RawShape::Unsupported { kind: "polyline" },
        IrObjectShape::Point => RawShape::Unsupported { kind: "point" },
        IrObjectShape::Text => RawShape::Unsupported { kind: "text" },
        IrObjectShape::Tile { .. } => RawShape::Unsupported { kind: "tile" },
    }
}
