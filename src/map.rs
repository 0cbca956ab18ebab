use crate::body::{place_tile, BodyOptions, BodyPlacement, TilePlacement};
use crate::config::LevelConfig;
use crate::error::MapError;
use crate::gid::TileId;
use crate::ir_map::*;
use crate::loader::json_loader::*;
use crate::role::{classify, contact_effect, Contact, ContactEffect, RoleTag};
use crate::tileset::{Tile, TileCatalog};
use anyhow::Context;
use macroquad::prelude::*;
use std::path::Path;

/// Index of a body in [`Level::bodies`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// A body placement plus the gameplay data attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyRequest {
    /// Position in [`Level::bodies`].
    pub id: BodyId,
    /// Masked gid of the tile the body came from.
    pub gid: u32,
    /// Name of the layer the instance was on.
    pub layer: String,
    /// Gameplay role; always plain for background layers.
    pub role: RoleTag,
    /// What the physics engine should build.
    pub body: BodyPlacement,
}

/// An entry of an object or tile layer, ready to be turned into bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacedObject {
    /// Named position with no tile, e.g. the spawn point.
    Marker {
        /// Object name.
        name: String,
        /// Object position, layer offset included.
        position: Vec2,
    },
    /// Tile instance, bottom-left anchored.
    Tile {
        /// Tiled object id, or the cell index for tile layers.
        object_id: u32,
        /// Raw gid, flags included.
        gid: TileId,
        /// World placement.
        placement: TilePlacement,
        /// Per-instance properties; they override the tile's.
        properties: Properties,
    },
}

/// Contact reported by the physics engine between the actor and a level body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// The level body that was touched.
    pub body: BodyId,
    /// Actor position at contact time.
    pub actor_center: Vec2,
}

/// Layer passes, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblyPhase {
    ReadingBackgroundLayer,
    ReadingObjectLayer,
    Done,
}

impl AssemblyPhase {
    fn next(self) -> Self {
        match self {
            AssemblyPhase::ReadingBackgroundLayer => AssemblyPhase::ReadingObjectLayer,
            AssemblyPhase::ReadingObjectLayer | AssemblyPhase::Done => AssemblyPhase::Done,
        }
    }
}

/// Collision geometry and spawn point of one map.
#[derive(Debug, Clone)]
pub struct Level {
    /// Background bodies first, then object-layer bodies, each in source order.
    pub bodies: Vec<BodyRequest>,
    /// Actor spawn, if the map has a start marker.
    pub spawn: Option<Vec2>,
    /// Every tile the map's tilesets define.
    pub catalog: TileCatalog,
    /// Map grid width in pixels.
    pub tile_w: u32,
    /// Map grid height in pixels.
    pub tile_h: u32,
    /// Map-level custom properties.
    pub properties: Properties,
}

impl Level {
    /// Load a level file with the default [`LevelConfig`].
    pub fn load(path: &str) -> anyhow::Result<Self> {
        Self::load_with_config(path, &LevelConfig::default())
    }

    /// Load a level file; errors carry the path as context.
    pub fn load_with_config(path: &str, config: &LevelConfig) -> anyhow::Result<Self> {
        let (ir, _) =
            decode_map_file_to_ir(path).with_context(|| format!("Reading level {path}"))?;
        Self::from_ir(ir, config).with_context(|| format!("Building level {path}"))
    }

    /// Build from a map document; external tilesets resolve against `base_dir`.
    pub fn from_json_str(txt: &str, base_dir: &Path, config: &LevelConfig) -> Result<Self, MapError> {
        Self::from_ir(decode_map_str_to_ir(txt, base_dir)?, config)
    }

    /// Assemble a decoded map. Any unresolvable reference aborts the whole level.
    pub fn from_ir(ir: IrMap, config: &LevelConfig) -> Result<Self, MapError> {
        let catalog = TileCatalog::build(&ir.tilesets)?;
        let mut asm = Assembler {
            catalog: &catalog,
            config,
            map: &ir,
            bodies: Vec::new(),
            spawn: None,
        };

        let mut phase = AssemblyPhase::ReadingBackgroundLayer;
        while phase != AssemblyPhase::Done {
            for layer in &ir.layers {
                if layer_phase(layer, config) == Some(phase) {
                    asm.read_layer(layer, phase)?;
                }
            }
            phase = phase.next();
        }
        for layer in &ir.layers {
            if matches!(layer.kind, IrLayerKind::Unsupported) {
                log::warn!("layer '{}' has an unsupported type; skipped", layer.name);
            }
        }

        let Assembler { bodies, spawn, .. } = asm;
        log::info!(
            "level assembled: {} bodies ({} hazards, {} bumpers, {} goals), spawn {:?}",
            bodies.len(),
            bodies.iter().filter(|b| b.role == RoleTag::Hazard).count(),
            bodies.iter().filter(|b| b.role == RoleTag::Bumper).count(),
            bodies.iter().filter(|b| b.role == RoleTag::Goal).count(),
            spawn
        );

        Ok(Self {
            bodies,
            spawn,
            catalog,
            tile_w: ir.tile_w,
            tile_h: ir.tile_h,
            properties: ir.properties,
        })
    }

    /// Body by id.
    pub fn body(&self, id: BodyId) -> Option<&BodyRequest> {
        self.bodies.get(id.0 as usize)
    }

    /// Role of a body, if it exists.
    pub fn role_of(&self, id: BodyId) -> Option<RoleTag> {
        self.body(id).map(|b| b.role)
    }

    /// Bodies tagged `role`, in emission order.
    pub fn bodies_with_role(&self, role: RoleTag) -> impl Iterator<Item = &BodyRequest> {
        self.bodies.iter().filter(move |b| b.role == role)
    }

    /// Gameplay reaction to a contact. Unknown bodies have no effect.
    pub fn respond_to_contact(&self, event: &ContactEvent, config: &LevelConfig) -> ContactEffect {
        match self.body(event.body) {
            Some(b) => contact_effect(
                b.role,
                Contact {
                    body_center: b.body.position,
                    actor_center: event.actor_center,
                },
                config,
            ),
            None => ContactEffect::None,
        }
    }
}

fn layer_phase(layer: &IrLayer, config: &LevelConfig) -> Option<AssemblyPhase> {
    match &layer.kind {
        IrLayerKind::Tiles { .. } => Some(AssemblyPhase::ReadingBackgroundLayer),
        IrLayerKind::Objects { .. } => {
            let named = layer.name.eq_ignore_ascii_case(&config.background_layer);
            let flagged = layer.properties.get_bool("background").unwrap_or(false);
            if named || flagged {
                Some(AssemblyPhase::ReadingBackgroundLayer)
            } else {
                Some(AssemblyPhase::ReadingObjectLayer)
            }
        }
        IrLayerKind::Unsupported => None,
    }
}

struct Assembler<'a> {
    catalog: &'a TileCatalog,
    config: &'a LevelConfig,
    map: &'a IrMap,
    bodies: Vec<BodyRequest>,
    spawn: Option<Vec2>,
}

impl<'a> Assembler<'a> {
    fn read_layer(&mut self, layer: &IrLayer, phase: AssemblyPhase) -> Result<(), MapError> {
        let before = self.bodies.len();
        for placed in placed_objects(layer, self.map)? {
            match placed {
                PlacedObject::Marker { name, position } => {
                    if phase == AssemblyPhase::ReadingObjectLayer && name == self.config.start_marker {
                        if let Some(prev) = self.spawn {
                            log::warn!("layer '{}': another start marker replaces {prev:?}", layer.name);
                        }
                        self.spawn = Some(position);
                    }
                }
                PlacedObject::Tile {
                    object_id,
                    gid,
                    placement,
                    properties,
                } => {
                    let tile = self.resolve(layer, object_id, gid)?;
                    let placement = sized_placement(placement, tile, self.grid_size());
                    let props = tile.properties.merged_with(&properties);
                    let role = match phase {
                        AssemblyPhase::ReadingObjectLayer => classify(&props, self.config),
                        _ => RoleTag::Plain,
                    };
                    let options = BodyOptions::from_properties(&props);
                    let tile_gid = tile.id;
                    for body in place_tile(&placement, tile, options) {
                        self.push(layer, tile_gid, role, body);
                    }
                }
            }
        }
        log::debug!(
            "layer '{}' ({phase:?}): {} bodies",
            layer.name,
            self.bodies.len() - before
        );
        Ok(())
    }

    fn grid_size(&self) -> Vec2 {
        vec2(self.map.tile_w as f32, self.map.tile_h as f32)
    }

    fn resolve(&self, layer: &IrLayer, object_id: u32, gid: TileId) -> Result<&'a Tile, MapError> {
        self.catalog.get(gid).ok_or_else(|| MapError::UnresolvedReference {
            layer: layer.name.clone(),
            object_id,
            gid: gid.clean(),
        })
    }

    fn push(&mut self, layer: &IrLayer, gid: u32, role: RoleTag, body: BodyPlacement) {
        let id = BodyId(self.bodies.len() as u32);
        self.bodies.push(BodyRequest {
            id,
            gid,
            layer: layer.name.clone(),
            role,
            body,
        });
    }
}

/// Instances saved without a size (and every tile-layer cell) keep the tile's
/// native size, or the map grid size if the tile has no image size either.
fn sized_placement(placement: TilePlacement, tile: &Tile, grid: Vec2) -> TilePlacement {
    if placement.size.x > 0.0 && placement.size.y > 0.0 {
        return placement;
    }
    let native = tile.image_size();
    let size = if native.x > 0.0 && native.y > 0.0 { native } else { grid };
    TilePlacement { size, ..placement }
}

/// Entries of a layer in source order, offsets applied. Non-tile shapes other
/// than markers carry no collision and are dropped.
///
/// Tile-layer cells are anchored at the bottom-left of their grid cell with a
/// zero size, so assembly draws them at the tile's native size.
pub fn placed_objects(layer: &IrLayer, map: &IrMap) -> Result<Vec<PlacedObject>, MapError> {
    match &layer.kind {
        IrLayerKind::Tiles {
            width,
            height,
            data,
        } => {
            if data.len() != width * height {
                return Err(MapError::InvalidMap(format!(
                    "layer '{}' has {} cells, expected {width}x{height}",
                    layer.name,
                    data.len()
                )));
            }
            let tw = map.tile_w as f32;
            let th = map.tile_h as f32;
            Ok(data
                .iter()
                .enumerate()
                .filter(|(_, raw)| !TileId(**raw).is_empty())
                .map(|(idx, raw)| {
                    let col = (idx % *width) as f32;
                    let row = (idx / *width) as f32;
                    let bottom_left = vec2(col * tw, (row + 1.0) * th) + layer.offset;
                    PlacedObject::Tile {
                        object_id: idx as u32,
                        gid: TileId(*raw),
                        placement: TilePlacement::new(bottom_left.x, bottom_left.y, 0.0, 0.0),
                        properties: Properties::new(),
                    }
                })
                .collect())
        }
        IrLayerKind::Objects { objects } => {
            let mut out = Vec::with_capacity(objects.len());
            for obj in objects {
                let position = vec2(obj.x, obj.y) + layer.offset;
                match obj.shape {
                    IrObjectShape::Tile { gid } => out.push(PlacedObject::Tile {
                        object_id: obj.id,
                        gid: TileId(gid),
                        placement: TilePlacement::new(position.x, position.y, obj.width, obj.height),
                        properties: obj.properties.clone(),
                    }),
                    _ if !obj.name.is_empty() => out.push(PlacedObject::Marker {
                        name: obj.name.clone(),
                        position,
                    }),
                    _ => log::debug!(
                        "layer '{}': object {} has no tile; skipped",
                        layer.name,
                        obj.id
                    ),
                }
            }
            Ok(out)
        }
        IrLayerKind::Unsupported => Ok(Vec::new()),
    }
}
