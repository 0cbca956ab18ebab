#![warn(missing_docs)]

//! Tiled JSON level loader that turns tile collision shapes into static
//! physics body placements, tagged with their gameplay role.
//!
//! The pipeline runs once per level: tilesets become a [`TileCatalog`], every
//! placed tile becomes one [`BodyPlacement`] per collision shape, and the
//! resulting [`Level`] answers contact queries with a [`ContactEffect`].

mod body;
mod config;
mod error;
mod gid;
#[allow(missing_docs)]
mod ir_map;
mod loader {
    pub mod json_loader;
}
mod map;
mod role;
mod shape;
mod tileset;

pub use body::{place_shape, place_tile, scale_factor, BodyOptions, BodyPlacement, BodyShape, TilePlacement};
pub use config::LevelConfig;
pub use error::MapError;
pub use gid::{TileId, FLIP_D, FLIP_H, FLIP_V, GID_MASK};
pub use ir_map::{
    IrLayer, IrLayerKind, IrMap, IrObject, IrObjectShape, IrTileMetadata, IrTileset, Properties,
    PropertyValue,
};
pub use loader::json_loader::{decode_map_file_to_ir, decode_map_str_to_ir, decode_tileset_str_to_ir};
pub use map::{placed_objects, BodyId, BodyRequest, ContactEvent, Level, PlacedObject};
pub use role::{classify, contact_effect, Contact, ContactEffect, RoleTag};
pub use shape::{normalize, polygon_centroid, CollisionShape, RawShape};
pub use tileset::{parse_tileset, raw_shape, Tile, TileCatalog};
