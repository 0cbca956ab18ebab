//! Placement requests for static bodies built from placed tile instances.
//!
//! The editor anchors tile objects at the bottom-left of their bounding box
//! (Y down) while shape offsets are measured from the tile's top-left, so a
//! shape's world position is `(x + offset.x, y - height + offset.y)`.

use crate::ir_map::Properties;
use crate::shape::CollisionShape;
use crate::tileset::Tile;
use macroquad::prelude::*;

/// A tile instance placed on the map, bottom-left anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    /// Bottom-left corner in world pixels.
    pub position: Vec2,
    /// Size the instance was placed at.
    pub size: Vec2,
}

impl TilePlacement {
    /// Placement with its bottom-left corner at `(x, y)`.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: vec2(x, y),
            size: vec2(width, height),
        }
    }

    /// Top-left corner, where tile-local offsets start.
    pub fn anchor(&self) -> Vec2 {
        vec2(self.position.x, self.position.y - self.size.y)
    }
}

/// Shape of a body as the physics engine should build it, centred on the
/// body's position.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyShape {
    /// Convex polygon around its centroid.
    Polygon {
        /// Vertices relative to the body position.
        vertices: Vec<Vec2>,
    },
    /// Circle centred on the body position.
    Circle {
        /// Radius in world pixels.
        radius: f32,
    },
    /// Axis-aligned box centred on the body position.
    Rectangle {
        /// Full width.
        width: f32,
        /// Full height.
        height: f32,
    },
}

/// Per-body material options read from custom properties.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyOptions {
    /// Bounciness override.
    pub restitution: Option<f32>,
    /// Friction override.
    pub friction: Option<f32>,
    /// Detects contacts without a collision response.
    pub is_sensor: bool,
}

impl BodyOptions {
    /// Read `restitution`, `friction` and `is_sensor`; absent values stay unset.
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            restitution: props.get_f32("restitution"),
            friction: props.get_f32("friction"),
            is_sensor: props.get_bool("is_sensor").unwrap_or(false),
        }
    }
}

/// One rigid body to hand to the physics engine.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyPlacement {
    /// World position of the shape's reference point.
    pub position: Vec2,
    /// Geometry around `position`.
    pub shape: BodyShape,
    /// Level geometry never moves.
    pub is_static: bool,
    /// Material overrides.
    pub options: BodyOptions,
}

/// Uniform scale for an instance placed at `placed` when its geometry was
/// authored at `reference`: the mean of the two axis ratios.
///
/// An axis with no reference size counts as unscaled.
pub fn scale_factor(placed: Vec2, reference: Vec2) -> f32 {
    let ratio = |p: f32, r: f32| if r > 0.0 { p / r } else { 1.0 };
    (ratio(placed.x, reference.x) + ratio(placed.y, reference.y)) / 2.0
}

/// Body for one of `tile`'s collision shapes.
///
/// Circles scale against their authoring reference and rectangles against the
/// tile image. Polygons are placed as authored.
pub fn place_shape(
    placed: &TilePlacement,
    tile: &Tile,
    shape: &CollisionShape,
    options: BodyOptions,
) -> BodyPlacement {
    let anchor = placed.anchor();
    let (offset, body_shape) = match shape {
        CollisionShape::Polygon {
            local_vertices,
            centroid_offset,
        } => (
            *centroid_offset,
            BodyShape::Polygon {
                vertices: local_vertices.clone(),
            },
        ),
        CollisionShape::Circle {
            center_offset,
            radius,
            reference_width,
            reference_height,
        } => {
            let s = scale_factor(placed.size, vec2(*reference_width, *reference_height));
            (*center_offset * s, BodyShape::Circle { radius: radius * s })
        }
        CollisionShape::Rectangle {
            center_offset,
            width,
            height,
        } => {
            let s = scale_factor(placed.size, tile.image_size());
            (
                *center_offset * s,
                BodyShape::Rectangle {
                    width: width * s,
                    height: height * s,
                },
            )
        }
        CollisionShape::TileBounds => return bounds_body(placed, options),
    };

    BodyPlacement {
        position: anchor + offset,
        shape: body_shape,
        is_static: true,
        options,
    }
}

/// Rectangle covering the placed box on both axes.
fn bounds_body(placed: &TilePlacement, options: BodyOptions) -> BodyPlacement {
    BodyPlacement {
        position: placed.anchor() + placed.size / 2.0,
        shape: BodyShape::Rectangle {
            width: placed.size.x,
            height: placed.size.y,
        },
        is_static: true,
        options,
    }
}

/// Every body for a placed tile: one per collision shape, or a single
/// rectangle over the placed bounds when the tile authors none.
pub fn place_tile(placed: &TilePlacement, tile: &Tile, options: BodyOptions) -> Vec<BodyPlacement> {
    if tile.collision_shapes.is_empty() {
        return vec![bounds_body(placed, options)];
    }

    tile.collision_shapes
        .iter()
        .map(|shape| place_shape(placed, tile, shape, options))
        .collect()
}
