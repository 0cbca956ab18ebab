//! Tile collision shapes with a local-origin convention.
//!
//! Offsets are measured from the tile's top-left anchor, Y down, the way the
//! editor authors them. Polygons keep their vertices around their own centroid
//! so a physics engine that re-centres the body on its centre of mass ends up
//! storing the same vertex data we do.

use crate::error::MapError;
use macroquad::prelude::*;
use std::f32::consts::TAU;

/// Collision object as read from a tile's object group, in tile-local pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum RawShape {
    /// Absolute tile-local vertices, in authoring order.
    Polygon(Vec<Vec2>),
    /// Bounding box of an ellipse.
    Ellipse(Rect),
    /// Bounding box of a rectangle. Objects with no specific kind land here.
    Rectangle(Rect),
    /// Kinds without a body conversion (polyline, point, text).
    Unsupported {
        /// Editor kind name.
        kind: &'static str,
    },
}

/// Engine-agnostic collision shape attached to a tile.
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    /// Convex polygon, vertices relative to its own centroid.
    Polygon {
        /// Vertices minus `centroid_offset`.
        local_vertices: Vec<Vec2>,
        /// Where the centroid sits relative to the tile anchor.
        centroid_offset: Vec2,
    },
    /// Circle (ellipses are approximated).
    Circle {
        /// Centre relative to the tile anchor.
        center_offset: Vec2,
        /// Radius in tile pixels.
        radius: f32,
        /// Tile image width when the shape was authored.
        reference_width: f32,
        /// Tile image height when the shape was authored.
        reference_height: f32,
    },
    /// Axis-aligned rectangle.
    Rectangle {
        /// Centre relative to the tile anchor.
        center_offset: Vec2,
        /// Full width.
        width: f32,
        /// Full height.
        height: f32,
    },
    /// Stand-in for a collision object with no body conversion. Covers
    /// whatever box the instance is placed at.
    TileBounds,
}

impl CollisionShape {
    /// The shape's reference point relative to the tile anchor, for a tile
    /// of `size`.
    pub fn offset(&self, size: Vec2) -> Vec2 {
        match self {
            CollisionShape::Polygon { centroid_offset, .. } => *centroid_offset,
            CollisionShape::Circle { center_offset, .. }
            | CollisionShape::Rectangle { center_offset, .. } => *center_offset,
            CollisionShape::TileBounds => size / 2.0,
        }
    }
}

/// Convert a raw collision object into a [`CollisionShape`].
///
/// `reference` is the tile's native image size, kept on circles for later
/// scale compensation.
///
/// Adding `centroid_offset` back to a polygon's local vertices gives the input
/// exactly for integer pixel coordinates. Fractional input comes back within a
/// few ULPs of f32.
pub fn normalize(raw: &RawShape, reference: Vec2) -> Result<CollisionShape, MapError> {
    match raw {
        RawShape::Polygon(points) => normalize_polygon(points),
        RawShape::Ellipse(bounds) => Ok(CollisionShape::Circle {
            center_offset: bounds.center(),
            radius: (bounds.w / 2.0 + bounds.h / 2.0) / 2.0,
            reference_width: reference.x,
            reference_height: reference.y,
        }),
        RawShape::Rectangle(bounds) => Ok(CollisionShape::Rectangle {
            center_offset: bounds.center(),
            width: bounds.w,
            height: bounds.h,
        }),
        RawShape::Unsupported { kind } => Err(MapError::UnsupportedShape {
            kind: (*kind).to_owned(),
        }),
    }
}

fn normalize_polygon(points: &[Vec2]) -> Result<CollisionShape, MapError> {
    ensure_convex(points)?;
    let centroid = polygon_centroid(points);
    Ok(CollisionShape::Polygon {
        local_vertices: points.iter().map(|p| *p - centroid).collect(),
        centroid_offset: centroid,
    })
}

/// Area-weighted centroid; falls back to the vertex mean for zero-area input.
pub fn polygon_centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }

    let mut twice_area = 0.0f32;
    let mut acc = Vec2::ZERO;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        let cross = a.perp_dot(b);
        twice_area += cross;
        acc += (*a + b) * cross;
    }

    if twice_area.abs() <= f32::EPSILON {
        let sum = points.iter().fold(Vec2::ZERO, |s, p| s + *p);
        return sum / points.len() as f32;
    }
    acc / (3.0 * twice_area)
}

/// Reject polygons that are degenerate, concave or wind around more than once.
fn ensure_convex(points: &[Vec2]) -> Result<(), MapError> {
    let n = points.len();
    if n < 3 {
        return Err(MapError::InvalidGeometry(format!(
            "polygon needs at least 3 vertices, got {n}"
        )));
    }

    let mut winding = 0.0f32;
    let mut turn_sign = 0.0f32;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let e1 = b - a;
        let e2 = c - b;
        if e1.length_squared() == 0.0 {
            return Err(MapError::InvalidGeometry(format!(
                "polygon repeats vertex {i} ({}, {})",
                a.x, a.y
            )));
        }

        let cross = e1.perp_dot(e2);
        let tolerance = 1e-6 * e1.length() * e2.length();
        if cross.abs() > tolerance {
            let sign = cross.signum();
            if turn_sign == 0.0 {
                turn_sign = sign;
            } else if sign != turn_sign {
                return Err(MapError::InvalidGeometry(format!(
                    "polygon is concave at vertex {}",
                    (i + 1) % n
                )));
            }
        }
        winding += cross.atan2(e1.dot(e2));
    }

    if turn_sign == 0.0 {
        return Err(MapError::InvalidGeometry(
            "polygon vertices are collinear".to_owned(),
        ));
    }
    // A star turns the same way at every corner but winds 4π.
    if (winding.abs() - TAU).abs() > 1e-3 {
        return Err(MapError::InvalidGeometry(
            "polygon is self-intersecting".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f32, y: f32, size: f32) -> Vec<Vec2> {
        vec![
            vec2(x, y),
            vec2(x + size, y),
            vec2(x + size, y + size),
            vec2(x, y + size),
        ]
    }

    #[test]
    fn polygon_is_stored_around_its_centroid() {
        let shape = normalize(&RawShape::Polygon(square(0.0, 0.0, 40.0)), vec2(40.0, 40.0))
            .expect("square is convex");
        match shape {
            CollisionShape::Polygon {
                local_vertices,
                centroid_offset,
            } => {
                assert_eq!(centroid_offset, vec2(20.0, 20.0));
                assert_eq!(local_vertices[0], vec2(-20.0, -20.0));
                assert_eq!(local_vertices[2], vec2(20.0, 20.0));
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn adding_centroid_back_restores_integer_vertices_exactly() {
        let inputs = [
            square(8.0, 4.0, 16.0),
            vec![vec2(0.0, 0.0), vec2(30.0, 0.0), vec2(0.0, 30.0)],
            vec![vec2(0.0, 30.0), vec2(30.0, 0.0), vec2(0.0, 0.0)],
            vec![
                vec2(4.0, 0.0),
                vec2(12.0, 0.0),
                vec2(16.0, 8.0),
                vec2(12.0, 16.0),
                vec2(4.0, 16.0),
                vec2(0.0, 8.0),
            ],
        ];
        for points in inputs {
            let shape = normalize(&RawShape::Polygon(points.clone()), Vec2::ZERO)
                .expect("convex input");
            let CollisionShape::Polygon {
                local_vertices,
                centroid_offset,
            } = shape
            else {
                panic!("expected polygon");
            };
            let restored: Vec<Vec2> = local_vertices.iter().map(|v| *v + centroid_offset).collect();
            assert_eq!(restored, points);
        }
    }

    #[test]
    fn fractional_vertices_round_trip_within_float_tolerance() {
        let points = vec![vec2(0.1, 0.2), vec2(3.7, 0.3), vec2(1.3, 5.9)];
        let shape = normalize(&RawShape::Polygon(points.clone()), Vec2::ZERO).expect("triangle");
        let CollisionShape::Polygon {
            local_vertices,
            centroid_offset,
        } = shape
        else {
            panic!("expected polygon");
        };
        for (local, input) in local_vertices.iter().zip(&points) {
            let restored = *local + centroid_offset;
            assert!(
                restored.abs_diff_eq(*input, 1e-5),
                "{restored:?} drifted from {input:?}"
            );
        }
    }

    #[test]
    fn triangle_centroid_is_area_weighted() {
        let c = polygon_centroid(&[vec2(0.0, 0.0), vec2(30.0, 0.0), vec2(0.0, 30.0)]);
        assert_eq!(c, vec2(10.0, 10.0));
    }

    #[test]
    fn rejects_too_few_vertices() {
        let err = normalize(&RawShape::Polygon(vec![vec2(0.0, 0.0), vec2(1.0, 0.0)]), Vec2::ZERO)
            .unwrap_err();
        assert!(matches!(err, MapError::InvalidGeometry(_)));
    }

    #[test]
    fn rejects_concave_polygon() {
        // Arrow head pointing right with a notch at (4, 5).
        let points = vec![
            vec2(0.0, 0.0),
            vec2(10.0, 5.0),
            vec2(0.0, 10.0),
            vec2(4.0, 5.0),
        ];
        let err = normalize(&RawShape::Polygon(points), Vec2::ZERO).unwrap_err();
        assert!(matches!(err, MapError::InvalidGeometry(msg) if msg.contains("concave")));
    }

    #[test]
    fn rejects_self_intersecting_star() {
        let outer: Vec<Vec2> = (0..5)
            .map(|k| {
                let a = k as f32 * TAU / 5.0;
                vec2(a.cos() * 10.0, a.sin() * 10.0)
            })
            .collect();
        let star = vec![outer[0], outer[2], outer[4], outer[1], outer[3]];
        let err = normalize(&RawShape::Polygon(star), Vec2::ZERO).unwrap_err();
        assert!(matches!(err, MapError::InvalidGeometry(_)));
    }

    #[test]
    fn rejects_collinear_and_repeated_vertices() {
        let line = vec![vec2(0.0, 0.0), vec2(5.0, 0.0), vec2(10.0, 0.0)];
        assert!(normalize(&RawShape::Polygon(line), Vec2::ZERO).is_err());

        let repeated = vec![vec2(0.0, 0.0), vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(0.0, 10.0)];
        assert!(normalize(&RawShape::Polygon(repeated), Vec2::ZERO).is_err());
    }

    #[test]
    fn ellipse_becomes_circle_with_mean_half_extent() {
        let shape = normalize(
            &RawShape::Ellipse(Rect::new(2.0, 4.0, 20.0, 12.0)),
            vec2(24.0, 24.0),
        )
        .expect("ellipse");
        assert_eq!(
            shape,
            CollisionShape::Circle {
                center_offset: vec2(12.0, 10.0),
                radius: 8.0,
                reference_width: 24.0,
                reference_height: 24.0,
            }
        );
    }

    #[test]
    fn rectangle_keeps_size_and_centers_offset() {
        let shape = normalize(&RawShape::Rectangle(Rect::new(0.0, 0.0, 40.0, 40.0)), Vec2::ZERO)
            .expect("rectangle");
        assert_eq!(
            shape,
            CollisionShape::Rectangle {
                center_offset: vec2(20.0, 20.0),
                width: 40.0,
                height: 40.0,
            }
        );
        assert_eq!(shape.offset(vec2(40.0, 40.0)), vec2(20.0, 20.0));
    }

    #[test]
    fn tile_bounds_offset_follows_the_tile_size() {
        assert_eq!(CollisionShape::TileBounds.offset(vec2(80.0, 40.0)), vec2(40.0, 20.0));
    }

    #[test]
    fn unsupported_kind_is_reported() {
        let raw = RawShape::Unsupported { kind: "polyline" };
        let err = normalize(&raw, Vec2::ZERO).unwrap_err();
        assert!(matches!(err, MapError::UnsupportedShape { kind } if kind == "polyline"));
    }
}
