//! Rotation math for normalized annotation geometry.
//!
//! Shapes are stored in the content's unrotated percentage space. When the
//! viewer host turns the content by a quarter turn, every stored shape has
//! to be re-expressed in the rotated space so its top-left corner and size
//! line up with what is on screen. The pipeline is:
//!
//! 1. pick the corner that becomes the new top-left,
//! 2. flip Y so the math runs in a bottom-up frame,
//! 3. rotate that corner about the origin,
//! 4. translate so the rotated page is anchored back at the origin,
//! 5. flip Y back to screen convention.

use crate::geometry::{DOCUMENT_EXTENT, Shape};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transform errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("Unsupported rotation: {0} degrees (expected a multiple of 90)")]
    UnsupportedRotation(i32),
}

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Clockwise quarter turn applied to the content by the viewer host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Normalize a raw degree value. Negative values are counter-clockwise
    /// turns, so `-90` is the same orientation as `270`.
    pub fn from_degrees(degrees: i32) -> TransformResult<Self> {
        if degrees % 90 != 0 {
            return Err(TransformError::UnsupportedRotation(degrees));
        }
        Ok(match degrees.rem_euclid(360) {
            0 => Rotation::Deg0,
            90 => Rotation::Deg90,
            180 => Rotation::Deg180,
            _ => Rotation::Deg270,
        })
    }

    /// Clockwise degrees in `[0, 360)`.
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// The rotation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg0,
            Rotation::Deg90 => Rotation::Deg270,
            Rotation::Deg180 => Rotation::Deg180,
            Rotation::Deg270 => Rotation::Deg90,
        }
    }

    /// Whether width and height trade places under this rotation.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Translation that re-anchors the rotated page at the origin, in
    /// screen convention, measured against the unrotated 100x100 space.
    fn anchor_offset(self) -> Vec2 {
        let (width, height) = (DOCUMENT_EXTENT, DOCUMENT_EXTENT);
        match self {
            Rotation::Deg0 => Vec2::ZERO,
            Rotation::Deg90 => Vec2::new(height, 0.0),
            Rotation::Deg180 => Vec2::new(width, height),
            Rotation::Deg270 => Vec2::new(0.0, width),
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = TransformError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// The four corners of a shape, clockwise from its origin.
pub fn get_points(shape: &Shape) -> [Point; 4] {
    let Shape {
        x,
        y,
        width,
        height,
    } = *shape;
    [
        Point::new(x, y),
        Point::new(x + width, y),
        Point::new(x + width, y + height),
        Point::new(x, y + height),
    ]
}

/// The corner that ends up as the top-left after rotating by `rotation`.
///
/// In the host's counter-clockwise notation this is 0 -> first, -90 ->
/// second, -180 -> third, -270 -> fourth corner.
pub fn select_transformation_point(shape: &Shape, rotation: Rotation) -> Point {
    let [p1, p2, p3, p4] = get_points(shape);
    match rotation {
        Rotation::Deg0 => p1,
        Rotation::Deg90 => p4,
        Rotation::Deg180 => p3,
        Rotation::Deg270 => p2,
    }
}

/// Standard counter-clockwise 2D rotation about the origin.
pub fn rotate_point(point: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Point::new(
        point.x * cos - point.y * sin,
        point.x * sin + point.y * cos,
    )
}

fn invert_y(point: Point) -> Point {
    Point::new(point.x, -point.y)
}

/// Re-express a document-space shape in the rotated page's space.
pub fn get_rotated_shape(shape: &Shape, rotation: Rotation) -> Shape {
    // Skip the trig entirely so a no-op stays bit-exact.
    if rotation == Rotation::Deg0 {
        return *shape;
    }

    let corner = invert_y(select_transformation_point(shape, rotation));
    let rotated = rotate_point(corner, -f64::from(rotation.degrees()));

    // Offsets are screen convention; Y is still flipped here.
    let offset = rotation.anchor_offset();
    let anchored = Point::new(rotated.x + offset.x, rotated.y - offset.y);
    let origin = invert_y(anchored);

    let (width, height) = if rotation.swaps_axes() {
        (shape.height, shape.width)
    } else {
        (shape.width, shape.height)
    };

    Shape {
        x: origin.x,
        y: origin.y,
        width,
        height,
    }
}

/// Re-express a single document-space position in the rotated page's space.
pub fn get_rotated_position(point: Point, rotation: Rotation) -> Point {
    get_rotated_shape(&Shape::new(point.x, point.y, 0.0, 0.0), rotation).origin()
}
