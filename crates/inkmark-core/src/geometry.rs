//! Geometry primitives shared by every part of the engine.
//!
//! Document-space values are percentages (0–100) of the content's natural,
//! unrotated dimensions. Viewport-space values are device pixels. A value
//! of either kind is a plain [`kurbo::Point`]; the owning structure decides
//! which space it lives in and never mixes the two.

use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Side length of the normalized document space.
pub const DOCUMENT_EXTENT: f64 = 100.0;

/// Axis-aligned box in document (percentage) space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Shape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Shape {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Check if every component is within `tolerance` of `other`.
    pub fn approx_eq(&self, other: &Shape, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }

    /// Smallest shape containing every point, or `None` for an empty iterator.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Shape> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let rect = points.fold(Rect::from_points(*first, *first), |rect, p| {
            rect.union_pt(*p)
        });
        Some(Shape::from(rect))
    }
}

impl From<Rect> for Shape {
    fn from(rect: Rect) -> Self {
        let rect = rect.abs();
        Self {
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
        }
    }
}

impl From<Shape> for Rect {
    fn from(shape: Shape) -> Self {
        Rect::new(
            shape.x,
            shape.y,
            shape.x + shape.width,
            shape.y + shape.height,
        )
    }
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Format as a CSS hex string (`#rrggbbaa`).
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style shared by every path of a [`PathGroup`](crate::path::PathGroup).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: SerializableColor,
    /// Stroke width in viewport pixels at scale 1.
    pub size: f64,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            size: 4.0,
        }
    }
}
