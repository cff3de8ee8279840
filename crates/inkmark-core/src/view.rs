//! Viewport mapping between document percentages and on-screen pixels.

use crate::geometry::DOCUMENT_EXTENT;
use crate::transform::{Rotation, get_rotated_position};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// How the host currently displays one content surface.
///
/// `rotation` and `scale` are driven by the viewer host; this engine only
/// consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    /// Page (or frame surface) currently shown.
    pub page: u32,
    pub rotation: Rotation,
    /// Zoom factor (1.0 = natural size).
    pub scale: f64,
    /// Unrotated, unscaled content size in pixels.
    pub natural_size: Size,
}

impl Default for PageView {
    fn default() -> Self {
        Self {
            page: 1,
            rotation: Rotation::Deg0,
            scale: 1.0,
            natural_size: Size::new(DOCUMENT_EXTENT, DOCUMENT_EXTENT),
        }
    }
}

impl PageView {
    pub fn new(page: u32, natural_size: Size) -> Self {
        Self {
            page,
            natural_size,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// On-screen size of the surface after scale and rotation.
    pub fn displayed_size(&self) -> Size {
        let scaled = self.natural_size * self.scale;
        if self.rotation.swaps_axes() {
            Size::new(scaled.height, scaled.width)
        } else {
            scaled
        }
    }

    /// Whether the surface has a usable on-screen area.
    pub fn is_renderable(&self) -> bool {
        let size = self.displayed_size();
        size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0
    }

    /// Check if a viewport pixel lies on the displayed surface.
    pub fn contains(&self, pixel: Point) -> bool {
        let size = self.displayed_size();
        self.is_renderable()
            && (0.0..=size.width).contains(&pixel.x)
            && (0.0..=size.height).contains(&pixel.y)
    }

    /// Map a document-space position to viewport pixels.
    pub fn to_viewport(&self, document: Point) -> Point {
        let rotated = get_rotated_position(document, self.rotation);
        let size = self.displayed_size();
        Point::new(
            rotated.x * size.width / DOCUMENT_EXTENT,
            rotated.y * size.height / DOCUMENT_EXTENT,
        )
    }

    /// Map a viewport pixel position back to document space, clamped to the
    /// page. Returns `None` while the surface has no area.
    pub fn to_document(&self, pixel: Point) -> Option<Point> {
        if !self.is_renderable() {
            return None;
        }
        let size = self.displayed_size();
        let rotated = Point::new(
            (pixel.x * DOCUMENT_EXTENT / size.width).clamp(0.0, DOCUMENT_EXTENT),
            (pixel.y * DOCUMENT_EXTENT / size.height).clamp(0.0, DOCUMENT_EXTENT),
        );
        Some(get_rotated_position(rotated, self.rotation.inverse()))
    }
}
