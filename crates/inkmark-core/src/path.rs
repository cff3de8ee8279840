//! Ink paths and the groups they are committed in.

use crate::geometry::{Shape, Stroke};
use crate::path_render;
use crate::view::PageView;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

/// Stable client-side identifier of a [`PathGroup`].
pub type GroupId = Uuid;

#[derive(Debug, Clone)]
struct ViewportCache {
    view: PageView,
    points: Vec<Point>,
}

/// An ordered run of document-space points.
///
/// Viewport points are derived lazily for whatever [`PageView`] they are
/// requested with and regenerated when the view changes.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Path {
    points: Vec<Point>,
    #[serde(skip)]
    viewport_cache: RwLock<Option<ViewportCache>>,
}

impl Clone for Path {
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
            viewport_cache: RwLock::new(self.viewport_cache.read().ok().and_then(|g| g.clone())),
        }
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a path from document-space points.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points,
            viewport_cache: RwLock::new(None),
        }
    }

    /// Append a sample. Only reachable while the path is being captured.
    pub(crate) fn push(&mut self, point: Point) {
        self.points.push(point);
        self.invalidate_viewport();
    }

    /// Get the document-space points.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Viewport points for `view`, regenerated if the view changed.
    pub fn viewport_points(&self, view: &PageView) -> Vec<Point> {
        if let Ok(cache) = self.viewport_cache.read() {
            if let Some(cached) = cache.as_ref().filter(|c| c.view == *view) {
                return cached.points.clone();
            }
        }

        let points: Vec<Point> = self.points.iter().map(|p| view.to_viewport(*p)).collect();
        if let Ok(mut cache) = self.viewport_cache.write() {
            *cache = Some(ViewportCache {
                view: *view,
                points: points.clone(),
            });
        }
        points
    }

    /// Whether viewport points for `view` are already cached.
    pub fn has_viewport_cache(&self, view: &PageView) -> bool {
        self.viewport_cache
            .read()
            .ok()
            .is_some_and(|cache| cache.as_ref().is_some_and(|c| c.view == *view))
    }

    /// Drop cached viewport points.
    pub fn invalidate_viewport(&self) {
        if let Ok(mut cache) = self.viewport_cache.write() {
            *cache = None;
        }
    }

    /// Bounding box in document space, or `None` when empty.
    pub fn bounds(&self) -> Option<Shape> {
        Shape::enclosing(&self.points)
    }

    /// SVG path data for the smoothed curve in viewport space.
    pub fn viewport_path_data(&self, view: &PageView) -> String {
        path_render::path_data(&self.viewport_points(view))
    }

    /// Simplified copy using Ramer-Douglas-Peucker. A non-positive
    /// tolerance returns the path unchanged.
    pub(crate) fn simplified(self, tolerance: f64) -> Self {
        if tolerance <= 0.0 || self.points.len() < 3 {
            return self;
        }
        Self::from_points(rdp_simplify(&self.points, tolerance))
    }

    /// Check if `point` lies within `tolerance` of the polyline.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.points.len() < 2 {
            return self
                .points
                .first()
                .is_some_and(|p| p.distance(point) <= tolerance);
        }

        self.points.windows(2).any(|window| {
            let start = window[0];
            let end = window[1];

            let line_vec = end - start;
            let point_vec = point - start;

            let line_len_sq = line_vec.hypot2();
            if line_len_sq < f64::EPSILON {
                return start.distance(point) <= tolerance;
            }

            let t = (point_vec.dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
            let projection = start + line_vec * t;
            projection.distance(point) <= tolerance
        })
    }
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;

    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);

        // Junction point is in both halves.
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let line: Vec2 = line_end - line_start;
    let len = line.hypot();
    if len < f64::EPSILON {
        return point.distance(line_start);
    }
    (point - line_start).cross(line).abs() / len
}

/// One or more committed paths sharing a stroke; the unit of undo/redo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGroup {
    id: GroupId,
    /// Page (or frame surface) the ink was drawn on.
    #[serde(default = "first_page")]
    page: u32,
    stroke: Stroke,
    paths: Vec<Path>,
}

fn first_page() -> u32 {
    1
}

impl PathGroup {
    /// Create a group on the first page with a fresh id.
    pub fn new(stroke: Stroke, paths: Vec<Path>) -> Self {
        Self {
            id: Uuid::new_v4(),
            page: first_page(),
            stroke,
            paths,
        }
    }

    /// Move the group onto `page`.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Get the group id.
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Get the page the group belongs to.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Get the shared stroke style.
    pub fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    /// Get the paths in drawing order.
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Every document-space point in every path, in order.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.paths.iter().flat_map(|path| path.points().iter())
    }

    /// Bounding box of every point, or `None` when empty.
    pub fn bounds(&self) -> Option<Shape> {
        Shape::enclosing(self.points())
    }

    /// Check if any path passes within `tolerance` of `point`.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.paths.iter().any(|path| path.hit_test(point, tolerance))
    }
}
