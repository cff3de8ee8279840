//! Smoothed curve generation for captured strokes.
//!
//! Interior samples become quadratic control points and the curve passes
//! through the midpoints between consecutive samples. This gives a smooth
//! line through noisy pointer input without any fitting state, and the same
//! input always yields the same output.

use kurbo::{BezPath, Point};

/// Build the smoothed curve through `points`.
///
/// A single point becomes a zero-length segment so round caps render it as
/// a dot. No points yields an empty path.
pub fn smooth_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();

    let Some((first, rest)) = points.split_first() else {
        return path;
    };

    path.move_to(*first);

    let Some((last, interior)) = rest.split_last() else {
        path.line_to(*first);
        return path;
    };

    for (i, control) in interior.iter().enumerate() {
        let next = rest[i + 1];
        path.quad_to(*control, control.midpoint(next));
    }
    path.line_to(*last);

    path
}

/// SVG path data for the smoothed curve through `points`.
pub fn path_data(points: &[Point]) -> String {
    if points.is_empty() {
        return String::new();
    }
    smooth_path(points).to_svg()
}
