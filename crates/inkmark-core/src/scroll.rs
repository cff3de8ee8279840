//! Scrolling a container so an annotation target is centered in view.
//!
//! All rectangles are the host's rendered client rectangles, i.e. after
//! any CSS rotation or scale has been applied. Using the untransformed
//! layout box would put rotated targets in the wrong place.

use crate::config::DEFAULT_SCROLL_THRESHOLD_PX;
use crate::geometry::DOCUMENT_EXTENT;
use crate::transform::{Rotation, get_rotated_position};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// How a scroll should be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// A scrollable host element.
pub trait ScrollContainer {
    /// Rendered rectangle of the container in client coordinates.
    fn bounding_rect(&self) -> Rect;
    /// Size of the visible area.
    fn client_size(&self) -> Size;
    /// Current scroll position (left, top).
    fn scroll_offset(&self) -> Point;
    /// Full scrollable size.
    fn scroll_extent(&self) -> Size;
    /// Whether the platform can animate scrolling.
    fn supports_smooth_scroll(&self) -> bool {
        true
    }
    fn scroll_to(&mut self, offset: Point, behavior: ScrollBehavior);
    /// Stop an in-flight smooth scroll, if any.
    fn cancel_smooth_scroll(&mut self) {}
}

/// An element to bring into view.
pub trait ScrollTarget {
    /// Rendered rectangle of the target in client coordinates.
    fn bounding_rect(&self) -> Rect;
}

/// Options for [`scroll_to_location`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollOptions {
    /// Point inside the target to center, in percent of its rendered size.
    /// `None` centers the target's top-left corner.
    pub offsets: Option<Point>,
    /// Largest vertical move, in pixels, that is still animated.
    pub threshold: f64,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            offsets: None,
            threshold: DEFAULT_SCROLL_THRESHOLD_PX,
        }
    }
}

impl ScrollOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_offsets(mut self, offsets: Point) -> Self {
        self.offsets = Some(offsets);
        self
    }

    /// Offset to a document-space location on a page shown with `rotation`.
    pub fn with_document_offset(self, location: Point, rotation: Rotation) -> Self {
        self.with_offsets(get_rotated_position(location, rotation))
    }
}

/// The scroll that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollRequest {
    pub offset: Point,
    pub behavior: ScrollBehavior,
}

/// Scroll `container` so the (offset) top-left of `target` is centered.
///
/// Missing elements are common while the host mounts or unmounts, so a
/// `None` on either side is a no-op.
pub fn scroll_to_location<C, T>(
    container: Option<&mut C>,
    target: Option<&T>,
    options: &ScrollOptions,
) -> Option<ScrollRequest>
where
    C: ScrollContainer + ?Sized,
    T: ScrollTarget + ?Sized,
{
    let (Some(container), Some(target)) = (container, target) else {
        log::debug!("Skipping scroll: container or target not mounted");
        return None;
    };

    let request = compute_scroll(&*container, target, options);
    if request.behavior == ScrollBehavior::Instant {
        container.cancel_smooth_scroll();
    }
    container.scroll_to(request.offset, request.behavior);
    Some(request)
}

/// Stop any smooth scroll still running on `container`, e.g. when the view
/// is torn down. Returns `false` when there is no container.
pub fn cancel_scroll<C>(container: Option<&mut C>) -> bool
where
    C: ScrollContainer + ?Sized,
{
    let Some(container) = container else {
        log::debug!("Skipping scroll cancel: container not mounted");
        return false;
    };
    container.cancel_smooth_scroll();
    true
}

/// Work out the scroll for [`scroll_to_location`] without applying it.
pub fn compute_scroll<C, T>(container: &C, target: &T, options: &ScrollOptions) -> ScrollRequest
where
    C: ScrollContainer + ?Sized,
    T: ScrollTarget + ?Sized,
{
    let container_rect = container.bounding_rect();
    let target_rect = target.bounding_rect();
    let current = container.scroll_offset();
    let client = container.client_size();
    let extent = container.scroll_extent();

    let offset = options.offsets.map_or(Vec2::ZERO, |pct| {
        Vec2::new(
            pct.x / DOCUMENT_EXTENT * target_rect.width(),
            pct.y / DOCUMENT_EXTENT * target_rect.height(),
        )
    });

    let target_left = target_rect.x0 - container_rect.x0 + current.x + offset.x;
    let target_top = target_rect.y0 - container_rect.y0 + current.y + offset.y;

    let left = clamp_scroll(target_left - client.width / 2.0, extent.width);
    let top = clamp_scroll(target_top - client.height / 2.0, extent.height);

    let small_move = (top - current.y).abs() <= options.threshold;
    let behavior = if container.supports_smooth_scroll() && small_move {
        ScrollBehavior::Smooth
    } else {
        ScrollBehavior::Instant
    };

    ScrollRequest {
        offset: Point::new(left, top),
        behavior,
    }
}

fn clamp_scroll(value: f64, extent: f64) -> f64 {
    let max = if extent.is_finite() { extent.max(0.0) } else { 0.0 };
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FakeContainer {
        rect: Rect,
        client: Size,
        offset: Point,
        extent: Size,
        smooth: bool,
        applied: Vec<ScrollRequest>,
        cancelled: usize,
    }

    impl FakeContainer {
        fn new() -> Self {
            Self {
                rect: Rect::new(0.0, 50.0, 800.0, 650.0),
                client: Size::new(800.0, 600.0),
                offset: Point::ZERO,
                extent: Size::new(2000.0, 5000.0),
                smooth: true,
                applied: Vec::new(),
                cancelled: 0,
            }
        }
    }

    impl ScrollContainer for FakeContainer {
        fn bounding_rect(&self) -> Rect {
            self.rect
        }
        fn client_size(&self) -> Size {
            self.client
        }
        fn scroll_offset(&self) -> Point {
            self.offset
        }
        fn scroll_extent(&self) -> Size {
            self.extent
        }
        fn supports_smooth_scroll(&self) -> bool {
            self.smooth
        }
        fn scroll_to(&mut self, offset: Point, behavior: ScrollBehavior) {
            self.offset = offset;
            self.applied.push(ScrollRequest { offset, behavior });
        }
        fn cancel_smooth_scroll(&mut self) {
            self.cancelled += 1;
        }
    }

    struct FakeTarget(Rect);

    impl ScrollTarget for FakeTarget {
        fn bounding_rect(&self) -> Rect {
            self.0
        }
    }

    #[test]
    fn test_centers_target() {
        let mut container = FakeContainer::new();
        let target = FakeTarget(Rect::new(900.0, 1050.0, 1100.0, 1250.0));

        let request =
            scroll_to_location(Some(&mut container), Some(&target), &ScrollOptions::default())
                .unwrap();
        assert_eq!(request.offset, Point::new(500.0, 700.0));
        assert_eq!(request.behavior, ScrollBehavior::Smooth);
        assert_eq!(container.applied, vec![request]);
        assert_eq!(container.cancelled, 0);
    }

    #[test]
    fn test_offsets_are_percent_of_rendered_target() {
        let container = FakeContainer::new();
        let target = FakeTarget(Rect::new(1000.0, 1050.0, 1200.0, 1450.0));
        let options = ScrollOptions::default().with_offsets(Point::new(50.0, 25.0));

        let request = compute_scroll(&container, &target, &options);
        assert_eq!(request.offset, Point::new(700.0, 800.0));
    }

    #[test]
    fn test_document_offset_follows_rotation() {
        let options =
            ScrollOptions::default().with_document_offset(Point::new(10.0, 20.0), Rotation::Deg90);
        let offsets = options.offsets.unwrap();
        assert!((offsets.x - 80.0).abs() < 1e-9);
        assert!((offsets.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_large_jump_is_instant() {
        let mut container = FakeContainer::new();
        let target = FakeTarget(Rect::new(0.0, 4050.0, 10.0, 4060.0));

        let request =
            scroll_to_location(Some(&mut container), Some(&target), &ScrollOptions::default())
                .unwrap();
        assert_eq!(request.behavior, ScrollBehavior::Instant);

        let near = FakeTarget(Rect::new(0.0, 4050.0, 10.0, 4060.0));
        let request = scroll_to_location(
            Some(&mut container),
            Some(&near),
            &ScrollOptions::default().with_threshold(5000.0),
        )
        .unwrap();
        assert_eq!(request.behavior, ScrollBehavior::Smooth);
    }

    #[test]
    fn test_no_smooth_support_is_instant() {
        let mut container = FakeContainer::new();
        container.smooth = false;
        let target = FakeTarget(Rect::new(0.0, 400.0, 10.0, 410.0));

        let request =
            scroll_to_location(Some(&mut container), Some(&target), &ScrollOptions::default())
                .unwrap();
        assert_eq!(request.behavior, ScrollBehavior::Instant);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let positions = [-100_000.0, -500.0, 0.0, 123.0, 4_999.0, 5_000.0, 1e9];
        for &x in &positions {
            for &y in &positions {
                for offset in [Point::ZERO, Point::new(300.0, 4000.0)] {
                    let mut container = FakeContainer::new();
                    container.offset = offset;
                    let target = FakeTarget(Rect::new(x, y, x + 10.0, y + 10.0));
                    let request = compute_scroll(&container, &target, &ScrollOptions::default());
                    assert!(request.offset.x >= 0.0 && request.offset.x <= container.extent.width);
                    assert!(request.offset.y >= 0.0 && request.offset.y <= container.extent.height);
                }
            }
        }
    }

    #[test]
    fn test_missing_elements_are_noop() {
        let mut container = FakeContainer::new();
        let target = FakeTarget(Rect::new(0.0, 0.0, 1.0, 1.0));

        assert!(
            scroll_to_location::<FakeContainer, FakeTarget>(
                None,
                Some(&target),
                &ScrollOptions::default()
            )
            .is_none()
        );
        assert!(
            scroll_to_location::<FakeContainer, FakeTarget>(
                Some(&mut container),
                None,
                &ScrollOptions::default()
            )
            .is_none()
        );
        assert!(container.applied.is_empty());
    }

    #[test]
    fn test_instant_jump_cancels_smooth_scroll() {
        let mut container = FakeContainer::new();
        let near = FakeTarget(Rect::new(0.0, 400.0, 10.0, 410.0));
        let far = FakeTarget(Rect::new(0.0, 4050.0, 10.0, 4060.0));
        let options = ScrollOptions::default();

        scroll_to_location(Some(&mut container), Some(&near), &options);
        assert_eq!(container.cancelled, 0);

        let request = scroll_to_location(Some(&mut container), Some(&far), &options).unwrap();
        assert_eq!(request.behavior, ScrollBehavior::Instant);
        assert_eq!(container.cancelled, 1);
        assert_eq!(container.applied.len(), 2);
    }

    #[test]
    fn test_cancel_scroll() {
        let mut container = FakeContainer::new();
        assert!(cancel_scroll(Some(&mut container)));
        assert_eq!(container.cancelled, 1);
        assert!(container.applied.is_empty());

        assert!(!cancel_scroll::<FakeContainer>(None));
    }
}
