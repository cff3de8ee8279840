//! The annotation engine for one content surface.

use crate::capture::{CaptureEnd, LoopControl, RedrawLoop, StrokeCapture};
use crate::config::EngineConfig;
use crate::events::{AnnotatorEvent, EventBus, SubscriptionId};
use crate::geometry::{Shape, Stroke};
use crate::history::{EditHistory, HistoryCounts};
use crate::media::{MediaElement, MediaTimeGate};
use crate::path::{GroupId, PathGroup};
use crate::scroll::ScrollOptions;
use crate::transform::{self, Rotation, TransformResult};
use crate::view::PageView;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Outcome of an undo or redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoResult {
    pub success: bool,
    pub counts: HistoryCounts,
}

/// One committed path ready to be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPath {
    pub group: GroupId,
    pub stroke: Stroke,
    /// SVG path data in viewport pixels.
    pub data: String,
}

/// Capture, history and redraw scheduling for one content surface.
///
/// Input positions are viewport pixels; everything stored is in document
/// space so it survives zoom and rotation changes.
#[derive(Debug)]
pub struct Annotator {
    config: EngineConfig,
    view: PageView,
    stroke: Stroke,
    capture: StrokeCapture,
    history: EditHistory,
    redraw: RedrawLoop,
    events: EventBus,
    /// Set when the host must schedule a redraw tick.
    frame_requested: bool,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Annotator {
    /// Create an engine on page 1 of a default view.
    pub fn new(config: EngineConfig) -> Self {
        let capture = StrokeCapture::new().with_simplify_tolerance(config.simplify_tolerance);
        Self {
            stroke: config.default_stroke,
            config,
            view: PageView::default(),
            capture,
            history: EditHistory::new(),
            redraw: RedrawLoop::new(),
            events: EventBus::new(),
            frame_requested: false,
        }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the current display state.
    pub fn view(&self) -> &PageView {
        &self.view
    }

    /// Get the edit history across all pages.
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Get the stroke capture state.
    pub fn capture(&self) -> &StrokeCapture {
        &self.capture
    }

    /// Get the style applied to new strokes.
    pub fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    /// Style for strokes started from now on.
    pub fn set_stroke(&mut self, stroke: Stroke) {
        self.stroke = stroke;
    }

    /// Start a stroke at a viewport pixel. Returns false if the view has
    /// no area.
    pub fn begin_stroke(&mut self, pixel: Point) -> bool {
        let started = self.capture.begin(pixel, &self.view, self.stroke);
        if started {
            self.request_frame();
        }
        started
    }

    /// Add a viewport sample. Returns false if it was coalesced away.
    pub fn update_stroke(&mut self, pixel: Point) -> bool {
        self.capture.update(pixel, &self.view)
    }

    /// Finish the current stroke. Emits [`AnnotatorEvent::Committed`] when a
    /// group was added to history.
    pub fn end_stroke(&mut self) -> CaptureEnd {
        let end = self.capture.end(&mut self.history);
        if let CaptureEnd::Committed(group) = &end {
            self.events.emit(&AnnotatorEvent::Committed(group.clone()));
            self.emit_counts();
        }
        end
    }

    /// The content under the surface is about to change. Any stroke in
    /// progress is soft-committed and announced.
    pub fn force_content_change(&mut self) -> Option<PathGroup> {
        if !self.capture.is_capturing() {
            return None;
        }
        let group = self.capture.soft_end(&mut self.history);
        self.events.emit(&AnnotatorEvent::SoftCommit(group.clone()));
        if group.is_some() {
            self.emit_counts();
        }
        group
    }

    /// Update the host's display state. Navigating to another page while
    /// capturing soft-commits the stroke.
    pub fn set_view(&mut self, view: PageView) {
        if view == self.view {
            return;
        }
        if view.page != self.view.page {
            log::debug!("Page changed from {} to {}", self.view.page, view.page);
            self.force_content_change();
        }
        self.view = view;
        self.request_frame();
    }

    /// Returns true once per pending request; the host then schedules
    /// [`Annotator::tick`] on its next frame.
    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }

    /// Run one redraw tick. Keep scheduling ticks while this returns
    /// [`LoopControl::Continue`].
    pub fn tick(&mut self) -> LoopControl {
        self.redraw.tick(&mut self.capture, &self.view)
    }

    fn request_frame(&mut self) {
        if self.redraw.request() {
            self.frame_requested = true;
        }
    }

    /// Undo the last commit, on any page.
    pub fn undo(&mut self) -> UndoResult {
        let success = self.history.undo();
        self.history_result(success)
    }

    /// Redo the last undone commit.
    pub fn redo(&mut self) -> UndoResult {
        let success = self.history.redo();
        self.history_result(success)
    }

    /// Get the undo and redo stack sizes.
    pub fn counts(&self) -> HistoryCounts {
        self.history.counts()
    }

    /// Bounding box of the ink committed on the current page.
    pub fn bounding_box(&self) -> Option<Shape> {
        self.history.page_bounding_box(self.view.page)
    }

    /// Delete a committed group, e.g. after its save failed.
    pub fn remove_group(&mut self, id: GroupId) -> Option<PathGroup> {
        let removed = self.history.remove(id);
        if removed.is_some() {
            self.emit_counts();
        }
        removed
    }

    /// Topmost committed group on the current page under a viewport pixel.
    /// Pixels off the page never hit.
    pub fn group_at(&self, pixel: Point) -> Option<&PathGroup> {
        if !self.view.contains(pixel) {
            return None;
        }
        let point = self.view.to_document(pixel)?;
        self.history
            .group_at(self.view.page, point, self.config.hit_tolerance)
    }

    fn history_result(&mut self, success: bool) -> UndoResult {
        if success {
            self.emit_counts();
        }
        UndoResult {
            success,
            counts: self.history.counts(),
        }
    }

    fn emit_counts(&mut self) {
        let counts = self.history.counts();
        self.events.emit(&AnnotatorEvent::HistoryChanged(counts));
    }

    /// Committed paths on the current page, in paint order.
    pub fn render(&self) -> Vec<RenderedPath> {
        self.history
            .committed()
            .iter()
            .filter(|group| group.page() == self.view.page)
            .flat_map(|group| {
                group.paths().iter().map(|path| RenderedPath {
                    group: group.id(),
                    stroke: *group.stroke(),
                    data: path.viewport_path_data(&self.view),
                })
            })
            .collect()
    }

    /// Path data for the stroke in progress.
    pub fn active_path_data(&self) -> Option<String> {
        self.capture
            .active()
            .map(|active| active.path().viewport_path_data(&self.view))
    }

    /// Rotate a document-space shape by a host rotation in degrees.
    pub fn transform_shape(shape: &Shape, degrees: i32) -> TransformResult<Shape> {
        let rotation = Rotation::from_degrees(degrees)?;
        Ok(transform::get_rotated_shape(shape, rotation))
    }

    /// Rotate a document-space position by a host rotation in degrees.
    pub fn transform_point(point: Point, degrees: i32) -> TransformResult<Point> {
        let rotation = Rotation::from_degrees(degrees)?;
        Ok(transform::get_rotated_position(point, rotation))
    }

    /// Scroll options using the configured animation threshold.
    pub fn scroll_options(&self) -> ScrollOptions {
        ScrollOptions::default().with_threshold(self.config.scroll_threshold_px)
    }

    /// A media gate using the configured seek tolerance.
    pub fn media_gate<M: MediaElement>(&self) -> MediaTimeGate<M> {
        MediaTimeGate::new(self.config.seek_tolerance_ms)
    }

    /// Register a listener for this instance's events.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&AnnotatorEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Tear down: drop the stroke in progress, stop the redraw loop,
    /// release history and listeners.
    pub fn destroy(&mut self) {
        self.capture.cancel();
        self.redraw.cancel();
        self.frame_requested = false;
        self.history.destroy();
        self.events.clear();
        log::debug!("Annotator destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_render;
    use crate::transform::TransformError;
    use kurbo::Size;
    use std::sync::{Arc, Mutex};

    fn recorded(annotator: &mut Annotator) -> Arc<Mutex<Vec<AnnotatorEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        annotator.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    fn draw(annotator: &mut Annotator, from: Point, to: Point) -> PathGroup {
        annotator.begin_stroke(from);
        annotator.update_stroke(to);
        match annotator.end_stroke() {
            CaptureEnd::Committed(group) => group,
            other => panic!("expected a commit, got {other:?}"),
        }
    }

    #[test]
    fn test_stroke_end_to_end() {
        let mut annotator = Annotator::default();
        let events = recorded(&mut annotator);

        assert!(annotator.begin_stroke(Point::new(10.0, 10.0)));
        assert!(annotator.take_frame_request());
        assert!(!annotator.take_frame_request());
        assert!(annotator.update_stroke(Point::new(15.0, 15.0)));
        let CaptureEnd::Committed(group) = annotator.end_stroke() else {
            panic!("expected a commit");
        };

        assert_eq!(
            group.paths()[0].points(),
            &[Point::new(10.0, 10.0), Point::new(15.0, 15.0)]
        );
        let counts = HistoryCounts {
            undo_count: 1,
            redo_count: 0,
        };
        assert_eq!(annotator.counts(), counts);
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[
                AnnotatorEvent::Committed(group),
                AnnotatorEvent::HistoryChanged(counts)
            ]
        );
    }

    #[test]
    fn test_tap_emits_nothing() {
        let mut annotator = Annotator::default();
        let events = recorded(&mut annotator);

        annotator.begin_stroke(Point::new(10.0, 10.0));
        assert_eq!(annotator.end_stroke(), CaptureEnd::Discarded);
        assert!(events.lock().unwrap().is_empty());
        assert!(annotator.bounding_box().is_none());
    }

    #[test]
    fn test_undo_redo_results() {
        let mut annotator = Annotator::default();
        draw(&mut annotator, Point::new(1.0, 1.0), Point::new(2.0, 2.0));

        let undone = annotator.undo();
        assert!(undone.success);
        assert_eq!(undone.counts.undo_count, 0);
        assert_eq!(undone.counts.redo_count, 1);

        let again = annotator.undo();
        assert!(!again.success);
        assert_eq!(again.counts, undone.counts);

        let redone = annotator.redo();
        assert!(redone.success);
        assert_eq!(redone.counts.undo_count, 1);
        assert!(!annotator.redo().success);
    }

    #[test]
    fn test_page_change_soft_commits() {
        let mut annotator = Annotator::default();
        let events = recorded(&mut annotator);

        annotator.begin_stroke(Point::new(10.0, 10.0));
        annotator.update_stroke(Point::new(20.0, 20.0));
        annotator.set_view(PageView {
            page: 2,
            ..PageView::default()
        });

        assert!(!annotator.capture().is_capturing());
        assert_eq!(annotator.counts().undo_count, 1);
        let events = events.lock().unwrap();
        let AnnotatorEvent::SoftCommit(Some(group)) = &events[0] else {
            panic!("expected a soft commit, got {:?}", events[0]);
        };
        assert_eq!(group.points().count(), 2);
        assert!(matches!(events[1], AnnotatorEvent::HistoryChanged(_)));
    }

    #[test]
    fn test_rotation_change_keeps_capture() {
        let mut annotator = Annotator::default();
        annotator.begin_stroke(Point::new(10.0, 10.0));
        annotator.set_view(PageView::default().with_rotation(Rotation::Deg180));
        assert!(annotator.capture().is_capturing());
        assert!(annotator.take_frame_request());
    }

    #[test]
    fn test_soft_commit_of_tap_carries_nothing() {
        let mut annotator = Annotator::default();
        let events = recorded(&mut annotator);

        annotator.begin_stroke(Point::new(10.0, 10.0));
        assert!(annotator.force_content_change().is_none());
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[AnnotatorEvent::SoftCommit(None)]
        );
        assert!(annotator.force_content_change().is_none());
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_tick_loop_stops_after_end() {
        let mut annotator = Annotator::default();
        annotator.begin_stroke(Point::new(0.0, 0.0));
        annotator.update_stroke(Point::new(1.0, 1.0));
        assert!(!annotator.update_stroke(Point::new(2.0, 2.0)));

        assert_eq!(annotator.tick(), LoopControl::Continue);
        assert!(annotator.update_stroke(Point::new(3.0, 3.0)));
        annotator.end_stroke();
        assert_eq!(annotator.tick(), LoopControl::Stop);
    }

    #[test]
    fn test_render_follows_view() {
        let mut annotator = Annotator::default();
        let group = draw(&mut annotator, Point::new(0.0, 0.0), Point::new(50.0, 50.0));
        let rendered = annotator.render();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].group, group.id());
        assert_eq!(
            rendered[0].data,
            path_render::path_data(&[Point::new(0.0, 0.0), Point::new(50.0, 50.0)])
        );

        annotator.set_view(PageView::new(1, Size::new(200.0, 200.0)));
        assert_eq!(
            annotator.render()[0].data,
            path_render::path_data(&[Point::new(0.0, 0.0), Point::new(100.0, 100.0)])
        );
    }

    #[test]
    fn test_pages_keep_their_own_ink() {
        let mut annotator = Annotator::default();
        let first = draw(&mut annotator, Point::new(80.0, 80.0), Point::new(90.0, 90.0));
        assert_eq!(first.page(), 1);

        annotator.set_view(PageView {
            page: 2,
            ..PageView::default()
        });
        let second = draw(&mut annotator, Point::new(1.0, 1.0), Point::new(2.0, 2.0));
        assert_eq!(second.page(), 2);

        let rendered = annotator.render();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].group, second.id());
        assert_eq!(annotator.bounding_box(), Some(Shape::new(1.0, 1.0, 1.0, 1.0)));
        assert!(annotator.group_at(Point::new(85.0, 85.0)).is_none());

        annotator.set_view(PageView::default());
        assert_eq!(annotator.render()[0].group, first.id());
        assert_eq!(annotator.bounding_box(), Some(Shape::new(80.0, 80.0, 10.0, 10.0)));
        assert_eq!(annotator.counts().undo_count, 2);
    }

    #[test]
    fn test_group_at_ignores_pixels_off_the_page() {
        let mut annotator = Annotator::default();
        let group = draw(&mut annotator, Point::new(100.0, 0.0), Point::new(100.0, 100.0));

        assert_eq!(
            annotator.group_at(Point::new(100.0, 50.0)).map(PathGroup::id),
            Some(group.id())
        );
        assert!(annotator.group_at(Point::new(500.0, 50.0)).is_none());
        assert!(annotator.group_at(Point::new(50.0, -10.0)).is_none());
    }

    #[test]
    fn test_group_at_and_remove() {
        let mut annotator = Annotator::default();
        let events = recorded(&mut annotator);
        let group = draw(&mut annotator, Point::new(0.0, 0.0), Point::new(50.0, 0.0));

        assert_eq!(
            annotator.group_at(Point::new(25.0, 0.5)).map(PathGroup::id),
            Some(group.id())
        );
        assert!(annotator.group_at(Point::new(25.0, 10.0)).is_none());

        assert!(annotator.remove_group(group.id()).is_some());
        assert!(annotator.remove_group(group.id()).is_none());
        assert_eq!(annotator.counts(), HistoryCounts::default());
        assert_eq!(events.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_transform_rejects_unsupported_rotation() {
        let shape = Shape::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(Annotator::transform_shape(&shape, 0).unwrap(), shape);
        assert!(matches!(
            Annotator::transform_shape(&shape, 45),
            Err(TransformError::UnsupportedRotation(45))
        ));
        assert!(Annotator::transform_point(Point::new(1.0, 2.0), -90).is_ok());
    }

    #[test]
    fn test_config_flows_into_helpers() {
        let config = EngineConfig {
            seek_tolerance_ms: 250,
            scroll_threshold_px: 300.0,
            ..EngineConfig::default()
        };
        let annotator = Annotator::new(config);
        assert!((annotator.scroll_options().threshold - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let mut annotator = Annotator::default();
        let events = recorded(&mut annotator);
        draw(&mut annotator, Point::new(0.0, 0.0), Point::new(5.0, 5.0));
        annotator.begin_stroke(Point::new(1.0, 1.0));

        annotator.destroy();
        assert!(!annotator.capture().is_capturing());
        assert_eq!(annotator.counts(), HistoryCounts::default());
        assert!(!annotator.take_frame_request());

        let before = events.lock().unwrap().len();
        draw(&mut annotator, Point::new(0.0, 0.0), Point::new(5.0, 5.0));
        assert_eq!(events.lock().unwrap().len(), before);
    }

    #[test]
    fn test_instances_are_isolated() {
        let mut first = Annotator::default();
        let mut second = Annotator::default();
        let first_events = recorded(&mut first);

        draw(&mut second, Point::new(0.0, 0.0), Point::new(5.0, 5.0));
        assert!(first_events.lock().unwrap().is_empty());
        assert_eq!(first.counts(), HistoryCounts::default());
    }
}
