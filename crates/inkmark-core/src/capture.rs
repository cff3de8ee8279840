//! Pointer capture of in-progress strokes.
//!
//! Samples arriving faster than the host redraws are coalesced: after a
//! sample is appended, further updates are dropped until the next redraw
//! tick clears the buffering flag. Point density therefore follows the
//! frame rate rather than the input device's sampling rate.

use crate::geometry::Stroke;
use crate::history::EditHistory;
use crate::path::{Path, PathGroup};
use crate::view::PageView;
use kurbo::Point;

/// A stroke being drawn.
#[derive(Debug, Clone)]
pub struct ActiveCapture {
    path: Path,
    stroke: Stroke,
    /// Page the stroke was started on.
    page: u32,
    /// Set after each appended sample, cleared on the next redraw tick.
    buffered: bool,
}

impl ActiveCapture {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_buffered(&self) -> bool {
        self.buffered
    }
}

/// Capture state. Only one stroke can be in progress at a time.
#[derive(Debug, Clone, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing(ActiveCapture),
}

/// How a capture finished.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEnd {
    /// The stroke was committed to history.
    Committed(PathGroup),
    /// The stroke had too few points and was dropped.
    Discarded,
    /// Nothing was being captured.
    NotCapturing,
}

/// Turns pointer samples into committed path groups.
#[derive(Debug, Clone, Default)]
pub struct StrokeCapture {
    state: CaptureState,
    simplify_tolerance: f64,
}

impl StrokeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simplify committed paths with the given tolerance (0 disables).
    pub fn with_simplify_tolerance(mut self, tolerance: f64) -> Self {
        self.simplify_tolerance = tolerance;
        self
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, CaptureState::Capturing(_))
    }

    pub fn is_buffered(&self) -> bool {
        self.active().is_some_and(ActiveCapture::is_buffered)
    }

    pub fn active(&self) -> Option<&ActiveCapture> {
        match &self.state {
            CaptureState::Capturing(active) => Some(active),
            CaptureState::Idle => None,
        }
    }

    /// Start a stroke at a viewport pixel position.
    ///
    /// A capture already in progress is dropped without committing.
    /// Returns false if the view has no area to map the point into.
    pub fn begin(&mut self, pixel: Point, view: &PageView, stroke: Stroke) -> bool {
        if self.is_capturing() {
            log::debug!("New stroke started while capturing; dropping previous stroke");
            self.cancel();
        }

        let Some(point) = view.to_document(pixel) else {
            log::warn!("Ignoring stroke start on page {} with no visible area", view.page);
            return false;
        };

        self.state = CaptureState::Capturing(ActiveCapture {
            path: Path::from_points(vec![point]),
            stroke,
            page: view.page,
            buffered: false,
        });
        true
    }

    /// Append a sample unless one was already taken since the last tick.
    /// Returns true if the sample was appended.
    pub fn update(&mut self, pixel: Point, view: &PageView) -> bool {
        let CaptureState::Capturing(active) = &mut self.state else {
            return false;
        };
        if active.buffered {
            return false;
        }
        let Some(point) = view.to_document(pixel) else {
            return false;
        };

        active.path.push(point);
        active.buffered = true;
        true
    }

    /// Redraw tick: allow the next sample through.
    pub fn on_frame(&mut self) {
        if let CaptureState::Capturing(active) = &mut self.state {
            active.buffered = false;
        }
    }

    /// Finish the stroke, committing it to `history` if it has at least two
    /// points. A single point is a tap, not a stroke.
    pub fn end(&mut self, history: &mut EditHistory) -> CaptureEnd {
        let CaptureState::Capturing(active) = std::mem::take(&mut self.state) else {
            return CaptureEnd::NotCapturing;
        };

        if active.path.len() <= 1 {
            log::debug!("Discarding stroke with {} point(s)", active.path.len());
            return CaptureEnd::Discarded;
        }

        let path = active.path.simplified(self.simplify_tolerance);
        let group = PathGroup::new(active.stroke, vec![path]).with_page(active.page);
        log::debug!(
            "Committing stroke {} with {} point(s)",
            group.id(),
            group.points().count()
        );
        history.insert(group.clone());
        CaptureEnd::Committed(group)
    }

    /// End the capture because the content under it is changing.
    ///
    /// The ink drawn so far is kept in `history` when it forms a stroke, and
    /// returned so the caller can announce a soft commit instead of a
    /// regular one.
    pub fn soft_end(&mut self, history: &mut EditHistory) -> Option<PathGroup> {
        match self.end(history) {
            CaptureEnd::Committed(group) => {
                log::info!("Soft-committed stroke {} on content change", group.id());
                Some(group)
            }
            CaptureEnd::Discarded | CaptureEnd::NotCapturing => None,
        }
    }

    /// Drop the in-progress stroke without touching history.
    pub fn cancel(&mut self) {
        self.state = CaptureState::Idle;
    }
}

/// Whether the host should schedule another redraw tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// Cooperative redraw loop driven by the host's next-frame callback.
///
/// The loop keeps itself scheduled while a stroke is being captured or
/// viewport geometry is stale, and stops once both are settled. A missed
/// tick only coalesces more samples into the next one.
#[derive(Debug, Clone, Default)]
pub struct RedrawLoop {
    scheduled: bool,
    dirty: bool,
}

impl RedrawLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark viewport geometry stale. Returns true if the host must schedule
    /// a tick (none is pending yet).
    pub fn request(&mut self) -> bool {
        self.dirty = true;
        if self.scheduled {
            return false;
        }
        self.scheduled = true;
        true
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Run one tick.
    pub fn tick(&mut self, capture: &mut StrokeCapture, view: &PageView) -> LoopControl {
        capture.on_frame();

        if self.dirty {
            if let Some(active) = capture.active() {
                active.path().viewport_points(view);
            }
            self.dirty = false;
        }

        if capture.is_capturing() {
            self.scheduled = true;
            LoopControl::Continue
        } else {
            self.scheduled = false;
            LoopControl::Stop
        }
    }

    /// Stop the loop; a pending tick becomes a no-op stop.
    pub fn cancel(&mut self) {
        self.scheduled = false;
        self.dirty = false;
    }
}
