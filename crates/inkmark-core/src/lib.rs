//! Inkmark Core Library
//!
//! Platform-agnostic geometry and capture engine for freehand annotations
//! on rotated, zoomed pages and time-anchored media.

pub mod annotator;
pub mod capture;
pub mod config;
pub mod events;
pub mod geometry;
pub mod history;
pub mod media;
pub mod path;
pub mod path_render;
pub mod scroll;
pub mod transform;
pub mod view;

pub use annotator::{Annotator, RenderedPath, UndoResult};
pub use capture::{CaptureEnd, CaptureState, LoopControl, RedrawLoop, StrokeCapture};
pub use config::{ConfigError, ConfigResult, EngineConfig};
pub use events::{AnnotatorEvent, EventBus, SubscriptionId};
pub use geometry::{DOCUMENT_EXTENT, SerializableColor, Shape, Stroke};
pub use history::{EditHistory, HistoryCounts};
pub use media::{
    Annotation, GateState, GateStatus, ListenerId, Location, MediaElement, MediaEvent,
    MediaTimeGate, TargetType,
};
pub use path::{GroupId, Path, PathGroup};
pub use scroll::{
    ScrollBehavior, ScrollContainer, ScrollOptions, ScrollRequest, ScrollTarget, cancel_scroll,
    compute_scroll, scroll_to_location,
};
pub use transform::{Rotation, TransformError, TransformResult};
pub use view::PageView;
