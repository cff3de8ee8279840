//! Replay of recorded input scripts against an [`Annotator`].
//!
//! A script is a JSON array of steps, each tagged with `"step"`:
//!
//! ```json
//! [
//!   { "step": "begin", "x": 10, "y": 10 },
//!   { "step": "update", "x": 15, "y": 15 },
//!   { "step": "end" }
//! ]
//! ```

use inkmark_core::{
    Annotation, Annotator, AnnotatorEvent, EngineConfig, GateStatus, HistoryCounts, ListenerId,
    MediaElement, MediaEvent, MediaTimeGate, PageView, Rotation, Shape, Stroke, TargetType,
    TransformError, UndoResult,
};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Script errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Step {step}: {source}")]
    Transform {
        step: usize,
        #[source]
        source: TransformError,
    },
    #[error("Step {step}: no committed group at index {index}")]
    UnknownGroup { step: usize, index: usize },
}

/// Result type for script operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

fn default_page() -> u32 {
    1
}

fn default_scale() -> f64 {
    1.0
}

fn default_extent() -> f64 {
    inkmark_core::DOCUMENT_EXTENT
}

fn default_present() -> bool {
    true
}

/// One recorded input step. Positions are viewport pixels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Begin {
        x: f64,
        y: f64,
        #[serde(default)]
        stroke: Option<Stroke>,
    },
    Update {
        x: f64,
        y: f64,
    },
    End,
    /// Host redraw tick.
    Tick,
    Undo,
    Redo,
    /// Display state change from the viewer host.
    View {
        #[serde(default = "default_page")]
        page: u32,
        #[serde(default)]
        rotation: i32,
        #[serde(default = "default_scale")]
        scale: f64,
        #[serde(default = "default_extent")]
        width: f64,
        #[serde(default = "default_extent")]
        height: f64,
    },
    /// Content is about to change under the current capture.
    ContentChange,
    /// Delete the committed group at `index` (paint order).
    Remove {
        index: usize,
    },
    TransformShape {
        shape: Shape,
        rotation: i32,
    },
    TransformPoint {
        x: f64,
        y: f64,
        rotation: i32,
    },
    /// Bind the scripted media element, or detach it with `present: false`.
    MediaBind {
        target_type: TargetType,
        #[serde(default = "default_present")]
        present: bool,
    },
    /// Move the scripted playback position.
    MediaTime {
        ms: u64,
    },
    MediaEvent {
        event: MediaEvent,
    },
    /// Focus an annotation, as the host does when one is selected.
    MediaFocus {
        #[serde(default)]
        active_annotation: Option<String>,
        #[serde(default)]
        annotations: Vec<Annotation>,
    },
}

/// A committed path as reported by a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathReport {
    /// Document-space points.
    pub points: Vec<Point>,
    /// SVG path data in the final view.
    pub data: String,
}

/// A committed group as reported by a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub id: String,
    pub page: u32,
    pub stroke: Stroke,
    pub paths: Vec<PathReport>,
}

/// Output produced by an individual step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutput {
    History { step: usize, result: UndoResult },
    Shape { step: usize, shape: Shape },
    Point { step: usize, point: Point },
    Gate { step: usize, status: GateStatus },
}

/// Final state after a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub groups: Vec<GroupReport>,
    pub counts: HistoryCounts,
    /// Bounds of the ink on the page shown at the end of the replay.
    pub bounding_box: Option<Shape>,
    pub events: Vec<AnnotatorEvent>,
    pub outputs: Vec<StepOutput>,
}

#[derive(Debug, Default)]
struct ScriptedMediaState {
    time_ms: u64,
    next_listener: u64,
    listeners: Vec<ListenerId>,
}

/// Media element whose playback position is set by the script.
#[derive(Debug, Clone, Default)]
struct ScriptedMedia {
    state: Rc<RefCell<ScriptedMediaState>>,
}

impl ScriptedMedia {
    fn set_time_ms(&self, ms: u64) {
        self.state.borrow_mut().time_ms = ms;
    }
}

impl MediaElement for ScriptedMedia {
    fn media_id(&self) -> u64 {
        0
    }

    fn current_time_secs(&self) -> f64 {
        self.state.borrow().time_ms as f64 / 1000.0
    }

    fn add_listener(&mut self, _event: MediaEvent) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push(id);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.state.borrow_mut().listeners.retain(|l| *l != id);
    }
}

/// Read and parse a script file.
pub fn load_script(path: impl AsRef<Path>) -> ScriptResult<Vec<Step>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .map_err(|e| ScriptError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_script(&json)
}

pub fn parse_script(json: &str) -> ScriptResult<Vec<Step>> {
    serde_json::from_str(json).map_err(|e| ScriptError::Parse(e.to_string()))
}

/// Replay `steps` on a fresh annotator.
pub fn run_script(steps: &[Step], config: EngineConfig) -> ScriptResult<ReplayReport> {
    let mut replay = Replay::new(config);
    for (index, step) in steps.iter().enumerate() {
        replay.apply(index, step)?;
    }
    Ok(replay.finish())
}

struct Replay {
    annotator: Annotator,
    events: Arc<Mutex<Vec<AnnotatorEvent>>>,
    media: ScriptedMedia,
    gate: MediaTimeGate<ScriptedMedia>,
    target_type: TargetType,
    media_present: bool,
    outputs: Vec<StepOutput>,
}

impl Replay {
    fn new(config: EngineConfig) -> Self {
        let mut annotator = Annotator::new(config);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        annotator.subscribe(move |event| {
            if let Ok(mut events) = sink.lock() {
                events.push(event.clone());
            }
        });
        let gate = annotator.media_gate();

        Self {
            annotator,
            events,
            media: ScriptedMedia::default(),
            gate,
            target_type: TargetType::default(),
            media_present: false,
            outputs: Vec::new(),
        }
    }

    fn apply(&mut self, index: usize, step: &Step) -> ScriptResult<()> {
        log::debug!("Step {index}: {step:?}");
        let transform_err = |source: TransformError| ScriptError::Transform {
            step: index,
            source,
        };

        match step {
            Step::Begin { x, y, stroke } => {
                if let Some(stroke) = stroke {
                    self.annotator.set_stroke(*stroke);
                }
                self.annotator.begin_stroke(Point::new(*x, *y));
            }
            Step::Update { x, y } => {
                self.annotator.update_stroke(Point::new(*x, *y));
            }
            Step::End => {
                self.annotator.end_stroke();
            }
            Step::Tick => {
                self.annotator.take_frame_request();
                self.annotator.tick();
            }
            Step::Undo => {
                let result = self.annotator.undo();
                self.outputs.push(StepOutput::History { step: index, result });
            }
            Step::Redo => {
                let result = self.annotator.redo();
                self.outputs.push(StepOutput::History { step: index, result });
            }
            Step::View {
                page,
                rotation,
                scale,
                width,
                height,
            } => {
                let rotation = Rotation::from_degrees(*rotation).map_err(transform_err)?;
                let view = PageView::new(*page, Size::new(*width, *height))
                    .with_rotation(rotation)
                    .with_scale(*scale);
                self.annotator.set_view(view);
            }
            Step::ContentChange => {
                self.annotator.force_content_change();
            }
            Step::Remove { index: group } => {
                let id = self
                    .annotator
                    .history()
                    .committed()
                    .get(*group)
                    .map(|g| g.id())
                    .ok_or(ScriptError::UnknownGroup {
                        step: index,
                        index: *group,
                    })?;
                self.annotator.remove_group(id);
            }
            Step::TransformShape { shape, rotation } => {
                let shape = Annotator::transform_shape(shape, *rotation).map_err(transform_err)?;
                self.outputs.push(StepOutput::Shape { step: index, shape });
            }
            Step::TransformPoint { x, y, rotation } => {
                let point = Annotator::transform_point(Point::new(*x, *y), *rotation)
                    .map_err(transform_err)?;
                self.outputs.push(StepOutput::Point { step: index, point });
            }
            Step::MediaBind {
                target_type,
                present,
            } => {
                self.target_type = *target_type;
                self.media_present = *present;
                self.gate
                    .bind(*target_type, present.then(|| self.media.clone()));
                self.push_gate_status(index);
            }
            Step::MediaTime { ms } => {
                self.media.set_time_ms(*ms);
                self.push_gate_status(index);
            }
            Step::MediaEvent { event } => {
                self.gate.handle_event(*event);
                self.push_gate_status(index);
            }
            Step::MediaFocus {
                active_annotation,
                annotations,
            } => {
                let media = self.media_present.then(|| self.media.clone());
                let status = self.gate.sync(
                    self.target_type,
                    media,
                    active_annotation.as_deref(),
                    annotations,
                );
                self.outputs.push(StepOutput::Gate { step: index, status });
            }
        }
        Ok(())
    }

    fn push_gate_status(&mut self, index: usize) {
        self.outputs.push(StepOutput::Gate {
            step: index,
            status: self.gate.status(),
        });
    }

    fn finish(self) -> ReplayReport {
        let view = *self.annotator.view();
        let groups = self
            .annotator
            .history()
            .committed()
            .iter()
            .map(|group| GroupReport {
                id: group.id().to_string(),
                page: group.page(),
                stroke: *group.stroke(),
                paths: group
                    .paths()
                    .iter()
                    .map(|path| PathReport {
                        points: path.points().to_vec(),
                        data: path.viewport_path_data(&view),
                    })
                    .collect(),
            })
            .collect();
        let events = self
            .events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default();

        ReplayReport {
            groups,
            counts: self.annotator.counts(),
            bounding_box: self.annotator.bounding_box(),
            events,
            outputs: self.outputs,
        }
    }
}
