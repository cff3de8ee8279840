//! Visibility gate for annotations anchored to a video timestamp.
//!
//! The host cannot report synchronously when a seek has landed, so ink for
//! a frame-anchored annotation is held back while playback is still moving
//! towards the annotation's time. The gate is [`GateState::Settled`] unless
//! the current content is time-based media.

use crate::config::DEFAULT_SEEK_TOLERANCE_MS;
use serde::{Deserialize, Serialize};

/// Kind of content the annotations are attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    #[default]
    Page,
    Image,
    /// Time-based media; annotations are anchored to a timestamp.
    Frame,
}

/// Where an annotation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Location {
    Page(u32),
    /// Playback time in milliseconds.
    Frame(u64),
}

/// The part of an annotation the gate looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub location: Location,
}

/// Playback notifications forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaEvent {
    /// A seek started.
    Seeking,
    /// A seek finished.
    Seeked,
    /// Periodic playback progress.
    TimeUpdate,
}

impl MediaEvent {
    pub const ALL: [MediaEvent; 3] = [
        MediaEvent::Seeking,
        MediaEvent::Seeked,
        MediaEvent::TimeUpdate,
    ];
}

/// Handle for a listener registered on a [`MediaElement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// The host's media element.
pub trait MediaElement {
    /// Identity of the underlying element, used to detect a swap.
    fn media_id(&self) -> u64;
    /// Playback position in seconds.
    fn current_time_secs(&self) -> f64;
    fn add_listener(&mut self, event: MediaEvent) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId);
}

/// Gate state. A target time only exists while seeking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    #[default]
    Settled,
    Seeking { target_ms: Option<u64> },
}

/// Snapshot returned to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStatus {
    /// Frame-anchored ink must not be drawn while true.
    pub is_seeking: bool,
    /// Instantaneous playback position, if media is bound.
    pub current_location_ms: Option<u64>,
}

#[derive(Debug)]
struct Binding<M> {
    media: M,
    listeners: Vec<ListenerId>,
}

/// Gate for one content surface.
#[derive(Debug)]
pub struct MediaTimeGate<M: MediaElement> {
    state: GateState,
    tolerance_ms: u64,
    target_type: TargetType,
    binding: Option<Binding<M>>,
    active_annotation: Option<String>,
}

impl<M: MediaElement> Default for MediaTimeGate<M> {
    fn default() -> Self {
        Self::new(DEFAULT_SEEK_TOLERANCE_MS)
    }
}

impl<M: MediaElement> MediaTimeGate<M> {
    pub fn new(tolerance_ms: u64) -> Self {
        Self {
            state: GateState::Settled,
            tolerance_ms,
            target_type: TargetType::default(),
            binding: None,
            active_annotation: None,
        }
    }

    /// Gating only applies to time-based media.
    pub fn is_active(&self) -> bool {
        self.target_type == TargetType::Frame
    }

    pub fn state(&self) -> GateState {
        if self.is_active() {
            self.state
        } else {
            GateState::Settled
        }
    }

    pub fn is_seeking(&self) -> bool {
        matches!(self.state(), GateState::Seeking { .. })
    }

    /// Instantaneous playback position in whole milliseconds.
    pub fn current_location_ms(&self) -> Option<u64> {
        self.binding
            .as_ref()
            .map(|binding| secs_to_ms(binding.media.current_time_secs()))
    }

    pub fn status(&self) -> GateStatus {
        GateStatus {
            is_seeking: self.is_seeking(),
            current_location_ms: self.current_location_ms(),
        }
    }

    /// Number of listeners currently attached to the bound media.
    pub fn listener_count(&self) -> usize {
        self.binding.as_ref().map_or(0, |b| b.listeners.len())
    }

    /// Attach to `media` for `target_type`, detaching from whatever was bound
    /// before. Rebinding the same element and type is a no-op.
    pub fn bind(&mut self, target_type: TargetType, media: Option<M>) {
        let current_id = self.binding.as_ref().map(|b| b.media.media_id());
        let new_id = media.as_ref().map(MediaElement::media_id);
        let wants_listeners = target_type == TargetType::Frame && media.is_some();
        let has_listeners = self.listener_count() > 0;
        if target_type == self.target_type
            && current_id == new_id
            && wants_listeners == has_listeners
        {
            return;
        }

        self.unbind();
        self.target_type = target_type;

        let Some(mut media) = media else {
            return;
        };
        let listeners = if target_type == TargetType::Frame {
            MediaEvent::ALL
                .iter()
                .map(|event| media.add_listener(*event))
                .collect()
        } else {
            Vec::new()
        };
        log::info!(
            "Media gate bound to media {} ({} listener(s))",
            media.media_id(),
            listeners.len()
        );
        self.binding = Some(Binding { media, listeners });
    }

    /// Detach every listener and forget the bound media.
    pub fn unbind(&mut self) {
        if let Some(mut binding) = self.binding.take() {
            for id in binding.listeners.drain(..) {
                binding.media.remove_listener(id);
            }
            log::info!("Media gate detached from media {}", binding.media.media_id());
        }
        self.state = GateState::Settled;
        self.active_annotation = None;
    }

    /// Feed a playback notification from the host.
    pub fn handle_event(&mut self, event: MediaEvent) {
        if !self.is_active() || self.binding.is_none() {
            return;
        }

        match event {
            MediaEvent::Seeking => {
                if let GateState::Settled = self.state {
                    log::debug!("Media gate: seek started");
                    self.state = GateState::Seeking { target_ms: None };
                }
            }
            MediaEvent::Seeked => {
                if self.state != GateState::Settled {
                    log::debug!("Media gate: seek finished");
                }
                self.state = GateState::Settled;
            }
            MediaEvent::TimeUpdate => {
                if let GateState::Seeking {
                    target_ms: Some(target),
                } = self.state
                {
                    if self.is_near(target) {
                        log::debug!("Media gate: playback reached {target} ms");
                        self.state = GateState::Settled;
                    }
                }
            }
        }
    }

    /// Point the gate at a new target time, e.g. a newly focused annotation.
    /// The new target replaces any earlier one.
    pub fn focus_target(&mut self, target_ms: u64) {
        if !self.is_active() || self.binding.is_none() {
            return;
        }
        if self.is_near(target_ms) {
            if self.state != GateState::Settled {
                log::debug!("Media gate: playback already at {target_ms} ms");
            }
            self.state = GateState::Settled;
        } else {
            log::debug!("Media gate: waiting for playback to reach {target_ms} ms");
            self.state = GateState::Seeking {
                target_ms: Some(target_ms),
            };
        }
    }

    /// Reconcile with the host's current props and report the gate status.
    pub fn sync(
        &mut self,
        target_type: TargetType,
        media: Option<M>,
        active_annotation_id: Option<&str>,
        annotations: &[Annotation],
    ) -> GateStatus {
        self.bind(target_type, media);

        if active_annotation_id != self.active_annotation.as_deref() {
            self.active_annotation = active_annotation_id.map(str::to_owned);
            let target = active_annotation_id
                .and_then(|id| annotations.iter().find(|a| a.id == id))
                .and_then(|a| match a.location {
                    Location::Frame(ms) => Some(ms),
                    Location::Page(_) => None,
                });
            if let Some(target_ms) = target {
                self.focus_target(target_ms);
            }
        }

        self.status()
    }

    fn is_near(&self, target_ms: u64) -> bool {
        self.current_location_ms()
            .is_some_and(|current| current.abs_diff(target_ms) <= self.tolerance_ms)
    }
}

impl<M: MediaElement> Drop for MediaTimeGate<M> {
    fn drop(&mut self) {
        self.unbind();
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * 1000.0).round() as u64
}
