//! Controller sampling
//!
//! Everything the engine knows about physical controllers comes through a
//! [`SampleSource`]: a stream of connect/disconnect notifications plus an
//! on-demand snapshot of every connected slot.

pub mod scripted;

#[cfg(feature = "gilrs")]
pub mod gilrs_source;

pub use scripted::ScriptedSource;

#[cfg(feature = "gilrs")]
pub use gilrs_source::GilrsSource;

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to initialize controller source: {0}")]
    Init(String),
}

/// One button reading: the digital pressed flag and the analog value (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ButtonSample {
    pub pressed: bool,
    pub value: f32,
}

impl ButtonSample {
    pub fn pressed() -> Self {
        Self { pressed: true, value: 1.0 }
    }

    pub fn released() -> Self {
        Self::default()
    }

    /// Analog-only reading (triggers); `pressed` stays false.
    pub fn analog(value: f32) -> Self {
        Self { pressed: false, value }
    }
}

/// Snapshot of one connected controller
#[derive(Debug, Clone, PartialEq)]
pub struct Controller {
    /// Stable identity string reported by the driver
    pub id: String,

    /// Slot index; may be reused after a disconnect
    pub index: usize,

    pub buttons: Vec<ButtonSample>,

    /// Axis values (-1.0 to 1.0)
    pub axes: Vec<f32>,
}

impl Controller {
    /// A controller at rest with the given number of buttons and axes.
    pub fn new(id: impl Into<String>, index: usize, buttons: usize, axes: usize) -> Self {
        Self {
            id: id.into(),
            index,
            buttons: vec![ButtonSample::released(); buttons],
            axes: vec![0.0; axes],
        }
    }

    pub fn identity(&self) -> PadIdentity {
        PadIdentity {
            id: self.id.clone(),
            index: self.index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadIdentity {
    pub id: String,
    pub index: usize,
}

/// Connection notifications, delivered asynchronously relative to the frame loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PadEvent {
    Connected(PadIdentity),
    Disconnected(PadIdentity),
}

/// Source of controller samples and connection notifications
pub trait SampleSource {
    /// Open a new notification stream.
    ///
    /// Controllers that are already present are announced as `Connected`
    /// before anything else. Dropping the receiver detaches the listener.
    fn subscribe(&mut self) -> Receiver<PadEvent>;

    /// Pump the underlying driver. Called once per engine step.
    fn refresh(&mut self) {}

    /// Current snapshot of a slot, `None` if nothing is there right now.
    fn sample(&self, index: usize) -> Option<Controller>;
}

/// Fan a notification out to every live listener, forgetting closed ones.
pub(crate) fn broadcast(listeners: &mut Vec<Sender<PadEvent>>, event: &PadEvent) {
    listeners.retain(|listener| listener.send(event.clone()).is_ok());
}
