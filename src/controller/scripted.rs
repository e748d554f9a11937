//! Scripted controller source.
//!
//! Holds controller snapshots in memory and lets the caller connect,
//! disconnect and move controls by hand. Clones share the same state, so a
//! test can keep one handle while the engine owns another.

use super::{broadcast, ButtonSample, Controller, PadEvent, SampleSource};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct ScriptState {
    pads: BTreeMap<usize, Controller>,
    /// Slots that are connected but currently report nothing
    hidden: BTreeSet<usize>,
    listeners: Vec<Sender<PadEvent>>,
}

/// In-memory [`SampleSource`] driven by explicit calls.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Plug a controller in and notify listeners.
    pub fn connect(&self, pad: Controller) {
        let mut state = self.lock();
        let event = PadEvent::Connected(pad.identity());
        debug!("[SCRIPT] connect '{}' at slot {}", pad.id, pad.index);
        state.hidden.remove(&pad.index);
        state.pads.insert(pad.index, pad);
        broadcast(&mut state.listeners, &event);
    }

    /// Unplug the controller in `index` and notify listeners.
    pub fn disconnect(&self, index: usize) {
        let mut state = self.lock();
        state.hidden.remove(&index);
        match state.pads.remove(&index) {
            Some(pad) => {
                debug!("[SCRIPT] disconnect '{}' at slot {}", pad.id, index);
                broadcast(&mut state.listeners, &PadEvent::Disconnected(pad.identity()));
            }
            None => warn!("[SCRIPT] disconnect of empty slot {}", index),
        }
    }

    pub fn set_button(&self, index: usize, button: usize, sample: ButtonSample) {
        let mut state = self.lock();
        if let Some(pad) = state.pads.get_mut(&index) {
            if button >= pad.buttons.len() {
                pad.buttons.resize(button + 1, ButtonSample::released());
            }
            pad.buttons[button] = sample;
        }
    }

    pub fn set_axis(&self, index: usize, axis: usize, value: f32) {
        let mut state = self.lock();
        if let Some(pad) = state.pads.get_mut(&index) {
            if axis >= pad.axes.len() {
                pad.axes.resize(axis + 1, 0.0);
            }
            pad.axes[axis] = value;
        }
    }

    /// Make a connected slot report nothing (or report again) without any
    /// connection notification.
    pub fn set_present(&self, index: usize, present: bool) {
        let mut state = self.lock();
        if present {
            state.hidden.remove(&index);
        } else {
            state.hidden.insert(index);
        }
    }

    /// Number of open notification streams
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl SampleSource for ScriptedSource {
    fn subscribe(&mut self) -> Receiver<PadEvent> {
        let (tx, rx) = unbounded();
        let mut state = self.lock();
        for pad in state.pads.values() {
            let _ = tx.send(PadEvent::Connected(pad.identity()));
        }
        state.listeners.push(tx);
        rx
    }

    fn sample(&self, index: usize) -> Option<Controller> {
        let state = self.lock();
        if state.hidden.contains(&index) {
            return None;
        }
        state.pads.get(&index).cloned()
    }
}
