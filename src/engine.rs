//! Engine - lifecycle manager and frame loop
//!
//! The engine owns the controller source, the profile source, the held
//! state of every connected controller and the executor that dispatches
//! transitions. It is synchronous and single-threaded: the host calls
//! [`Engine::step`] once per display frame.
//!
//! ```text
//!            connect (first pad)
//!   Idle ─────────────────────────▶ Polling ──┐
//!    ▲                                 │  ▲    │ tick, request next frame
//!    │   disconnect (last pad) / stop  │  └────┘
//!    └─────────────────────────────────┘
//! ```
//!
//! Connection and profile notifications are queued by their sources and
//! only applied at the start of a step, so a tick always sees one
//! consistent set of pads, held state and profiles.

use crate::controller::{PadEvent, PadIdentity, SampleSource};
use crate::mapping::control::ControlKey;
use crate::mapping::dispatcher::{Dispatcher, FocusTracker};
use crate::mapping::executor::MappingExecutor;
use crate::mapping::held::HeldTable;
use crate::mapping::profile::ProfileSet;
use crate::store::ProfileSource;
use crossbeam_channel::Receiver;
use log::{debug, info, trace};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine is already started")]
    AlreadyStarted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No controller connected, no frames scheduled
    Idle,
    /// At least one controller connected, one pass per frame
    Polling,
}

struct ActivePad {
    id: String,
    /// Missing profile already reported for the current profile set
    missing_logged: bool,
}

pub struct Engine<S, F, P>
where
    S: SampleSource,
    F: FocusTracker,
    P: ProfileSource,
{
    source: S,
    profile_source: P,
    executor: MappingExecutor<F>,
    profiles: ProfileSet,
    pads: BTreeMap<usize, ActivePad>,
    held: HeldTable,
    state: LoopState,
    frame_requested: bool,
    pad_events: Option<Receiver<PadEvent>>,
    profile_events: Option<Receiver<ProfileSet>>,
}

impl<S, F, P> Engine<S, F, P>
where
    S: SampleSource,
    F: FocusTracker,
    P: ProfileSource,
{
    pub fn new(source: S, dispatcher: Dispatcher<F>, profile_source: P) -> Self {
        let profiles = profile_source.profiles();
        Self {
            source,
            profile_source,
            executor: MappingExecutor::new(dispatcher),
            profiles,
            pads: BTreeMap::new(),
            held: HeldTable::default(),
            state: LoopState::Idle,
            frame_requested: false,
            pad_events: None,
            profile_events: None,
        }
    }

    /// Attach to the controller and profile notifications. Controllers
    /// that are already present connect on the next step.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.is_started() {
            return Err(EngineError::AlreadyStarted);
        }

        info!("Starting engine...");
        // Subscribe before the snapshot so a concurrent replace is never lost
        self.profile_events = Some(self.profile_source.subscribe());
        self.profiles = self.profile_source.profiles();
        self.pad_events = Some(self.source.subscribe());
        info!("✓ Engine started with {} profile(s)", self.profiles.len());
        Ok(())
    }

    /// One host frame: pump the source, apply queued notifications, then
    /// run the frame if one was requested. Returns the number of
    /// transitions raised by the tick.
    pub fn step(&mut self) -> usize {
        if !self.is_started() {
            return 0;
        }

        self.source.refresh();
        self.apply_notifications();

        if self.frame_requested {
            self.run_frame()
        } else {
            0
        }
    }

    fn apply_notifications(&mut self) {
        let pad_events: Vec<PadEvent> = self
            .pad_events
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default();

        for event in pad_events {
            match event {
                PadEvent::Connected(pad) => self.connect(pad),
                PadEvent::Disconnected(pad) => {
                    self.disconnect(&pad);
                }
            }
        }

        // Only the newest set matters: the first replacement already flushed
        let latest = self
            .profile_events
            .as_ref()
            .and_then(|rx| rx.try_iter().last());
        if let Some(profiles) = latest {
            self.replace_profiles(profiles);
        }
    }

    /// Fire the scheduled frame callback.
    pub fn run_frame(&mut self) -> usize {
        self.frame_requested = false;
        self.tick()
    }

    pub fn connect(&mut self, pad: PadIdentity) {
        if self.pads.contains_key(&pad.index) {
            debug!("Slot {} connected again, releasing its previous holds", pad.index);
            self.flush_pad(pad.index);
        }

        info!("Controller connected: '{}' (slot {})", pad.id, pad.index);
        self.pads.insert(
            pad.index,
            ActivePad {
                id: pad.id,
                missing_logged: false,
            },
        );
        self.held.allocate(pad.index);

        if self.state == LoopState::Idle {
            debug!("Idle -> Polling");
            self.state = LoopState::Polling;
            self.frame_requested = true;
        }
    }

    /// Release every held control of the pad under the current profile and
    /// forget it. Returns the number of `up` events raised.
    pub fn disconnect(&mut self, pad: &PadIdentity) -> usize {
        if !self.pads.contains_key(&pad.index) {
            debug!("Disconnect for unknown slot {} ('{}') ignored", pad.index, pad.id);
            return 0;
        }

        let released = self.flush_pad(pad.index);
        self.held.remove(pad.index);
        if let Some(active) = self.pads.remove(&pad.index) {
            info!("Controller disconnected: '{}' (slot {}), released {} control(s)", active.id, pad.index, released);
        }

        if self.pads.is_empty() && self.state == LoopState::Polling {
            debug!("Polling -> Idle");
            self.state = LoopState::Idle;
            self.frame_requested = false;
        }
        released
    }

    /// One sampling pass over every connected controller, then schedule
    /// the next frame. A no-op unless polling.
    pub fn tick(&mut self) -> usize {
        if self.state != LoopState::Polling {
            trace!("tick while {:?}, ignored", self.state);
            return 0;
        }

        let mut raised = 0;
        for (&index, active) in self.pads.iter_mut() {
            let Some(pad) = self.source.sample(index) else {
                trace!("slot {} absent this pass", index);
                continue;
            };

            let Some(profile) = self.profiles.resolve(&active.id) else {
                if !active.missing_logged {
                    debug!("No profile for '{}' and no wildcard, dispatch disabled", active.id);
                    active.missing_logged = true;
                }
                continue;
            };
            if profile.disabled {
                continue;
            }

            let Some(held) = self.held.get_mut(index) else { continue };
            raised += self.executor.update_pad(&pad, &active.id, profile, held);
        }

        self.frame_requested = true;
        raised
    }

    /// Release every held control under the old profiles, then swap in
    /// `next`. Holds start over under the new mapping.
    pub fn replace_profiles(&mut self, next: ProfileSet) -> usize {
        let indices: Vec<usize> = self.pads.keys().copied().collect();
        let released: usize = indices.into_iter().map(|index| self.flush_pad(index)).sum();

        self.profiles = next;
        for active in self.pads.values_mut() {
            active.missing_logged = false;
        }
        info!("Profiles replaced ({} profile(s)), released {} control(s)", self.profiles.len(), released);
        released
    }

    /// Disconnect everything, go idle and detach from both sources.
    pub fn stop(&mut self) {
        if !self.is_started() && self.pads.is_empty() {
            return;
        }

        info!("Stopping engine...");
        let pads: Vec<PadIdentity> = self
            .pads
            .iter()
            .map(|(&index, active)| PadIdentity {
                id: active.id.clone(),
                index,
            })
            .collect();
        for pad in &pads {
            self.disconnect(pad);
        }

        self.held.clear();
        self.state = LoopState::Idle;
        self.frame_requested = false;
        self.pad_events = None;
        self.profile_events = None;
        info!("✓ Engine stopped");
    }

    fn flush_pad(&mut self, index: usize) -> usize {
        let Some(active) = self.pads.get(&index) else { return 0 };
        let Some(held) = self.held.get_mut(index) else { return 0 };
        self.executor
            .release_all(&active.id, self.profiles.resolve(&active.id), held)
    }

    pub fn is_started(&self) -> bool {
        self.pad_events.is_some()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        self.state == LoopState::Polling
    }

    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    pub fn active_count(&self) -> usize {
        self.pads.len()
    }

    /// Connected controllers in slot order
    pub fn active_pads(&self) -> Vec<PadIdentity> {
        self.pads
            .iter()
            .map(|(&index, active)| PadIdentity {
                id: active.id.clone(),
                index,
            })
            .collect()
    }

    pub fn held_keys(&self, index: usize) -> Vec<ControlKey> {
        self.held
            .get(index)
            .map(|held| held.keys().collect())
            .unwrap_or_default()
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn executor(&self) -> &MappingExecutor<F> {
        &self.executor
    }
}

impl<S, F, P> Drop for Engine<S, F, P>
where
    S: SampleSource,
    F: FocusTracker,
    P: ProfileSource,
{
    fn drop(&mut self) {
        if self.is_started() {
            info!("Shutting down engine (Drop trait)...");
            self.stop();
        }
    }
}
