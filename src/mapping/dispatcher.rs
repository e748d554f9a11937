//! Event synthesis and delivery
//!
//! The dispatcher turns a [`MappingEntry`] plus a [`Transition`] into a
//! [`SyntheticEvent`] and hands it to whatever currently has focus. Delivery
//! is fire-and-forget: failures are logged, never retried or propagated.

use crate::backend::BackendError;
use crate::mapping::control::ControlKey;
use crate::mapping::edge::Transition;
use crate::mapping::profile::{EntryKind, MappingEntry};
use log::{debug, trace, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Bound on nested focus resolution, guards against focus cycles
const MAX_FOCUS_DEPTH: usize = 16;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no focused target")]
    NoTarget,

    #[error("delivery failed: {0}")]
    Backend(#[from] BackendError),

    #[error("target rejected event: {0}")]
    Rejected(String),
}

/// Where a synthetic event came from
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub controller_id: String,
    pub control: ControlKey,
    pub raw_value: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryFlags {
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
}

impl Default for DeliveryFlags {
    fn default() -> Self {
        Self {
            bubbles: true,
            cancelable: true,
            composed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    Key {
        code: String,
        key: String,
        key_code: u32,
        which: u32,
    },
    Mouse {
        button: u8,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticEvent {
    pub transition: Transition,
    pub payload: EventPayload,
    pub from: Provenance,
    pub flags: DeliveryFlags,
    /// Name of the engine that synthesized the event
    pub context: Arc<str>,
}

impl SyntheticEvent {
    /// `keydown`, `keypress`, `keyup`, `mousedown`, `mousepress` or `mouseup`
    pub fn event_type(&self) -> String {
        let prefix = match self.payload {
            EventPayload::Key { .. } => "key",
            EventPayload::Mouse { .. } => "mouse",
        };
        format!("{}{}", prefix, self.transition)
    }

    pub fn is_key(&self) -> bool {
        matches!(self.payload, EventPayload::Key { .. })
    }

    /// Key code for key events, `None` for mouse events
    pub fn code(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Key { code, .. } => Some(code),
            EventPayload::Mouse { .. } => None,
        }
    }
}

/// Something that can receive synthetic events
pub trait Target {
    fn label(&self) -> String;

    /// Focused element of a context embedded in this target, if any.
    fn embedded_focus(&self) -> Option<Arc<dyn Target>> {
        None
    }

    fn deliver(&self, event: &SyntheticEvent) -> Result<(), DispatchError>;
}

/// Answers "what has focus right now"
pub trait FocusTracker {
    fn active_target(&self) -> Option<Arc<dyn Target>>;
}

pub struct Dispatcher<F: FocusTracker> {
    focus: F,
    context: Arc<str>,
    /// Bindings already reported for an unknown entry kind
    unknown_reported: Mutex<HashSet<(String, ControlKey)>>,
}

impl<F: FocusTracker> Dispatcher<F> {
    pub fn new(focus: F, context: &str) -> Self {
        Self {
            focus,
            context: Arc::from(context),
            unknown_reported: Mutex::new(HashSet::new()),
        }
    }

    pub fn focus(&self) -> &F {
        &self.focus
    }

    /// Build the event an entry raises for a transition.
    pub fn synthesize(&self, entry: &MappingEntry, transition: Transition, from: Provenance) -> SyntheticEvent {
        let payload = match entry.kind {
            EntryKind::Mouse => EventPayload::Mouse {
                button: entry.button.unwrap_or(0),
            },
            EntryKind::Key | EntryKind::Unknown => {
                if entry.kind == EntryKind::Unknown && self.first_unknown(&from) {
                    warn!(
                        "Unknown mapping kind for {} on '{}', sending a key event",
                        from.control, from.controller_id
                    );
                }
                let code = entry.code.clone().or_else(|| entry.key.clone()).unwrap_or_default();
                let key = entry.key.clone().unwrap_or_else(|| code.clone());
                let key_code = entry.key_code.or(entry.which).unwrap_or(0);
                let which = entry.which.or(entry.key_code).unwrap_or(0);
                EventPayload::Key { code, key, key_code, which }
            }
        };

        SyntheticEvent {
            transition,
            payload,
            from,
            flags: DeliveryFlags::default(),
            context: Arc::clone(&self.context),
        }
    }

    /// True the first time a binding with an unknown kind is synthesized.
    fn first_unknown(&self, from: &Provenance) -> bool {
        self.unknown_reported
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert((from.controller_id.clone(), from.control))
    }

    /// Synthesize and deliver. Returns whether a target accepted the event.
    pub fn dispatch(&self, entry: &MappingEntry, transition: Transition, from: Provenance) -> bool {
        let event = self.synthesize(entry, transition, from);
        match self.deliver(&event) {
            Ok(()) => {
                trace!("Emit: {} {:?} from {}", event.event_type(), event.payload, event.from.control);
                true
            }
            Err(DispatchError::NoTarget) => {
                debug!("Dropped {}: no focused target", event.event_type());
                false
            }
            Err(e) => {
                warn!("Failed to deliver {}: {}", event.event_type(), e);
                false
            }
        }
    }

    fn deliver(&self, event: &SyntheticEvent) -> Result<(), DispatchError> {
        let target = self.resolve_target().ok_or(DispatchError::NoTarget)?;
        target.deliver(event)
    }

    /// Innermost focused target, following embedded contexts.
    fn resolve_target(&self) -> Option<Arc<dyn Target>> {
        let mut target = self.focus.active_target()?;
        for _ in 0..MAX_FOCUS_DEPTH {
            match target.embedded_focus() {
                Some(inner) => target = inner,
                None => return Some(target),
            }
        }
        warn!("Focus chain deeper than {} levels, delivering to '{}'", MAX_FOCUS_DEPTH, target.label());
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockFocus, RecordingTarget};

    fn from_button(index: u8) -> Provenance {
        Provenance {
            controller_id: "Xbox".into(),
            control: ControlKey::Button(index),
            raw_value: 1.0,
        }
    }

    #[test]
    fn key_entry_payload() {
        let dispatcher = Dispatcher::new(MockFocus::empty(), "test");
        let entry = MappingEntry::key("Space").with_key_code(32);
        let event = dispatcher.synthesize(&entry, Transition::Down, from_button(0));

        assert_eq!(event.event_type(), "keydown");
        assert_eq!(
            event.payload,
            EventPayload::Key {
                code: "Space".into(),
                key: "Space".into(),
                key_code: 32,
                which: 32,
            }
        );
        assert_eq!(event.flags, DeliveryFlags::default());
        assert_eq!(&*event.context, "test");
    }

    #[test]
    fn mouse_entry_payload() {
        let dispatcher = Dispatcher::new(MockFocus::empty(), "test");
        let event = dispatcher.synthesize(&MappingEntry::mouse(2), Transition::Up, from_button(1));
        assert_eq!(event.event_type(), "mouseup");
        assert_eq!(event.payload, EventPayload::Mouse { button: 2 });
    }

    #[test]
    fn unknown_kind_falls_back_to_key() {
        let dispatcher = Dispatcher::new(MockFocus::empty(), "test");
        let entry = MappingEntry {
            kind: EntryKind::Unknown,
            code: Some("KeyQ".into()),
            ..MappingEntry::default()
        };
        let event = dispatcher.synthesize(&entry, Transition::Press, from_button(0));
        assert_eq!(event.event_type(), "keypress");
        assert_eq!(event.code(), Some("KeyQ"));
    }

    #[test]
    fn unknown_kind_is_reported_once_per_binding() {
        let dispatcher = Dispatcher::new(MockFocus::empty(), "test");
        let entry = MappingEntry {
            kind: EntryKind::Unknown,
            code: Some("KeyQ".into()),
            ..MappingEntry::default()
        };

        for transition in [Transition::Down, Transition::Press, Transition::Press, Transition::Up] {
            dispatcher.synthesize(&entry, transition, from_button(0));
        }
        dispatcher.synthesize(&entry, Transition::Down, from_button(1));

        assert!(!dispatcher.first_unknown(&from_button(0)));
        assert!(!dispatcher.first_unknown(&from_button(1)));
        assert_eq!(dispatcher.unknown_reported.lock().unwrap().len(), 2);
    }

    #[test]
    fn no_target_drops_event() {
        let dispatcher = Dispatcher::new(MockFocus::empty(), "test");
        assert!(!dispatcher.dispatch(&MappingEntry::key("Space"), Transition::Down, from_button(0)));
    }

    #[test]
    fn delivers_to_innermost_focus() {
        let inner = Arc::new(RecordingTarget::new("frame input"));
        let outer = Arc::new(RecordingTarget::new("page").with_embedded(inner.clone()));
        let dispatcher = Dispatcher::new(MockFocus::new(outer.clone()), "test");

        assert!(dispatcher.dispatch(&MappingEntry::key("Space"), Transition::Down, from_button(0)));
        assert!(outer.events().is_empty());
        assert_eq!(inner.events().len(), 1);
    }

    #[test]
    fn rejected_delivery_is_not_fatal() {
        let target = Arc::new(RecordingTarget::new("readonly").rejecting());
        let dispatcher = Dispatcher::new(MockFocus::new(target.clone()), "test");
        assert!(!dispatcher.dispatch(&MappingEntry::key("Space"), Transition::Down, from_button(0)));
        assert!(!dispatcher.dispatch(&MappingEntry::mouse(0), Transition::Up, from_button(0)));
        assert_eq!(target.events().len(), 0);
    }
}
