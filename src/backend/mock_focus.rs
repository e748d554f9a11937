//! In-memory focus and targets for tests.

use crate::mapping::dispatcher::{DispatchError, FocusTracker, SyntheticEvent, Target};
use log::info;
use std::sync::{Arc, Mutex};

/// Target that records everything delivered to it.
pub struct RecordingTarget {
    label: String,
    events: Mutex<Vec<SyntheticEvent>>,
    embedded: Option<Arc<dyn Target>>,
    reject: bool,
}

impl RecordingTarget {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            events: Mutex::new(Vec::new()),
            embedded: None,
            reject: false,
        }
    }

    /// Host an embedded context whose focus is `inner`.
    pub fn with_embedded(mut self, inner: Arc<dyn Target>) -> Self {
        self.embedded = Some(inner);
        self
    }

    /// Refuse every delivery.
    pub fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    pub fn events(&self) -> Vec<SyntheticEvent> {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// `keydown`, `mouseup`, ... in delivery order
    pub fn event_types(&self) -> Vec<String> {
        self.events().iter().map(SyntheticEvent::event_type).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }
}

impl Target for RecordingTarget {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn embedded_focus(&self) -> Option<Arc<dyn Target>> {
        self.embedded.clone()
    }

    fn deliver(&self, event: &SyntheticEvent) -> Result<(), DispatchError> {
        if self.reject {
            return Err(DispatchError::Rejected(self.label.clone()));
        }
        info!("[MOCK TARGET] {} <- {} {:?}", self.label, event.event_type(), event.code());
        self.events.lock().unwrap_or_else(|p| p.into_inner()).push(event.clone());
        Ok(())
    }
}

/// Focus tracker whose answer tests can change. Clones share the focus.
#[derive(Clone, Default)]
pub struct MockFocus {
    active: Arc<Mutex<Option<Arc<dyn Target>>>>,
}

impl MockFocus {
    pub fn new(target: Arc<dyn Target>) -> Self {
        let focus = Self::default();
        focus.set(Some(target));
        focus
    }

    /// Nothing focused
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set(&self, target: Option<Arc<dyn Target>>) {
        *self.active.lock().unwrap_or_else(|p| p.into_inner()) = target;
    }
}

impl FocusTracker for MockFocus {
    fn active_target(&self) -> Option<Arc<dyn Target>> {
        self.active.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}
