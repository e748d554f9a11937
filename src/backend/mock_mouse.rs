//! Mock mouse backend for testing.
//!
//! This backend logs mouse events instead of actually sending them
//! to the OS.

use super::{BackendError, MouseBackend, MouseButton};
use log::info;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Down,
    Up,
}

/// Mock mouse backend that logs events instead of sending them.
#[derive(Clone, Debug, Default)]
pub struct MockMouseBackend {
    log: Arc<Mutex<Vec<(MouseAction, MouseButton)>>>,
}

impl MockMouseBackend {
    /// Create a new mock mouse backend.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<(MouseAction, MouseButton)> {
        self.log.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn record(&self, action: MouseAction, button: MouseButton) {
        self.log.lock().unwrap_or_else(|p| p.into_inner()).push((action, button));
    }
}

impl MouseBackend for MockMouseBackend {
    fn button_down(&self, button: MouseButton) -> Result<(), BackendError> {
        info!("[MOCK MOUSE] Button DOWN: {}", button.name());
        self.record(MouseAction::Down, button);
        Ok(())
    }

    fn button_up(&self, button: MouseButton) -> Result<(), BackendError> {
        info!("[MOCK MOUSE] Button UP: {}", button.name());
        self.record(MouseAction::Up, button);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_mouse_works() {
        let mouse = MockMouseBackend::new();
        assert!(mouse.button_down(MouseButton::Left).is_ok());
        assert!(mouse.button_up(MouseButton::Left).is_ok());
        assert!(mouse.button_down(MouseButton::Back).is_ok());

        assert_eq!(
            mouse.actions(),
            vec![
                (MouseAction::Down, MouseButton::Left),
                (MouseAction::Up, MouseButton::Left),
                (MouseAction::Down, MouseButton::Back),
            ]
        );
    }
}
