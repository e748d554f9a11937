//! Mock keyboard backend for testing.
//!
//! This backend logs keyboard events instead of actually sending them
//! to the OS, and remembers them so tests can check for stuck keys.

use super::{BackendError, KeyboardBackend};
use log::info;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Repeat,
    Up,
}

/// Mock keyboard backend that logs events instead of sending them.
///
/// Clones share one action log.
#[derive(Clone, Debug, Default)]
pub struct MockKeyboardBackend {
    log: Arc<Mutex<Vec<(KeyAction, String)>>>,
}

impl MockKeyboardBackend {
    /// Create a new mock keyboard backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, action: KeyAction, code: &str) {
        self.log
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((action, code.to_string()));
    }

    /// Every action seen so far, oldest first.
    pub fn actions(&self) -> Vec<(KeyAction, String)> {
        self.log.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Keys that went down and have not come back up.
    pub fn pressed_keys(&self) -> BTreeSet<String> {
        let mut pressed = BTreeSet::new();
        for (action, code) in self.actions() {
            match action {
                KeyAction::Down | KeyAction::Repeat => {
                    pressed.insert(code);
                }
                KeyAction::Up => {
                    pressed.remove(&code);
                }
            }
        }
        pressed
    }
}

impl KeyboardBackend for MockKeyboardBackend {
    fn key_down(&self, code: &str) -> Result<(), BackendError> {
        info!("[MOCK KEYBOARD] Key DOWN: {}", code);
        self.record(KeyAction::Down, code);
        Ok(())
    }

    fn key_up(&self, code: &str) -> Result<(), BackendError> {
        info!("[MOCK KEYBOARD] Key UP: {}", code);
        self.record(KeyAction::Up, code);
        Ok(())
    }

    fn key_repeat(&self, code: &str) -> Result<(), BackendError> {
        info!("[MOCK KEYBOARD] Key REPEAT: {}", code);
        self.record(KeyAction::Repeat, code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_keyboard_works() {
        let keyboard = MockKeyboardBackend::new();
        assert!(keyboard.key_down("KeyW").is_ok());
        assert!(keyboard.key_up("KeyW").is_ok());
        assert!(keyboard.key_repeat("Space").is_ok());

        // Mock accepts any key name
        assert!(keyboard.key_down("invalid_key").is_ok());
        assert_eq!(keyboard.actions().len(), 4);
    }

    #[test]
    fn pressed_keys_tracks_unreleased() {
        let keyboard = MockKeyboardBackend::new();
        let shared = keyboard.clone();
        keyboard.key_down("KeyA").unwrap();
        keyboard.key_down("KeyB").unwrap();
        shared.key_up("KeyA").unwrap();

        let pressed: Vec<_> = keyboard.pressed_keys().into_iter().collect();
        assert_eq!(pressed, vec!["KeyB".to_string()]);
    }
}
