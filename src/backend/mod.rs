//! Backend abstraction for keyboard and mouse input injection
//!
//! This module provides a unified interface for sending keyboard and mouse
//! events to the operating system, and the [`SystemTarget`] that turns
//! synthetic events into backend calls.

pub mod keyboard_sendinput;
pub mod mouse_sendinput;
pub mod mock_keyboard;
pub mod mock_mouse;
pub mod mock_focus;

#[cfg(windows)]
pub use keyboard_sendinput::KeyboardSendInputBackend;
#[cfg(windows)]
pub use mouse_sendinput::MouseSendInputBackend;

pub use mock_focus::{MockFocus, RecordingTarget};
pub use mock_keyboard::{KeyAction, MockKeyboardBackend};
pub use mock_mouse::{MockMouseBackend, MouseAction};

use crate::mapping::dispatcher::{DispatchError, EventPayload, FocusTracker, SyntheticEvent, Target};
use crate::mapping::edge::Transition;
use log::trace;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend operation failed: {0}")]
    Operation(String),

    #[error("Unsupported key: {0}")]
    UnsupportedKey(String),

    #[error("Unsupported mouse button: {0}")]
    UnsupportedButton(u8),

    #[error("Platform not supported")]
    PlatformNotSupported,
}

/// Unified backend interface for keyboard operations
pub trait KeyboardBackend {
    /// Press a key (key down event), by key code name
    fn key_down(&self, code: &str) -> Result<(), BackendError>;

    /// Release a key (key up event)
    fn key_up(&self, code: &str) -> Result<(), BackendError>;

    /// Repeat signal while a key stays held (defaults to another key down,
    /// which is how the OS itself auto-repeats)
    fn key_repeat(&self, code: &str) -> Result<(), BackendError> {
        self.key_down(code)
    }
}

/// Unified backend interface for mouse operations
pub trait MouseBackend {
    /// Press a mouse button (button down)
    fn button_down(&self, button: MouseButton) -> Result<(), BackendError>;

    /// Release a mouse button (button up)
    fn button_up(&self, button: MouseButton) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Back,
    Forward,
}

impl MouseButton {
    /// Map a pointer-event button number (0 primary, 1 auxiliary,
    /// 2 secondary, 3 back, 4 forward).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(MouseButton::Left),
            1 => Some(MouseButton::Middle),
            2 => Some(MouseButton::Right),
            3 => Some(MouseButton::Back),
            4 => Some(MouseButton::Forward),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Middle => "middle",
            MouseButton::Right => "right",
            MouseButton::Back => "back",
            MouseButton::Forward => "forward",
        }
    }
}

/// Delivers synthetic events to the OS through keyboard/mouse backends
pub struct SystemTarget<K, M>
where
    K: KeyboardBackend,
    M: MouseBackend,
{
    keyboard: K,
    mouse: M,
}

impl<K, M> SystemTarget<K, M>
where
    K: KeyboardBackend,
    M: MouseBackend,
{
    pub fn new(keyboard: K, mouse: M) -> Self {
        Self { keyboard, mouse }
    }
}

impl<K, M> Target for SystemTarget<K, M>
where
    K: KeyboardBackend,
    M: MouseBackend,
{
    fn label(&self) -> String {
        "system input".to_string()
    }

    fn deliver(&self, event: &SyntheticEvent) -> Result<(), DispatchError> {
        match &event.payload {
            EventPayload::Key { code, .. } => {
                if code.is_empty() {
                    return Err(BackendError::UnsupportedKey(String::new()).into());
                }
                match event.transition {
                    Transition::Down => self.keyboard.key_down(code)?,
                    Transition::Press => self.keyboard.key_repeat(code)?,
                    Transition::Up => self.keyboard.key_up(code)?,
                }
            }
            EventPayload::Mouse { button } => {
                let button = MouseButton::from_index(*button).ok_or(BackendError::UnsupportedButton(*button))?;
                match event.transition {
                    Transition::Down => self.mouse.button_down(button)?,
                    // Mice have no auto-repeat; holding is already expressed by the down
                    Transition::Press => trace!("mouse {} still held", button.name()),
                    Transition::Up => self.mouse.button_up(button)?,
                }
            }
        }
        Ok(())
    }
}

/// Focus tracker for OS-level injection: the OS routes injected input to
/// the foreground window, so the system target always has focus.
pub struct DesktopFocus {
    target: Arc<dyn Target>,
}

impl DesktopFocus {
    pub fn new(target: Arc<dyn Target>) -> Self {
        Self { target }
    }
}

impl FocusTracker for DesktopFocus {
    fn active_target(&self) -> Option<Arc<dyn Target>> {
        Some(Arc::clone(&self.target))
    }
}

// Windows implementations
#[cfg(windows)]
impl KeyboardBackend for KeyboardSendInputBackend {
    fn key_down(&self, code: &str) -> Result<(), BackendError> {
        KeyboardSendInputBackend::key_down(code)
    }

    fn key_up(&self, code: &str) -> Result<(), BackendError> {
        KeyboardSendInputBackend::key_up(code)
    }
}

#[cfg(windows)]
impl MouseBackend for MouseSendInputBackend {
    fn button_down(&self, button: MouseButton) -> Result<(), BackendError> {
        MouseSendInputBackend::button_down(button)
    }

    fn button_up(&self, button: MouseButton) -> Result<(), BackendError> {
        MouseSendInputBackend::button_up(button)
    }
}

/// Get the OS-level target for the current platform
#[cfg(windows)]
pub fn system_target() -> Result<Arc<dyn Target>, BackendError> {
    Ok(Arc::new(SystemTarget::new(KeyboardSendInputBackend, MouseSendInputBackend)))
}

#[cfg(not(windows))]
pub fn system_target() -> Result<Arc<dyn Target>, BackendError> {
    Err(BackendError::PlatformNotSupported)
}

/// Get a target backed by the logging mock backends
pub fn mock_system_target() -> Arc<dyn Target> {
    Arc::new(SystemTarget::new(MockKeyboardBackend::new(), MockMouseBackend::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::control::ControlKey;
    use crate::mapping::dispatcher::{DeliveryFlags, Provenance};

    fn event(payload: EventPayload, transition: Transition) -> SyntheticEvent {
        SyntheticEvent {
            transition,
            payload,
            from: Provenance {
                controller_id: "pad".into(),
                control: ControlKey::Button(0),
                raw_value: 1.0,
            },
            flags: DeliveryFlags::default(),
            context: Arc::from("test"),
        }
    }

    fn key(code: &str) -> EventPayload {
        EventPayload::Key {
            code: code.into(),
            key: code.into(),
            key_code: 0,
            which: 0,
        }
    }

    #[test]
    fn key_transitions_map_to_backend_calls() {
        let keyboard = MockKeyboardBackend::new();
        let target = SystemTarget::new(keyboard.clone(), MockMouseBackend::new());

        target.deliver(&event(key("Space"), Transition::Down)).unwrap();
        target.deliver(&event(key("Space"), Transition::Press)).unwrap();
        target.deliver(&event(key("Space"), Transition::Up)).unwrap();

        assert_eq!(
            keyboard.actions(),
            vec![
                (KeyAction::Down, "Space".to_string()),
                (KeyAction::Repeat, "Space".to_string()),
                (KeyAction::Up, "Space".to_string()),
            ]
        );
        assert!(keyboard.pressed_keys().is_empty());
    }

    #[test]
    fn mouse_press_is_not_forwarded() {
        let mouse = MockMouseBackend::new();
        let target = SystemTarget::new(MockKeyboardBackend::new(), mouse.clone());

        target.deliver(&event(EventPayload::Mouse { button: 2 }, Transition::Down)).unwrap();
        target.deliver(&event(EventPayload::Mouse { button: 2 }, Transition::Press)).unwrap();
        target.deliver(&event(EventPayload::Mouse { button: 2 }, Transition::Up)).unwrap();

        assert_eq!(
            mouse.actions(),
            vec![(MouseAction::Down, MouseButton::Right), (MouseAction::Up, MouseButton::Right)]
        );
    }

    #[test]
    fn unsupported_inputs_are_errors() {
        let target = SystemTarget::new(MockKeyboardBackend::new(), MockMouseBackend::new());
        assert!(target.deliver(&event(EventPayload::Mouse { button: 9 }, Transition::Down)).is_err());
        assert!(target.deliver(&event(key(""), Transition::Down)).is_err());
    }

    #[test]
    fn desktop_focus_always_answers() {
        let focus = DesktopFocus::new(mock_system_target());
        assert!(focus.active_target().is_some());
    }

    #[test]
    fn mouse_button_numbers() {
        assert_eq!(MouseButton::from_index(0), Some(MouseButton::Left));
        assert_eq!(MouseButton::from_index(1), Some(MouseButton::Middle));
        assert_eq!(MouseButton::from_index(2), Some(MouseButton::Right));
        assert_eq!(MouseButton::from_index(4), Some(MouseButton::Forward));
        assert_eq!(MouseButton::from_index(5), None);
    }
}
