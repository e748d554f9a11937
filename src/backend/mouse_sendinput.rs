//! Windows SendInput mouse backend (buttons).
//!
//! Sends button presses and releases via Win32 SendInput. Back and forward
//! go out as X buttons 1 and 2.
//!
//! Safety: Same caveats as keyboard backend; wraps SendInput and converts
//! errors to [`BackendError`].

use super::MouseButton;

#[cfg(windows)]
use super::BackendError;
#[cfg(windows)]
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEINPUT, MOUSE_EVENT_FLAGS,
    MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP,
    MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_XDOWN, MOUSEEVENTF_XUP,
};

/// `mouseData` value for a button (X button number, 0 for the rest)
pub fn x_button_data(button: MouseButton) -> u32 {
    match button {
        MouseButton::Back => 1,
        MouseButton::Forward => 2,
        _ => 0,
    }
}

#[cfg(windows)]
#[derive(Clone, Copy, Debug)]
pub struct MouseSendInputBackend;

#[cfg(windows)]
impl MouseSendInputBackend {
    /// Press a mouse button (button down event).
    pub fn button_down(button: MouseButton) -> Result<(), BackendError> {
        let flags = match button {
            MouseButton::Left => MOUSEEVENTF_LEFTDOWN,
            MouseButton::Middle => MOUSEEVENTF_MIDDLEDOWN,
            MouseButton::Right => MOUSEEVENTF_RIGHTDOWN,
            MouseButton::Back | MouseButton::Forward => MOUSEEVENTF_XDOWN,
        };
        Self::send_button_event(flags, x_button_data(button))
    }

    /// Release a mouse button (button up event).
    pub fn button_up(button: MouseButton) -> Result<(), BackendError> {
        let flags = match button {
            MouseButton::Left => MOUSEEVENTF_LEFTUP,
            MouseButton::Middle => MOUSEEVENTF_MIDDLEUP,
            MouseButton::Right => MOUSEEVENTF_RIGHTUP,
            MouseButton::Back | MouseButton::Forward => MOUSEEVENTF_XUP,
        };
        Self::send_button_event(flags, x_button_data(button))
    }

    fn send_button_event(flags: MOUSE_EVENT_FLAGS, mouse_data: u32) -> Result<(), BackendError> {
        let mi = MOUSEINPUT {
            dx: 0,
            dy: 0,
            mouseData: mouse_data as _,
            dwFlags: flags,
            time: 0,
            dwExtraInfo: 0,
        };

        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 { mi },
        };

        // SAFETY: Win32 call; we pass a single INPUT struct slice.
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent == 0 {
            use windows::Win32::Foundation::GetLastError;
            let err = unsafe { GetLastError() };
            Err(BackendError::Operation(format!("SendInput failed: 0x{:08X}", err.0)))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_buttons_carry_their_number() {
        assert_eq!(x_button_data(MouseButton::Back), 1);
        assert_eq!(x_button_data(MouseButton::Forward), 2);
        assert_eq!(x_button_data(MouseButton::Left), 0);
        assert_eq!(x_button_data(MouseButton::Right), 0);
    }
}
