//! Windows SendInput keyboard backend (scancode-based).
//!
//! This backend injects keyboard events using Win32 `SendInput` with
//! `KEYEVENTF_SCANCODE`, which is generally more reliable for games
//! than virtual-key based injection.
//!
//! Keys are named by physical key code (`KeyA`, `Digit1`, `ArrowUp`,
//! `ShiftLeft`, `Numpad0`, `Space`, ...), the same names profiles use for
//! `code`. Names are matched case-insensitively.
//!
//! # Safety Notes
//! - Calling `SendInput` is inherently unsafe; we wrap it in a small
//!   helper that returns a `windows::core::Result<()>` and surface a
//!   [`BackendError`] at the public boundary.
//! - Extended keys (arrows, numpad enter, right ctrl/alt, etc.) are
//!   automatically handled with the `KEYEVENTF_EXTENDEDKEY` flag.

#[cfg(windows)]
use super::BackendError;
#[cfg(windows)]
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, KEYEVENTF_SCANCODE, VIRTUAL_KEY,
};

/// US keyboard Set 1 scancodes for named keys. Values above 0xFF carry the
/// 0xE0 extended prefix.
/// Reference: https://www.win.tue.nl/~aeb/linux/kbd/scancodes-1.html
const NAMED_KEYS: &[(&str, u16)] = &[
    // Modifiers
    ("ShiftLeft", 0x2A),
    ("ShiftRight", 0x36),
    ("ControlLeft", 0x1D),
    ("ControlRight", 0xE01D),
    ("AltLeft", 0x38),
    ("AltRight", 0xE038),
    ("MetaLeft", 0xE05B),
    ("MetaRight", 0xE05C),
    // Arrows
    ("ArrowUp", 0xE048),
    ("ArrowDown", 0xE050),
    ("ArrowLeft", 0xE04B),
    ("ArrowRight", 0xE04D),
    // Numpad
    ("Numpad0", 0x52),
    ("Numpad1", 0x4F),
    ("Numpad2", 0x50),
    ("Numpad3", 0x51),
    ("Numpad4", 0x4B),
    ("Numpad5", 0x4C),
    ("Numpad6", 0x4D),
    ("Numpad7", 0x47),
    ("Numpad8", 0x48),
    ("Numpad9", 0x49),
    ("NumpadMultiply", 0x37),
    ("NumpadAdd", 0x4E),
    ("NumpadSubtract", 0x4A),
    ("NumpadDivide", 0xE035),
    ("NumpadDecimal", 0x53),
    ("NumpadEnter", 0xE01C),
    // Editing and whitespace
    ("Escape", 0x01),
    ("Tab", 0x0F),
    ("CapsLock", 0x3A),
    ("Enter", 0x1C),
    ("Backspace", 0x0E),
    ("Space", 0x39),
    ("Insert", 0xE052),
    ("Delete", 0xE053),
    ("Home", 0xE047),
    ("End", 0xE04F),
    ("PageUp", 0xE049),
    ("PageDown", 0xE051),
    // Punctuation
    ("Minus", 0x0C),
    ("Equal", 0x0D),
    ("BracketLeft", 0x1A),
    ("BracketRight", 0x1B),
    ("Semicolon", 0x27),
    ("Quote", 0x28),
    ("Backquote", 0x29),
    ("Backslash", 0x2B),
    ("Comma", 0x33),
    ("Period", 0x34),
    ("Slash", 0x35),
];

/// Letters in QWERTY row order with their scancodes
const LETTERS: [u16; 26] = [
    0x1E, 0x30, 0x2E, 0x20, 0x12, 0x21, 0x22, 0x23, 0x17, 0x24, 0x25, 0x26, 0x32, // A-M
    0x31, 0x18, 0x19, 0x10, 0x13, 0x1F, 0x14, 0x16, 0x2F, 0x11, 0x2D, 0x15, 0x2C, // N-Z
];

const FUNCTION_KEYS: [u16; 12] = [0x3B, 0x3C, 0x3D, 0x3E, 0x3F, 0x40, 0x41, 0x42, 0x43, 0x44, 0x57, 0x58];

/// Scancode for a physical key code name, `None` if unsupported.
pub fn scancode_for(code: &str) -> Option<u16> {
    let code = code.trim();

    if let Some(letter) = strip_prefix_ci(code, "Key") {
        let &[c] = letter.as_bytes() else { return None };
        let c = c.to_ascii_uppercase();
        return c.is_ascii_uppercase().then(|| LETTERS[usize::from(c - b'A')]);
    }

    if let Some(digit) = strip_prefix_ci(code, "Digit") {
        if digit.len() != 1 {
            return None;
        }
        return match digit.parse::<u16>() {
            Ok(0) => Some(0x0B),
            Ok(n) => Some(0x01 + n),
            Err(_) => None,
        };
    }

    if let Some(n) = strip_prefix_ci(code, "F").and_then(|n| n.parse::<usize>().ok()) {
        return n.checked_sub(1).and_then(|i| FUNCTION_KEYS.get(i)).copied();
    }

    NAMED_KEYS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(code))
        .map(|&(_, scancode)| scancode)
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Check if a scancode is an extended key (requires KEYEVENTF_EXTENDEDKEY flag).
#[inline]
pub fn is_extended(scancode: u16) -> bool {
    scancode > 0xFF
}

#[cfg(windows)]
/// Backend that uses Win32 SendInput to synthesize keyboard events.
#[derive(Clone, Copy, Debug)]
pub struct KeyboardSendInputBackend;

#[cfg(windows)]
impl KeyboardSendInputBackend {
    fn lookup(code: &str) -> Result<u16, BackendError> {
        scancode_for(code).ok_or_else(|| BackendError::UnsupportedKey(code.to_string()))
    }

    /// Press a key by code name (KeyW, ShiftLeft, ...).
    pub fn key_down(code: &str) -> Result<(), BackendError> {
        Self::key_down_scancode(Self::lookup(code)?)
    }

    /// Release a key by code name.
    pub fn key_up(code: &str) -> Result<(), BackendError> {
        Self::key_up_scancode(Self::lookup(code)?)
    }

    /// Low-level helper to send a single keyboard input using a hardware scancode.
    ///
    /// For extended keys (scancode > 0xFF), the actual scancode is the lower byte
    /// and KEYEVENTF_EXTENDEDKEY flag is automatically added.
    unsafe fn send_scancode(scancode: u16, mut flags: KEYBD_EVENT_FLAGS) -> windows::core::Result<()> {
        use windows::Win32::UI::Input::KeyboardAndMouse::KEYEVENTF_EXTENDEDKEY;

        let actual_scancode = if is_extended(scancode) {
            flags |= KEYEVENTF_EXTENDEDKEY;
            scancode & 0xFF
        } else {
            scancode
        };

        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(0),
                    wScan: actual_scancode,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };

        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent == 0 {
            use windows::Win32::Foundation::GetLastError;
            let err = unsafe { GetLastError() };
            Err(windows::core::Error::from_hresult(err.to_hresult()))
        } else {
            Ok(())
        }
    }

    /// Press a key using a hardware scancode (make code).
    pub fn key_down_scancode(scancode: u16) -> Result<(), BackendError> {
        // SAFETY: thin wrapper around SendInput with a single INPUT.
        unsafe { Self::send_scancode(scancode, KEYEVENTF_SCANCODE) }
            .map_err(|e| BackendError::Operation(e.to_string()))
    }

    /// Release a key using a hardware scancode (break code).
    pub fn key_up_scancode(scancode: u16) -> Result<(), BackendError> {
        unsafe { Self::send_scancode(scancode, KEYEVENTF_SCANCODE | KEYEVENTF_KEYUP) }
            .map_err(|e| BackendError::Operation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters() {
        assert_eq!(scancode_for("KeyW"), Some(0x11));
        assert_eq!(scancode_for("KeyA"), Some(0x1E));
        assert_eq!(scancode_for("keyz"), Some(0x2C));
        assert_eq!(scancode_for("KeyAB"), None);
        assert_eq!(scancode_for("Key1"), None);
    }

    #[test]
    fn digits() {
        assert_eq!(scancode_for("Digit0"), Some(0x0B));
        assert_eq!(scancode_for("Digit1"), Some(0x02));
        assert_eq!(scancode_for("Digit9"), Some(0x0A));
        assert_eq!(scancode_for("Digit10"), None);
    }

    #[test]
    fn function_keys() {
        assert_eq!(scancode_for("F1"), Some(0x3B));
        assert_eq!(scancode_for("F10"), Some(0x44));
        assert_eq!(scancode_for("F12"), Some(0x58));
        assert_eq!(scancode_for("F0"), None);
        assert_eq!(scancode_for("F13"), None);
    }

    #[test]
    fn named_keys() {
        assert_eq!(scancode_for("Space"), Some(0x39));
        assert_eq!(scancode_for("ShiftLeft"), Some(0x2A));
        assert_eq!(scancode_for("ArrowRight"), Some(0xE04D));
        assert_eq!(scancode_for("numpadenter"), Some(0xE01C));
        assert_eq!(scancode_for("Backquote"), Some(0x29));
        assert_eq!(scancode_for("Unidentified"), None);
        assert_eq!(scancode_for(""), None);
    }

    #[test]
    fn extended_keys() {
        assert!(is_extended(scancode_for("ArrowUp").unwrap()));
        assert!(is_extended(scancode_for("ControlRight").unwrap()));
        assert!(!is_extended(scancode_for("ControlLeft").unwrap()));
        assert!(!is_extended(scancode_for("KeyW").unwrap()));
    }
}
