//! Gamepad source backed by `gilrs`.
//!
//! Buttons and axes are reported in the standard gamepad layout so that
//! profile indices mean the same thing on every platform:
//!
//! | index | button            | index | button       |
//! |-------|-------------------|-------|--------------|
//! | 0     | South (A)         | 9     | Start        |
//! | 1     | East (B)          | 10    | Left stick   |
//! | 2     | West (X)          | 11    | Right stick  |
//! | 3     | North (Y)         | 12    | D-pad up     |
//! | 4     | Left bumper       | 13    | D-pad down   |
//! | 5     | Right bumper      | 14    | D-pad left   |
//! | 6     | Left trigger      | 15    | D-pad right  |
//! | 7     | Right trigger     | 16    | Guide        |
//! | 8     | Select            |       |              |
//!
//! Axes: 0/1 left stick X/Y, 2/3 right stick X/Y, Y positive = down.

use super::{broadcast, ButtonSample, Controller, PadEvent, PadIdentity, SampleSource, SourceError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use gilrs::{Axis, Button, EventType, Gamepad, GamepadId, Gilrs};
use log::{debug, info};

const STANDARD_BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

/// (axis, invert)
const STANDARD_AXES: [(Axis, bool); 4] = [
    (Axis::LeftStickX, false),
    (Axis::LeftStickY, true),
    (Axis::RightStickX, false),
    (Axis::RightStickY, true),
];

pub struct GilrsSource {
    gilrs: Gilrs,
    listeners: Vec<Sender<PadEvent>>,
}

impl GilrsSource {
    pub fn new() -> Result<Self, SourceError> {
        let gilrs = Gilrs::new().map_err(|e| SourceError::Init(e.to_string()))?;
        info!("✓ Gamepad driver ready");
        Ok(Self {
            gilrs,
            listeners: Vec::new(),
        })
    }

    fn identity(id: GamepadId, gamepad: &Gamepad<'_>) -> PadIdentity {
        PadIdentity {
            id: gamepad.name().to_string(),
            index: usize::from(id),
        }
    }

    fn snapshot(id: GamepadId, gamepad: &Gamepad<'_>) -> Controller {
        let buttons = STANDARD_BUTTONS
            .iter()
            .map(|&button| match gamepad.button_data(button) {
                Some(data) => ButtonSample {
                    pressed: data.is_pressed(),
                    value: data.value(),
                },
                None => ButtonSample::released(),
            })
            .collect();

        let axes = STANDARD_AXES
            .iter()
            .map(|&(axis, invert)| {
                let value = gamepad.value(axis);
                if invert { -value } else { value }
            })
            .collect();

        Controller {
            id: gamepad.name().to_string(),
            index: usize::from(id),
            buttons,
            axes,
        }
    }
}

impl SampleSource for GilrsSource {
    fn subscribe(&mut self) -> Receiver<PadEvent> {
        let (tx, rx) = unbounded();
        for (id, gamepad) in self.gilrs.gamepads() {
            let _ = tx.send(PadEvent::Connected(Self::identity(id, &gamepad)));
        }
        self.listeners.push(tx);
        rx
    }

    fn refresh(&mut self) {
        // Draining events is what keeps gilrs' cached gamepad state current.
        while let Some(event) = self.gilrs.next_event() {
            let notification = match event.event {
                EventType::Connected => {
                    let gamepad = self.gilrs.gamepad(event.id);
                    PadEvent::Connected(Self::identity(event.id, &gamepad))
                }
                EventType::Disconnected => {
                    let gamepad = self.gilrs.gamepad(event.id);
                    PadEvent::Disconnected(Self::identity(event.id, &gamepad))
                }
                _ => continue,
            };
            debug!("Gamepad notification: {:?}", notification);
            broadcast(&mut self.listeners, &notification);
        }
    }

    fn sample(&self, index: usize) -> Option<Controller> {
        self.gilrs
            .gamepads()
            .find(|(id, _)| usize::from(*id) == index)
            .map(|(id, gamepad)| Self::snapshot(id, &gamepad))
    }
}
