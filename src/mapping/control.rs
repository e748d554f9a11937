//! Control addressing
//!
//! A [`ControlKey`] names one independently held control: a button, or one
//! signed direction of an axis. Each physical axis yields two keys.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Negative,
    Positive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControlKey {
    Button(u8),
    Axis(u8, Sign),
}

impl ControlKey {
    /// Index of this key in a profile's axis table.
    ///
    /// `axis * 2` is the negative direction, `axis * 2 + 1` the positive one.
    /// Profile lookup and held-state storage both go through this mapping.
    pub fn axis_slot(self) -> Option<u16> {
        self.is_axis().then(|| self.slot())
    }

    /// Index of this key within its own profile table: the button index for
    /// buttons, the axis slot for axis directions.
    pub fn slot(self) -> u16 {
        match self {
            ControlKey::Button(index) => u16::from(index),
            ControlKey::Axis(axis, Sign::Negative) => u16::from(axis) * 2,
            ControlKey::Axis(axis, Sign::Positive) => u16::from(axis) * 2 + 1,
        }
    }

    /// Inverse of [`ControlKey::axis_slot`].
    pub fn from_axis_slot(slot: u16) -> Option<Self> {
        let axis = u8::try_from(slot / 2).ok()?;
        let sign = if slot % 2 == 0 { Sign::Negative } else { Sign::Positive };
        Some(ControlKey::Axis(axis, sign))
    }

    pub fn is_axis(self) -> bool {
        matches!(self, ControlKey::Axis(..))
    }
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKey::Button(index) => write!(f, "button {}", index),
            ControlKey::Axis(axis, Sign::Negative) => write!(f, "axis {}-", axis),
            ControlKey::Axis(axis, Sign::Positive) => write!(f, "axis {}+", axis),
        }
    }
}
