//! Edge detection
//!
//! Turns a stream of samples for one control into discrete transitions:
//!
//! | was held | active now | transition |
//! |----------|------------|------------|
//! | no       | no         | none       |
//! | no       | yes        | `Down`     |
//! | yes      | yes        | `Press`    |
//! | yes      | no         | `Up`       |

use crate::controller::ButtonSample;
use crate::mapping::control::Sign;
use std::fmt;

/// Fixed activation threshold for analog button values
pub const BUTTON_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Down,
    /// Repeat signal while the control stays held
    Press,
    Up,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Down => "down",
            Transition::Press => "press",
            Transition::Up => "up",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one edge evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub held: bool,
    pub transition: Option<Transition>,
}

/// Round to 3 decimal places so jitter around a threshold does not flap.
#[inline]
pub fn quantize(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[inline]
pub fn button_active(sample: ButtonSample) -> bool {
    sample.pressed || quantize(sample.value) > BUTTON_THRESHOLD
}

#[inline]
pub fn axis_active(value: f32, sign: Sign, threshold: f32) -> bool {
    let value = quantize(value);
    match sign {
        Sign::Positive => value > threshold,
        Sign::Negative => value < -threshold,
    }
}

pub fn edge(active: bool, held: bool) -> Edge {
    let transition = match (held, active) {
        (false, true) => Some(Transition::Down),
        (true, true) => Some(Transition::Press),
        (true, false) => Some(Transition::Up),
        (false, false) => None,
    };
    Edge { held: active, transition }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `samples` through the detector starting released.
    fn run(samples: &[bool]) -> Vec<Option<Transition>> {
        let mut held = false;
        samples
            .iter()
            .map(|&active| {
                let e = edge(active, held);
                held = e.held;
                e.transition
            })
            .collect()
    }

    #[test]
    fn down_then_presses_then_single_up() {
        use Transition::*;
        assert_eq!(
            run(&[true, true, true, false, false]),
            vec![Some(Down), Some(Press), Some(Press), Some(Up), None]
        );
    }

    #[test]
    fn never_repeats_down_while_held() {
        let transitions = run(&[true; 50]);
        assert_eq!(transitions.iter().filter(|t| **t == Some(Transition::Down)).count(), 1);
        assert_eq!(transitions.iter().filter(|t| **t == Some(Transition::Press)).count(), 49);
    }

    #[test]
    fn button_pressed_flag_or_value() {
        assert!(button_active(ButtonSample::pressed()));
        assert!(button_active(ButtonSample::analog(0.51)));
        assert!(!button_active(ButtonSample::analog(0.5)));
        // 0.5004 quantizes to 0.5
        assert!(!button_active(ButtonSample::analog(0.5004)));
        assert!(!button_active(ButtonSample::released()));
    }

    #[test]
    fn axis_directions_are_independent() {
        assert!(axis_active(0.8, Sign::Positive, 0.5));
        assert!(!axis_active(0.8, Sign::Negative, 0.5));
        assert!(axis_active(-0.8, Sign::Negative, 0.5));
        assert!(!axis_active(-0.8, Sign::Positive, 0.5));
        assert!(!axis_active(0.0, Sign::Positive, 0.5));
        assert!(!axis_active(0.0, Sign::Negative, 0.5));
    }

    #[test]
    fn axis_directions_exclusive_on_a_sweep() {
        let threshold = 0.3;
        let mut value = -1.0f32;
        while value <= 1.0 {
            let both = axis_active(value, Sign::Positive, threshold) && axis_active(value, Sign::Negative, threshold);
            assert!(!both, "both directions active at {}", value);
            value += 0.01;
        }
    }

    #[test]
    fn quantize_rounds_to_thousandths() {
        assert_eq!(quantize(0.70049), 0.7);
        assert_eq!(quantize(0.12345), 0.123);
        assert_eq!(quantize(0.9996), 1.0);
        assert_eq!(quantize(-0.2504), -0.25);
    }
}
