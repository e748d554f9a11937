//! Mapping executor - runs one sampling pass for one controller
//!
//! Given a controller snapshot, its profile and its held state, the
//! executor evaluates every mapped control, updates the held flags and
//! dispatches the resulting transitions. It also owns the flush path used
//! when holds must be released without a sample (disconnect, profile swap,
//! stop).

use crate::controller::Controller;
use crate::mapping::control::ControlKey;
use crate::mapping::dispatcher::{Dispatcher, FocusTracker, Provenance};
use crate::mapping::edge::{self, Transition};
use crate::mapping::held::HeldState;
use crate::mapping::profile::{MappingEntry, Profile};
use log::{debug, trace};

/// Executes mapping entries for controller samples
pub struct MappingExecutor<F: FocusTracker> {
    dispatcher: Dispatcher<F>,
}

impl<F: FocusTracker> MappingExecutor<F> {
    pub fn new(dispatcher: Dispatcher<F>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher<F> {
        &self.dispatcher
    }

    /// Evaluate every mapped control of `pad`. Returns the number of
    /// transitions raised.
    pub fn update_pad(&self, pad: &Controller, controller_id: &str, profile: &Profile, held: &mut HeldState) -> usize {
        let mut raised = 0;

        for (&index, entry) in &profile.buttons {
            let Ok(button) = u8::try_from(index) else { continue };
            let Some(&sample) = pad.buttons.get(usize::from(button)) else { continue };
            let active = edge::button_active(sample);
            raised += self.apply(ControlKey::Button(button), active, sample.value, controller_id, entry, held);
        }

        for (&slot, entry) in &profile.axes {
            let Some(key @ ControlKey::Axis(axis, sign)) = ControlKey::from_axis_slot(slot) else { continue };
            let Some(&value) = pad.axes.get(usize::from(axis)) else { continue };
            let active = edge::axis_active(value, sign, profile.axes_threshold);
            raised += self.apply(key, active, value, controller_id, entry, held);
        }

        raised
    }

    fn apply(
        &self,
        key: ControlKey,
        active: bool,
        raw_value: f32,
        controller_id: &str,
        entry: &MappingEntry,
        held: &mut HeldState,
    ) -> usize {
        let result = edge::edge(active, held.is_held(key));
        held.set(key, result.held);

        let Some(transition) = result.transition else { return 0 };
        trace!("'{}' {} -> {} ({})", controller_id, key, transition, entry.label());

        let from = Provenance {
            controller_id: controller_id.to_string(),
            control: key,
            raw_value,
        };
        self.dispatcher.dispatch(entry, transition, from);
        1
    }

    /// Raise `up` for every held control that `profile` maps, then empty
    /// `held`. Without a profile the state is simply cleared.
    pub fn release_all(&self, controller_id: &str, profile: Option<&Profile>, held: &mut HeldState) -> usize {
        let keys = held.take_all();
        let Some(profile) = profile else {
            if !keys.is_empty() {
                debug!("'{}': clearing {} holds without a profile", controller_id, keys.len());
            }
            return 0;
        };

        let mut released = 0;
        for key in keys {
            let Some(entry) = profile.entry(key) else { continue };
            let from = Provenance {
                controller_id: controller_id.to_string(),
                control: key,
                raw_value: 0.0,
            };
            trace!("'{}' {} -> up on release ({})", controller_id, key, entry.label());
            self.dispatcher.dispatch(entry, Transition::Up, from);
            released += 1;
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockFocus, RecordingTarget};
    use crate::mapping::control::Sign;
    use crate::controller::ButtonSample;
    use std::sync::Arc;

    fn executor() -> (MappingExecutor<MockFocus>, Arc<RecordingTarget>) {
        let target = Arc::new(RecordingTarget::new("test"));
        let dispatcher = Dispatcher::new(MockFocus::new(target.clone()), "test");
        (MappingExecutor::new(dispatcher), target)
    }

    #[test]
    fn button_down_press_up() {
        let (executor, target) = executor();
        let profile = Profile::default().with_button(0, MappingEntry::key("Space"));
        let mut held = HeldState::default();
        let mut pad = Controller::new("Xbox", 0, 4, 2);

        pad.buttons[0] = ButtonSample::pressed();
        executor.update_pad(&pad, "Xbox", &profile, &mut held);
        executor.update_pad(&pad, "Xbox", &profile, &mut held);
        pad.buttons[0] = ButtonSample::released();
        executor.update_pad(&pad, "Xbox", &profile, &mut held);
        executor.update_pad(&pad, "Xbox", &profile, &mut held);

        assert_eq!(target.event_types(), vec!["keydown", "keypress", "keyup"]);
        assert!(held.is_empty());
    }

    #[test]
    fn unmapped_controls_are_ignored() {
        let (executor, target) = executor();
        let profile = Profile::default().with_button(0, MappingEntry::key("Space"));
        let mut held = HeldState::default();
        let mut pad = Controller::new("Xbox", 0, 4, 2);
        pad.buttons[1] = ButtonSample::pressed();
        pad.axes[0] = 1.0;

        assert_eq!(executor.update_pad(&pad, "Xbox", &profile, &mut held), 0);
        assert!(target.events().is_empty());
        assert!(held.is_empty());
    }

    #[test]
    fn missing_controls_are_skipped() {
        let (executor, target) = executor();
        let profile = Profile::default()
            .with_button(9, MappingEntry::key("Space"))
            .with_axis(5, Sign::Positive, MappingEntry::key("KeyD"));
        let mut held = HeldState::default();
        let pad = Controller::new("tiny", 0, 2, 1);

        assert_eq!(executor.update_pad(&pad, "tiny", &profile, &mut held), 0);
        assert!(target.events().is_empty());
    }

    #[test]
    fn stick_push_holds_one_direction() {
        let (executor, target) = executor();
        let profile = Profile::default()
            .with_threshold(0.5)
            .with_axis(0, Sign::Negative, MappingEntry::key("ArrowLeft"))
            .with_axis(0, Sign::Positive, MappingEntry::key("ArrowRight"));
        let mut held = HeldState::default();
        let mut pad = Controller::new("Xbox", 0, 0, 2);

        for value in [0.0, -0.9, -0.9, 0.0, 0.9, 0.0] {
            pad.axes[0] = value;
            executor.update_pad(&pad, "Xbox", &profile, &mut held);
            let neg = held.is_held(ControlKey::Axis(0, Sign::Negative));
            let pos = held.is_held(ControlKey::Axis(0, Sign::Positive));
            assert!(!(neg && pos));
        }

        let codes: Vec<_> = target
            .events()
            .iter()
            .map(|e| format!("{}:{}", e.event_type(), e.code().unwrap_or_default()))
            .collect();
        assert_eq!(
            codes,
            vec![
                "keydown:ArrowLeft",
                "keypress:ArrowLeft",
                "keyup:ArrowLeft",
                "keydown:ArrowRight",
                "keyup:ArrowRight",
            ]
        );
    }

    #[test]
    fn provenance_carries_raw_value() {
        let (executor, target) = executor();
        let profile = Profile::default().with_button(6, MappingEntry::mouse(0));
        let mut held = HeldState::default();
        let mut pad = Controller::new("Xbox", 0, 8, 0);
        pad.buttons[6] = ButtonSample::analog(0.75);

        executor.update_pad(&pad, "Xbox", &profile, &mut held);
        let events = target.events();
        assert_eq!(events[0].from.control, ControlKey::Button(6));
        assert_eq!(events[0].from.raw_value, 0.75);
        assert_eq!(events[0].from.controller_id, "Xbox");
    }

    #[test]
    fn release_all_flushes_only_held() {
        let (executor, target) = executor();
        let profile = Profile::default()
            .with_button(0, MappingEntry::key("KeyA"))
            .with_button(1, MappingEntry::key("KeyB"))
            .with_axis(1, Sign::Negative, MappingEntry::key("ArrowUp"));
        let mut held = HeldState::default();
        held.set(ControlKey::Button(0), true);
        held.set(ControlKey::Axis(1, Sign::Negative), true);

        assert_eq!(executor.release_all("Xbox", Some(&profile), &mut held), 2);
        assert!(held.is_empty());

        let events = target.events();
        assert!(events.iter().all(|e| e.event_type() == "keyup"));
        let codes: Vec<_> = events.iter().filter_map(|e| e.code().map(String::from)).collect();
        assert_eq!(codes, vec!["KeyA", "ArrowUp"]);
    }

    #[test]
    fn release_all_without_profile_only_clears() {
        let (executor, target) = executor();
        let mut held = HeldState::default();
        held.set(ControlKey::Button(0), true);

        assert_eq!(executor.release_all("Xbox", None, &mut held), 0);
        assert!(held.is_empty());
        assert!(target.events().is_empty());
    }
}
