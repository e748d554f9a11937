//! Live controller view
//!
//! State model behind a controller visualizer: one node per drawable part,
//! each remembering its last (quantized) value so a frame only reports the
//! parts that actually moved. Sticks and the d-pad hat are composites of a
//! horizontal and a vertical node.

use crate::controller::{PadIdentity, SampleSource};
use crate::mapping::control::ControlKey;
use crate::mapping::edge::quantize;
use crate::mapping::profile::Profile;
use log::debug;
use std::collections::BTreeMap;

/// Buttons drawn on their own; 12..=15 belong to the hat
const FACE_BUTTONS: usize = 12;

const STICK_TRAVEL: f32 = 20.0;
const POV_TRAVEL: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stick {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PovDirection {
    Up,
    Down,
    Left,
    Right,
}

impl PovDirection {
    /// Standard layout: d-pad up/down/left/right are buttons 12..=15
    pub fn from_button(index: usize) -> Option<Self> {
        match index {
            12 => Some(PovDirection::Up),
            13 => Some(PovDirection::Down),
            14 => Some(PovDirection::Left),
            15 => Some(PovDirection::Right),
            _ => None,
        }
    }

    fn orientation(self) -> Orientation {
        match self {
            PovDirection::Up | PovDirection::Down => Orientation::Vertical,
            PovDirection::Left | PovDirection::Right => Orientation::Horizontal,
        }
    }
}

/// Addressable part of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Element {
    Button(u8),
    StickAxis(Stick, Orientation),
    PovDirection(PovDirection),
}

impl Element {
    /// Element drawing axis `index` of the standard layout
    pub fn for_axis(index: usize) -> Option<Self> {
        match index {
            0 => Some(Element::StickAxis(Stick::Left, Orientation::Horizontal)),
            1 => Some(Element::StickAxis(Stick::Left, Orientation::Vertical)),
            2 => Some(Element::StickAxis(Stick::Right, Orientation::Horizontal)),
            3 => Some(Element::StickAxis(Stick::Right, Orientation::Vertical)),
            _ => None,
        }
    }
}

/// One element's last seen value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Node {
    last_value: f32,
}

impl Node {
    /// Record `value`; returns whether it differs from the last one.
    pub fn activate(&mut self, value: f32) -> bool {
        let value = quantize(value);
        if value == self.last_value {
            return false;
        }
        self.last_value = value;
        true
    }

    pub fn reset(&mut self) -> bool {
        self.activate(0.0)
    }

    pub fn value(&self) -> f32 {
        self.last_value
    }
}

/// Two nodes moving one drawn part (a stick or the hat)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Composite {
    pub horizontal: Node,
    pub vertical: Node,
    travel: f32,
}

impl Composite {
    fn new(travel: f32) -> Self {
        Self {
            horizontal: Node::default(),
            vertical: Node::default(),
            travel,
        }
    }

    fn node_mut(&mut self, orientation: Orientation) -> &mut Node {
        match orientation {
            Orientation::Horizontal => &mut self.horizontal,
            Orientation::Vertical => &mut self.vertical,
        }
    }

    /// Drawing offset in whole units
    pub fn offset(&self) -> (i32, i32) {
        (
            (self.horizontal.value() * self.travel) as i32,
            (self.vertical.value() * self.travel) as i32,
        )
    }

    fn reset(&mut self) {
        self.horizontal.reset();
        self.vertical.reset();
    }
}

/// A node change reported by [`PadView::update`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change {
    pub element: Element,
    pub value: f32,
}

struct Binding {
    pad: PadIdentity,
    profile: Option<Profile>,
}

pub struct PadView {
    binding: Option<Binding>,
    buttons: [Node; FACE_BUTTONS],
    pov_buttons: [Node; 4],
    left: Composite,
    right: Composite,
    pov: Composite,
}

impl Default for PadView {
    fn default() -> Self {
        Self::new()
    }
}

impl PadView {
    pub fn new() -> Self {
        Self {
            binding: None,
            buttons: [Node::default(); FACE_BUTTONS],
            pov_buttons: [Node::default(); 4],
            left: Composite::new(STICK_TRAVEL),
            right: Composite::new(STICK_TRAVEL),
            pov: Composite::new(POV_TRAVEL),
        }
    }

    /// Follow `pad` with `profile` for hints, or unbind and reset for `None`.
    pub fn bind_pad(&mut self, pad: Option<PadIdentity>, profile: Option<Profile>) {
        match pad {
            Some(pad) => {
                debug!("Panel bound to '{}' (slot {})", pad.id, pad.index);
                self.binding = Some(Binding { pad, profile });
            }
            None => {
                debug!("Panel unbound");
                self.binding = None;
                self.reset();
            }
        }
    }

    pub fn bound_pad(&self) -> Option<&PadIdentity> {
        self.binding.as_ref().map(|b| &b.pad)
    }

    /// Sample the bound pad once and return every node that changed.
    pub fn update<S: SampleSource>(&mut self, source: &S) -> Vec<Change> {
        let Some(binding) = &self.binding else { return Vec::new() };
        let Some(pad) = source.sample(binding.pad.index) else { return Vec::new() };

        let mut changes = Vec::new();
        for (index, sample) in pad.buttons.iter().enumerate() {
            self.activate_button(index, sample.value, &mut changes);
        }
        for (index, &value) in pad.axes.iter().enumerate() {
            let Some(element @ Element::StickAxis(stick, orientation)) = Element::for_axis(index) else { continue };
            let composite = match stick {
                Stick::Left => &mut self.left,
                Stick::Right => &mut self.right,
            };
            if composite.node_mut(orientation).activate(value) {
                changes.push(Change { element, value: quantize(value) });
            }
        }
        changes
    }

    fn activate_button(&mut self, index: usize, value: f32, changes: &mut Vec<Change>) {
        if let Some(direction) = PovDirection::from_button(index) {
            let node = &mut self.pov_buttons[index - FACE_BUTTONS];
            if node.activate(value) {
                let value = node.value();
                let orientation = direction.orientation();
                let hat = self.hat_value(orientation);
                self.pov.node_mut(orientation).activate(hat);
                changes.push(Change {
                    element: Element::PovDirection(direction),
                    value,
                });
            }
            return;
        }

        let (Some(node), Ok(button)) = (self.buttons.get_mut(index), u8::try_from(index)) else { return };
        if node.activate(value) {
            debug!("Button {} {}", index, if node.value() > 0.0 { "pressed" } else { "released" });
            changes.push(Change {
                element: Element::Button(button),
                value: node.value(),
            });
        }
    }

    /// Hat position on one axis from both of its d-pad buttons.
    /// Opposite directions held together cancel out.
    fn hat_value(&self, orientation: Orientation) -> f32 {
        let [up, down, left, right] = &self.pov_buttons;
        match orientation {
            Orientation::Vertical => down.value() - up.value(),
            Orientation::Horizontal => right.value() - left.value(),
        }
    }

    /// Return every node to rest.
    pub fn reset(&mut self) {
        for node in self.buttons.iter_mut().chain(self.pov_buttons.iter_mut()) {
            node.reset();
        }
        self.left.reset();
        self.right.reset();
        self.pov.reset();
    }

    /// Mapping label of every bound control of the bound profile
    pub fn hints(&self) -> BTreeMap<ControlKey, String> {
        self.binding
            .as_ref()
            .and_then(|b| b.profile.as_ref())
            .map(|profile| profile.entries().map(|(key, entry)| (key, entry.label())).collect())
            .unwrap_or_default()
    }

    pub fn button(&self, index: usize) -> Option<&Node> {
        if index < FACE_BUTTONS {
            return self.buttons.get(index);
        }
        PovDirection::from_button(index).map(|_| &self.pov_buttons[index - FACE_BUTTONS])
    }

    pub fn stick(&self, stick: Stick) -> &Composite {
        match stick {
            Stick::Left => &self.left,
            Stick::Right => &self.right,
        }
    }

    pub fn pov(&self) -> &Composite {
        &self.pov
    }
}

/// Pick the controller to show: the last one used if still connected,
/// else the first.
pub fn choose_pad<'a>(pads: &'a [PadIdentity], last_used: Option<&str>) -> Option<&'a PadIdentity> {
    last_used
        .and_then(|id| pads.iter().find(|pad| pad.id == id))
        .or_else(|| pads.first())
}
