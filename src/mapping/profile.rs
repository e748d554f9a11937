//! Profile data model
//!
//! A [`Profile`] maps [`ControlKey`]s to [`MappingEntry`]s. A [`ProfileSet`]
//! keys profiles by controller identity, with [`WILDCARD`] as the fallback.
//! Profiles are values: editing one produces a new profile.

use crate::mapping::config::ConfigError;
use crate::mapping::control::{ControlKey, Sign};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Profile key used when a controller has no profile of its own
pub const WILDCARD: &str = "any";

pub const DEFAULT_AXES_THRESHOLD: f32 = 0.7;

fn default_axes_threshold() -> f32 {
    DEFAULT_AXES_THRESHOLD
}

/// Which kind of synthetic event an entry raises
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Key,
    Mouse,
    /// Anything else found in stored data; synthesized as a key event
    #[serde(other)]
    Unknown,
}

/// The synthetic event raised for one control
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(default)]
    pub kind: EntryKind,

    /// Physical key code name ("Space", "KeyW", "ArrowRight")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Key value ("a", " ", "ArrowRight")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, rename = "keyCode", skip_serializing_if = "Option::is_none")]
    pub key_code: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub which: Option<u32>,

    /// Mouse button number (0 primary, 1 auxiliary, 2 secondary, 3 back, 4 forward)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<u8>,
}

impl MappingEntry {
    /// Key entry whose code and key share a name.
    pub fn key(code: &str) -> Self {
        Self {
            kind: EntryKind::Key,
            code: Some(code.to_string()),
            key: Some(code.to_string()),
            ..Self::default()
        }
    }

    /// Attach the legacy numeric code (used for both `keyCode` and `which`).
    pub fn with_key_code(mut self, key_code: u32) -> Self {
        self.key_code = Some(key_code);
        self.which = Some(key_code);
        self
    }

    pub fn mouse(button: u8) -> Self {
        Self {
            kind: EntryKind::Mouse,
            button: Some(button),
            ..Self::default()
        }
    }

    /// Short human label, used for logs and panel hints.
    pub fn label(&self) -> String {
        match self.kind {
            EntryKind::Mouse => format!("Mouse {}", self.button.unwrap_or(0)),
            EntryKind::Key | EntryKind::Unknown => self
                .code
                .clone()
                .or_else(|| self.key.clone())
                .unwrap_or_else(|| "?".to_string()),
        }
    }

    fn validate(&self, context: &str) -> Result<(), ConfigError> {
        match self.kind {
            EntryKind::Mouse if self.button.is_none() => Err(ConfigError::Invalid(format!(
                "{}: mouse entry needs a 'button'",
                context
            ))),
            EntryKind::Key if self.code.is_none() && self.key.is_none() => Err(ConfigError::Invalid(
                format!("{}: key entry needs a 'code' or 'key'", context),
            )),
            _ => Ok(()),
        }
    }
}

/// Mapping for one controller (or the wildcard)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, with = "sparse_table")]
    pub buttons: BTreeMap<u16, MappingEntry>,

    /// Indexed by [`ControlKey::axis_slot`]
    #[serde(default, with = "sparse_table")]
    pub axes: BTreeMap<u16, MappingEntry>,

    #[serde(default = "default_axes_threshold", rename = "axesThreshold")]
    pub axes_threshold: f32,

    #[serde(default)]
    pub disabled: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            buttons: BTreeMap::new(),
            axes: BTreeMap::new(),
            axes_threshold: DEFAULT_AXES_THRESHOLD,
            disabled: false,
        }
    }
}

impl Profile {
    pub fn entry(&self, key: ControlKey) -> Option<&MappingEntry> {
        let table = if key.is_axis() { &self.axes } else { &self.buttons };
        table.get(&key.slot())
    }

    /// A copy of this profile with `key` bound to `entry`, or unbound for `None`.
    pub fn with_entry(&self, key: ControlKey, entry: Option<MappingEntry>) -> Self {
        let mut next = self.clone();
        let table = if key.is_axis() { &mut next.axes } else { &mut next.buttons };
        match entry {
            Some(entry) => {
                table.insert(key.slot(), entry);
            }
            None => {
                table.remove(&key.slot());
            }
        }
        next
    }

    pub fn with_button(self, index: u8, entry: MappingEntry) -> Self {
        self.with_entry(ControlKey::Button(index), Some(entry))
    }

    pub fn with_axis(self, axis: u8, sign: Sign, entry: MappingEntry) -> Self {
        self.with_entry(ControlKey::Axis(axis, sign), Some(entry))
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.axes_threshold = threshold;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Every mapped control with its entry, buttons first.
    pub fn entries(&self) -> impl Iterator<Item = (ControlKey, &MappingEntry)> + '_ {
        let buttons = self
            .buttons
            .iter()
            .filter_map(|(&index, entry)| u8::try_from(index).ok().map(|i| (ControlKey::Button(i), entry)));
        let axes = self
            .axes
            .iter()
            .filter_map(|(&slot, entry)| ControlKey::from_axis_slot(slot).map(|key| (key, entry)));
        buttons.chain(axes)
    }

    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !(self.axes_threshold > 0.0 && self.axes_threshold < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "profile '{}': axesThreshold must be between 0.0 and 1.0 (exclusive), got {}",
                name, self.axes_threshold
            )));
        }
        for &index in self.buttons.keys() {
            if u8::try_from(index).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "profile '{}': button index {} out of range",
                    name, index
                )));
            }
        }
        for &slot in self.axes.keys() {
            if ControlKey::from_axis_slot(slot).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "profile '{}': axis slot {} out of range",
                    name, slot
                )));
            }
        }
        for (key, entry) in self.entries() {
            entry.validate(&format!("profile '{}' {}", name, key))?;
        }
        Ok(())
    }
}

/// Profiles keyed by controller identity string or [`WILDCARD`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileSet {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wildcard profile mapping the first button to Space.
    pub fn builtin() -> Self {
        Self::new().with_profile(
            WILDCARD,
            Profile::default().with_button(0, MappingEntry::key("Space").with_key_code(32)),
        )
    }

    pub fn with_profile(mut self, id: impl Into<String>, profile: Profile) -> Self {
        self.profiles.insert(id.into(), profile);
        self
    }

    /// Controller-specific profile, else the wildcard, else `None`.
    pub fn resolve(&self, controller_id: &str) -> Option<&Profile> {
        self.profiles
            .get(controller_id)
            .or_else(|| self.profiles.get(WILDCARD))
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Profile)> + '_ {
        self.profiles.iter().map(|(id, profile)| (id.as_str(), profile))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, profile) in &self.profiles {
            profile.validate(id)?;
        }
        Ok(())
    }
}

/// (De)serializes an index table either from a sparse array with nulls or
/// from an object keyed by decimal index strings. Always writes the object
/// form so the output is valid in both JSON and TOML.
mod sparse_table {
    use super::MappingEntry;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Table {
        List(Vec<Option<MappingEntry>>),
        Map(BTreeMap<String, Option<MappingEntry>>),
    }

    pub fn serialize<S>(table: &BTreeMap<u16, MappingEntry>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(table.iter().map(|(index, entry)| (index.to_string(), entry)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<u16, MappingEntry>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Table::deserialize(deserializer)? {
            Table::List(list) => list
                .into_iter()
                .enumerate()
                .filter_map(|(index, entry)| entry.map(|entry| (index, entry)))
                .map(|(index, entry)| {
                    u16::try_from(index)
                        .map(|index| (index, entry))
                        .map_err(|_| D::Error::custom(format!("index {} out of range", index)))
                })
                .collect(),
            Table::Map(map) => map
                .into_iter()
                .filter_map(|(index, entry)| entry.map(|entry| (index, entry)))
                .map(|(index, entry)| {
                    index
                        .trim()
                        .parse::<u16>()
                        .map(|index| (index, entry))
                        .map_err(|_| D::Error::custom(format!("invalid control index '{}'", index)))
                })
                .collect(),
        }
    }
}
