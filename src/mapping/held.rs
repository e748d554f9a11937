//! Control state table: which controls of which controller are held.

use crate::mapping::control::ControlKey;
use std::collections::{BTreeMap, BTreeSet};

/// Held controls of one controller
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeldState {
    keys: BTreeSet<ControlKey>,
}

impl HeldState {
    pub fn is_held(&self, key: ControlKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn set(&mut self, key: ControlKey, held: bool) {
        if held {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    /// Empty the state, returning what was held in key order.
    pub fn take_all(&mut self) -> Vec<ControlKey> {
        std::mem::take(&mut self.keys).into_iter().collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = ControlKey> + '_ {
        self.keys.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Per-slot held state for every connected controller
#[derive(Debug, Default)]
pub struct HeldTable {
    pads: BTreeMap<usize, HeldState>,
}

impl HeldTable {
    /// Fresh, empty state for a slot. Any previous state is returned.
    pub fn allocate(&mut self, index: usize) -> Option<HeldState> {
        self.pads.insert(index, HeldState::default())
    }

    pub fn get(&self, index: usize) -> Option<&HeldState> {
        self.pads.get(&index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut HeldState> {
        self.pads.get_mut(&index)
    }

    pub fn remove(&mut self, index: usize) -> Option<HeldState> {
        self.pads.remove(&index)
    }

    pub fn clear(&mut self) {
        self.pads.clear();
    }

    pub fn contains(&self, index: usize) -> bool {
        self.pads.contains_key(&index)
    }
}
