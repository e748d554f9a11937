//! padmap-rs: gamepad to keyboard/mouse mapping engine
//!
//! This library samples game controllers once per frame and turns their
//! buttons and stick directions into synthetic keyboard and mouse events,
//! following a per-controller profile with a wildcard fallback.

pub mod backend;
pub mod controller;
pub mod engine;
pub mod mapping;
pub mod panel;
pub mod store;

// Re-export commonly used items
pub use backend::{DesktopFocus, KeyboardBackend, MouseBackend, SystemTarget};
pub use controller::{ButtonSample, Controller, PadEvent, PadIdentity, SampleSource, ScriptedSource};
pub use engine::{Engine, EngineError, LoopState};
pub use mapping::{Config, ControlKey, Dispatcher, MappingEntry, MappingExecutor, Profile, ProfileSet, Sign, Transition};
pub use panel::PadView;
pub use store::{ProfileSource, ProfileStore, StoreError};
