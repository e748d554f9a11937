//! Mapping module - turns controller samples into synthetic keyboard/mouse events

pub mod config;
pub mod control;
pub mod dispatcher;
pub mod edge;
pub mod executor;
pub mod held;
pub mod profile;

pub use config::{Config, ConfigError, Settings};
pub use control::{ControlKey, Sign};
pub use dispatcher::{DispatchError, Dispatcher, FocusTracker, SyntheticEvent, Target};
pub use edge::Transition;
pub use executor::MappingExecutor;
pub use held::{HeldState, HeldTable};
pub use profile::{EntryKind, MappingEntry, Profile, ProfileSet, WILDCARD};
