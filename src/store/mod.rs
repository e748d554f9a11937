//! Profile store
//!
//! Holds the profile sets of every namespace, hands the active one to the
//! engine and notifies subscribers whenever it is replaced. Edits never
//! mutate a profile in place: each commit builds a new set and replaces
//! the old one.

pub mod persist;

use crate::mapping::config::ConfigError;
use crate::mapping::control::ControlKey;
use crate::mapping::profile::{MappingEntry, Profile, ProfileSet};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use persist::Namespaces;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access profile file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse profile file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid profiles: {0}")]
    Invalid(String),
}

impl From<ConfigError> for StoreError {
    fn from(e: ConfigError) -> Self {
        StoreError::Invalid(e.to_string())
    }
}

/// Where the engine reads profiles from
pub trait ProfileSource {
    /// Current profile set
    fn profiles(&self) -> ProfileSet;

    /// Stream of replacement sets. Dropping the receiver unsubscribes.
    fn subscribe(&mut self) -> Receiver<ProfileSet>;
}

/// A fixed set that never changes
impl ProfileSource for ProfileSet {
    fn profiles(&self) -> ProfileSet {
        self.clone()
    }

    fn subscribe(&mut self) -> Receiver<ProfileSet> {
        crossbeam_channel::never()
    }
}

struct StoreInner {
    namespace: String,
    namespaces: Namespaces,
    path: Option<PathBuf>,
    listeners: Vec<Sender<ProfileSet>>,
}

impl StoreInner {
    fn active(&self) -> ProfileSet {
        self.namespaces.get(&self.namespace).cloned().unwrap_or_default()
    }
}

/// Shared handle to the profile store. Clones see the same profiles.
#[derive(Clone)]
pub struct ProfileStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl ProfileStore {
    /// In-memory store with an empty active namespace
    pub fn new(namespace: &str) -> Self {
        Self::with_profiles(namespace, ProfileSet::new())
    }

    /// In-memory store seeded with `profiles`
    pub fn with_profiles(namespace: &str, profiles: ProfileSet) -> Self {
        let mut namespaces = Namespaces::new();
        namespaces.insert(namespace.to_string(), profiles);
        Self::from_parts(namespace, namespaces, None)
    }

    /// Store backed by a JSON file. A missing file or namespace starts from
    /// `seed`; changes are written back on every replacement.
    pub fn load(path: &Path, namespace: &str, seed: ProfileSet) -> Result<Self, StoreError> {
        let mut namespaces = persist::read(path)?;
        if !namespaces.contains_key(namespace) {
            info!("No profiles for namespace '{}', using {} seed profile(s)", namespace, seed.len());
            namespaces.insert(namespace.to_string(), seed);
        }
        Ok(Self::from_parts(namespace, namespaces, Some(path.to_path_buf())))
    }

    fn from_parts(namespace: &str, namespaces: Namespaces, path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                namespace: namespace.to_string(),
                namespaces,
                path,
                listeners: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn namespace(&self) -> String {
        self.lock().namespace.clone()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }

    /// Write every namespace to the backing file. No-op for in-memory stores.
    pub fn save(&self) -> Result<(), StoreError> {
        let inner = self.lock();
        match &inner.path {
            Some(path) => persist::write(path, &inner.namespaces),
            None => {
                debug!("Profile store has no file, not saving");
                Ok(())
            }
        }
    }

    /// Swap in a new set for the active namespace and notify subscribers.
    /// A file-backed store writes first; on failure nothing changes.
    pub fn replace(&self, profiles: ProfileSet) -> Result<(), StoreError> {
        profiles.validate()?;

        let mut inner = self.lock();
        let namespace = inner.namespace.clone();

        if let Some(path) = &inner.path {
            let mut next = inner.namespaces.clone();
            next.insert(namespace.clone(), profiles.clone());
            persist::write(path, &next)?;
        }
        inner.namespaces.insert(namespace.clone(), profiles.clone());

        let before = inner.listeners.len();
        inner.listeners.retain(|tx| tx.send(profiles.clone()).is_ok());
        if inner.listeners.len() < before {
            debug!("Dropped {} closed profile subscriber(s)", before - inner.listeners.len());
        }
        info!("Profiles replaced in namespace '{}' ({} profile(s))", namespace, profiles.len());
        Ok(())
    }

    /// Bind (or unbind with `None`) one control of one profile. An unknown
    /// profile key starts from an empty profile.
    pub fn commit_edit(
        &self,
        profile_key: &str,
        control: ControlKey,
        entry: Option<MappingEntry>,
    ) -> Result<(), StoreError> {
        let current = self.profiles();
        let profile = current.get(profile_key).cloned().unwrap_or_else(|| {
            debug!("Creating profile '{}' on first edit", profile_key);
            Profile::default()
        });

        match &entry {
            Some(entry) => info!("Edit '{}': {} -> {}", profile_key, control, entry.label()),
            None => info!("Edit '{}': {} unbound", profile_key, control),
        }

        let next = current.with_profile(profile_key, profile.with_entry(control, entry));
        self.replace(next).map_err(|e| {
            warn!("Rejected edit of '{}' {}: {}", profile_key, control, e);
            e
        })
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl ProfileSource for ProfileStore {
    fn profiles(&self) -> ProfileSet {
        self.lock().active()
    }

    fn subscribe(&mut self) -> Receiver<ProfileSet> {
        let (tx, rx) = unbounded();
        self.lock().listeners.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::control::Sign;
    use crate::mapping::profile::WILDCARD;

    #[test]
    fn replace_notifies_subscribers() {
        let mut store = ProfileStore::new("global");
        let rx = store.subscribe();

        store.replace(ProfileSet::builtin()).unwrap();

        assert_eq!(rx.try_recv().unwrap(), ProfileSet::builtin());
        assert_eq!(store.profiles(), ProfileSet::builtin());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut store = ProfileStore::new("global");
        let rx = store.subscribe();
        let _kept = store.subscribe();
        drop(rx);

        store.replace(ProfileSet::builtin()).unwrap();
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn invalid_replacement_is_rejected() {
        let mut store = ProfileStore::with_profiles("global", ProfileSet::builtin());
        let rx = store.subscribe();
        let bad = ProfileSet::new().with_profile(WILDCARD, Profile::default().with_threshold(0.0));

        assert!(matches!(store.replace(bad), Err(StoreError::Invalid(_))));
        assert!(rx.try_recv().is_err());
        assert_eq!(store.profiles(), ProfileSet::builtin());
    }

    #[test]
    fn commit_edit_builds_a_new_profile() {
        let mut store = ProfileStore::with_profiles("global", ProfileSet::builtin());
        let before = store.profiles();
        let rx = store.subscribe();

        store
            .commit_edit(WILDCARD, ControlKey::Axis(0, Sign::Positive), Some(MappingEntry::key("ArrowRight")))
            .unwrap();

        let after = rx.try_recv().unwrap();
        let profile = after.get(WILDCARD).unwrap();
        assert!(profile.entry(ControlKey::Button(0)).is_some());
        assert_eq!(
            profile.entry(ControlKey::Axis(0, Sign::Positive)).and_then(|e| e.code.clone()),
            Some("ArrowRight".to_string())
        );
        // The earlier value is untouched
        assert!(before.get(WILDCARD).unwrap().entry(ControlKey::Axis(0, Sign::Positive)).is_none());
    }

    #[test]
    fn commit_edit_can_unbind_and_create() {
        let store = ProfileStore::with_profiles("global", ProfileSet::builtin());

        store.commit_edit(WILDCARD, ControlKey::Button(0), None).unwrap();
        assert!(store.profiles().get(WILDCARD).unwrap().entry(ControlKey::Button(0)).is_none());

        store.commit_edit("Xbox", ControlKey::Button(1), Some(MappingEntry::mouse(0))).unwrap();
        assert!(store.profiles().get("Xbox").is_some());
    }

    #[test]
    fn namespaces_are_isolated() {
        let dir = std::env::temp_dir().join(format!("padmap-store-ns-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("profiles.json");

        let desk = ProfileStore::load(&path, "desk", ProfileSet::builtin()).unwrap();
        desk.commit_edit(WILDCARD, ControlKey::Button(3), Some(MappingEntry::key("KeyE"))).unwrap();

        let couch = ProfileStore::load(&path, "couch", ProfileSet::new()).unwrap();
        assert!(couch.profiles().is_empty());

        let reloaded = ProfileStore::load(&path, "desk", ProfileSet::new()).unwrap();
        assert!(reloaded.profiles().get(WILDCARD).unwrap().entry(ControlKey::Button(3)).is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_save_leaves_profiles_untouched() {
        let dir = std::env::temp_dir().join(format!("padmap-store-unwritable-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        // A directory where the file should be makes every write fail
        let path = dir.join("profiles.json");
        std::fs::create_dir_all(&path).unwrap();

        let mut store = ProfileStore::with_profiles("global", ProfileSet::builtin());
        store.lock().path = Some(path);
        let rx = store.subscribe();

        let result = store.commit_edit(WILDCARD, ControlKey::Button(3), Some(MappingEntry::key("KeyE")));

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(rx.try_recv().is_err());
        assert!(store.profiles().get(WILDCARD).unwrap().entry(ControlKey::Button(3)).is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn fixed_set_never_notifies() {
        let mut set = ProfileSet::builtin();
        let rx = set.subscribe();
        assert!(rx.try_recv().is_err());
        assert_eq!(set.profiles(), ProfileSet::builtin());
    }
}
