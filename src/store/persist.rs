//! Profile file on disk
//!
//! Layout: namespace -> controller id (or "any") -> profile. The controller
//! the panel showed last is kept in a small file next to it.

use super::StoreError;
use crate::mapping::profile::ProfileSet;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub type Namespaces = BTreeMap<String, ProfileSet>;

/// Resolve a relative profile file name next to the executable, falling
/// back to the current directory.
pub fn resolve_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return exe_dir.join(path);
        }
    }

    path.to_path_buf()
}

/// Read every namespace from `path`. A missing file is an empty store.
pub fn read(path: &Path) -> Result<Namespaces, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No existing profile file found at: {}", path.display());
            return Ok(Namespaces::new());
        }
        Err(e) => return Err(e.into()),
    };

    let namespaces: Namespaces = serde_json::from_str(&content)?;
    for (namespace, profiles) in &namespaces {
        profiles
            .validate()
            .map_err(|e| StoreError::Invalid(format!("namespace '{}': {}", namespace, e)))?;
    }

    debug!("Loaded {} profile namespace(s) from: {}", namespaces.len(), path.display());
    Ok(namespaces)
}

pub fn write(path: &Path, namespaces: &Namespaces) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(namespaces)?;
    fs::write(path, content)?;

    info!("Saved profiles to: {}", path.display());
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
struct LastUsed {
    controller: String,
}

/// File holding the last controller bound to the panel
pub fn last_used_path(profile_path: &Path) -> PathBuf {
    profile_path.with_file_name("last_used.json")
}

/// Controller id saved by [`write_last_used`]. A missing file is `None`.
pub fn read_last_used(path: &Path) -> Result<Option<String>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let last: LastUsed = serde_json::from_str(&content)?;
    Ok(Some(last.controller))
}

pub fn write_last_used(path: &Path, controller_id: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let last = LastUsed {
        controller: controller_id.to_string(),
    };
    fs::write(path, serde_json::to_string_pretty(&last)?)?;
    debug!("Remembered controller '{}' in {}", controller_id, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::control::{ControlKey, Sign};
    use crate::mapping::profile::{MappingEntry, Profile, WILDCARD};

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("padmap-persist-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("profiles.json")
    }

    #[test]
    fn missing_file_is_empty() {
        let path = scratch_file("missing");
        assert!(read(&path).unwrap().is_empty());
    }

    #[test]
    fn write_then_read_back() {
        let path = scratch_file("write");
        let profile = Profile::default()
            .with_threshold(0.5)
            .with_axis(0, Sign::Positive, MappingEntry::key("ArrowRight"));
        let mut namespaces = Namespaces::new();
        namespaces.insert("global".into(), ProfileSet::new().with_profile(WILDCARD, profile.clone()));

        write(&path, &namespaces).unwrap();
        let loaded = read(&path).unwrap();
        assert_eq!(loaded.get("global").and_then(|set| set.get(WILDCARD)), Some(&profile));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn reads_sparse_array_layout() {
        let path = scratch_file("sparse");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{
                "global": {
                    "any": {
                        "buttons": [{"kind": "key", "code": "Space", "keyCode": 32}, null, {"kind": "mouse", "button": 2}],
                        "axes": {"1": {"kind": "key", "code": "ArrowRight"}},
                        "axesThreshold": 0.5,
                        "disabled": false
                    }
                }
            }"#,
        )
        .unwrap();

        let loaded = read(&path).unwrap();
        let profile = loaded["global"].get(WILDCARD).unwrap();
        assert!(profile.entry(ControlKey::Button(0)).is_some());
        assert!(profile.entry(ControlKey::Button(1)).is_none());
        assert_eq!(profile.entry(ControlKey::Button(2)).and_then(|e| e.button), Some(2));
        assert!(profile.entry(ControlKey::Axis(0, Sign::Positive)).is_some());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = scratch_file("malformed");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read(&path), Err(StoreError::Json(_))));

        fs::write(&path, r#"{"global": {"any": {"axesThreshold": 2.0}}}"#).unwrap();
        assert!(matches!(read(&path), Err(StoreError::Invalid(_))));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn absolute_paths_are_kept() {
        let path = std::env::temp_dir().join("profiles.json");
        assert_eq!(resolve_path(&path), path);
    }

    #[test]
    fn last_used_survives_a_restart() {
        let path = last_used_path(&scratch_file("last-used"));
        assert_eq!(read_last_used(&path).unwrap(), None);

        write_last_used(&path, "Xbox Wireless Controller").unwrap();
        assert_eq!(read_last_used(&path).unwrap().as_deref(), Some("Xbox Wireless Controller"));

        write_last_used(&path, "DualSense").unwrap();
        assert_eq!(read_last_used(&path).unwrap().as_deref(), Some("DualSense"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
