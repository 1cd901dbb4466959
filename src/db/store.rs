// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key-value store for persisted application state.
//!
//! Values are opaque strings. The on-disk backend keeps one file per key
//! inside a data directory; the mock backend lives in memory and is
//! shared between clones so tests can inspect what was written.

use crate::error::AppError;
use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone)]
enum Backend {
    Directory(PathBuf),
    Memory(Arc<DashMap<String, String>>),
}

/// String key-value store.
#[derive(Clone)]
pub struct LocalStore {
    backend: Backend,
}

impl LocalStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, AppError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        tracing::info!(path = %dir.display(), "Opened local store");

        Ok(Self {
            backend: Backend::Directory(dir),
        })
    }

    /// Create an in-memory store for testing.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Read a value. Missing keys are `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        match &self.backend {
            Backend::Memory(map) => Ok(map.get(key).map(|v| v.value().clone())),
            Backend::Directory(dir) => {
                let path = key_path(dir, key)?;
                match fs::read_to_string(&path) {
                    Ok(value) => Ok(Some(value)),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(AppError::Storage(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    ))),
                }
            }
        }
    }

    /// Overwrite a value.
    ///
    /// On disk the new value is written to a sibling temp file and renamed
    /// over the old one, so readers never see a half-written value.
    pub fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(map) => {
                map.insert(key.to_string(), value.to_string());
                Ok(())
            }
            Backend::Directory(dir) => {
                let path = key_path(dir, key)?;
                let tmp = path.with_extension("json.tmp");
                fs::write(&tmp, value)
                    .and_then(|_| fs::rename(&tmp, &path))
                    .map_err(|e| {
                        AppError::Storage(format!("Failed to write {}: {}", path.display(), e))
                    })
            }
        }
    }
}

/// Map a key to its file, refusing anything that could escape the directory.
fn key_path(dir: &Path, key: &str) -> Result<PathBuf, AppError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(AppError::Storage(format!("Invalid storage key '{}'", key)));
    }
    Ok(dir.join(format!("{}.json", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_store_shared_between_clones() {
        let store = LocalStore::new_mock();
        let clone = store.clone();

        store.set("portals", "[]").unwrap();
        assert_eq!(clone.get("portals").unwrap().as_deref(), Some("[]"));
        assert_eq!(clone.get("missing").unwrap(), None);
    }

    #[test]
    fn test_directory_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();

        assert_eq!(store.get("portals").unwrap(), None);
        store.set("portals", r#"[{"guid":"a"}]"#).unwrap();
        store.set("portals", "[]").unwrap();

        let reopened = LocalStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("portals").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        assert!(store.set("../escape", "x").is_err());
    }
}
