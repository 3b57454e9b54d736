// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON-file store.
//!
//! The whole map is rewritten on every mutation through a sibling temp file
//! and a rename, so readers of the file see either the old or the new
//! contents, never a half-written token pair.

use super::KeyValueStore;
use crate::error::ApiError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key/value store persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store, reading existing contents if the file exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ApiError> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                ApiError::Storage(format!("corrupt state file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(ApiError::Storage(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened state file");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the map, persist it, then commit in memory.
    fn mutate<F>(&self, change: F) -> Result<(), ApiError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ApiError::Storage("state file lock poisoned".to_string()))?;

        let mut next = entries.clone();
        change(&mut next);
        self.write_file(&next)?;
        *entries = next;
        Ok(())
    }

    fn write_file(&self, entries: &BTreeMap<String, String>) -> Result<(), ApiError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| ApiError::Storage(format!("failed to serialize state: {}", e)))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .map_err(|e| ApiError::Storage(format!("failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            ApiError::Storage(format!("failed to replace {}: {}", self.path.display(), e))
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ApiError::Storage("state file lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, new_entries: &[(&str, &str)]) -> Result<(), ApiError> {
        self.mutate(|entries| {
            for (key, value) in new_entries {
                entries.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), ApiError> {
        self.mutate(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}
