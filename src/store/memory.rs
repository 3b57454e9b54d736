//! In-process store for tests and short-lived clients.

use super::KeyValueStore;
use crate::error::ApiError;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ApiError::Storage("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, new_entries: &[(&str, &str)]) -> Result<(), ApiError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ApiError::Storage("memory store lock poisoned".to_string()))?;
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), ApiError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ApiError::Storage("memory store lock poisoned".to_string()))?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}
