// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-local key/value persistence.
//!
//! Holds the session tokens, the cached profile, the pending post-login
//! destination and the recent notifications.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::ApiError;

/// Key names as constants.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    /// Serialized `UserProfile`
    pub const USER: &str = "user";
    /// Route to restore after the next successful login
    pub const REDIRECT_PATH: &str = "redirect_path";
    /// JSON array of recent notification strings
    pub const NOTIFICATIONS: &str = "notifications";
}

/// Persistence medium behind the token store and session guard.
///
/// `set_many` and `remove_many` apply all entries or none.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ApiError>;

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ApiError>;

    fn remove_many(&self, keys: &[&str]) -> Result<(), ApiError>;

    fn set(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<(), ApiError> {
        self.remove_many(&[key])
    }
}
