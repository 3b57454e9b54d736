// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable holder of the current session.
//!
//! Both tokens are written under one write lock and one `set_many` call, so
//! no reader ever observes a new access token paired with an old refresh
//! token (or the reverse).

use crate::error::ApiError;
use crate::models::Session;
use crate::store::{keys, KeyValueStore};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct TokenStore {
    current: Arc<RwLock<Option<Session>>>,
    backing: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    /// Create an empty token store over `backing` without reading it.
    pub fn new(backing: Arc<dyn KeyValueStore>) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            backing,
        }
    }

    /// Create a token store and restore any session persisted in `backing`.
    ///
    /// A half-present pair (only one of the two keys) counts as no session.
    pub fn load(backing: Arc<dyn KeyValueStore>) -> Result<Self, ApiError> {
        let access = backing.get(keys::ACCESS_TOKEN)?;
        let refresh = backing.get(keys::REFRESH_TOKEN)?;

        let session = match (access, refresh) {
            (Some(access), Some(refresh)) => Some(Session::new(access, refresh)),
            (None, None) => None,
            _ => {
                tracing::warn!("Persisted session is incomplete, ignoring it");
                None
            }
        };

        tracing::debug!(restored = session.is_some(), "Token store loaded");

        Ok(Self {
            current: Arc::new(RwLock::new(session)),
            backing,
        })
    }

    pub async fn get(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// Replace both tokens. On persistence failure the previous session stays.
    ///
    /// The backing store may do blocking file I/O, so writes run on the
    /// blocking pool while the write lock is held.
    pub async fn set(&self, session: Session) -> Result<(), ApiError> {
        let mut current = self.current.write().await;

        let backing = self.backing.clone();
        let access = session.access_token().to_string();
        let refresh = session.refresh_token().to_string();
        persist(move || {
            backing.set_many(&[
                (keys::ACCESS_TOKEN, access.as_str()),
                (keys::REFRESH_TOKEN, refresh.as_str()),
            ])
        })
        .await?;

        *current = Some(session);
        Ok(())
    }

    /// Remove the session. The in-memory copy is dropped even if persistence fails,
    /// so a torn-down session is never reused by this process.
    pub async fn clear(&self) -> Result<(), ApiError> {
        let mut current = self.current.write().await;
        *current = None;

        let backing = self.backing.clone();
        persist(move || backing.remove_many(&[keys::ACCESS_TOKEN, keys::REFRESH_TOKEN])).await
    }
}

async fn persist<F>(write: F) -> Result<(), ApiError>
where
    F: FnOnce() -> Result<(), ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(write)
        .await
        .map_err(|e| ApiError::Storage(format!("session write task failed: {}", e)))?
}
