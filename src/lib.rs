// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Streak-Client: session-aware client for the Community Streak API
//!
//! This crate keeps a bearer session alive across concurrent requests
//! (single-flight refresh, one retry per request), sends the user back to
//! login when the session is gone, and drives event membership.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

use config::Config;
use error::{ApiError, Result};
use services::{
    EventMembershipController, HttpTokenRefresher, Navigator, NotificationFeed, NotificationLog,
    RequestClient, SessionGuard, SessionManager, StreakApi, TokenStore,
};
use std::sync::Arc;
use store::KeyValueStore;

/// Shared client state. Clone is cheap; all clones share one session.
#[derive(Clone)]
pub struct StreakClient {
    config: Config,
    store: Arc<dyn KeyValueStore>,
    session: SessionManager,
    guard: Arc<SessionGuard>,
    api: StreakApi,
    notifications: NotificationLog,
}

impl StreakClient {
    /// Build a client over `store`, restoring any persisted session.
    pub fn new(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        let tokens = TokenStore::load(store.clone())?;
        let guard = Arc::new(SessionGuard::new(
            store.clone(),
            navigator,
            &config.home_path,
            &config.login_path,
        ));
        let refresher = Arc::new(HttpTokenRefresher::new(http.clone(), &config.api_url));
        let session = SessionManager::new(tokens, refresher, guard.clone(), config.refresh_timeout);

        let client = RequestClient::new(http, &config.api_url, session.clone());
        let api = StreakApi::new(client, store.clone(), guard.clone(), config.top_x);
        let notifications = NotificationLog::new(store.clone());

        Ok(Self {
            config,
            store,
            session,
            guard,
            api,
            notifications,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn guard(&self) -> &Arc<SessionGuard> {
        &self.guard
    }

    pub fn api(&self) -> &StreakApi {
        &self.api
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    /// Load the membership controller for `user_id` in `event_id`.
    pub async fn membership(&self, event_id: u64, user_id: u64) -> Result<EventMembershipController> {
        EventMembershipController::load(self.api.clone(), event_id, user_id).await
    }

    /// Open the motivation feed at the configured WebSocket URL.
    pub async fn notification_feed(&self) -> Result<NotificationFeed> {
        NotificationFeed::connect(&self.config.ws_url).await
    }
}
