// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login redirect and post-login restoration.

use crate::error::ApiError;
use crate::store::{keys, KeyValueStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Routes that are never remembered as a post-login destination.
const AUTH_ROUTES: &[&str] = &["/login", "/register"];

/// Moves the (out-of-scope) view layer to a route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

impl Navigator for mpsc::UnboundedSender<String> {
    fn navigate(&self, path: &str) {
        if self.send(path.to_string()).is_err() {
            tracing::debug!(path, "Navigation receiver dropped");
        }
    }
}

/// Navigator that only remembers where it was sent. Used by headless clients.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(path.to_string());
        }
    }
}

/// Decides where the user goes when the session is lost or restored.
pub struct SessionGuard {
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    home_path: String,
    login_path: String,
    location: Mutex<String>,
    /// Set from the first `on_session_lost` until the next successful login.
    redirected: AtomicBool,
}

impl SessionGuard {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        home_path: &str,
        login_path: &str,
    ) -> Self {
        Self {
            store,
            navigator,
            home_path: home_path.to_string(),
            login_path: login_path.to_string(),
            location: Mutex::new(home_path.to_string()),
            redirected: AtomicBool::new(false),
        }
    }

    /// Report the route the user is currently on.
    pub fn record_location(&self, path: &str) {
        if let Ok(mut location) = self.location.lock() {
            *location = path.to_string();
        }
    }

    pub fn current_location(&self) -> String {
        self.location
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|_| self.home_path.clone())
    }

    /// Session is gone; remember the current route and go to login.
    pub fn session_lost(&self) -> Result<(), ApiError> {
        let location = self.current_location();
        self.on_session_lost(&location)
    }

    /// Remember `intended_path` and navigate to login.
    ///
    /// First writer wins until the next successful login: repeated calls
    /// neither overwrite the stored destination nor navigate again.
    pub fn on_session_lost(&self, intended_path: &str) -> Result<(), ApiError> {
        if self.redirected.swap(true, Ordering::SeqCst) {
            tracing::debug!(intended_path, "Already redirected to login");
            return Ok(());
        }

        let persisted = self.remember(intended_path);

        tracing::info!(intended_path, "Session lost, redirecting to login");
        self.navigator.navigate(&self.login_path);
        persisted
    }

    fn remember(&self, intended_path: &str) -> Result<(), ApiError> {
        if AUTH_ROUTES.contains(&intended_path) {
            return Ok(());
        }
        // A destination left over from an unfinished login is still the one to restore.
        if self.store.get(keys::REDIRECT_PATH)?.is_some() {
            return Ok(());
        }
        self.store.set(keys::REDIRECT_PATH, intended_path)
    }

    /// Navigate to the remembered destination (or home) and forget it.
    pub fn on_login_succeeded(&self) -> Result<String, ApiError> {
        let destination = self
            .store
            .get(keys::REDIRECT_PATH)?
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.home_path.clone());

        self.store.remove(keys::REDIRECT_PATH)?;
        self.redirected.store(false, Ordering::SeqCst);

        self.record_location(&destination);
        self.navigator.navigate(&destination);
        Ok(destination)
    }

    /// Explicit logout: drop any pending destination and show login.
    pub fn on_logout(&self) -> Result<(), ApiError> {
        self.store.remove(keys::REDIRECT_PATH)?;
        self.redirected.store(false, Ordering::SeqCst);
        self.record_location(&self.login_path);
        self.navigator.navigate(&self.login_path);
        Ok(())
    }
}
