// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-flight session refresh.
//!
//! Refresh tokens rotate, so two concurrent refresh calls would race to
//! overwrite the token store and invalidate each other. The coordinator
//! makes sure one episode runs at a time:
//!
//! 1. The first caller to report a 401 while `Idle` becomes the leader and
//!    spawns the episode (exactly one refresh call).
//! 2. Callers arriving while `Refreshing` queue a completion handle and wait.
//! 3. On success the new session is stored *before* the state returns to
//!    `Idle`, then every waiter gets it.
//! 4. On failure the store is cleared, the session guard runs once, and every
//!    waiter gets `SessionExpired`.
//!
//! The episode runs on its own task with a bounded timeout, so a dropped
//! leader or a hung refresh call can never leave waiters stranded.

use crate::error::{ApiError, Result};
use crate::models::{Session, TokenResponse};
use crate::services::guard::SessionGuard;
use crate::services::request::{check_status, read_body};
use crate::services::token_store::TokenStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};

/// Exchanges a refresh token for new credentials.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse>;
}

/// `POST /users/token/refresh?refresh_token=...`
pub struct HttpTokenRefresher {
    http: reqwest::Client,
    url: String,
}

impl HttpTokenRefresher {
    pub fn new(http: reqwest::Client, api_url: &str) -> Self {
        Self {
            http,
            url: format!("{}/users/token/refresh", api_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.url)
            .query(&[("refresh_token", refresh_token)])
            .send()
            .await?;

        let (status, body) = read_body(response).await?;
        check_status(status, body, false)?.json()
    }
}

/// Observable coordinator phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
}

/// Waiter handle; `None` means the episode failed.
type Waiter = oneshot::Sender<Option<Session>>;

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<Waiter> },
}

struct Inner {
    state: Mutex<RefreshState>,
    tokens: TokenStore,
    refresher: Arc<dyn TokenRefresher>,
    guard: Arc<SessionGuard>,
    timeout: Duration,
    refresh_calls: AtomicU64,
}

#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        tokens: TokenStore,
        refresher: Arc<dyn TokenRefresher>,
        guard: Arc<SessionGuard>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RefreshState::Idle),
                tokens,
                refresher,
                guard,
                timeout,
                refresh_calls: AtomicU64::new(0),
            }),
        }
    }

    /// Obtain a session newer than `stale_access_token`.
    ///
    /// Called after a request carrying `stale_access_token` got a 401.
    pub async fn recover(&self, stale_access_token: &str) -> Result<Session> {
        let receiver = {
            let mut state = self.inner.state.lock().await;
            let (tx, rx) = oneshot::channel();

            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    tracing::debug!(queued = waiters.len() + 1, "Refresh in flight, queueing request");
                    waiters.push(tx);
                }
                RefreshState::Idle => {
                    let current = match self.inner.tokens.get().await {
                        Some(session) => session,
                        // Torn down by an earlier episode; the guard already ran.
                        None => return Err(ApiError::SessionExpired),
                    };

                    if current.access_token() != stale_access_token {
                        tracing::debug!("Session already refreshed, retrying with current token");
                        return Ok(current);
                    }

                    tracing::info!("Access token rejected, refreshing session");
                    *state = RefreshState::Refreshing { waiters: vec![tx] };
                    self.inner.refresh_calls.fetch_add(1, Ordering::SeqCst);

                    let inner = self.inner.clone();
                    let refresh_token = current.refresh_token().to_string();
                    tokio::spawn(async move { run_episode(inner, refresh_token).await });
                }
            }
            rx
        };

        match receiver.await {
            Ok(Some(session)) => Ok(session),
            _ => Err(ApiError::SessionExpired),
        }
    }

    pub async fn phase(&self) -> RefreshPhase {
        match &*self.inner.state.lock().await {
            RefreshState::Idle => RefreshPhase::Idle,
            RefreshState::Refreshing { .. } => RefreshPhase::Refreshing,
        }
    }

    /// Number of refresh calls started since creation.
    pub fn refresh_count(&self) -> u64 {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }
}

async fn run_episode(inner: Arc<Inner>, refresh_token: String) {
    let outcome = match tokio::time::timeout(inner.timeout, inner.refresher.refresh(&refresh_token)).await {
        Ok(Ok(response)) => response
            .into_session(Some(&refresh_token))
            .ok_or_else(|| ApiError::Decode("refresh response without tokens".to_string())),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(ApiError::Timeout("token refresh")),
    };

    let outcome = match outcome {
        Ok(session) => inner.tokens.set(session.clone()).await.map(|()| session),
        Err(e) => Err(e),
    };

    if let Err(e) = &outcome {
        tracing::warn!(error = %e, "Session refresh failed, clearing session");
        if let Err(clear_err) = inner.tokens.clear().await {
            tracing::error!(error = %clear_err, "Failed to clear persisted session");
        }
    }

    let waiters = {
        let mut state = inner.state.lock().await;
        match std::mem::replace(&mut *state, RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        }
    };

    match outcome {
        Ok(session) => {
            tracing::info!(waiters = waiters.len(), "Session refreshed");
            for waiter in waiters {
                // A waiter that gave up has dropped its receiver; nothing to deliver.
                let _ = waiter.send(Some(session.clone()));
            }
        }
        Err(_) => {
            if let Err(e) = inner.guard.session_lost() {
                tracing::error!(error = %e, "Failed to record post-login destination");
            }
            for waiter in waiters {
                let _ = waiter.send(None);
            }
        }
    }
}
