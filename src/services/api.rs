// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community Streak API client.
//!
//! Thin typed wrappers over [`RequestClient`]; every authenticated call goes
//! through the shared refresh path.

use crate::error::{ApiError, Result};
use crate::models::{
    EventDetail, EventView, MessageResponse, NewEvent, SignupRequest, TokenResponse, UserProfile,
};
use crate::services::guard::SessionGuard;
use crate::services::request::{ApiRequest, RequestClient};
use crate::store::{keys, KeyValueStore};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use std::sync::Arc;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub profile: UserProfile,
    /// Route restored by the session guard
    pub destination: String,
}

/// `POST /events` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedEvent {
    pub message: String,
    pub event: EventView,
}

#[derive(Clone)]
pub struct StreakApi {
    client: RequestClient,
    store: Arc<dyn KeyValueStore>,
    guard: Arc<SessionGuard>,
    top_x: u32,
}

impl StreakApi {
    pub fn new(
        client: RequestClient,
        store: Arc<dyn KeyValueStore>,
        guard: Arc<SessionGuard>,
        top_x: u32,
    ) -> Self {
        Self {
            client,
            store,
            guard,
            top_x,
        }
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    pub fn guard(&self) -> &Arc<SessionGuard> {
        &self.guard
    }

    // ─── Account ─────────────────────────────────────────────────────────────

    pub async fn signup(&self, request: &SignupRequest) -> Result<MessageResponse> {
        let body = serde_json::to_value(request)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to encode signup: {}", e)))?;
        self.client
            .send_json(&ApiRequest::post("/users/signup").json(body).anonymous())
            .await
    }

    /// Log in, store the session and profile, then restore the pending route.
    ///
    /// The backend expects the password field base64-encoded.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let encoded = BASE64.encode(password);
        let response: TokenResponse = self
            .client
            .send_json(
                &ApiRequest::post("/users/login")
                    .form(&[("username", username), ("password", encoded.as_str())])
                    .anonymous(),
            )
            .await?;

        let session = response
            .into_session(None)
            .ok_or_else(|| ApiError::Decode("login response without refresh token".to_string()))?;
        self.client.session().tokens().set(session).await?;

        match self.complete_login().await {
            Ok(outcome) => {
                tracing::info!(user_id = outcome.profile.id, username = %outcome.profile.username, "Logged in");
                Ok(outcome)
            }
            Err(e) => {
                // A login that reports failure must not leave a usable session behind.
                tracing::warn!(error = %e, "Login incomplete, discarding session");
                if let Err(clear_err) = self.client.session().tokens().clear().await {
                    tracing::error!(error = %clear_err, "Failed to clear persisted session");
                }
                Err(e)
            }
        }
    }

    async fn complete_login(&self) -> Result<LoginOutcome> {
        let profile = self.me().await?;
        let cached = serde_json::to_string(&profile)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to encode profile: {}", e)))?;
        self.store.set(keys::USER, &cached)?;

        let destination = self.guard.on_login_succeeded()?;
        Ok(LoginOutcome {
            profile,
            destination,
        })
    }

    /// Drop the session, cached profile and pending destination.
    pub async fn logout(&self) -> Result<()> {
        self.client.session().tokens().clear().await?;
        self.store.remove(keys::USER)?;
        self.guard.on_logout()?;
        tracing::info!("Logged out");
        Ok(())
    }

    pub async fn me(&self) -> Result<UserProfile> {
        self.client.send_json(&ApiRequest::get("/users/me")).await
    }

    /// Profile cached by the last login, if any.
    pub fn cached_user(&self) -> Result<Option<UserProfile>> {
        match self.store.get(keys::USER)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| ApiError::Storage(format!("corrupt cached profile: {}", e))),
            None => Ok(None),
        }
    }

    pub async fn user_events(&self, user_id: u64) -> Result<Vec<EventView>> {
        self.client
            .send_json(&ApiRequest::get(format!("/users/{}/events", user_id)))
            .await
    }

    // ─── Events ──────────────────────────────────────────────────────────────

    pub async fn events(&self, flags: Option<&str>) -> Result<Vec<EventView>> {
        let mut request = ApiRequest::get("/events");
        if let Some(flags) = flags {
            request = request.query("flags", flags);
        }
        self.client.send_json(&request).await
    }

    pub async fn created_events(&self) -> Result<Vec<EventView>> {
        self.client.send_json(&ApiRequest::get("/events/myevents")).await
    }

    pub async fn joined_events(&self) -> Result<Vec<EventView>> {
        self.client
            .send_json(&ApiRequest::get("/events/joinedevents"))
            .await
    }

    /// Event detail with the requesting user's membership.
    ///
    /// The backend answers an unknown id with `200 {"error": ...}`; that is
    /// reported as a 404 validation error.
    pub async fn event_detail(&self, event_id: u64, top_x: Option<u32>) -> Result<EventDetail> {
        let request = ApiRequest::get(format!("/events/{}", event_id))
            .query("top_x", top_x.unwrap_or(self.top_x));
        let value: serde_json::Value = self.client.send_json(&request).await?;

        if let Some(error) = value.get("error").and_then(|e| e.as_str()) {
            return Err(ApiError::Validation {
                status: 404,
                message: error.to_string(),
            });
        }

        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("event {}: {}", event_id, e)))
    }

    pub async fn create_event(&self, event: &NewEvent) -> Result<CreatedEvent> {
        let request = ApiRequest::post("/events")
            .query("name", &event.name)
            .query("description", &event.description)
            .query("is_private", event.is_private);
        self.client.send_json(&request).await
    }

    pub async fn join_event(&self, event_id: u64, user_id: u64) -> Result<MessageResponse> {
        self.client
            .send_json(&ApiRequest::post(format!("/events/{}/join", event_id)).query("user_id", user_id))
            .await
    }

    pub async fn exit_event(&self, event_id: u64, user_id: u64) -> Result<MessageResponse> {
        self.client
            .send_json(&ApiRequest::post(format!("/events/{}/exit", event_id)).query("user_id", user_id))
            .await
    }

    pub async fn mark_completed(&self, event_id: u64) -> Result<MessageResponse> {
        self.client
            .send_json(&ApiRequest::post(format!("/events/{}/mark-completed", event_id)))
            .await
    }
}
