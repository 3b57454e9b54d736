// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use serde_json::json;
use std::sync::Arc;
use streak_client::config::Config;
use streak_client::models::Session;
use streak_client::services::RecordingNavigator;
use streak_client::store::MemoryStore;
use streak_client::StreakClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client pointed at `server` with an in-memory store.
/// Returns the client, its store and the navigator that records redirects.
#[allow(dead_code)]
pub fn create_test_client(server: &MockServer) -> (StreakClient, Arc<MemoryStore>, Arc<RecordingNavigator>) {
    let store = Arc::new(MemoryStore::new());
    let navigator = Arc::new(RecordingNavigator::default());
    let client = StreakClient::new(
        Config::test_default(&server.uri()),
        store.clone(),
        navigator.clone(),
    )
    .expect("Failed to build test client");
    (client, store, navigator)
}

/// Same as [`create_test_client`], logged in with the given tokens.
#[allow(dead_code)]
pub async fn logged_in_client(
    server: &MockServer,
    access: &str,
    refresh: &str,
) -> (StreakClient, Arc<MemoryStore>, Arc<RecordingNavigator>) {
    let (client, store, navigator) = create_test_client(server);
    client
        .session()
        .tokens()
        .set(Session::new(access, refresh))
        .await
        .expect("Failed to seed session");
    (client, store, navigator)
}

/// FastAPI's response to an expired bearer token.
#[allow(dead_code)]
pub fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({"detail": "Could not validate credentials"}))
}

/// Refresh endpoint exchanging `refresh` for a new pair, expected exactly once.
#[allow(dead_code)]
pub async fn mount_refresh(server: &MockServer, refresh: &str, new_access: &str, new_refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/users/token/refresh"))
        .and(query_param("refresh_token", refresh))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "access_token": new_access,
                    "refresh_token": new_refresh,
                    "token_type": "bearer"
                }))
                .set_delay(std::time::Duration::from_millis(200)),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn event_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{} every day", name),
        "streak_count": 0,
        "top_participants": []
    })
}

#[allow(dead_code)]
pub fn event_detail_json(id: u64, status: &str, streak: Option<u32>) -> serde_json::Value {
    json!({
        "event_id": id,
        "name": "Morning run",
        "description": "5k before work",
        "created_by": 1,
        "is_private": false,
        "top_users": [],
        "user_details": {
            "status": status,
            "streak_count": streak,
            "request_update_streak": true
        },
        "user_counts": 0
    })
}
