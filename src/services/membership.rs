// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event membership state machine.
//!
//! ```text
//! NotMember --join--> Member --mark_complete--> MemberCompletedToday
//!     ^                  |                              |
//!     +------exit--------+------------exit--------------+
//! ```
//!
//! Status is never advanced locally: every successful action is followed by
//! a fresh `GET /events/{id}` and the status is derived from that payload.
//! The one local change is discarding the user's streak right after an exit,
//! so a stale non-zero streak is never reported for someone who left.

use crate::error::{ApiError, Result};
use crate::models::{EventDetail, MembershipStatus, Participant};
use crate::services::api::StreakApi;

/// Membership of one user in one event.
pub struct EventMembershipController {
    api: StreakApi,
    event_id: u64,
    user_id: u64,
    detail: EventDetail,
}

impl EventMembershipController {
    /// Fetch the event so the controller always starts from server state.
    pub async fn load(api: StreakApi, event_id: u64, user_id: u64) -> Result<Self> {
        let detail = api.event_detail(event_id, None).await?;
        tracing::debug!(event_id, user_id, status = ?detail.membership(), "Loaded membership");
        Ok(Self {
            api,
            event_id,
            user_id,
            detail,
        })
    }

    /// Re-fetch the event. On failure the previous state is kept.
    pub async fn refresh(&mut self) -> Result<MembershipStatus> {
        let detail = self.api.event_detail(self.event_id, None).await?;
        let previous = self.detail.membership();
        self.detail = detail;

        let status = self.detail.membership();
        if status != previous {
            tracing::info!(
                event_id = self.event_id,
                user_id = self.user_id,
                from = ?previous,
                to = ?status,
                "Membership changed"
            );
        }
        Ok(status)
    }

    pub async fn join(&mut self) -> Result<MembershipStatus> {
        if self.status().is_member() {
            return Err(ApiError::AlreadyMember);
        }

        self.api.join_event(self.event_id, self.user_id).await?;
        self.refresh().await
    }

    pub async fn exit(&mut self) -> Result<MembershipStatus> {
        if !self.status().is_member() {
            return Err(ApiError::NotMember);
        }

        self.api.exit_event(self.event_id, self.user_id).await?;
        // The server has reset the streak; don't keep showing the old one
        // even if the re-fetch below fails.
        self.detail.forget_streak(self.user_id);
        self.refresh().await
    }

    pub async fn mark_complete(&mut self) -> Result<MembershipStatus> {
        match self.status() {
            MembershipStatus::NotMember => return Err(ApiError::NotMember),
            MembershipStatus::MemberCompletedToday => return Err(ApiError::AlreadyCompleted),
            MembershipStatus::Member => {}
        }

        match self.api.mark_completed(self.event_id).await {
            Ok(_) => {}
            Err(ApiError::Validation { status: 400, message })
                if message.to_ascii_lowercase().contains("already") =>
            {
                tracing::debug!(event_id = self.event_id, %message, "Completion already recorded");
                // Pick up the server's view so the next call is rejected locally.
                if let Err(e) = self.refresh().await {
                    tracing::debug!(error = %e, "Re-fetch after duplicate completion failed");
                }
                return Err(ApiError::AlreadyCompleted);
            }
            Err(e) => return Err(e),
        }

        self.refresh().await
    }

    pub fn status(&self) -> MembershipStatus {
        self.detail.membership()
    }

    pub fn detail(&self) -> &EventDetail {
        &self.detail
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    /// The user's streak as last reported by the server; 0 when not a member.
    pub fn streak_count(&self) -> u32 {
        if !self.status().is_member() {
            return 0;
        }
        self.detail.user_details.streak_count.unwrap_or(0)
    }

    pub fn rank(&self) -> Option<u32> {
        self.detail.user_details.rank.filter(|r| *r > 0)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.detail.top_users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::Session;
    use crate::services::guard::RecordingNavigator;
    use crate::store::MemoryStore;
    use crate::StreakClient;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> StreakClient {
        let config = Config::test_default(&server.uri());
        let client = StreakClient::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingNavigator::default()),
        )
        .unwrap();
        client
            .session()
            .tokens()
            .set(Session::new("a1", "r1"))
            .await
            .unwrap();
        client
    }

    fn detail(status: &str, streak: Option<u32>, eligible: Option<bool>) -> serde_json::Value {
        let mut top_users = Vec::new();
        if let Some(streak) = streak {
            top_users.push(json!({"userid": 3, "username": "ana", "streak_count": streak}));
        }
        json!({
            "event_id": 7,
            "name": "Morning run",
            "description": "5k before work",
            "created_by": 1,
            "top_users": top_users,
            "user_details": {
                "status": status,
                "streak_count": streak,
                "rank": streak.map(|_| 1),
                "request_update_streak": eligible
            },
            "user_counts": top_users.len()
        })
    }

    async fn mount_detail(server: &MockServer, body: serde_json::Value) {
        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/events/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_join_then_already_member() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        mount_detail(&server, detail("Not part of the event", None, None)).await;
        let mut controller = client.membership(7, 3).await.unwrap();
        assert_eq!(controller.status(), MembershipStatus::NotMember);

        mount_detail(&server, detail("Part of the event", Some(0), Some(true))).await;
        Mock::given(method("POST"))
            .and(path("/events/7/join"))
            .and(query_param("user_id", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Joined event"})))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(controller.join().await.unwrap(), MembershipStatus::Member);
        assert!(matches!(controller.join().await, Err(ApiError::AlreadyMember)));
    }

    #[tokio::test]
    async fn test_exit_never_reports_old_streak() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        mount_detail(&server, detail("Part of the event", Some(12), Some(true))).await;
        let mut controller = client.membership(7, 3).await.unwrap();
        assert_eq!(controller.streak_count(), 12);

        // Exit succeeds but the follow-up fetch fails.
        server.reset().await;
        Mock::given(method("POST"))
            .and(path("/events/7/exit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Exited event"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/events/7"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(matches!(controller.exit().await, Err(ApiError::Transient { .. })));
        assert_eq!(controller.detail().user_details.streak_count, None);
        assert!(controller.participants().iter().all(|p| p.user_id != 3));
        assert_eq!(controller.streak_count(), 0);
    }

    #[tokio::test]
    async fn test_exit_when_not_member_is_local() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        mount_detail(&server, detail("Not part of the event", None, None)).await;
        let mut controller = client.membership(7, 3).await.unwrap();

        Mock::given(method("POST"))
            .and(path("/events/7/exit"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(matches!(controller.exit().await, Err(ApiError::NotMember)));
    }

    #[tokio::test]
    async fn test_second_completion_is_rejected_locally() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        mount_detail(&server, detail("Part of the event", Some(4), Some(true))).await;
        let mut controller = client.membership(7, 3).await.unwrap();

        mount_detail(&server, detail("Part of the event", Some(5), Some(false))).await;
        Mock::given(method("POST"))
            .and(path("/events/7/mark-completed"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Streak updated successfully"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(
            controller.mark_complete().await.unwrap(),
            MembershipStatus::MemberCompletedToday
        );
        assert_eq!(controller.streak_count(), 5);
        assert!(matches!(controller.mark_complete().await, Err(ApiError::AlreadyCompleted)));
    }

    #[tokio::test]
    async fn test_server_side_duplicate_completion() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        mount_detail(&server, detail("Part of the event", Some(4), Some(true))).await;
        let mut controller = client.membership(7, 3).await.unwrap();

        Mock::given(method("POST"))
            .and(path("/events/7/mark-completed"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Streak already updated for today"})),
            )
            .mount(&server)
            .await;

        assert!(matches!(controller.mark_complete().await, Err(ApiError::AlreadyCompleted)));
    }

    #[tokio::test]
    async fn test_failed_join_leaves_status() {
        let server = MockServer::start().await;
        let client = client(&server).await;

        mount_detail(&server, detail("Not part of the event", None, None)).await;
        let mut controller = client.membership(7, 3).await.unwrap();

        Mock::given(method("POST"))
            .and(path("/events/7/join"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(controller.join().await.is_err());
        assert_eq!(controller.status(), MembershipStatus::NotMember);
    }
}
