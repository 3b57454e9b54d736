//! Event projections returned by the API.
//!
//! These are read-only views; the client only interprets the fields that
//! drive membership status and the leaderboard.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// `user_details.status` value the server uses for members.
pub const MEMBER_STATUS: &str = "Part of the event";

/// Event as listed by `/events`, `/events/joinedevents`, `/users/{id}/events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventView {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Streak of the requesting user (0 when absent from the payload)
    #[serde(default)]
    pub streak_count: u32,
    /// Leaderboard, highest streak first
    #[serde(default, alias = "top_users")]
    pub top_participants: Vec<Participant>,
    #[serde(default)]
    pub created_by: Option<u64>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Free-form display properties set by the event creator
    #[serde(default)]
    pub props: Option<serde_json::Value>,
    /// Whether today's completion is already recorded (user events only)
    #[serde(default)]
    pub completed: Option<bool>,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "userid", alias = "user_id")]
    pub user_id: u64,
    pub username: String,
    pub streak_count: u32,
}

/// Full `GET /events/{id}` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    #[serde(alias = "id")]
    pub event_id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub created_by: Option<u64>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub top_users: Vec<Participant>,
    pub user_details: UserDetails,
    #[serde(default)]
    pub user_counts: Option<u32>,
}

impl EventDetail {
    /// Current membership status, derived from this payload only.
    pub fn membership(&self) -> MembershipStatus {
        MembershipStatus::from_details(&self.user_details)
    }

    /// Drop every cached streak value for `user_id`.
    ///
    /// Used right after a confirmed exit: the server has reset the streak
    /// and nothing non-zero may be shown for that user until the next fetch.
    pub fn forget_streak(&mut self, user_id: u64) {
        self.user_details.streak_count = None;
        self.user_details.rank = None;
        self.top_users.retain(|p| p.user_id != user_id);
    }
}

/// Requesting user's relation to the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    pub status: String,
    #[serde(default)]
    pub streak_count: Option<u32>,
    /// 1-based position in `top_users`, 0 when outside the leaderboard
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub last_modified: Option<String>,
    /// Server's eligibility flag for mark-complete
    #[serde(default)]
    pub request_update_streak: Option<bool>,
}

impl UserDetails {
    pub fn is_member(&self) -> bool {
        self.status == MEMBER_STATUS
    }

    /// Date of the last recorded completion, if the server sent one.
    pub fn last_completed_on(&self) -> Option<NaiveDate> {
        let raw = self.last_modified.as_deref()?;
        chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc).date_naive())
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
            .ok()
    }

    /// Whether mark-complete is allowed.
    ///
    /// Uses the server flag; when it is missing, falls back to the same rule
    /// the server applies (no completion recorded today, UTC).
    pub fn can_complete_today(&self) -> bool {
        match self.request_update_streak {
            Some(flag) => flag,
            None => self.last_completed_on() != Some(Utc::now().date_naive()),
        }
    }
}

/// Membership of one user in one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    NotMember,
    Member,
    MemberCompletedToday,
}

impl MembershipStatus {
    pub fn from_details(details: &UserDetails) -> Self {
        if !details.is_member() {
            MembershipStatus::NotMember
        } else if details.can_complete_today() {
            MembershipStatus::Member
        } else {
            MembershipStatus::MemberCompletedToday
        }
    }

    pub fn is_member(self) -> bool {
        !matches!(self, MembershipStatus::NotMember)
    }
}

/// The backend stores optional text columns as NULL.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Query parameters for `POST /events`.
#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub is_private: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_json(user_details: serde_json::Value) -> EventDetail {
        serde_json::from_value(serde_json::json!({
            "event_id": 7,
            "name": "Morning run",
            "description": "5k before work",
            "created_by": 1,
            "is_private": false,
            "flags": "user_created",
            "created_at": "2024-01-01T08:00:00",
            "top_users": [
                {"userid": 3, "username": "ana", "streak_count": 12},
                {"userid": 5, "username": "bo", "streak_count": 4}
            ],
            "user_details": user_details,
            "user_counts": 2
        }))
        .unwrap()
    }

    #[test]
    fn test_status_not_member() {
        let detail = detail_json(serde_json::json!({"status": "Not part of the event"}));
        assert_eq!(detail.membership(), MembershipStatus::NotMember);
    }

    #[test]
    fn test_status_member_eligible() {
        let detail = detail_json(serde_json::json!({
            "status": "Part of the event",
            "streak_count": 12,
            "rank": 1,
            "last_modified": "2024-01-01T08:00:00.123456",
            "request_update_streak": true
        }));
        assert_eq!(detail.membership(), MembershipStatus::Member);
        assert_eq!(detail.top_users[0].user_id, 3);
    }

    #[test]
    fn test_status_completed_today() {
        let detail = detail_json(serde_json::json!({
            "status": "Part of the event",
            "streak_count": 12,
            "request_update_streak": false
        }));
        assert_eq!(detail.membership(), MembershipStatus::MemberCompletedToday);
    }

    #[test]
    fn test_missing_flag_falls_back_to_last_modified() {
        let today = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        let details = UserDetails {
            status: MEMBER_STATUS.to_string(),
            streak_count: Some(1),
            rank: None,
            last_modified: Some(today),
            request_update_streak: None,
        };
        assert_eq!(
            MembershipStatus::from_details(&details),
            MembershipStatus::MemberCompletedToday
        );

        let never = UserDetails {
            last_modified: None,
            ..details
        };
        assert_eq!(MembershipStatus::from_details(&never), MembershipStatus::Member);
    }

    #[test]
    fn test_forget_streak_removes_user_everywhere() {
        let mut detail = detail_json(serde_json::json!({
            "status": "Part of the event",
            "streak_count": 12,
            "rank": 1,
            "request_update_streak": true
        }));

        detail.forget_streak(3);

        assert_eq!(detail.user_details.streak_count, None);
        assert!(detail.top_users.iter().all(|p| p.user_id != 3));
        assert_eq!(detail.top_users.len(), 1);
    }

    #[test]
    fn test_event_view_defaults() {
        let view: EventView =
            serde_json::from_str(r#"{"id": 1, "name": "Read", "props": []}"#).unwrap();
        assert_eq!(view.streak_count, 0);
        assert!(view.top_participants.is_empty());
    }

    #[test]
    fn test_null_description_is_empty() {
        let view: EventView =
            serde_json::from_str(r#"{"id": 1, "name": "Read", "description": null}"#).unwrap();
        assert_eq!(view.description, "");

        let detail: EventDetail = serde_json::from_value(serde_json::json!({
            "event_id": 7,
            "name": "Morning run",
            "description": null,
            "user_details": {"status": "Not part of the event"}
        }))
        .unwrap();
        assert_eq!(detail.description, "");
    }
}
