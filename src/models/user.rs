//! User profile returned by the API.

use serde::{Deserialize, Serialize};

/// Current user, cached under the `user` key after login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body for `POST /users/signup`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `{message}` acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
