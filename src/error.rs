// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error types.
//!
//! Only authorization failures are intercepted by the session layer (turned
//! into a retry or into [`ApiError::SessionExpired`]). Everything else the
//! server says reaches the caller as-is.

/// Error returned by every client operation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No session is stored; the caller must route to login. No request was sent.
    #[error("Not logged in")]
    Unauthenticated,

    /// The refresh attempt failed (or a retried request was rejected again).
    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Already a member of this event")]
    AlreadyMember,

    #[error("Streak already updated for today")]
    AlreadyCompleted,

    #[error("Not a member of this event")]
    NotMember,

    /// Login rejected by the server (401 on an unauthenticated call).
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// 4xx other than 401, with the server-provided message.
    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// 5xx or a network failure. Not retried here.
    #[error("Server unavailable: {message}")]
    Transient { status: Option<u16>, message: String },

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Business-rule rejections from the membership controller.
    ///
    /// The view layer shows these inline instead of as a generic failure.
    pub fn is_business_rejection(&self) -> bool {
        matches!(
            self,
            ApiError::AlreadyMember | ApiError::AlreadyCompleted | ApiError::NotMember
        )
    }

    /// Whether the caller should send the user to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Unauthenticated | ApiError::SessionExpired)
    }

    /// HTTP status carried by the error, if it came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { status, .. } => Some(*status),
            ApiError::Transient { status, .. } => *status,
            ApiError::InvalidCredentials(_) => Some(401),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ApiError::Timeout("server response");
        }
        if err.is_decode() {
            return ApiError::Decode(err.to_string());
        }
        ApiError::Transient {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;
