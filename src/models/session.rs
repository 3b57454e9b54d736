// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session credentials.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Access/refresh token pair. Always replaced as a unit.
///
/// Both tokens are `SecretString`, so `Debug` output is redacted.
#[derive(Debug, Clone)]
pub struct Session {
    access_token: SecretString,
    refresh_token: SecretString,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: SecretString::from(refresh_token.into()),
        }
    }

    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub fn refresh_token(&self) -> &str {
        self.refresh_token.expose_secret()
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token())
    }
}

/// Token response from `/users/login` and `/users/token/refresh`.
///
/// The refresh endpoint may omit `refresh_token`; the caller keeps the old one.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Build the session installed after this response.
    pub fn into_session(self, previous_refresh_token: Option<&str>) -> Option<Session> {
        let refresh = match self.refresh_token {
            Some(token) if !token.is_empty() => token,
            _ => previous_refresh_token?.to_string(),
        };
        Some(Session::new(self.access_token, refresh))
    }
}
