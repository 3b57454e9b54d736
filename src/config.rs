//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default API base (includes the `/api/v1` prefix).
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Default notification socket.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws/motivation";

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL for REST calls, without a trailing slash
    pub api_url: String,
    /// Motivation WebSocket URL
    pub ws_url: String,
    /// Where the session (tokens, profile, redirect path) is persisted
    pub state_file: PathBuf,
    /// Upper bound for a single HTTP exchange
    pub request_timeout: Duration,
    /// Upper bound for one refresh episode; followers never wait longer than this
    pub refresh_timeout: Duration,
    /// Leaderboard size requested with event details
    pub top_x: u32,
    /// Route the user lands on after login when nothing was pending
    pub home_path: String,
    /// Route of the login screen
    pub login_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_url = env::var("STREAK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            ws_url: env::var("STREAK_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string()),
            state_file: env::var("STREAK_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".streak-session.json")),
            request_timeout: Duration::from_secs(parse_var("STREAK_REQUEST_TIMEOUT_SECS", 30)?),
            refresh_timeout: Duration::from_secs(parse_var("STREAK_REFRESH_TIMEOUT_SECS", 10)?),
            top_x: parse_var("STREAK_TOP_X", 100)?,
            home_path: "/".to_string(),
            login_path: "/login".to_string(),
        })
    }

    /// Default config for testing, pointed at the given mock server.
    pub fn test_default(api_url: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            ws_url: "ws://127.0.0.1:1/ws/motivation".to_string(),
            state_file: PathBuf::from("unused-in-tests.json"),
            request_timeout: Duration::from_secs(5),
            refresh_timeout: Duration::from_secs(2),
            top_x: 10,
            home_path: "/".to_string(),
            login_path: "/login".to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
