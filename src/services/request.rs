// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP dispatch with bearer credentials.
//!
//! Handles:
//! - Attaching the current access token
//! - Fast `Unauthenticated` failure when no session exists
//! - One transparent retry after a 401, via the refresh coordinator
//! - Mapping status classes to [`ApiError`] without business interpretation

use crate::error::{ApiError, Result};
use crate::models::Session;
use crate::services::session::SessionManager;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

/// Request body variants used by the API.
#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// A retryable request description.
///
/// Kept by value so it can be dispatched a second time after a refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Body,
    authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
            authenticated: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.body = Body::Form(
            fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self
    }

    /// Send without credentials (signup, login). A 401 is never retried.
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// Successful (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::Decode(format!("JSON parse error: {}", e)))
    }
}

/// Issues API calls on behalf of every caller.
#[derive(Clone)]
pub struct RequestClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionManager,
}

impl RequestClient {
    pub fn new(http: reqwest::Client, base_url: &str, session: SessionManager) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Send a request, refreshing the session at most once on 401.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        if !request.authenticated {
            let (status, body) = self.dispatch(request, None).await?;
            return check_status(status, body, false);
        }

        let session = self
            .session
            .tokens()
            .get()
            .await
            .ok_or(ApiError::Unauthenticated)?;

        let (status, body) = self.dispatch(request, Some(&session)).await?;
        if status != StatusCode::UNAUTHORIZED {
            return check_status(status, body, true);
        }

        tracing::debug!(path = %request.path, "Authorization failure, waiting for session refresh");
        let renewed = self
            .session
            .coordinator()
            .recover(session.access_token())
            .await?;

        let (status, body) = self.dispatch(request, Some(&renewed)).await?;
        if status == StatusCode::UNAUTHORIZED {
            // Already retried in this episode; never queue it again.
            tracing::warn!(path = %request.path, "Request rejected after session refresh");
            return Err(ApiError::SessionExpired);
        }
        check_status(status, body, true)
    }

    /// Send and decode a JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        self.send(request).await?.json()
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        session: Option<&Session>,
    ) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(session) = session {
            builder = builder.header(reqwest::header::AUTHORIZATION, session.bearer());
        }
        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await?;
        let (status, body) = read_body(response).await?;

        tracing::trace!(method = %request.method, path = %request.path, status = status.as_u16(), "API response");
        Ok((status, body))
    }
}

/// Read the status and body of a response.
///
/// On error statuses an unreadable body only loses the message. On success
/// the body is the payload, so a failed read is an error of its own.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String)> {
    let status = response.status();
    if !status.is_success() {
        return Ok((status, response.text().await.unwrap_or_default()));
    }

    match response.text().await {
        Ok(body) => Ok((status, body)),
        Err(e) if e.is_timeout() => Err(ApiError::Timeout("server response")),
        Err(e) => Err(ApiError::Transient {
            status: Some(status.as_u16()),
            message: format!("Failed to read response body: {}", e),
        }),
    }
}

/// Map a status class to a result, passing server messages through verbatim.
pub(crate) fn check_status(status: StatusCode, body: String, authenticated: bool) -> Result<ApiResponse> {
    if status.is_success() {
        return Ok(ApiResponse {
            status: status.as_u16(),
            body,
        });
    }

    let message = server_message(status, &body);

    if status == StatusCode::UNAUTHORIZED && !authenticated {
        return Err(ApiError::InvalidCredentials(message));
    }

    if status.is_server_error() {
        tracing::warn!(status = status.as_u16(), "Server error");
        return Err(ApiError::Transient {
            status: Some(status.as_u16()),
            message,
        });
    }

    Err(ApiError::Validation {
        status: status.as_u16(),
        message,
    })
}

/// Extract the human-readable message from an error body.
///
/// The backend reports errors as `{"detail": "..."}`, or a list of field
/// errors for request validation failures.
fn server_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(serde_json::Value::Array(items)) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if !messages.is_empty() {
                    return messages.join("; ");
                }
            }
            _ => {}
        }
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_message_is_passed_through() {
        let err = check_status(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Email already registered"}"#.to_string(),
            false,
        )
        .unwrap_err();

        match err {
            ApiError::Validation { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Email already registered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_field_errors_are_joined() {
        let body = r#"{"detail": [{"loc": ["query", "user_id"], "msg": "field required"}, {"msg": "value is not a valid integer"}]}"#;
        let message = server_message(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(message, "field required; value is not a valid integer");
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err = check_status(StatusCode::BAD_GATEWAY, String::new(), true).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Transient {
                status: Some(502),
                ..
            }
        ));
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn test_anonymous_401_is_invalid_credentials() {
        let err = check_status(
            StatusCode::UNAUTHORIZED,
            r#"{"detail": "Invalid email or password"}"#.to_string(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials(ref m) if m == "Invalid email or password"));
    }

    #[tokio::test]
    async fn test_truncated_success_body_is_transient() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            // Promise 100 bytes, send a few, then hang up.
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n[{\"id\":")
                .await;
        });

        let response = reqwest::get(format!("http://{}/events", addr)).await.unwrap();
        let err = read_body(response).await.unwrap_err();

        assert!(matches!(err, ApiError::Transient { status: Some(200), .. }));
    }

    #[tokio::test]
    async fn test_error_body_is_read_for_message() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let body = r#"{"detail": "Event not found"}"#;
            let response = format!(
                "HTTP/1.1 404 Not Found\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });

        let response = reqwest::get(format!("http://{}/events/9", addr)).await.unwrap();
        let (status, body) = read_body(response).await.unwrap();

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(server_message(status, &body), "Event not found");
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::post("/events/7/join").query("user_id", 3);
        assert_eq!(request.path(), "/events/7/join");
        assert!(request.is_authenticated());
        assert!(!request.clone().anonymous().is_authenticated());
    }
}
