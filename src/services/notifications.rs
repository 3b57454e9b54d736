// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Motivation feed pushed by the server over WebSocket, and the short
//! history of messages kept for display.

use crate::error::{ApiError, Result};
use crate::store::{keys, KeyValueStore};
use futures_util::stream::{BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Number of messages kept in the notification log.
pub const NOTIFICATION_LOG_CAPACITY: usize = 10;

/// Text frames from the notification socket.
///
/// Ends when the socket closes or errors. A feed cannot be restarted;
/// reconnecting means calling [`NotificationFeed::connect`] again.
pub struct NotificationFeed {
    inner: BoxStream<'static, String>,
}

impl NotificationFeed {
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(ws_url).await.map_err(|e| ApiError::Transient {
            status: None,
            message: format!("WebSocket connect failed: {}", e),
        })?;
        tracing::info!(url = ws_url, "Connected to notification feed");
        Ok(Self::from_stream(ws_stream))
    }

    /// Wrap an already-established message stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Send
            + 'static,
    {
        let inner = stream
            .take_while(|msg| {
                let open = match msg {
                    Ok(Message::Close(_)) => {
                        tracing::info!("Notification feed closed");
                        false
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Notification feed error");
                        false
                    }
                    Ok(_) => true,
                };
                futures_util::future::ready(open)
            })
            .filter_map(|msg| {
                let text = match msg {
                    Ok(Message::Text(text)) => Some(text.to_string()),
                    _ => None,
                };
                futures_util::future::ready(text)
            })
            .boxed();
        Self { inner }
    }
}

impl Stream for NotificationFeed {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.inner.poll_next_unpin(cx)
    }
}

/// Most recent notifications, newest first, persisted in the key-value store.
#[derive(Clone)]
pub struct NotificationLog {
    store: Arc<dyn KeyValueStore>,
}

impl NotificationLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn push(&self, message: &str) -> Result<()> {
        let mut messages = self.recent()?;
        messages.insert(0, message.to_string());
        messages.truncate(NOTIFICATION_LOG_CAPACITY);

        let raw = serde_json::to_string(&messages)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to encode notifications: {}", e)))?;
        self.store.set(keys::NOTIFICATIONS, &raw)
    }

    pub fn recent(&self) -> Result<Vec<String>> {
        match self.store.get(keys::NOTIFICATIONS)? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| ApiError::Storage(format!("corrupt notification log: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(keys::NOTIFICATIONS)
    }
}
