// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session manager: the token store and its refresh coordinator, bound together.
//!
//! Constructed once per client and handed to every request path.

use crate::services::guard::SessionGuard;
use crate::services::refresh::{RefreshCoordinator, TokenRefresher};
use crate::services::token_store::TokenStore;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct SessionManager {
    tokens: TokenStore,
    coordinator: RefreshCoordinator,
}

impl SessionManager {
    pub fn new(
        tokens: TokenStore,
        refresher: Arc<dyn TokenRefresher>,
        guard: Arc<SessionGuard>,
        refresh_timeout: Duration,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(tokens.clone(), refresher, guard, refresh_timeout);
        Self {
            tokens,
            coordinator,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.get().await.is_some()
    }
}
