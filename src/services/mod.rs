// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session handling and API access.

pub mod api;
pub mod guard;
pub mod membership;
pub mod notifications;
pub mod refresh;
pub mod request;
pub mod session;
pub mod token_store;

pub use api::{CreatedEvent, LoginOutcome, StreakApi};
pub use guard::{Navigator, RecordingNavigator, SessionGuard};
pub use membership::EventMembershipController;
pub use notifications::{NotificationFeed, NotificationLog};
pub use refresh::{HttpTokenRefresher, RefreshCoordinator, RefreshPhase, TokenRefresher};
pub use request::{ApiRequest, ApiResponse, RequestClient};
pub use session::SessionManager;
pub use token_store::TokenStore;
