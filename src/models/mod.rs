// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the API.

pub mod event;
pub mod session;
pub mod user;

pub use event::{EventDetail, EventView, MembershipStatus, NewEvent, Participant, UserDetails};
pub use session::{Session, TokenResponse};
pub use user::{MessageResponse, SignupRequest, UserProfile};
