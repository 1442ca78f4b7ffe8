// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod fixture;
pub mod player;
pub mod role;
pub mod user;

pub use fixture::{LeaderboardEntry, MatchRecord};
pub use player::PlayerProfile;
pub use role::Role;
pub use user::UserRecord;
