// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - feature logic layer.

pub mod admin;
pub mod auth;
pub mod identity;
pub mod profiles;
pub mod scoreboard;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::AdminService;
pub use auth::{AuthService, SignedInUser};
pub use identity::{FirebaseAuthClient, IdentityProvider, IdentityRecord};
pub use profiles::PlayerProfileService;
pub use scoreboard::ScoreboardService;
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
