// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store layer.
//!
//! Feature services only see the [`DocumentStore`] trait. [`FirestoreDb`] talks
//! to Firestore (or its emulator); [`MemoryStore`] keeps everything in process
//! for offline runs and tests.

pub mod firestore;
pub mod memory;
pub mod store;
pub mod subscription;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;
pub use store::{Direction, Document, DocumentStore, OrderBy};
pub use subscription::{SnapshotCallback, SubscriptionHandle, SubscriptionRegistry};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PLAYERS: &str = "players";
    pub const MATCHES: &str = "matches";
    pub const LEADERBOARD: &str = "leaderboard";
    pub const AUDIT_LOGS: &str = "audit_logs";
}
