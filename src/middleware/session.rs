// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guard for the session record kept in durable client storage.
//!
//! The record is five string fields. It is only usable when its role is a
//! known role and it is younger than [`SESSION_DURATION_MS`]; otherwise all
//! five fields are removed together.

use crate::error::Result;
use crate::models::Role;
use crate::services::storage::KeyValueStore;
use crate::time_utils::{now_millis, SharedClock};
use std::sync::Arc;

/// How long a sign-in stays valid (8 hours).
pub const SESSION_DURATION_MS: i64 = 8 * 60 * 60 * 1000;

/// Storage keys of the session record.
pub mod keys {
    pub const ROLE: &str = "userRole";
    pub const LOGGED_IN: &str = "isLoggedIn";
    pub const LOGIN_TIMESTAMP: &str = "loginTimestamp";
    pub const EMAIL: &str = "userEmail";
    pub const USER_ID: &str = "userId";

    pub const ALL: [&str; 5] = [ROLE, LOGGED_IN, LOGIN_TIMESTAMP, EMAIL, USER_ID];
}

/// Session record as persisted at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Role,
    /// Epoch milliseconds
    pub login_timestamp: i64,
}

/// Why a stored session was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rejection {
    UnknownRole(String),
    Expired { age_ms: i64 },
    BadTimestamp(String),
}

/// Validates, writes and clears the persisted session record.
#[derive(Clone)]
pub struct SessionGuard {
    storage: Arc<dyn KeyValueStore>,
    clock: SharedClock,
}

impl SessionGuard {
    pub fn new(storage: Arc<dyn KeyValueStore>, clock: SharedClock) -> Self {
        Self { storage, clock }
    }

    /// Check the stored record, purging it if it must not be used.
    ///
    /// Returns `true` when the record is usable or there is none at all.
    pub fn validate_stored_session(&self) -> bool {
        let Some(rejection) = self.check() else {
            return true;
        };

        match &rejection {
            Rejection::UnknownRole(role) => {
                tracing::warn!(role = %role, "Invalid role in storage, clearing session")
            }
            Rejection::Expired { age_ms } => {
                tracing::warn!(age_ms, "Session expired, clearing session")
            }
            Rejection::BadTimestamp(raw) => {
                tracing::warn!(timestamp = %raw, "Unreadable login timestamp, clearing session")
            }
        }

        if let Err(e) = self.purge() {
            tracing::error!(error = %e, "Failed to purge session record");
        }
        false
    }

    fn check(&self) -> Option<Rejection> {
        if let Some(role) = self.non_empty(keys::ROLE) {
            if role.parse::<Role>().is_err() {
                return Some(Rejection::UnknownRole(role));
            }
        }

        if let Some(raw) = self.non_empty(keys::LOGIN_TIMESTAMP) {
            let Ok(timestamp) = raw.trim().parse::<i64>() else {
                return Some(Rejection::BadTimestamp(raw));
            };
            let age_ms = now_millis(&self.clock).saturating_sub(timestamp);
            if age_ms > SESSION_DURATION_MS {
                return Some(Rejection::Expired { age_ms });
            }
        }

        None
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.storage.get(key).filter(|v| !v.is_empty())
    }

    /// Write the record for a fresh sign-in.
    pub fn persist(&self, session: &PersistedSession) -> Result<()> {
        let mut entries = vec![
            (keys::ROLE, session.role.as_str().to_string()),
            (keys::LOGGED_IN, "true".to_string()),
            (keys::LOGIN_TIMESTAMP, session.login_timestamp.to_string()),
            (keys::USER_ID, session.user_id.clone()),
        ];
        if let Some(email) = &session.email {
            entries.push((keys::EMAIL, email.clone()));
        }

        self.storage.set_all(&entries)?;
        if session.email.is_none() {
            self.storage.remove(keys::EMAIL)?;
        }
        Ok(())
    }

    /// Read back a complete, signed-in record.
    ///
    /// Does not validate; call [`Self::validate_stored_session`] first.
    pub fn load(&self) -> Option<PersistedSession> {
        if self.storage.get(keys::LOGGED_IN).as_deref() != Some("true") {
            return None;
        }

        Some(PersistedSession {
            user_id: self.non_empty(keys::USER_ID)?,
            email: self.non_empty(keys::EMAIL),
            role: self.non_empty(keys::ROLE)?.parse().ok()?,
            login_timestamp: self.non_empty(keys::LOGIN_TIMESTAMP)?.parse().ok()?,
        })
    }

    /// Remove every field of the record in one storage change.
    pub fn purge(&self) -> Result<()> {
        self.storage.remove_all(&keys::ALL)
    }
}
