// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote-call gateway.
//!
//! Every document-store and identity-provider call goes through
//! [`Gateway::execute`], which charges it against the caller's quota first.

use crate::error::Result;
use crate::middleware::rate_limit::{QuotaTable, RateLimiter};
use crate::state::SharedState;
use crate::time_utils::SharedClock;
use std::future::Future;
use std::sync::Arc;

/// Operation names used as rate-limit keys.
pub mod operations {
    pub const GOOGLE_SIGN_IN: &str = "googleSignIn";
    pub const EMAIL_SIGN_IN: &str = "emailSignIn";
    pub const CREATE_ACCOUNT: &str = "createAccount";
    pub const UPDATE_DISPLAY_NAME: &str = "updateDisplayName";
    pub const GET_USER_ROLE: &str = "getUserRole";
    pub const CREATE_USER_DOC: &str = "createUserDoc";
    pub const LOAD_USERS: &str = "loadUsers";
    pub const SET_USER_ROLE: &str = "setUserRole";
    pub const DELETE_USER: &str = "deleteUser";
    pub const LOAD_AUDIT_LOGS: &str = "loadAuditLogs";
    pub const CLEAR_AUDIT_LOGS: &str = "clearAuditLogs";
    pub const LOAD_PROFILES: &str = "loadProfiles";
    pub const CREATE_PROFILE: &str = "createProfile";
    pub const UPDATE_PROFILE: &str = "updateProfile";
    pub const DELETE_PROFILE: &str = "deleteProfile";
    pub const START_MATCH: &str = "startMatch";
    pub const UPDATE_SCORES: &str = "updateScores";
    pub const SUBSCRIBE_LEADERBOARD: &str = "subscribeLeaderboard";
}

/// Rate-limited entry point for remote operations.
#[derive(Clone)]
pub struct Gateway {
    limiter: Arc<RateLimiter>,
    quotas: Arc<QuotaTable>,
    state: SharedState,
}

impl Gateway {
    pub fn new(quotas: QuotaTable, clock: SharedClock, state: SharedState) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::new(clock)),
            quotas: Arc::new(quotas),
            state,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run `call` if the current identity still has quota for `operation`.
    ///
    /// `call` is not invoked when the quota is exhausted. Its own result,
    /// success or failure, is returned as is.
    pub async fn execute<T, F, Fut>(&self, operation: &str, call: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let identity = self.state.read().await.identity.user_id.clone();
        let quota = self.quotas.for_operation(operation);

        self.limiter
            .check_and_block(identity.as_deref(), operation, quota)?;

        tracing::debug!(operation, identity = ?identity, "Remote call");

        let result = call().await;
        if let Err(e) = &result {
            tracing::error!(operation, error = %e, "Remote call failed");
        }
        result
    }
}
