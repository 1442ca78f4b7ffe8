// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offline collaborators for service unit tests.

use crate::config::Config;
use crate::db::MemoryStore;
use crate::error::{AppError, Result};
use crate::services::identity::{IdentityProvider, IdentityRecord};
use crate::services::storage::MemoryKeyValueStore;
use crate::AppContext;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use dashmap::DashMap;
use mockable::Clock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(
            Utc.with_ymd_and_hms(2026, 3, 14, 19, 0, 0).unwrap(),
        )))
    }

    pub(crate) fn advance(&self, by: chrono::Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Identity provider backed by a map of email accounts.
///
/// Google tokens sign in as `g-{token}` with email `{token}@example.com`.
#[derive(Default)]
pub(crate) struct ScriptedIdentity {
    accounts: DashMap<String, (String, IdentityRecord)>,
    calls: AtomicUsize,
}

impl ScriptedIdentity {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    async fn sign_in_with_google(&self, google_id_token: &str) -> Result<IdentityRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(IdentityRecord {
            uid: format!("g-{}", google_id_token),
            email: Some(format!("{}@example.com", google_id_token)),
            display_name: Some(google_id_token.to_string()),
            id_token: "token".to_string(),
        })
    }

    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<IdentityRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.accounts.get(email) {
            Some(account) if account.0 == password => Ok(account.1.clone()),
            _ => Err(AppError::RemoteOperationFailed(
                "INVALID_LOGIN_CREDENTIALS".to_string(),
            )),
        }
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<IdentityRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.accounts.contains_key(email) {
            return Err(AppError::RemoteOperationFailed("EMAIL_EXISTS".to_string()));
        }
        let record = IdentityRecord {
            uid: format!("uid-{}", self.accounts.len() + 1),
            email: Some(email.to_string()),
            display_name: None,
            id_token: "token".to_string(),
        };
        self.accounts
            .insert(email.to_string(), (password.to_string(), record.clone()));
        Ok(record)
    }

    async fn update_display_name(
        &self,
        user: &IdentityRecord,
        display_name: &str,
    ) -> Result<IdentityRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut updated = user.clone();
        updated.display_name = Some(display_name.to_string());
        if let Some(email) = &user.email {
            if let Some(mut account) = self.accounts.get_mut(email) {
                account.1 = updated.clone();
            }
        }
        Ok(updated)
    }
}

/// An offline [`AppContext`] plus handles on its collaborators.
pub(crate) struct TestHarness {
    pub ctx: AppContext,
    pub store: MemoryStore,
    pub storage: Arc<MemoryKeyValueStore>,
    pub identity: Arc<ScriptedIdentity>,
    pub clock: Arc<MutableClock>,
}

impl TestHarness {
    pub(crate) fn new() -> Self {
        Self::with_storage(Arc::new(MemoryKeyValueStore::new()), MemoryStore::new())
    }

    pub(crate) fn with_storage(storage: Arc<MemoryKeyValueStore>, store: MemoryStore) -> Self {
        let identity = Arc::new(ScriptedIdentity::default());
        let clock = MutableClock::new();
        let ctx = AppContext::new(
            Config::test_default(),
            Arc::new(store.clone()),
            identity.clone(),
            storage.clone(),
            clock.clone(),
        );

        Self {
            ctx,
            store,
            storage,
            identity,
            clock,
        }
    }

    /// Mark the context as signed in with `role`, without touching the store.
    pub(crate) async fn sign_in_as(&self, user_id: &str, role: crate::models::Role) {
        let mut state = self.ctx.state.write().await;
        state.identity.user_id = Some(user_id.to_string());
        state.identity.role = Some(role);
        state.identity.is_logged_in = true;
    }
}
