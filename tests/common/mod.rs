// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use darts_scorekeeper::config::Config;
use darts_scorekeeper::db::{FirestoreDb, MemoryStore};
use darts_scorekeeper::error::{AppError, Result};
use darts_scorekeeper::models::Role;
use darts_scorekeeper::services::{IdentityProvider, IdentityRecord, MemoryKeyValueStore};
use darts_scorekeeper::AppContext;
use mockable::Clock;
use std::sync::{Arc, Mutex};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Unique suffix for test isolation against a shared emulator.
#[allow(dead_code)]
pub fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Clock the test moves by hand.
pub struct TestClock(Mutex<DateTime<Utc>>);

#[allow(dead_code)]
impl TestClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(
            Utc.with_ymd_and_hms(2026, 3, 14, 19, 0, 0).unwrap(),
        )))
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for TestClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Identity provider that signs in any Google token as `g-{token}`.
///
/// Email sign-in only accepts the password `"secret"`.
#[derive(Default)]
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in_with_google(&self, google_id_token: &str) -> Result<IdentityRecord> {
        Ok(IdentityRecord {
            uid: format!("g-{}", google_id_token),
            email: Some(format!("{}@example.com", google_id_token)),
            display_name: None,
            id_token: "token".to_string(),
        })
    }

    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<IdentityRecord> {
        if password != "secret" {
            return Err(AppError::RemoteOperationFailed(
                "INVALID_LOGIN_CREDENTIALS".to_string(),
            ));
        }
        Ok(IdentityRecord {
            uid: format!("e-{}", email),
            email: Some(email.to_string()),
            display_name: None,
            id_token: "token".to_string(),
        })
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<IdentityRecord> {
        self.sign_in_with_email(email, password).await
    }

    async fn update_display_name(
        &self,
        user: &IdentityRecord,
        display_name: &str,
    ) -> Result<IdentityRecord> {
        let mut updated = user.clone();
        updated.display_name = Some(display_name.to_string());
        Ok(updated)
    }
}

/// Offline client: in-memory store and storage, fake identity, test clock.
#[allow(dead_code)]
pub struct TestClient {
    pub ctx: AppContext,
    pub store: MemoryStore,
    pub storage: Arc<MemoryKeyValueStore>,
    pub clock: Arc<TestClock>,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new() -> Self {
        Self::with_config(Config::test_default())
    }

    pub fn with_config(config: Config) -> Self {
        let store = MemoryStore::new();
        let storage = Arc::new(MemoryKeyValueStore::new());
        let clock = TestClock::new();
        let ctx = AppContext::new(
            config,
            Arc::new(store.clone()),
            Arc::new(FakeIdentity),
            storage.clone(),
            clock.clone(),
        );

        Self {
            ctx,
            store,
            storage,
            clock,
        }
    }

    /// Sign in through Google and force the stored role to `role`.
    pub async fn sign_in_as(&self, token: &str, role: Role) -> String {
        use darts_scorekeeper::db::DocumentStore;

        let uid = format!("g-{}", token);
        self.store
            .set(
                "users",
                &uid,
                serde_json::json!({ "email": format!("{}@example.com", token), "role": role.as_str() }),
            )
            .await
            .unwrap();
        let user = self.ctx.auth().sign_in_with_google(token).await.unwrap();
        assert_eq!(user.role, role);
        uid
    }
}
