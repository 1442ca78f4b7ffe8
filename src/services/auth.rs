// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, session restore and sign-out.
//!
//! After any successful sign-in the user's role is read from their
//! `users/{uid}` document (created as `viewer` on first sign-in) and the
//! session record is persisted.

use crate::db::{collections, DocumentStore};
use crate::error::Result;
use crate::middleware::gateway::operations;
use crate::middleware::validation::validate_email;
use crate::middleware::{Gateway, PersistedSession, SessionGuard};
use crate::models::{Role, UserRecord};
use crate::services::identity::{IdentityProvider, IdentityRecord};
use crate::state::{Identity, SharedState};
use crate::time_utils::{now_millis, SharedClock};
use crate::AppContext;
use std::sync::Arc;

/// Result of a completed sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInUser {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Role,
}

pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    gateway: Gateway,
    session: SessionGuard,
    clock: SharedClock,
    state: SharedState,
}

impl AuthService {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            identity: ctx.identity.clone(),
            store: ctx.store.clone(),
            gateway: ctx.gateway.clone(),
            session: ctx.session.clone(),
            clock: ctx.clock.clone(),
            state: ctx.state.clone(),
        }
    }

    /// Sign in with an ID token from the Google sign-in flow.
    pub async fn sign_in_with_google(&self, google_id_token: &str) -> Result<SignedInUser> {
        let record = self
            .gateway
            .execute(operations::GOOGLE_SIGN_IN, || {
                self.identity.sign_in_with_google(google_id_token)
            })
            .await?;

        self.complete_sign_in(record).await
    }

    pub async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<SignedInUser> {
        let email = validate_email(email)?;
        let record = self
            .gateway
            .execute(operations::EMAIL_SIGN_IN, || {
                self.identity.sign_in_with_email(&email, password)
            })
            .await?;

        self.complete_sign_in(record).await
    }

    /// Create an email/password account and sign it in.
    ///
    /// New accounts without a display name get the local part of their email.
    pub async fn create_account(&self, email: &str, password: &str) -> Result<SignedInUser> {
        let email = validate_email(email)?;
        let mut record = self
            .gateway
            .execute(operations::CREATE_ACCOUNT, || {
                self.identity.create_account(&email, password)
            })
            .await?;

        if record.display_name.is_none() {
            let display_name = email.split('@').next().unwrap_or_default().to_string();
            let updated = self
                .gateway
                .execute(operations::UPDATE_DISPLAY_NAME, || {
                    self.identity.update_display_name(&record, &display_name)
                })
                .await?;
            record = updated;
        }

        self.complete_sign_in(record).await
    }

    async fn complete_sign_in(&self, record: IdentityRecord) -> Result<SignedInUser> {
        self.state.write().await.set_identity(Identity {
            user_id: Some(record.uid.clone()),
            email: record.email.clone(),
            display_name: record.display_name.clone(),
            role: None,
            is_logged_in: true,
            player_id: None,
        });

        let role = self.resolve_role(&record).await;
        self.state.write().await.identity.role = Some(role);

        let session = PersistedSession {
            user_id: record.uid.clone(),
            email: record.email.clone(),
            role,
            login_timestamp: now_millis(&self.clock),
        };
        if let Err(e) = self.session.persist(&session) {
            tracing::warn!(error = %e, "Failed to persist login info");
        }

        tracing::info!(user_id = %record.uid, role = %role, "User signed in");

        Ok(SignedInUser {
            user_id: record.uid,
            email: record.email,
            display_name: record.display_name,
            role,
        })
    }

    /// Role from the user's document, creating the document on first sign-in.
    ///
    /// Any failure here leaves the user as a viewer.
    async fn resolve_role(&self, record: &IdentityRecord) -> Role {
        let lookup = self
            .gateway
            .execute(operations::GET_USER_ROLE, || {
                self.store.get(collections::USERS, &record.uid)
            })
            .await;

        match lookup {
            Ok(Some(doc)) => match UserRecord::from_document(&doc) {
                Ok(user) => user.parsed_role().unwrap_or_else(|| {
                    tracing::warn!(user_id = %record.uid, role = ?user.role, "Unusable stored role");
                    Role::Viewer
                }),
                Err(e) => {
                    tracing::warn!(user_id = %record.uid, error = %e, "Malformed user document");
                    Role::Viewer
                }
            },
            Ok(None) => {
                let user = UserRecord {
                    id: record.uid.clone(),
                    email: record.email.clone(),
                    name: None,
                    role: Some(Role::Viewer.as_str().to_string()),
                };
                let created = match serde_json::to_value(&user) {
                    Ok(data) => {
                        self.gateway
                            .execute(operations::CREATE_USER_DOC, || {
                                self.store.set(collections::USERS, &record.uid, data)
                            })
                            .await
                    }
                    Err(e) => Err(anyhow::Error::from(e).into()),
                };
                if let Err(e) = created {
                    tracing::error!(user_id = %record.uid, error = %e, "Failed to create user document");
                }
                Role::Viewer
            }
            Err(e) => {
                tracing::error!(user_id = %record.uid, error = %e, "Failed to load user role");
                Role::Viewer
            }
        }
    }

    /// Pick up a persisted sign-in, if one is still valid.
    pub async fn restore_session(&self) -> Option<SignedInUser> {
        if !self.session.validate_stored_session() {
            return None;
        }
        let session = self.session.load()?;

        self.state.write().await.set_identity(Identity {
            user_id: Some(session.user_id.clone()),
            email: session.email.clone(),
            display_name: None,
            role: Some(session.role),
            is_logged_in: true,
            player_id: None,
        });

        tracing::info!(user_id = %session.user_id, role = %session.role, "Session restored");

        Some(SignedInUser {
            user_id: session.user_id,
            email: session.email,
            display_name: None,
            role: session.role,
        })
    }

    /// Cancel subscriptions, forget the user and purge the session record.
    pub async fn sign_out(&self) -> Result<()> {
        let cancelled = self.state.write().await.reset_for_sign_out();
        tracing::info!(cancelled, "User signed out");
        self.session.purge()
    }
}
