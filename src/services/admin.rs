// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel operations: user management and audit log maintenance.
//!
//! Every operation checks the local role before any remote call is made.

use crate::db::{collections, DocumentStore};
use crate::error::{AppError, Result};
use crate::middleware::gateway::operations;
use crate::middleware::Gateway;
use crate::models::{Role, UserRecord};
use crate::state::SharedState;
use crate::AppContext;
use serde_json::json;
use std::sync::Arc;

pub struct AdminService {
    store: Arc<dyn DocumentStore>,
    gateway: Gateway,
    state: SharedState,
}

impl AdminService {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            store: ctx.store.clone(),
            gateway: ctx.gateway.clone(),
            state: ctx.state.clone(),
        }
    }

    /// Roles offered in the role selector, lowest privilege first.
    pub fn role_options() -> &'static [Role] {
        &Role::ALL
    }

    async fn require_admin(&self) -> Result<()> {
        if self.state.read().await.is_admin() {
            Ok(())
        } else {
            tracing::warn!("Admin operation attempted without admin role");
            Err(AppError::Unauthorized)
        }
    }

    /// All user documents. Malformed documents are skipped.
    pub async fn load_users(&self) -> Result<Vec<UserRecord>> {
        self.require_admin().await?;

        let docs = self
            .gateway
            .execute(operations::LOAD_USERS, || {
                self.store.list(collections::USERS, None)
            })
            .await?;

        Ok(docs
            .iter()
            .filter_map(|doc| match UserRecord::from_document(doc) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(id = %doc.id, error = %e, "Skipping malformed user document");
                    None
                }
            })
            .collect())
    }

    pub async fn set_user_role(&self, user_id: &str, role: Role) -> Result<()> {
        self.require_admin().await?;

        self.gateway
            .execute(operations::SET_USER_ROLE, || {
                self.store
                    .update(collections::USERS, user_id, json!({ "role": role.as_str() }))
            })
            .await?;

        tracing::info!(user_id, role = %role, "Role updated");
        Ok(())
    }

    /// Delete a user's document. Their identity provider account is untouched.
    pub async fn remove_user(&self, user_id: &str) -> Result<()> {
        self.require_admin().await?;

        self.gateway
            .execute(operations::DELETE_USER, || {
                self.store.delete(collections::USERS, user_id)
            })
            .await?;

        tracing::info!(user_id, "User deleted");
        Ok(())
    }

    /// Delete every audit log entry, returning how many were removed.
    pub async fn clear_audit_logs(&self) -> Result<usize> {
        self.require_admin().await?;

        let ids: Vec<String> = self
            .gateway
            .execute(operations::LOAD_AUDIT_LOGS, || {
                self.store.list(collections::AUDIT_LOGS, None)
            })
            .await?
            .into_iter()
            .map(|doc| doc.id)
            .collect();

        if ids.is_empty() {
            return Ok(0);
        }

        let deleted = self
            .gateway
            .execute(operations::CLEAR_AUDIT_LOGS, || {
                self.store.delete_many(collections::AUDIT_LOGS, &ids)
            })
            .await?;

        tracing::info!(deleted, "Audit logs cleared");
        Ok(deleted)
    }
}
