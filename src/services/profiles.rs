// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Player profile management.
//!
//! The service keeps `state.players` in sync with the `players` collection:
//! every change is followed by a full reload.

use crate::db::{collections, DocumentStore};
use crate::error::{AppError, Result};
use crate::middleware::gateway::operations;
use crate::middleware::validation::validate_input;
use crate::middleware::Gateway;
use crate::models::PlayerProfile;
use crate::state::SharedState;
use crate::AppContext;
use serde_json::json;
use std::sync::Arc;

/// Longest accepted name or nickname, in characters.
pub const MAX_NAME_LENGTH: usize = 50;

pub struct PlayerProfileService {
    store: Arc<dyn DocumentStore>,
    gateway: Gateway,
    state: SharedState,
}

impl PlayerProfileService {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            store: ctx.store.clone(),
            gateway: ctx.gateway.clone(),
            state: ctx.state.clone(),
        }
    }

    /// Fetch all profiles and replace the cached list.
    pub async fn load_profiles(&self) -> Result<Vec<PlayerProfile>> {
        let docs = self
            .gateway
            .execute(operations::LOAD_PROFILES, || {
                self.store.list(collections::PLAYERS, None)
            })
            .await?;

        let profiles: Vec<PlayerProfile> = docs
            .iter()
            .filter_map(|doc| match PlayerProfile::from_document(doc) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(id = %doc.id, error = %e, "Skipping malformed player document");
                    None
                }
            })
            .collect();

        tracing::debug!(count = profiles.len(), "Player profiles loaded");
        self.state.write().await.players = profiles.clone();
        Ok(profiles)
    }

    /// Create a profile and return its ID.
    pub async fn create_profile(&self, name: &str, nickname: &str) -> Result<String> {
        let (name, nickname) = validate_profile(name, nickname)?;

        let id = self
            .gateway
            .execute(operations::CREATE_PROFILE, || {
                self.store.add(
                    collections::PLAYERS,
                    json!({ "name": name, "nickname": nickname }),
                )
            })
            .await?;

        tracing::info!(id = %id, "Player profile created");
        self.load_profiles().await?;
        Ok(id)
    }

    pub async fn update_profile(&self, id: &str, name: &str, nickname: &str) -> Result<()> {
        let (name, nickname) = validate_profile(name, nickname)?;

        self.gateway
            .execute(operations::UPDATE_PROFILE, || {
                self.store.update(
                    collections::PLAYERS,
                    id,
                    json!({ "name": name, "nickname": nickname }),
                )
            })
            .await?;

        self.load_profiles().await?;
        Ok(())
    }

    pub async fn delete_profile(&self, id: &str) -> Result<()> {
        self.gateway
            .execute(operations::DELETE_PROFILE, || {
                self.store.delete(collections::PLAYERS, id)
            })
            .await?;

        tracing::info!(id, "Player profile deleted");
        self.load_profiles().await?;
        Ok(())
    }
}

fn validate_profile(name: &str, nickname: &str) -> Result<(String, String)> {
    let name = validate_input(name, MAX_NAME_LENGTH)?;
    let nickname = validate_input(nickname, MAX_NAME_LENGTH)?;
    if name.is_empty() {
        return Err(AppError::InvalidInput("Name is required".to_string()));
    }
    Ok((name, nickname))
}
