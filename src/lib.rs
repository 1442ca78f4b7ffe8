// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Darts scorekeeper: client core for scoring darts fixtures
//!
//! This crate holds the non-UI half of the scorekeeper: sign-in and the
//! persisted session, rate-limited access to the document store and identity
//! provider, and the feature services built on top of them.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use middleware::{Gateway, SessionGuard};
use services::{
    AdminService, AuthService, IdentityProvider, KeyValueStore, PlayerProfileService,
    ScoreboardService,
};
use state::{AppState, SharedState};
use std::sync::Arc;
use time_utils::SharedClock;

/// Everything a feature service needs, built once and passed around.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub session: SessionGuard,
    pub gateway: Gateway,
    pub clock: SharedClock,
    pub state: SharedState,
}

impl AppContext {
    /// Wire the collaborators together around a fresh [`AppState`].
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn KeyValueStore>,
        clock: SharedClock,
    ) -> Self {
        let state = AppState::shared();
        let gateway = Gateway::new(config.quotas.clone(), clock.clone(), state.clone());
        let session = SessionGuard::new(storage, clock.clone());

        Self {
            config,
            store,
            identity,
            session,
            gateway,
            clock,
            state,
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self)
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(self)
    }

    pub fn profiles(&self) -> PlayerProfileService {
        PlayerProfileService::new(self)
    }

    pub fn scoreboard(&self) -> ScoreboardService {
        ScoreboardService::new(self)
    }
}
