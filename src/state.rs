// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-process application state.
//!
//! Field groups have one owner each:
//! - `identity`: auth service only
//! - `ui`: the feature whose selection it is
//! - `live_match`: scoreboard service
//! - `players`: player profile service
//! - `subscriptions`: whoever opens a subscription registers it here
//!
//! Any service may read any field.

use crate::db::SubscriptionRegistry;
use crate::models::{PlayerProfile, Role};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared between the services of one running client.
pub type SharedState = Arc<RwLock<AppState>>;

/// Season selection meaning "every season".
pub const ALL_TIME_SEASON: &str = "all-time";

/// Who is signed in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Option<Role>,
    pub is_logged_in: bool,
    /// Player profile linked to this account, if any
    pub player_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Match,
    Leaderboard,
    Stats,
    HeadToHead,
    MyProfile,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardSort {
    pub column: String,
    pub descending: bool,
}

impl Default for LeaderboardSort {
    fn default() -> Self {
        Self {
            column: "gamesWon".to_string(),
            descending: true,
        }
    }
}

/// Action waiting for the user to confirm it.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub action: String,
    pub data: Value,
}

/// Current UI selections.
#[derive(Debug, Clone, PartialEq)]
pub struct UiSelection {
    pub active_tab: Tab,
    pub active_season_id: Option<String>,
    pub selected_stats_season_id: String,
    pub selected_player_id: Option<String>,
    pub selected_fixture_id: Option<String>,
    pub confirmation: Option<Confirmation>,
    pub head_to_head: (Option<String>, Option<String>),
    pub leaderboard_sort: LeaderboardSort,
}

impl Default for UiSelection {
    fn default() -> Self {
        Self {
            active_tab: Tab::default(),
            active_season_id: None,
            selected_stats_season_id: ALL_TIME_SEASON.to_string(),
            selected_player_id: None,
            selected_fixture_id: None,
            confirmation: None,
            head_to_head: (None, None),
            leaderboard_sort: LeaderboardSort::default(),
        }
    }
}

/// One leg/game within a fixture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Game {
    pub player_ids: Vec<String>,
    pub winner_id: Option<String>,
}

/// The match being scored right now.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveMatch {
    pub fixture_id: Option<String>,
    pub players: Vec<String>,
    pub games: Vec<Game>,
    pub active_game_index: usize,
    /// Running score per player, seat order
    pub scores: Vec<u32>,
    /// Named stat counters per player, seat order
    pub stats: Vec<HashMap<String, u32>>,
}

/// The single mutable state record of a client.
#[derive(Debug, Default)]
pub struct AppState {
    pub identity: Identity,
    pub ui: UiSelection,
    pub live_match: LiveMatch,
    pub players: Vec<PlayerProfile>,
    pub subscriptions: SubscriptionRegistry,
}

impl AppState {
    pub fn shared() -> SharedState {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.identity.user_id.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.role
    }

    pub fn is_admin(&self) -> bool {
        self.identity.role.is_some_and(Role::is_admin)
    }

    /// Replace the signed-in identity. Only the auth service calls this.
    pub(crate) fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }

    pub(crate) fn clear_identity(&mut self) {
        self.identity = Identity::default();
    }

    /// Tear down everything tied to the signed-in user.
    ///
    /// Cancels all live subscriptions and returns how many there were.
    pub fn reset_for_sign_out(&mut self) -> usize {
        let cancelled = self.subscriptions.cancel_all();
        self.clear_identity();
        self.live_match = LiveMatch::default();
        self.ui.confirmation = None;
        self.ui.selected_fixture_id = None;
        cancelled
    }
}
