// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live match scoring and the leaderboard feed.

use crate::db::{collections, DocumentStore, OrderBy, SnapshotCallback};
use crate::error::{AppError, Result};
use crate::middleware::gateway::operations;
use crate::middleware::Gateway;
use crate::models::{LeaderboardEntry, MatchRecord};
use crate::state::{LiveMatch, SharedState};
use crate::time_utils::{now_millis, SharedClock};
use crate::AppContext;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Leaderboard ordering field.
const GAMES_WON: &str = "gamesWon";

pub struct ScoreboardService {
    store: Arc<dyn DocumentStore>,
    gateway: Gateway,
    clock: SharedClock,
    state: SharedState,
}

impl ScoreboardService {
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            store: ctx.store.clone(),
            gateway: ctx.gateway.clone(),
            clock: ctx.clock.clone(),
            state: ctx.state.clone(),
        }
    }

    /// Create a match document for `players` and make it the live match.
    pub async fn start_match(&self, players: Vec<String>) -> Result<String> {
        let record = MatchRecord::new(players.clone(), now_millis(&self.clock));
        let data = serde_json::to_value(&record).map_err(anyhow::Error::from)?;

        let id = self
            .gateway
            .execute(operations::START_MATCH, || {
                self.store.add(collections::MATCHES, data)
            })
            .await?;

        let seats = players.len();
        self.state.write().await.live_match = LiveMatch {
            fixture_id: Some(id.clone()),
            players,
            scores: vec![0; seats],
            stats: vec![HashMap::new(); seats],
            ..LiveMatch::default()
        };

        tracing::info!(match_id = %id, seats, "Match started");
        Ok(id)
    }

    /// Write the running scores of a match.
    ///
    /// An empty `match_id` is ignored. When it is the live match the scores
    /// are mirrored into state.
    pub async fn update_scores(&self, match_id: &str, scores: Vec<u32>) -> Result<()> {
        if match_id.is_empty() {
            return Ok(());
        }

        self.gateway
            .execute(operations::UPDATE_SCORES, || {
                self.store
                    .update(collections::MATCHES, match_id, json!({ "scores": scores }))
            })
            .await?;

        let mut state = self.state.write().await;
        if state.live_match.fixture_id.as_deref() == Some(match_id) {
            state.live_match.scores = scores;
        }
        Ok(())
    }

    /// Watch the leaderboard, best record first.
    ///
    /// `on_update` gets the full board now and after every change. Returns the
    /// subscription ID; the subscription ends on sign-out.
    pub async fn subscribe_leaderboard<F>(&self, on_update: F) -> Result<u64>
    where
        F: Fn(Vec<LeaderboardEntry>) + Send + Sync + 'static,
    {
        let callback: SnapshotCallback = Arc::new(move |docs| {
            on_update(docs.iter().map(LeaderboardEntry::from_document).collect())
        });

        let handle = self
            .gateway
            .execute(operations::SUBSCRIBE_LEADERBOARD, || {
                self.store.subscribe(
                    collections::LEADERBOARD,
                    Some(OrderBy::desc(GAMES_WON)),
                    callback,
                )
            })
            .await?;

        let id = self.state.write().await.subscriptions.register(handle);
        tracing::debug!(subscription = id, "Leaderboard subscription opened");
        Ok(id)
    }

    /// Stop one subscription early. Returns whether it was still open.
    pub async fn unsubscribe(&self, id: u64) -> bool {
        self.state.write().await.subscriptions.cancel(id)
    }

    /// Add `delta` to a per-player stat counter, never going below zero.
    pub async fn adjust_stat(&self, player_index: usize, stat: &str, delta: i32) -> Result<u32> {
        let mut state = self.state.write().await;
        let stats = &mut state.live_match.stats;
        if player_index >= stats.len() {
            return Err(AppError::InvalidInput(format!(
                "No player at seat {}",
                player_index
            )));
        }

        let counter = stats[player_index].entry(stat.to_string()).or_insert(0);
        *counter = counter.saturating_add_signed(delta);
        Ok(*counter)
    }

    /// End the live match, returning its fixture ID if one was running.
    pub async fn finish_match(&self) -> Option<String> {
        let fixture_id = self.state.read().await.live_match.fixture_id.clone();
        if let Some(id) = &fixture_id {
            tracing::info!(match_id = %id, "Match finished");
        }
        fixture_id
    }

    /// Running scores as shown on the board, e.g. `3 - 1`.
    pub async fn score_line(&self) -> String {
        format_score_line(&self.state.read().await.live_match.scores)
    }
}

fn format_score_line(scores: &[u32]) -> String {
    scores
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" - ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::TestHarness;
    use mockable::Clock;
    use std::sync::Mutex;

    fn pair() -> Vec<String> {
        vec!["p1".to_string(), "p2".to_string()]
    }

    #[tokio::test]
    async fn test_start_match_persists_zeroed_record() {
        let h = TestHarness::new();
        let scoreboard = h.ctx.scoreboard();

        let id = scoreboard.start_match(pair()).await.unwrap();

        let doc = h.store.get(collections::MATCHES, &id).await.unwrap().unwrap();
        assert_eq!(doc.data["players"], json!(["p1", "p2"]));
        assert_eq!(doc.data["scores"], json!([0, 0]));
        assert_eq!(
            doc.data["createdAt"],
            h.clock.utc().timestamp_millis()
        );

        let state = h.ctx.state.read().await;
        assert_eq!(state.live_match.fixture_id.as_deref(), Some(id.as_str()));
        assert_eq!(state.live_match.scores, vec![0, 0]);
    }

    #[tokio::test]
    async fn test_update_scores() {
        let h = TestHarness::new();
        let scoreboard = h.ctx.scoreboard();
        let id = scoreboard.start_match(pair()).await.unwrap();

        scoreboard.update_scores(&id, vec![3, 1]).await.unwrap();

        let doc = h.store.get(collections::MATCHES, &id).await.unwrap().unwrap();
        assert_eq!(doc.data["scores"], json!([3, 1]));
        assert_eq!(doc.data["players"], json!(["p1", "p2"]));
        assert_eq!(scoreboard.score_line().await, "3 - 1");
    }

    #[tokio::test]
    async fn test_update_scores_without_match_is_noop() {
        let h = TestHarness::new();
        h.ctx.scoreboard().update_scores("", vec![1]).await.unwrap();
        assert_eq!(h.store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_leaderboard_subscription() {
        let h = TestHarness::new();
        h.store
            .set(collections::LEADERBOARD, "a", json!({ "name": "Ann", "gamesWon": 2 }))
            .await
            .unwrap();

        let seen: Arc<Mutex<Vec<Vec<LeaderboardEntry>>>> = Arc::default();
        let sink = seen.clone();
        let id = h
            .ctx
            .scoreboard()
            .subscribe_leaderboard(move |rows| sink.lock().unwrap().push(rows))
            .await
            .unwrap();

        h.store
            .set(collections::LEADERBOARD, "b", json!({ "gamesWon": 5 }))
            .await
            .unwrap();

        {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 2);
            let latest = &seen[1];
            assert_eq!(latest[0].name, "Unknown");
            assert_eq!(latest[0].games_won, 5);
            assert_eq!(latest[1].name, "Ann");
            assert_eq!(latest[1].games_lost, 0);
        }

        assert!(h.ctx.scoreboard().unsubscribe(id).await);
        assert_eq!(h.store.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_adjust_stat_floors_at_zero() {
        let h = TestHarness::new();
        let scoreboard = h.ctx.scoreboard();
        scoreboard.start_match(pair()).await.unwrap();

        assert_eq!(scoreboard.adjust_stat(1, "180s", 1).await.unwrap(), 1);
        assert_eq!(scoreboard.adjust_stat(1, "180s", -3).await.unwrap(), 0);
        assert_eq!(scoreboard.adjust_stat(0, "180s", -1).await.unwrap(), 0);
        assert!(scoreboard.adjust_stat(2, "180s", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_finish_match() {
        let h = TestHarness::new();
        let scoreboard = h.ctx.scoreboard();
        assert_eq!(scoreboard.finish_match().await, None);

        let id = scoreboard.start_match(pair()).await.unwrap();
        assert_eq!(scoreboard.finish_match().await, Some(id));
    }

    #[test]
    fn test_format_score_line() {
        assert_eq!(format_score_line(&[]), "");
        assert_eq!(format_score_line(&[501, 321]), "501 - 321");
    }
}
