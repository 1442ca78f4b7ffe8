// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, restore, sign-out and what each leaves behind.

use darts_scorekeeper::db::DocumentStore;
use darts_scorekeeper::middleware::session::{keys, SESSION_DURATION_MS};
use darts_scorekeeper::models::Role;
use darts_scorekeeper::services::KeyValueStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod common;
use common::TestClient;

#[tokio::test]
async fn test_sign_in_persists_session_record() {
    let client = TestClient::new();
    let user = client
        .ctx
        .auth()
        .sign_in_with_email("ann@example.com", "secret")
        .await
        .unwrap();

    assert_eq!(user.role, Role::Viewer);
    assert_eq!(client.storage.get(keys::ROLE).as_deref(), Some("viewer"));
    assert_eq!(client.storage.get(keys::LOGGED_IN).as_deref(), Some("true"));
    assert_eq!(
        client.storage.get(keys::EMAIL).as_deref(),
        Some("ann@example.com")
    );
    assert_eq!(client.storage.get(keys::USER_ID), Some(user.user_id));
    assert!(client.storage.get(keys::LOGIN_TIMESTAMP).is_some());
}

#[tokio::test]
async fn test_failed_sign_in_leaves_nothing_behind() {
    let client = TestClient::new();
    let result = client
        .ctx
        .auth()
        .sign_in_with_email("ann@example.com", "wrong")
        .await;

    assert!(result.is_err());
    assert!(client.storage.is_empty());
    assert!(!client.ctx.state.read().await.identity.is_logged_in);
}

#[tokio::test]
async fn test_tampered_role_is_purged_on_restore() {
    let client = TestClient::new();
    client.ctx.auth().sign_in_with_google("ann").await.unwrap();

    client.storage.set(keys::ROLE, "superuser").unwrap();

    assert!(client.ctx.auth().restore_session().await.is_none());
    assert!(client.storage.is_empty());
}

#[tokio::test]
async fn test_session_survives_until_eight_hours() {
    let client = TestClient::new();
    client.sign_in_as("ann", Role::Scorer).await;

    client
        .clock
        .advance(chrono::Duration::milliseconds(SESSION_DURATION_MS));
    let restored = client.ctx.auth().restore_session().await.unwrap();
    assert_eq!(restored.role, Role::Scorer);

    client.clock.advance(chrono::Duration::milliseconds(1));
    assert!(client.ctx.auth().restore_session().await.is_none());
    assert!(client.storage.is_empty());
}

#[tokio::test]
async fn test_sign_out_cancels_leaderboard_subscription() {
    let client = TestClient::new();
    client.ctx.auth().sign_in_with_google("ann").await.unwrap();

    let updates = Arc::new(AtomicUsize::new(0));
    let counter = updates.clone();
    client
        .ctx
        .scoreboard()
        .subscribe_leaderboard(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();
    assert_eq!(updates.load(Ordering::SeqCst), 1);
    assert_eq!(client.store.listener_count(), 1);

    client.ctx.auth().sign_out().await.unwrap();
    assert_eq!(client.store.listener_count(), 0);
    assert!(client.ctx.state.read().await.subscriptions.is_empty());

    client
        .store
        .set("leaderboard", "p1", serde_json::json!({ "gamesWon": 1 }))
        .await
        .unwrap();
    assert_eq!(updates.load(Ordering::SeqCst), 1);
    assert!(client.storage.is_empty());
}

#[tokio::test]
async fn test_sign_out_clears_live_match() {
    let client = TestClient::new();
    client.ctx.auth().sign_in_with_google("ann").await.unwrap();
    let scoreboard = client.ctx.scoreboard();
    scoreboard
        .start_match(vec!["p1".into(), "p2".into()])
        .await
        .unwrap();

    client.ctx.auth().sign_out().await.unwrap();

    assert_eq!(scoreboard.finish_match().await, None);
    assert_eq!(scoreboard.score_line().await, "");
    let state = client.ctx.state.read().await;
    assert!(state.identity.user_id.is_none());
    assert!(state.role().is_none());
}
