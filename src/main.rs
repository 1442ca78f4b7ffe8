// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Darts scorekeeper client
//!
//! Restores the persisted sign-in, then follows the leaderboard and logs
//! every update until interrupted.

use darts_scorekeeper::{
    config::Config,
    db::{DocumentStore, FirestoreDb, MemoryStore},
    services::{FileKeyValueStore, FirebaseAuthClient},
    time_utils::system_clock,
    AppContext,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        project = %config.gcp_project_id,
        offline = config.offline,
        "Starting darts scorekeeper"
    );

    let store: Arc<dyn DocumentStore> = if config.offline {
        tracing::info!("Offline mode, using in-memory document store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FirestoreDb::new(&config.gcp_project_id).await?)
    };

    let identity = Arc::new(FirebaseAuthClient::new(&config)?);
    let storage = Arc::new(FileKeyValueStore::open(&config.session_file));
    tracing::info!(path = %config.session_file.display(), "Session storage opened");

    let ctx = AppContext::new(config, store, identity, storage, system_clock());

    match ctx.auth().restore_session().await {
        Some(user) => tracing::info!(user_id = %user.user_id, role = %user.role, "Signed in"),
        None => tracing::info!("No active session, browsing anonymously"),
    }

    ctx.scoreboard()
        .subscribe_leaderboard(|rows| {
            for (rank, row) in rows.iter().enumerate() {
                tracing::info!(
                    rank = rank + 1,
                    name = %row.name,
                    won = row.games_won,
                    lost = row.games_lost,
                    "Leaderboard"
                );
            }
        })
        .await?;

    tokio::signal::ctrl_c().await?;

    let cancelled = ctx.state.write().await.subscriptions.cancel_all();
    tracing::info!(cancelled, "Shutting down");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("darts_scorekeeper=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
