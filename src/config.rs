// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use crate::middleware::rate_limit::{Quota, QuotaTable};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default quota applied to every gateway operation.
pub const DEFAULT_RATE_LIMIT: u32 = 50;
/// Default sliding window for the gateway quota.
pub const DEFAULT_RATE_WINDOW_MS: u64 = 60_000;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project hosting Firestore and Firebase Authentication
    pub gcp_project_id: String,
    /// Firebase Web API key (public, identifies the project to Identity Toolkit)
    pub firebase_api_key: String,
    /// Optional Firebase Auth emulator host, e.g. `localhost:9099`
    pub auth_emulator_host: Option<String>,
    /// Run against in-memory collaborators only
    pub offline: bool,
    /// Where the persisted session record lives
    pub session_file: PathBuf,
    /// Gateway quotas
    pub quotas: QuotaTable,
}

impl Config {
    /// Config for tests: offline, default quotas.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            firebase_api_key: "test-api-key".to_string(),
            auth_emulator_host: None,
            offline: true,
            session_file: PathBuf::from(".darts-session.test.json"),
            quotas: QuotaTable::new(Quota::new(
                DEFAULT_RATE_LIMIT,
                Duration::from_millis(DEFAULT_RATE_WINDOW_MS),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let offline = env::var("DARTS_OFFLINE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let gcp_project_id = match env::var("GCP_PROJECT_ID") {
            Ok(v) => v.trim().to_string(),
            Err(_) if offline => "offline".to_string(),
            Err(_) => return Err(ConfigError::Missing("GCP_PROJECT_ID")),
        };

        let firebase_api_key = match env::var("FIREBASE_API_KEY") {
            Ok(v) => v.trim().to_string(),
            Err(_) if offline => String::new(),
            Err(_) => return Err(ConfigError::Missing("FIREBASE_API_KEY")),
        };

        let default_limit = parse_var("RATE_LIMIT_DEFAULT", DEFAULT_RATE_LIMIT)?;
        let window_ms = parse_var("RATE_LIMIT_WINDOW_MS", DEFAULT_RATE_WINDOW_MS)?;
        let window = Duration::from_millis(window_ms);

        let overrides = match env::var("RATE_LIMIT_OVERRIDES") {
            Ok(raw) => parse_overrides(&raw, window)?,
            Err(_) => HashMap::new(),
        };

        Ok(Self {
            gcp_project_id,
            firebase_api_key,
            auth_emulator_host: env::var("FIREBASE_AUTH_EMULATOR_HOST").ok(),
            offline,
            session_file: env::var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".darts-session.json")),
            quotas: QuotaTable::new(Quota::new(default_limit, window)).with_overrides(overrides),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Parse `op=limit,op=limit` into per-operation quotas sharing one window.
fn parse_overrides(raw: &str, window: Duration) -> Result<HashMap<String, Quota>, ConfigError> {
    let mut overrides = HashMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let invalid = || ConfigError::Invalid {
            name: "RATE_LIMIT_OVERRIDES",
            value: entry.to_string(),
        };

        let (operation, limit) = entry.split_once('=').ok_or_else(invalid)?;
        let limit: u32 = limit.trim().parse().map_err(|_| invalid())?;
        overrides.insert(operation.trim().to_string(), Quota::new(limit, window));
    }

    Ok(overrides)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
