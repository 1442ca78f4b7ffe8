// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-identity, per-operation rate limiting over a trailing window.
//!
//! Each key keeps the timestamps of its recent allowed calls. A check drops
//! the ones older than the window, rejects if `limit` remain, and otherwise
//! records the new call.

use crate::error::{AppError, Result};
use crate::time_utils::{now_millis, SharedClock};
use dashmap::DashMap;
use std::collections::HashMap;
use std::time::Duration;

/// Identity used when nobody is signed in.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Allowed number of calls within a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub window: Duration,
}

impl Quota {
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Quota per operation name, with a default for everything else.
#[derive(Debug, Clone)]
pub struct QuotaTable {
    default: Quota,
    overrides: HashMap<String, Quota>,
}

impl QuotaTable {
    pub fn new(default: Quota) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, Quota>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    pub fn with_override(mut self, operation: impl Into<String>, quota: Quota) -> Self {
        self.overrides.insert(operation.into(), quota);
        self
    }

    pub fn for_operation(&self, operation: &str) -> Quota {
        self.overrides
            .get(operation)
            .copied()
            .unwrap_or(self.default)
    }
}

/// Timestamps (epoch ms) of recent allowed calls, keyed by `identity-operation`.
pub type WindowRecords = DashMap<String, Vec<i64>>;

/// Sliding-window rate limiter.
///
/// Records are created on first use and never removed, so memory grows with
/// the number of distinct identities seen by this process.
pub struct RateLimiter {
    windows: WindowRecords,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }

    /// Allow the call or fail with `RateLimitExceeded`.
    ///
    /// The check and the record happen under the entry's shard lock, so two
    /// tasks racing on the same key cannot both take the last slot.
    pub fn check_and_block(
        &self,
        identity: Option<&str>,
        operation: &str,
        quota: Quota,
    ) -> Result<()> {
        let identity = identity
            .filter(|id| !id.is_empty())
            .unwrap_or(ANONYMOUS_IDENTITY);
        let key = format!("{}-{}", identity, operation);
        let now = now_millis(&self.clock);
        let window_ms = quota.window_ms();

        let mut timestamps = self.windows.entry(key).or_default();
        timestamps.retain(|&t| now.saturating_sub(t) < window_ms);

        if timestamps.len() >= quota.limit as usize {
            tracing::warn!(
                identity,
                operation,
                limit = quota.limit,
                window_ms,
                "Rate limit exceeded"
            );
            return Err(AppError::RateLimitExceeded {
                operation: operation.to_string(),
            });
        }

        timestamps.push(now);
        Ok(())
    }

    /// Calls currently counted against a key (without pruning).
    pub fn recorded(&self, identity: &str, operation: &str) -> usize {
        self.windows
            .get(&format!("{}-{}", identity, operation))
            .map(|t| t.len())
            .unwrap_or(0)
    }
}
