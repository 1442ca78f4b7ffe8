// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for clocks and timestamps.

use mockable::Clock;
use std::sync::Arc;

/// Clock shared by the rate limiter, session guard and services.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// The wall clock.
pub fn system_clock() -> SharedClock {
    Arc::new(mockable::DefaultClock)
}

/// Current time as epoch milliseconds.
pub fn now_millis(clock: &SharedClock) -> i64 {
    clock.utc().timestamp_millis()
}
