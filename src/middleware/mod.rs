// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Guards every remote call passes through (validation, quotas, session).

pub mod gateway;
pub mod rate_limit;
pub mod session;
pub mod validation;

pub use gateway::{operations, Gateway};
pub use rate_limit::{Quota, QuotaTable, RateLimiter};
pub use session::{PersistedSession, SessionGuard};
pub use validation::{validate_input, DEFAULT_MAX_LENGTH};
