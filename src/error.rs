// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the core and the feature services.

/// Application error type.
///
/// Validation and quota errors are raised before any remote call is made.
/// Remote failures are carried through unchanged as `RemoteOperationFailed`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limit exceeded for {operation}. Please wait before trying again.")]
    RateLimitExceeded { operation: String },

    #[error("Not authorized")]
    Unauthorized,

    #[error("Remote operation failed: {0}")]
    RemoteOperationFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the caller may try the same operation again after waiting.
    ///
    /// Nothing in this crate retries automatically; this is a hint for the UI.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::RateLimitExceeded { .. })
    }

    /// Short machine-readable code for notifications.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::RateLimitExceeded { .. } => "rate_limited",
            AppError::Unauthorized => "unauthorized",
            AppError::RemoteOperationFailed(_) => "remote_error",
            AppError::NotFound(_) => "not_found",
            AppError::Storage(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
