// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Free-text input validation.
//!
//! Everything a user types is passed through here before it is written to
//! the document store.

use crate::error::{AppError, Result};
use serde_json::Value;
use validator::ValidateEmail;

/// Default maximum length for free text, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 100;

/// Longest email address accepted.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Matched case-insensitively anywhere in the input.
const DENYLIST: [&str; 6] = [
    "<script",
    "javascript:",
    "data:",
    "vbscript:",
    "onload=",
    "onerror=",
];

/// Validate free text and return it trimmed.
///
/// Fails with `InvalidInput` when the text is longer than `max_length`
/// characters or contains script-like content.
pub fn validate_input(input: &str, max_length: usize) -> Result<String> {
    let length = input.chars().count();
    if length > max_length {
        return Err(AppError::InvalidInput(format!(
            "Input too long (max {} characters)",
            max_length
        )));
    }

    let lowered = input.to_ascii_lowercase();
    if DENYLIST.iter().any(|pattern| lowered.contains(pattern)) {
        return Err(AppError::InvalidInput(
            "Invalid characters detected".to_string(),
        ));
    }

    Ok(input.trim().to_string())
}

/// Like [`validate_input`] but for a possibly missing field.
pub fn validate_optional_input(input: Option<&str>, max_length: usize) -> Result<String> {
    match input {
        Some(text) => validate_input(text, max_length),
        None => Err(AppError::InvalidInput("Input must be a string".to_string())),
    }
}

/// Like [`validate_input`] for a JSON value; anything but a string is rejected.
pub fn validate_json_input(input: &Value, max_length: usize) -> Result<String> {
    validate_optional_input(input.as_str(), max_length)
}

/// Validate an email address and return it trimmed.
pub fn validate_email(input: &str) -> Result<String> {
    let email = validate_input(input, MAX_EMAIL_LENGTH)?;
    if !email.validate_email() {
        return Err(AppError::InvalidInput(format!(
            "Not a valid email address: {}",
            email
        )));
    }
    Ok(email)
}
