// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User record stored in the `users` collection.

use crate::db::Document;
use crate::models::Role;
use serde::{Deserialize, Serialize};

/// User document (document ID is the identity provider's uid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Document ID, not stored as a field
    #[serde(skip)]
    pub id: String,
    /// Email address, if the identity provider shared one
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Role as stored; unknown values are kept raw so an admin can repair them
    #[serde(default)]
    pub role: Option<String>,
}

impl UserRecord {
    /// Build a record from a fetched document, keeping its ID.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let mut user: UserRecord = serde_json::from_value(doc.data.clone())?;
        user.id = doc.id.clone();
        Ok(user)
    }

    /// Stored role if it is one of the known roles.
    pub fn parsed_role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }
}
