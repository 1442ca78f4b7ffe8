// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Player profile stored in the `players` collection.

use crate::db::Document;
use serde::{Deserialize, Deserializer, Serialize};

/// A player that can take part in fixtures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nickname: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl PlayerProfile {
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let mut player: PlayerProfile = serde_json::from_value(doc.data.clone())?;
        player.id = doc.id.clone();
        Ok(player)
    }

    /// Label used in lists and selectors: `Name (Nick)` or just `Name`.
    pub fn display_label(&self) -> String {
        if self.nickname.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.nickname)
        }
    }
}
