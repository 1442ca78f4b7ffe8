// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Match and leaderboard documents.

use crate::db::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Match document in the `matches` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Player IDs in seat order
    pub players: Vec<String>,
    /// Running score per player, same order as `players`
    pub scores: Vec<u32>,
    /// Creation time (epoch milliseconds)
    pub created_at: i64,
}

impl MatchRecord {
    /// New match with every score at zero.
    pub fn new(players: Vec<String>, created_at: i64) -> Self {
        let scores = vec![0; players.len()];
        Self {
            players,
            scores,
            created_at,
        }
    }
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub games_won: u32,
    pub games_lost: u32,
}

const UNKNOWN_NAME: &str = "Unknown";

fn count_field(data: &Value, field: &str) -> u32 {
    data[field]
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

impl LeaderboardEntry {
    /// Lenient conversion: each field falls back on its own, so a row is
    /// always rendered. Empty or missing names show as `Unknown`, unusable
    /// counts as 0.
    pub fn from_document(doc: &Document) -> Self {
        let name = doc.data["name"]
            .as_str()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_NAME)
            .to_string();

        Self {
            id: doc.id.clone(),
            name,
            games_won: count_field(&doc.data, "gamesWon"),
            games_lost: count_field(&doc.data, "gamesLost"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_match_has_zero_scores() {
        let record = MatchRecord::new(vec!["a".to_string(), "b".to_string()], 42);
        assert_eq!(record.scores, vec![0, 0]);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["createdAt"], 42);
    }

    #[test]
    fn test_leaderboard_defaults() {
        let entry = LeaderboardEntry::from_document(&Document::new("x", json!({})));
        assert_eq!(entry.name, "Unknown");
        assert_eq!(entry.games_won, 0);
        assert_eq!(entry.games_lost, 0);
        assert_eq!(entry.id, "x");
    }

    #[test]
    fn test_leaderboard_reads_camel_case() {
        let doc = Document::new("y", json!({ "name": "Ann", "gamesWon": 7, "gamesLost": 2 }));
        let entry = LeaderboardEntry::from_document(&doc);
        assert_eq!(entry.name, "Ann");
        assert_eq!(entry.games_won, 7);
        assert_eq!(entry.games_lost, 2);
    }

    #[test]
    fn test_malformed_leaderboard_document() {
        let doc = Document::new("z", json!({ "gamesWon": "lots" }));
        let entry = LeaderboardEntry::from_document(&doc);
        assert_eq!(entry.name, "Unknown");
        assert_eq!(entry.games_won, 0);
        assert_eq!(entry.id, "z");
    }

    #[test]
    fn test_leaderboard_fields_default_independently() {
        let doc = Document::new(
            "a",
            json!({ "name": "Ann", "gamesWon": 5, "gamesLost": null }),
        );
        let entry = LeaderboardEntry::from_document(&doc);
        assert_eq!(entry.name, "Ann");
        assert_eq!(entry.games_won, 5);
        assert_eq!(entry.games_lost, 0);

        let doc = Document::new("b", json!({ "name": "", "gamesWon": 2, "gamesLost": -1 }));
        let entry = LeaderboardEntry::from_document(&doc);
        assert_eq!(entry.name, "Unknown");
        assert_eq!(entry.games_won, 2);
        assert_eq!(entry.games_lost, 0);
    }
}
