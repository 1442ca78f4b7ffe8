// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collection-scoped document operations.

use crate::db::subscription::{SnapshotCallback, SubscriptionHandle};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;

/// A document as read from the store: its ID plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Single-field ordering for list and subscribe queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    /// Compare two documents the way the store orders them.
    ///
    /// Documents missing the field sort after those that have it.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ordering = match (a.data.get(&self.field), b.data.get(&self.field)) {
            (Some(x), Some(y)) => compare_values(x, y),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Remote document storage.
///
/// Every call here is a remote operation and must go through the gateway.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Read a whole collection, optionally ordered by one field.
    async fn list(&self, collection: &str, order: Option<&OrderBy>) -> Result<Vec<Document>>;

    /// Create a document with a generated ID and return that ID.
    async fn add(&self, collection: &str, data: Value) -> Result<String>;

    /// Create or replace a document.
    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()>;

    /// Merge `fields` into an existing document. Fails if it does not exist.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Delete several documents, returning how many were deleted.
    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<usize>;

    /// Watch a collection. `on_snapshot` receives the full (ordered) collection
    /// once immediately and again after every change.
    async fn subscribe(
        &self,
        collection: &str,
        order: Option<OrderBy>,
        on_snapshot: SnapshotCallback,
    ) -> Result<SubscriptionHandle>;
}

/// Merge the top-level keys of `fields` into `target`.
///
/// Non-object values replace the target outright.
pub(crate) fn merge_fields(target: &mut Value, fields: Value) {
    match (target.as_object_mut(), fields) {
        (Some(existing), Value::Object(update)) => {
            for (key, value) in update {
                existing.insert(key, value);
            }
        }
        (_, fields) => *target = fields,
    }
}
