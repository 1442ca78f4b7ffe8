// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Used in offline mode and by tests. Listeners are notified synchronously
//! after each write to their collection.

use crate::db::store::{merge_fields, Document, DocumentStore, OrderBy};
use crate::db::subscription::{SnapshotCallback, SubscriptionHandle};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

struct Listener {
    collection: String,
    order: Option<OrderBy>,
    callback: SnapshotCallback,
}

#[derive(Default)]
struct Inner {
    collections: DashMap<String, BTreeMap<String, Value>>,
    listeners: DashMap<u64, Listener>,
    next_listener: AtomicU64,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

/// Document store held entirely in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations attempted so far.
    pub fn call_count(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Simulate the backend going away: every operation fails until restored.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    fn begin(&self) -> Result<()> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::RemoteOperationFailed(
                "Document store unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn snapshot(&self, collection: &str, order: Option<&OrderBy>) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order {
            docs.sort_by(|a, b| order.compare(a, b));
        }
        docs
    }

    fn notify(&self, collection: &str) {
        // Collect first so no map guard is held while callbacks run.
        let listeners: Vec<(Option<OrderBy>, SnapshotCallback)> = self
            .inner
            .listeners
            .iter()
            .filter(|l| l.collection == collection)
            .map(|l| (l.order.clone(), l.callback.clone()))
            .collect();

        for (order, callback) in listeners {
            callback(self.snapshot(collection, order.as_ref()));
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.begin()?;
        Ok(self
            .inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned())
            .map(|data| Document::new(id, data)))
    }

    async fn list(&self, collection: &str, order: Option<&OrderBy>) -> Result<Vec<Document>> {
        self.begin()?;
        Ok(self.snapshot(collection, order))
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String> {
        self.begin()?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), data);
        self.notify(collection);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        self.begin()?;
        self.inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        self.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        self.begin()?;
        {
            let mut docs = self
                .inner
                .collections
                .get_mut(collection)
                .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;
            let existing = docs
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;
            merge_fields(existing, fields);
        }
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.begin()?;
        let removed = self
            .inner
            .collections
            .get_mut(collection)
            .and_then(|mut docs| docs.remove(id))
            .is_some();
        if removed {
            self.notify(collection);
        }
        Ok(())
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<usize> {
        self.begin()?;
        let removed = match self.inner.collections.get_mut(collection) {
            Some(mut docs) => ids.iter().filter(|id| docs.remove(*id).is_some()).count(),
            None => 0,
        };
        if removed > 0 {
            self.notify(collection);
        }
        Ok(removed)
    }

    async fn subscribe(
        &self,
        collection: &str,
        order: Option<OrderBy>,
        on_snapshot: SnapshotCallback,
    ) -> Result<SubscriptionHandle> {
        self.begin()?;
        let key = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);

        on_snapshot(self.snapshot(collection, order.as_ref()));

        self.inner.listeners.insert(
            key,
            Listener {
                collection: collection.to_string(),
                order,
                callback: on_snapshot,
            },
        );

        let inner = Arc::downgrade(&self.inner);
        Ok(SubscriptionHandle::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.remove(&key);
            }
        }))
    }
}
