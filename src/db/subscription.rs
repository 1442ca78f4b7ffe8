// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live subscription handles and the registry that owns them.

use crate::db::store::Document;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback invoked with the full collection snapshot on every change.
pub type SnapshotCallback = Arc<dyn Fn(Vec<Document>) + Send + Sync>;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Cancelable registration of a live query.
///
/// Dropping a handle does not cancel it; call [`SubscriptionHandle::cancel`]
/// or hand it to a [`SubscriptionRegistry`].
#[must_use = "a live subscription keeps running until cancelled"]
pub struct SubscriptionHandle {
    id: u64,
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SubscriptionHandle {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id: NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed),
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop receiving snapshots.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Outstanding subscriptions of the running client.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    handles: Vec<SubscriptionHandle>,
}

impl SubscriptionRegistry {
    /// Keep a handle until it is cancelled; returns its ID.
    pub fn register(&mut self, handle: SubscriptionHandle) -> u64 {
        let id = handle.id();
        self.handles.push(handle);
        id
    }

    /// Cancel one subscription. Returns false if the ID is unknown.
    pub fn cancel(&mut self, id: u64) -> bool {
        match self.handles.iter().position(|h| h.id() == id) {
            Some(index) => {
                self.handles.swap_remove(index).cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every subscription, returning how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.handles.len();
        for handle in self.handles.drain(..) {
            handle.cancel();
        }
        if count > 0 {
            tracing::debug!(count, "Cancelled live subscriptions");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
