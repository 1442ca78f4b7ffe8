// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed document store.
//!
//! Documents are exchanged as `serde_json::Value`; the typed models live in
//! `crate::models` and are converted by the feature services.

use crate::db::store::{merge_fields, Direction, Document, DocumentStore, OrderBy};
use crate::db::subscription::{SnapshotCallback, SubscriptionHandle};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use firestore::{
    FirestoreListenEvent, FirestoreListenerTarget, FirestoreMemListenStateStorage,
    FirestoreQueryDirection,
};
use gcloud_sdk::google::firestore::v1::target_change::TargetChangeType;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Metadata keys the Firestore deserializer adds next to the document fields.
const FIRESTORE_ID_FIELD: &str = "_firestore_id";
const FIRESTORE_META_PREFIX: &str = "_firestore_";

/// Quiet period after a change before a snapshot is delivered, so the
/// initial load and write bursts arrive as one callback.
const SNAPSHOT_SETTLE: Duration = Duration::from_millis(200);

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    next_target: Arc<AtomicU32>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            AppError::RemoteOperationFailed(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self::with_client(Some(client)))
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::RemoteOperationFailed(format!(
                "Failed to connect to Firestore Emulator: {}",
                e
            ))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self::with_client(Some(client)))
    }

    /// Create a disconnected client. All operations return an error.
    pub fn new_disconnected() -> Self {
        Self::with_client(None)
    }

    fn with_client(client: Option<firestore::FirestoreDb>) -> Self {
        Self {
            client,
            // Target ID 0 is reserved by the listen protocol.
            next_target: Arc::new(AtomicU32::new(1)),
        }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client.as_ref().ok_or_else(|| {
            AppError::RemoteOperationFailed("Database not connected (offline mode)".to_string())
        })
    }
}

fn remote_error(e: impl std::fmt::Display) -> AppError {
    AppError::RemoteOperationFailed(e.to_string())
}

/// Split the deserializer's metadata from the document fields.
fn into_document(fallback_id: &str, mut value: Value) -> Document {
    let mut id = fallback_id.to_string();

    if let Some(fields) = value.as_object_mut() {
        if let Some(Value::String(doc_id)) = fields.get(FIRESTORE_ID_FIELD) {
            id = doc_id.clone();
        }
        fields.retain(|key, _| !key.starts_with(FIRESTORE_META_PREFIX));
    }

    Document::new(id, value)
}

/// Last path segment of a full document name.
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Documents matching a listen target, maintained from the change stream.
#[derive(Debug, Default)]
struct ListenSnapshot {
    docs: BTreeMap<String, Document>,
}

impl ListenSnapshot {
    /// Apply one listen event. Returns whether the document set changed.
    fn apply(&mut self, event: FirestoreListenEvent) -> bool {
        match event {
            FirestoreListenEvent::DocumentChange(change) => {
                let Some(doc) = change.document else {
                    return false;
                };
                let id = document_id(&doc.name).to_string();

                if change.target_ids.is_empty() && !change.removed_target_ids.is_empty() {
                    return self.docs.remove(&id).is_some();
                }

                match firestore::FirestoreDb::deserialize_doc_to::<Value>(&doc) {
                    Ok(value) => {
                        self.docs.insert(id.clone(), into_document(&id, value));
                        true
                    }
                    Err(e) => {
                        tracing::warn!(doc = %doc.name, error = %e, "Skipping undecodable document");
                        false
                    }
                }
            }
            FirestoreListenEvent::DocumentDelete(deleted) => {
                self.docs.remove(document_id(&deleted.document)).is_some()
            }
            FirestoreListenEvent::DocumentRemove(removed) => {
                self.docs.remove(document_id(&removed.document)).is_some()
            }
            FirestoreListenEvent::TargetChange(change)
                if change.target_change_type == TargetChangeType::Reset as i32 =>
            {
                // The server resends the full state after a reset.
                self.docs.clear();
                true
            }
            _ => false,
        }
    }

    fn ordered(&self, order: Option<&OrderBy>) -> Vec<Document> {
        let mut docs: Vec<Document> = self.docs.values().cloned().collect();
        if let Some(order) = order {
            docs.sort_by(|a, b| order.compare(a, b));
        }
        docs
    }
}

impl From<Direction> for FirestoreQueryDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Ascending => FirestoreQueryDirection::Ascending,
            Direction::Descending => FirestoreQueryDirection::Descending,
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let value: Option<Value> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(remote_error)?;

        Ok(value.map(|v| into_document(id, v)))
    }

    async fn list(&self, collection: &str, order: Option<&OrderBy>) -> Result<Vec<Document>> {
        let query = self.get_client()?.fluent().select().from(collection);

        let values: Vec<Value> = match order {
            Some(order) => {
                query
                    .order_by([(
                        order.field.as_str(),
                        FirestoreQueryDirection::from(order.direction),
                    )])
                    .obj()
                    .query()
                    .await
            }
            None => query.obj().query().await,
        }
        .map_err(remote_error)?;

        Ok(values
            .into_iter()
            .map(|v| into_document("", v))
            .collect())
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.set(collection, &id, data).await?;
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(&data)
            .execute()
            .await
            .map_err(remote_error)?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        // We fetch-modify-write to preserve other fields
        let mut existing = self
            .get(collection, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;

        merge_fields(&mut existing.data, fields);
        self.set(collection, id, existing.data).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(remote_error)?;
        Ok(())
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> Result<usize> {
        let client = self.get_client()?;

        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = client.begin_transaction().await.map_err(|e| {
                AppError::RemoteOperationFailed(format!("Failed to begin transaction: {}", e))
            })?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::RemoteOperationFailed(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::RemoteOperationFailed(format!("Failed to commit batch deletion: {}", e))
            })?;

            tracing::debug!(collection, count = chunk.len(), "Committed batch deletion");
        }

        Ok(ids.len())
    }

    async fn subscribe(
        &self,
        collection: &str,
        order: Option<OrderBy>,
        on_snapshot: SnapshotCallback,
    ) -> Result<SubscriptionHandle> {
        let client = self.get_client()?;
        let target = FirestoreListenerTarget::new(self.next_target.fetch_add(1, Ordering::Relaxed));

        let mut listener = client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(remote_error)?;

        client
            .fluent()
            .select()
            .from(collection)
            .listen()
            .add_target(target, &mut listener)
            .map_err(remote_error)?;

        // Snapshots are built from the pushed changes and never re-read the
        // collection. Only opening the listener goes through the gateway, so
        // pushed updates are not counted against the caller's quota.
        let snapshot = Arc::new(Mutex::new(ListenSnapshot::default()));
        let changed = Arc::new(Notify::new());
        {
            let snapshot = snapshot.clone();
            let changed = changed.clone();
            listener
                .start(move |event| {
                    let snapshot = snapshot.clone();
                    let changed = changed.clone();
                    async move {
                        let dirty = snapshot
                            .lock()
                            .map(|mut docs| docs.apply(event))
                            .unwrap_or(false);
                        if dirty {
                            changed.notify_one();
                        }
                        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
                    }
                })
                .await
                .map_err(remote_error)?;
        }

        tracing::info!(collection, "Live subscription started");

        // Deliver a first snapshot even when the collection is empty.
        changed.notify_one();
        let emitter = tokio::spawn(async move {
            loop {
                changed.notified().await;
                tokio::time::sleep(SNAPSHOT_SETTLE).await;
                let docs = match snapshot.lock() {
                    Ok(docs) => docs.ordered(order.as_ref()),
                    Err(_) => break,
                };
                on_snapshot(docs);
            }
        });

        let (cancel_tx, cancel_rx) = tokio::sync::oneshot::channel::<()>();
        let watched = collection.to_string();
        tokio::spawn(async move {
            if cancel_rx.await.is_err() {
                // Handle dropped without cancel: keep listening for the
                // life of the process.
                std::future::pending::<()>().await;
            }
            emitter.abort();
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(collection = %watched, error = %e, "Listener shutdown failed");
            } else {
                tracing::info!(collection = %watched, "Live subscription stopped");
            }
        });

        Ok(SubscriptionHandle::new(move || {
            let _ = cancel_tx.send(());
        }))
    }
}
