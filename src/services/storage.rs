// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable client-side key-value storage for the session record.

use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Synchronous string key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Write several entries as one change.
    fn set_all(&self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several keys as one change.
    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// In-memory storage (tests, offline runs without a session file).
///
/// One lock covers the whole map, so batched writes and removals are seen
/// by readers all at once.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn modify(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Storage("session storage lock poisoned".to_string()))?;
        change(&mut entries);
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.modify(|entries| {
            entries.remove(key);
        })
    }

    fn set_all(&self, batch: &[(&str, String)]) -> Result<()> {
        self.modify(|entries| {
            for (key, value) in batch {
                entries.insert(key.to_string(), value.clone());
            }
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        self.modify(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

/// Storage persisted as a JSON object in a single file.
///
/// Every change rewrites the file through a temporary file and a rename, so
/// a batch of changes lands on disk all together or not at all.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// An unreadable or corrupt file is treated as empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt session file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read session file");
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn modify(&self, change: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Storage("session storage lock poisoned".to_string()))?;

        let mut updated = entries.clone();
        change(&mut updated);
        self.write(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                AppError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
            })
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.modify(|entries| {
            entries.remove(key);
        })
    }

    fn set_all(&self, batch: &[(&str, String)]) -> Result<()> {
        self.modify(|entries| {
            for (key, value) in batch {
                entries.insert(key.to_string(), value.clone());
            }
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<()> {
        self.modify(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryKeyValueStore::new();
        store.set("a", "1").unwrap();
        store.set_all(&[("b", "2".to_string()), ("c", "3".to_string())]).unwrap();
        assert_eq!(store.get("b").as_deref(), Some("2"));

        store.remove_all(&["a", "b"]).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("a").is_none());
    }

    #[test]
    fn test_memory_store_purge_is_never_partial() {
        use std::sync::Arc;

        const KEYS: [&str; 5] = ["a", "b", "c", "d", "e"];
        let store = Arc::new(MemoryKeyValueStore::new());
        let batch: Vec<(&str, String)> = KEYS.iter().map(|k| (*k, "v".to_string())).collect();

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..500 {
                    store.set_all(&batch).unwrap();
                    store.remove_all(&KEYS).unwrap();
                }
            })
        };

        for _ in 0..2_000 {
            let seen = store.len();
            assert!(seen == 0 || seen == KEYS.len(), "saw {seen} of {} keys", KEYS.len());
        }
        writer.join().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileKeyValueStore::open(&path);
        store
            .set_all(&[("userId", "u1".to_string()), ("userRole", "admin".to_string())])
            .unwrap();
        drop(store);

        let reopened = FileKeyValueStore::open(&path);
        assert_eq!(reopened.get("userId").as_deref(), Some("u1"));

        reopened.remove_all(&["userId", "userRole"]).unwrap();
        let reopened = FileKeyValueStore::open(&path);
        assert!(reopened.get("userRole").is_none());
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileKeyValueStore::open(&path);
        assert!(store.get("userId").is_none());
        store.set("userId", "u2").unwrap();
        assert_eq!(FileKeyValueStore::open(&path).get("userId").as_deref(), Some("u2"));
    }
}
