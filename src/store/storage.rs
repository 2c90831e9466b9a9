// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key-value storage backends for the persisted session.
//!
//! Provides:
//! - `MemoryStorage` (process-local, for tests and embedded use)
//! - `FileStorage` (JSON object on disk, survives restarts)

use crate::error::AuthError;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Synchronous string key-value storage.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AuthError>;
    fn remove(&self, key: &str) -> Result<(), AuthError>;
}

/// In-memory storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash leaves either the old or the new contents.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents; a missing file reads as empty.
    fn read_raw(&self) -> Result<String, AuthError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(AuthError::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn parse(&self, raw: &str) -> Result<BTreeMap<String, String>, AuthError> {
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(raw).map_err(|e| {
            AuthError::Storage(format!("Corrupt session file {}: {}", self.path.display(), e))
        })
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, AuthError> {
        self.parse(&self.read_raw()?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                AuthError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
            })
    }

    fn update(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), AuthError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AuthError::Storage("Session file lock poisoned".to_string()))?;
        // A corrupt file is replaced rather than blocking every write.
        let mut entries = match self.parse(&self.read_raw()?) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt session file");
                BTreeMap::new()
            }
        };
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), AuthError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
