//! Key-value persistence backends behind the token store.
//!
//! DESIGN
//! ======
//! One capability trait, two backends. `MemoryBackend` is a process-local map
//! (the browser-session analogue and the test default). `FileBackend` keeps a
//! single JSON object on disk so a session survives restarts on the device.
//!
//! `set_many` applies every entry as one write: the memory backend holds its
//! lock for the whole batch, and the file backend rewrites the file through a
//! temp file plus rename. A token pair therefore never lands half-written.
//!
//! A failed `remove_many` leaves every key in place. Logout retries the
//! clear once; if that also fails the session file still holds the tokens
//! and the next restore will pick them up.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::AuthError;

/// Async key-value storage. Missing keys are `Ok(None)`, never an error.
#[async_trait::async_trait]
pub trait KeyValueBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError>;

    /// Write all entries as a single unit.
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AuthError>;

    /// Remove all keys as a single unit. Absent keys are ignored.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), AuthError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AuthError> {
        let mut map = self.entries.lock().await;
        for (key, value) in entries {
            map.insert((*key).to_owned(), value.clone());
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), AuthError> {
        let mut map = self.entries.lock().await;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// JSON-object file store. All mutations are read-modify-write under an
/// in-process lock; the write itself is temp-file-then-rename.
pub struct FileBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    async fn read_all(&self) -> Result<HashMap<String, String>, AuthError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(storage_error("read", &self.path, &e)),
        };
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| AuthError::Storage(format!("{} is not a JSON object: {e}", self.path.display())))
    }

    async fn write_all(&self, map: &HashMap<String, String>) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("create dir for", &self.path, &e))?;
        }
        let raw = serde_json::to_string_pretty(map).map_err(|e| AuthError::Storage(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| storage_error("write", &tmp, &e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| storage_error("replace", &self.path, &e))
    }
}

#[async_trait::async_trait]
impl KeyValueBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        for (key, value) in entries {
            map.insert((*key).to_owned(), value.clone());
        }
        self.write_all(&map).await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() == before {
            return Ok(());
        }
        self.write_all(&map).await
    }
}

fn storage_error(action: &str, path: &Path, err: &std::io::Error) -> AuthError {
    AuthError::Storage(format!("failed to {action} {}: {err}", path.display()))
}

#[cfg(test)]
#[path = "backend_test.rs"]
mod backend_test;
