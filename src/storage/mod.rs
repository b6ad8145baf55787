//! Local persistence adapter.
//!
//! A small key-value abstraction over JSON strings stored under namespaced
//! keys. The file-backed implementation keeps one file per key under an app
//! data directory; the in-memory implementation backs tests and throwaway
//! sessions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::info;
use serde::{Deserialize, Serialize};

use crate::constants::{STORAGE_KEY_APP_META, STORAGE_SCHEMA_VERSION};
use crate::errors::{Result, StorageError};

/// Contract the core needs from its environment: get/set/remove a string
/// value by key. Values are JSON documents; keys come from `constants`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Volatile store used in tests and for purely in-memory sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one `<key>.json` file per key under a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StorageError::InitFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        info!("Initialized file store at {}", dir.display());
        Ok(FileStore { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value).map_err(|e| {
            StorageError::WriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AppMeta {
    version: u32,
}

/// Writes the schema-version marker on first use of a store.
pub fn ensure_metadata(store: &dyn KeyValueStore) -> Result<()> {
    if store.get(STORAGE_KEY_APP_META)?.is_none() {
        let meta = AppMeta {
            version: STORAGE_SCHEMA_VERSION,
        };
        store.set(STORAGE_KEY_APP_META, &serde_json::to_string(&meta)?)?;
        info!("Wrote storage metadata (schema v{})", STORAGE_SCHEMA_VERSION);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get("k").unwrap().is_none());

        store.set("k", "[1,2,3]").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[1,2,3]"));

        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = FileStore::new(dir.path()).unwrap();
            store.set("pocketbudget.transactions", "[]").unwrap();
        }

        let reopened = FileStore::new(dir.path()).unwrap();
        assert_eq!(
            reopened.get("pocketbudget.transactions").unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn file_store_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.remove("missing").unwrap();
        store.set("k", "{}").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn metadata_written_once() {
        let store = MemoryStore::new();
        ensure_metadata(&store).unwrap();
        let first = store.get(STORAGE_KEY_APP_META).unwrap().unwrap();

        ensure_metadata(&store).unwrap();
        assert_eq!(store.get(STORAGE_KEY_APP_META).unwrap().unwrap(), first);
    }
}
