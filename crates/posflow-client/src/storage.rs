//! # Key/Value Storage
//!
//! The two stores the client context persists state into.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storage Tiers                                    │
//! │                                                                         │
//! │  FileStore (durable)                 MemoryStore (session)              │
//! │  ───────────────────                 ─────────────────────              │
//! │  storage.json in the data dir        HashMap behind a Mutex             │
//! │  survives restarts                   dies with the PosClient            │
//! │                                                                         │
//! │  token        bearer credential      productsCache  serialized catalog │
//! │  user         signed-in user record                                     │
//! │  todayStats   day-level figures                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Fixed storage keys.
pub mod keys {
    /// Bearer token (durable).
    pub const TOKEN: &str = "token";
    /// Serialized signed-in user (durable).
    pub const USER: &str = "user";
    /// Serialized product cache entry (session).
    pub const PRODUCTS_CACHE: &str = "productsCache";
    /// Day-level statistics shown by the POS headers (durable, read-only here).
    pub const TODAY_STATS: &str = "todayStats";
}

/// File name of the durable store inside the data directory.
pub const STORE_FILE_NAME: &str = "storage.json";

// =============================================================================
// Trait
// =============================================================================

/// String key/value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
}

impl dyn KeyValueStore {
    /// Reads and parses a JSON value.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> ClientResult<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serializes and stores a JSON value.
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> ClientResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// Memory Store
// =============================================================================

/// Session-scoped store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

// =============================================================================
// File Store
// =============================================================================

/// Durable store backed by a single JSON object file.
///
/// The whole map is kept in memory and rewritten on every mutation; the
/// file holds a handful of small records so this stays cheap.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Opens (or creates) the store file at `path`.
    ///
    /// A corrupt file is logged and replaced by an empty store rather than
    /// locking the cashier out.
    pub fn open(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(?path, error = %e, "Durable store is corrupt, starting empty");
                    HashMap::new()
                }
            }
        } else {
            debug!(?path, "Durable store not found, starting empty");
            HashMap::new()
        };

        Ok(FileStore {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Opens `storage.json` inside `dir`, creating the directory if needed.
    pub fn open_in(dir: &Path) -> ClientResult<Self> {
        std::fs::create_dir_all(dir)?;
        Self::open(dir.join(STORE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> ClientResult<()> {
        let raw = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| ClientError::Storage(format!("{}: {}", self.path.display(), e)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}
