//! # Token Cache
//!
//! Keeps the bearer credential in memory so every request does not go back
//! to the durable store.
//!
//! There is no refresh-on-expiry: a stale token makes the next request fail
//! with 401/403 and the caller sends the user back to login.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::error::ClientResult;
use crate::storage::{keys, KeyValueStore};

/// Memory copy of the bearer token, backed by the durable store.
pub struct TokenCache {
    store: Arc<dyn KeyValueStore>,
    cached: Mutex<Option<String>>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        TokenCache {
            store,
            cached: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.cached.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the token, reading the durable store only while the memory
    /// copy is empty.
    pub fn get_token(&self) -> Option<String> {
        let mut slot = self.slot();
        if slot.is_none() {
            match self.store.get(keys::TOKEN) {
                Ok(Some(token)) if !token.is_empty() => {
                    debug!("Token cache populated from storage");
                    *slot = Some(token);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Failed to read token from storage"),
            }
        }
        slot.clone()
    }

    /// Persists a new token (login) and primes the memory copy.
    pub fn set_token(&self, token: &str) -> ClientResult<()> {
        self.store.set(keys::TOKEN, token)?;
        *self.slot() = Some(token.to_string());
        Ok(())
    }

    /// Drops the memory copy. Call on logout.
    pub fn invalidate(&self) {
        *self.slot() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that counts reads so the cache hit path can be observed.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        reads: AtomicUsize,
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
            self.inner.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), ClientError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_reads_storage_once() {
        let store = Arc::new(CountingStore::default());
        store.set(keys::TOKEN, "t-1").unwrap();
        let cache = TokenCache::new(store.clone());

        assert_eq!(cache.get_token().as_deref(), Some("t-1"));
        assert_eq!(cache.get_token().as_deref(), Some("t-1"));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate_forces_reread() {
        let store = Arc::new(CountingStore::default());
        store.set(keys::TOKEN, "old").unwrap();
        let cache = TokenCache::new(store.clone());
        assert_eq!(cache.get_token().as_deref(), Some("old"));

        store.set(keys::TOKEN, "new").unwrap();
        assert_eq!(cache.get_token().as_deref(), Some("old"));

        cache.invalidate();
        assert_eq!(cache.get_token().as_deref(), Some("new"));
    }

    #[test]
    fn test_missing_token() {
        let cache = TokenCache::new(Arc::new(MemoryStore::new()));
        assert_eq!(cache.get_token(), None);

        cache.set_token("fresh").unwrap();
        assert_eq!(cache.get_token().as_deref(), Some("fresh"));
    }
}
