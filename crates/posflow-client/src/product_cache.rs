//! # Product Cache
//!
//! Two cache tiers in front of `GET /api/products`.
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ProductCache::fetch                               │
//! │                                                                         │
//! │  force_refresh? ── yes ───────────────────────────────┐                 │
//! │        │ no                                          │                 │
//! │        ▼                                             │                 │
//! │  1. memory entry, age < ttl? ── yes ──► return       │                 │
//! │        │ no                                          │                 │
//! │        ▼                                             │                 │
//! │  2. session "productsCache", age < ttl?              │                 │
//! │        │ yes ──► promote to memory ──► return        │                 │
//! │        │ no / corrupt                                │                 │
//! │        ▼                                             ▼                 │
//! │  3. GET /api/products ──► write both tiers (timestamp = now) ──► return│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invalidation is all-or-nothing: any stock mutation clears both tiers.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use posflow_core::Product;

use crate::api::{endpoints, ApiClient};
use crate::error::ClientResult;
use crate::storage::{keys, KeyValueStore};

/// A product list plus the epoch-millisecond time it was fetched.
///
/// This is also the serialized shape of the session tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Vec<Product>,
    pub timestamp: i64,
}

impl CacheEntry {
    /// Entry stamped with the current time.
    pub fn now(data: Vec<Product>) -> Self {
        CacheEntry {
            data,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// True while the entry is younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration, now_ms: i64) -> bool {
        let age = now_ms - self.timestamp;
        age >= 0 && (age as u128) < ttl.as_millis()
    }
}

/// Memory and session copies of the catalog.
pub struct ProductCache {
    session: Arc<dyn KeyValueStore>,
    memory: Mutex<Option<CacheEntry>>,
    ttl: Duration,
}

impl ProductCache {
    pub fn new(session: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        ProductCache {
            session,
            memory: Mutex::new(None),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn memory(&self) -> MutexGuard<'_, Option<CacheEntry>> {
        self.memory.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the catalog, hitting the network only when both tiers miss
    /// or `force_refresh` is set.
    pub async fn fetch(&self, api: &ApiClient, force_refresh: bool) -> ClientResult<Vec<Product>> {
        if !force_refresh {
            if let Some(products) = self.cached() {
                return Ok(products);
            }
        }

        debug!(force_refresh, "Fetching products from backend");
        let products: Vec<Product> = api.get(endpoints::PRODUCTS).await?;
        self.store(products.clone());
        Ok(products)
    }

    /// Fresh cached list from either tier, promoting a session hit to memory.
    pub fn cached(&self) -> Option<Vec<Product>> {
        let now = Utc::now().timestamp_millis();

        {
            let memory = self.memory();
            if let Some(entry) = memory.as_ref() {
                if entry.is_fresh(self.ttl, now) {
                    debug!(count = entry.data.len(), "Product cache hit (memory)");
                    return Some(entry.data.clone());
                }
            }
        }

        let entry = self.read_session()?;
        if !entry.is_fresh(self.ttl, now) {
            return None;
        }

        debug!(count = entry.data.len(), "Product cache hit (session)");
        let products = entry.data.clone();
        *self.memory() = Some(entry);
        Some(products)
    }

    /// Writes a freshly fetched list into both tiers.
    pub fn store(&self, products: Vec<Product>) {
        let entry = CacheEntry::now(products);
        if let Err(e) = self.session.set_json(keys::PRODUCTS_CACHE, &entry) {
            warn!(error = %e, "Failed to write session product cache");
        }
        *self.memory() = Some(entry);
    }

    /// Clears both tiers.
    pub fn invalidate(&self) {
        *self.memory() = None;
        if let Err(e) = self.session.remove(keys::PRODUCTS_CACHE) {
            warn!(error = %e, "Failed to clear session product cache");
        }
        debug!("Product cache invalidated");
    }

    fn read_session(&self) -> Option<CacheEntry> {
        match self.session.get_json::<CacheEntry>(keys::PRODUCTS_CACHE) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Dropping corrupt session product cache");
                let _ = self.session.remove(keys::PRODUCTS_CACHE);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::storage::MemoryStore;
    use crate::test_support::spawn_backend;
    use crate::token::TokenCache;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn catalog_backend() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            endpoints::PRODUCTS,
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!([
                        { "id": 1, "name": "Lager", "price": 150, "quantity": 24 },
                        { "id": "p-2", "name": "Crisps", "price": 1.5, "quantity": 3 }
                    ]))
                }
            }),
        );
        (spawn_backend(router).await, hits)
    }

    fn setup(base_url: &str, ttl: Duration) -> (ApiClient, ProductCache, Arc<dyn KeyValueStore>) {
        let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenCache::new(Arc::new(MemoryStore::new())));
        let api = ApiClient::new(&ClientConfig::with_base_url(base_url), tokens).unwrap();
        (api, ProductCache::new(session.clone(), ttl), session)
    }

    #[test]
    fn test_entry_freshness() {
        let entry = CacheEntry {
            data: vec![],
            timestamp: 10_000,
        };
        let ttl = Duration::from_millis(5_000);
        assert!(entry.is_fresh(ttl, 10_000));
        assert!(entry.is_fresh(ttl, 14_999));
        assert!(!entry.is_fresh(ttl, 15_000));
    }

    #[tokio::test]
    async fn test_hit_within_ttl_makes_no_request() {
        let (base, hits) = catalog_backend().await;
        let (api, cache, _) = setup(&base, Duration::from_secs(5));

        let first = cache.fetch(&api, false).await.unwrap();
        let second = cache.fetch(&api, false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].id, "1");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_always_fetches() {
        let (base, hits) = catalog_backend().await;
        let (api, cache, _) = setup(&base, Duration::from_secs(5));

        cache.fetch(&api, false).await.unwrap();
        cache.fetch(&api, true).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let (base, hits) = catalog_backend().await;
        let (api, cache, _) = setup(&base, Duration::from_millis(30));

        cache.fetch(&api, false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.fetch(&api, false).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_then_fetch_hits_network() {
        let (base, hits) = catalog_backend().await;
        let (api, cache, session) = setup(&base, Duration::from_secs(5));

        cache.fetch(&api, false).await.unwrap();
        cache.invalidate();
        assert_eq!(session.get(keys::PRODUCTS_CACHE).unwrap(), None);

        cache.fetch(&api, false).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_session_hit_is_promoted() {
        let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let product: Product =
            serde_json::from_value(json!({ "id": 7, "name": "Soda", "price": 1, "quantity": 5 })).unwrap();
        session
            .set_json(keys::PRODUCTS_CACHE, &CacheEntry::now(vec![product]))
            .unwrap();

        let cache = ProductCache::new(session.clone(), Duration::from_secs(5));
        assert_eq!(cache.cached().unwrap()[0].id, "7");

        // Memory now answers even with the session copy gone.
        session.remove(keys::PRODUCTS_CACHE).unwrap();
        assert_eq!(cache.cached().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_session_entry_is_a_miss() {
        let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        session.set(keys::PRODUCTS_CACHE, "{not json").unwrap();

        let cache = ProductCache::new(session.clone(), Duration::from_secs(5));
        assert_eq!(cache.cached(), None);
        assert_eq!(session.get(keys::PRODUCTS_CACHE).unwrap(), None);
    }
}
