//! # posflow-client: Backend Client Context for Posflow
//!
//! Everything between the POS screens and the backend REST API: the bearer
//! token, the request wrapper, the catalog cache, the checkout and shift
//! orchestrator and the latency recorder.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            PosClient                                    │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │             Transaction Orchestrator (transaction.rs)            │  │
//! │  │  begin_sale → apply_optimistic → submit                          │  │
//! │  │  clock_in / clock_out / current_shift / monitor_stats            │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  ProductCache  │  │   ApiClient    │  │   PerformanceMetrics   │    │
//! │  │                │  │                │  │                        │    │
//! │  │ memory tier    │  │ headers, JSON  │  │ sales / clockIns /     │    │
//! │  │ session tier   │  │ timing, errors │  │ clockOuts ring buffers │    │
//! │  └───────┬────────┘  └───────┬────────┘  └────────────────────────┘    │
//! │          │                   │                                          │
//! │          ▼                   ▼                                          │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  MemoryStore   │  │   TokenCache   │──│  FileStore (durable)   │    │
//! │  │  (session)     │  │                │  │  token, user, stats    │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All state hangs off one explicitly constructed [`PosClient`]; there are
//! no process-wide singletons. Locks are `std::sync::Mutex` and are never
//! held across an `.await`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use posflow_client::{ClientConfig, PosClient};
//! use posflow_core::{Money, PaymentMethod, SaleItem, SaleRequest, TaxType};
//!
//! let client = PosClient::new(ClientConfig::load_or_default(None))?;
//!
//! let request = SaleRequest::from_cart(
//!     vec![SaleItem::new("p-1", "Lager", Money::from_major(150), 2)],
//!     10.0,
//!     Money::from_major(20),
//!     TaxType::Exclusive,
//!     PaymentMethod::Cash,
//!     Some(shift_id),
//! );
//!
//! match client.complete_sale(request, |_| cart.clear()).await {
//!     Ok(result) => println!("Sale {} ({})", result.sale_id, result.performance_grade),
//!     Err(failure) if failure.needs_rollback => cart.restore(),
//!     Err(failure) => eprintln!("{}", failure),
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod product_cache;
pub mod session;
pub mod storage;
pub mod token;
pub mod transaction;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{ApiClient, RequestOptions};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use metrics::{MetricCategory, MetricRecord, MetricStats, PerformanceMetrics};
pub use product_cache::{CacheEntry, ProductCache};
pub use session::Session;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use token::TokenCache;
pub use transaction::{SaleFailure, SaleTransaction, TransactionState};

use std::sync::Arc;

use tracing::info;

use posflow_core::Product;

// =============================================================================
// Client Context
// =============================================================================

/// The client-side context every POS screen talks through.
pub struct PosClient {
    config: ClientConfig,
    api: ApiClient,
    tokens: Arc<TokenCache>,
    products: Arc<ProductCache>,
    metrics: PerformanceMetrics,
    session: Session,
}

impl PosClient {
    /// Builds a client whose durable store is `storage.json` in the
    /// configured data directory.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let dir = config.data_dir().ok_or_else(|| {
            ClientError::InvalidConfig("No data directory available; set storage.data_dir".into())
        })?;
        let durable = FileStore::open_in(&dir)?;
        info!(path = ?durable.path(), "Opened durable store");
        Self::with_store(config, Arc::new(durable))
    }

    /// Builds a client over an existing durable store.
    pub fn with_store(config: ClientConfig, durable: Arc<dyn KeyValueStore>) -> ClientResult<Self> {
        config.validate()?;

        let session_store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenCache::new(durable.clone()));
        let products = Arc::new(ProductCache::new(session_store, config.product_ttl()));
        let api = ApiClient::new(&config, tokens.clone())?;
        let metrics = PerformanceMetrics::new(config.metrics.capacity);
        let session = Session::new(durable, tokens.clone(), products.clone());

        info!(base_url = %api.base_url(), "Posflow client ready");

        Ok(PosClient {
            config,
            api,
            tokens,
            products,
            metrics,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    pub fn product_cache(&self) -> &ProductCache {
        &self.products
    }

    /// Latency recorder for callers that want to track timings.
    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Catalog through the cache.
    pub async fn products(&self, force_refresh: bool) -> ClientResult<Vec<Product>> {
        self.products.fetch(&self.api, force_refresh).await
    }
}

// =============================================================================
// Test Support
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_backend, test_client};
    use axum::http::HeaderMap;
    use axum::routing::get;
    use axum::{Json, Router};
    use posflow_core::{Role, User};
    use serde_json::json;

    #[tokio::test]
    async fn test_login_token_reaches_backend() {
        let router = Router::new().route(
            api::endpoints::PRODUCTS,
            get(|headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .map(|v| v == "Bearer tok-9")
                    .unwrap_or(false);
                let name = if authorized { "ok" } else { "anon" };
                Json(json!([{ "id": 1, "name": name, "price": 1 }]))
            }),
        );
        let client = test_client(&spawn_backend(router).await);

        let user = User {
            id: "u-1".into(),
            name: "Amina".into(),
            email: None,
            role: Role::Cashier,
            business_type: None,
        };
        client.session().login("tok-9", &user).unwrap();

        let products = client.products(true).await.unwrap();
        assert_eq!(products[0].name, "ok");
    }

    #[test]
    fn test_new_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::default();
        config.storage.data_dir = Some(dir.path().to_path_buf());

        let client = PosClient::new(config).unwrap();
        client.tokens().set_token("persisted").unwrap();
        assert!(dir.path().join(storage::STORE_FILE_NAME).exists());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ClientConfig::with_base_url("not a url");
        assert!(PosClient::with_store(config, Arc::new(MemoryStore::new())).is_err());
    }
}
