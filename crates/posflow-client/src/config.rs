//! # Client Configuration
//!
//! Configuration management for the backend client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     POSFLOW_API_URL=https://pos.example.com                            │
//! │     POSFLOW_PRODUCT_TTL_MS=5000                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/posflow/posflow.toml (Linux)                             │
//! │     ~/Library/Application Support/com.posflow.pos/posflow.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost backend, 5 s catalog cache, 200 ms slow-call warning     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [api]
//! base_url = "https://pos.example.com"
//! slow_request_ms = 200
//!
//! [cache]
//! product_ttl_ms = 5000
//!
//! [metrics]
//! capacity = 100
//!
//! [storage]
//! data_dir = "/var/lib/posflow"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use posflow_core::validation::validate_base_url;
use posflow_core::{METRICS_CAPACITY, PRODUCT_CACHE_TTL_MS, SLOW_REQUEST_MS};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL every endpoint path is joined onto.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Calls slower than this are logged as warnings (milliseconds).
    #[serde(default = "default_slow_request_ms")]
    pub slow_request_ms: u64,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_slow_request_ms() -> u64 {
    SLOW_REQUEST_MS
}

fn default_user_agent() -> String {
    format!("posflow-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            slow_request_ms: default_slow_request_ms(),
            user_agent: default_user_agent(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Catalog cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// How long a fetched product list is served without a network call.
    #[serde(default = "default_product_ttl_ms")]
    pub product_ttl_ms: u64,
}

fn default_product_ttl_ms() -> u64 {
    PRODUCT_CACHE_TTL_MS
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            product_ttl_ms: default_product_ttl_ms(),
        }
    }
}

// =============================================================================
// Metrics Settings
// =============================================================================

/// Latency recorder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Samples retained per category; the oldest is evicted first.
    #[serde(default = "default_metrics_capacity")]
    pub capacity: usize,
}

fn default_metrics_capacity() -> usize {
    METRICS_CAPACITY
}

impl Default for MetricsSettings {
    fn default() -> Self {
        MetricsSettings {
            capacity: default_metrics_capacity(),
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the durable key/value file lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Overrides the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub metrics: MetricsSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl ClientConfig {
    /// Creates a config with defaults pointing at `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.api.base_url = base_url.into();
        config
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (posflow.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ClientError::ConfigLoadFailed(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        validate_base_url(&self.api.base_url)?;
        url::Url::parse(&self.api.base_url)?;

        if self.metrics.capacity == 0 {
            return Err(ClientError::InvalidConfig(
                "metrics.capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("POSFLOW_API_URL") {
            debug!(url = %url, "Overriding API base URL from environment");
            self.api.base_url = url;
        }

        if let Ok(ms) = std::env::var("POSFLOW_SLOW_REQUEST_MS") {
            match ms.parse::<u64>() {
                Ok(v) => self.api.slow_request_ms = v,
                Err(_) => warn!(value = %ms, "Ignoring invalid POSFLOW_SLOW_REQUEST_MS"),
            }
        }

        if let Ok(ms) = std::env::var("POSFLOW_PRODUCT_TTL_MS") {
            match ms.parse::<u64>() {
                Ok(v) => self.cache.product_ttl_ms = v,
                Err(_) => warn!(value = %ms, "Ignoring invalid POSFLOW_PRODUCT_TTL_MS"),
            }
        }

        if let Ok(dir) = std::env::var("POSFLOW_DATA_DIR") {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "posflow", "pos")
            .map(|dirs| dirs.config_dir().join("posflow.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Directory holding the durable store file.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(|| {
            directories::ProjectDirs::from("com", "posflow", "pos")
                .map(|dirs| dirs.data_dir().to_path_buf())
        })
    }

    pub fn product_ttl(&self) -> Duration {
        Duration::from_millis(self.cache.product_ttl_ms)
    }

    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.api.slow_request_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.cache.product_ttl_ms, 5_000);
        assert_eq!(config.api.slow_request_ms, 200);
        assert_eq!(config.metrics.capacity, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::with_base_url("ftp://nope");
        assert!(config.validate().is_err());

        config.api.base_url = "https://pos.example.com".to_string();
        assert!(config.validate().is_ok());

        config.metrics.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://pos.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://pos.example.com");
        assert_eq!(config.api.slow_request_ms, 200);
        assert_eq!(config.cache.product_ttl_ms, 5_000);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posflow.toml");

        let mut config = ClientConfig::with_base_url("https://pos.example.com");
        config.cache.product_ttl_ms = 1_000;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[api]"));
        assert!(contents.contains("[cache]"));

        let parsed: ClientConfig = toml::from_str(&contents).unwrap();
        assert_eq!(parsed.cache.product_ttl_ms, 1_000);
    }
}
