//! # API Request Wrapper
//!
//! Single choke point for every HTTP call to the backend.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ApiClient::request                              │
//! │                                                                         │
//! │  path + RequestOptions                                                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  headers = Content-Type: application/json                               │
//! │          + Authorization: Bearer <TokenCache::get_token()>              │
//! │          + caller overrides (caller wins)                               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  send ──► network failure? ──► ClientError::Network ──┐                 │
//! │        │                                             │                 │
//! │        ▼                                             │                 │
//! │  2xx? ── no ──► body.error | body.message            │                 │
//! │        │        | "HTTP <code>: <reason>" ──► Http ──┤                 │
//! │        ▼                                             ▼                 │
//! │  parse JSON as T                          error! with elapsed_ms       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  elapsed > slow threshold? ──► warn!                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No retries and no timeout: one call, one outcome, straight back to the
//! caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::token::TokenCache;

/// Backend endpoint paths.
pub mod endpoints {
    pub const PRODUCTS: &str = "/api/products";
    pub const SALES_COMPLETE: &str = "/api/v2/sales/complete";
    pub const CLOCK_IN: &str = "/api/v2/shifts/clock-in";
    pub const CLOCK_OUT: &str = "/api/v2/shifts/clock-out";
    pub const CURRENT_SHIFT: &str = "/api/v2/shifts/current";
    pub const MONITOR_STATS: &str = "/api/v2/monitor/stats";
}

// =============================================================================
// Request Options
// =============================================================================

/// Method, optional JSON body and extra headers for one call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    /// POST without a body.
    pub fn post() -> Self {
        RequestOptions {
            method: Method::POST,
            ..Self::default()
        }
    }

    /// POST with a serialized JSON body.
    pub fn post_json<B: Serialize>(body: &B) -> ClientResult<Self> {
        Ok(RequestOptions {
            method: Method::POST,
            body: Some(serde_json::to_value(body)?),
            headers: HeaderMap::new(),
        })
    }

    /// Adds or replaces a header sent with this call.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

// =============================================================================
// API Client
// =============================================================================

/// HTTP wrapper with standard headers and timing instrumentation.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenCache>,
    slow_threshold: Duration,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, tokens: Arc<TokenCache>) -> ClientResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        match HeaderValue::from_str(&config.api.user_agent) {
            Ok(ua) => {
                default_headers.insert(USER_AGENT, ua);
            }
            Err(_) => warn!(user_agent = %config.api.user_agent, "Ignoring invalid User-Agent"),
        }

        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        Ok(ApiClient {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            tokens,
            slow_threshold: config.slow_request_threshold(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path (`/api/...`).
    fn endpoint(&self, path: &str) -> ClientResult<url::Url> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        Ok(url::Url::parse(&joined)?)
    }

    /// Standard headers merged with the caller's overrides.
    fn headers(&self, overrides: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.tokens.get_token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token contains invalid header characters, sending without it"),
            }
        }

        for (name, value) in overrides {
            headers.insert(name.clone(), value.clone());
        }

        headers
    }

    /// Issues one call and parses the 2xx body as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ClientResult<T> {
        let method = options.method.clone();
        let started = Instant::now();

        let result = self.send(path, options).await;
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        match &result {
            Ok(_) if elapsed > self.slow_threshold => {
                warn!(%method, path, elapsed_ms, "Slow API call");
            }
            Ok(_) => {
                debug!(%method, path, elapsed_ms, "API call completed");
            }
            Err(e) => {
                error!(%method, path, elapsed_ms, error = %e, "API call failed");
            }
        }

        result
    }

    /// GET shorthand.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.request(path, RequestOptions::get()).await
    }

    /// POST-with-JSON-body shorthand.
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.request(path, RequestOptions::post_json(body)?).await
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        let headers = self.headers(&options.headers);

        let mut builder = self.http.request(options.method, url).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(serde_json::to_vec(&body)?);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::http(status, server_message(&bytes)));
        }

        serde_json::from_slice(&bytes).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Accepts `{"error": "..."}`, `{"message": "..."}` and
/// `{"error": {"message": "..."}}`.
fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;

    let text = match value.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Object(obj)) => obj.get("message").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    text.or_else(|| value.get("message").and_then(Value::as_str).map(str::to_string))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{keys, KeyValueStore, MemoryStore};
    use crate::test_support::spawn_backend;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    fn client_for(base_url: &str, token: Option<&str>) -> ApiClient {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        if let Some(t) = token {
            store.set(keys::TOKEN, t).unwrap();
        }
        let tokens = Arc::new(TokenCache::new(store));
        ApiClient::new(&ClientConfig::with_base_url(base_url), tokens).unwrap()
    }

    #[test]
    fn test_server_message_shapes() {
        assert_eq!(server_message(br#"{"error":"Out of stock"}"#).as_deref(), Some("Out of stock"));
        assert_eq!(server_message(br#"{"message":"Bad shift"}"#).as_deref(), Some("Bad shift"));
        assert_eq!(
            server_message(br#"{"error":{"message":"nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(server_message(b"<html>oops</html>"), None);
        assert_eq!(server_message(br#"{"error":""}"#), None);
    }

    #[tokio::test]
    async fn test_sends_bearer_and_parses_json() {
        let router = Router::new().route(
            "/api/echo",
            get(|headers: AxumHeaders| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let content_type = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({ "auth": auth, "contentType": content_type }))
            }),
        );
        let base = spawn_backend(router).await;
        let client = client_for(&base, Some("secret"));

        let body: Value = client.get("/api/echo").await.unwrap();
        assert_eq!(body["auth"], "Bearer secret");
        assert_eq!(body["contentType"], "application/json");
    }

    #[tokio::test]
    async fn test_caller_headers_override_defaults() {
        let router = Router::new().route(
            "/api/echo",
            get(|headers: AxumHeaders| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({ "auth": auth }))
            }),
        );
        let base = spawn_backend(router).await;
        let client = client_for(&base, Some("secret"));

        let options = RequestOptions::get()
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer override"));
        let body: Value = client.request("/api/echo", options).await.unwrap();
        assert_eq!(body["auth"], "Bearer override");
    }

    #[tokio::test]
    async fn test_non_2xx_uses_server_message() {
        let router = Router::new().route(
            "/api/fail",
            post(|| async { (StatusCode::CONFLICT, Json(json!({ "error": "Insufficient stock" }))) }),
        );
        let base = spawn_backend(router).await;
        let client = client_for(&base, None);

        let err = client
            .request::<Value>("/api/fail", RequestOptions::post())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "Insufficient stock");
    }

    #[tokio::test]
    async fn test_non_2xx_without_body_uses_status_text() {
        let router = Router::new().route("/api/fail", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let base = spawn_backend(router).await;
        let client = client_for(&base, None);

        let err = client.get::<Value>("/api/fail").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    }

    #[tokio::test]
    async fn test_network_failure() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = client_for(&format!("http://127.0.0.1:{}", port), None);
        let err = client.get::<Value>("/api/products").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[tokio::test]
    async fn test_unparseable_success_body_is_malformed() {
        let router = Router::new().route("/api/text", get(|| async { "plain text" }));
        let base = spawn_backend(router).await;
        let client = client_for(&base, None);

        let err = client.get::<Value>("/api/text").await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }
}
