//! # Client Error Types
//!
//! Error types for everything that talks to the backend or local storage.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  (a) Transport  │  │  (b) HTTP       │  │  (c) Malformed          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Network        │  │  Http {status,  │  │  MalformedResponse      │ │
//! │  │  (DNS, refused, │  │   message}      │  │  (2xx without saleId,   │ │
//! │  │   reset)        │  │                 │  │   unparseable body)     │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │ (d) Precondition│  │  Configuration  │  │      Storage            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Validation     │  │  InvalidConfig  │  │  Storage                │ │
//! │  │  (no request    │  │  InvalidUrl     │  │  Serialization          │ │
//! │  │   was sent)     │  │  ConfigLoad/Save│  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this crate swallows an error: every operation logs and then
//! returns it to the caller, who decides what the cashier sees.

use posflow_core::ValidationError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering all possible failures.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Request Errors
    // =========================================================================
    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    ///
    /// `message` is the server's own text when it sent one, otherwise
    /// `"HTTP <code>: <reason>"`.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// A 2xx response whose body is not what the endpoint promises.
    #[error("Invalid server response: {0}")]
    MalformedResponse(String),

    /// Local precondition failure; no request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Builds an HTTP error from a status and an optional server message.
    pub fn http(status: reqwest::StatusCode, server_message: Option<String>) -> Self {
        let message = server_message.unwrap_or_else(|| {
            format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        });
        ClientError::Http {
            status: status.as_u16(),
            message,
        }
    }

    /// Returns the HTTP status when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403: the bearer token is missing, stale or revoked.
    ///
    /// Tokens are never refreshed here; callers send the user back to login.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// True when the failure happened before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::Validation(_)
                | ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
                | ClientError::Storage(_)
                | ClientError::Serialization(_)
        )
    }
}
