//! # Error Types
//!
//! Domain-specific error types for posflow-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  posflow-core errors (this file)                                       │
//! │  └── ValidationError  - Local precondition failures                    │
//! │                                                                         │
//! │  posflow-client errors (separate crate)                                │
//! │  └── ClientError      - Network, HTTP, malformed response, storage     │
//! │                                                                         │
//! │  Flow: ValidationError → ClientError → caller (dashboard / CLI)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A validation failure never reaches the network: the client checks first
//! and returns before the request wrapper is invoked.

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// The message text is shown to cashiers verbatim, so it stays short.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Invalid format (e.g., a base URL without a scheme).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_message() {
        let err = ValidationError::required("Shift ID");
        assert_eq!(err.to_string(), "Shift ID is required");
    }

    #[test]
    fn test_invalid_format_message() {
        let err = ValidationError::InvalidFormat {
            field: "base_url".to_string(),
            reason: "must start with http:// or https://".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "base_url has invalid format: must start with http:// or https://"
        );
    }
}
