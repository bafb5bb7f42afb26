//! # Validation Module
//!
//! Local precondition checks that must pass before any request is issued.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard                                                    │
//! │  └── Disables buttons while a request is in flight                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: posflow-client                                               │
//! │  └── THIS MODULE: reject obviously unusable input without a request    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Stock checks, totals reconciliation, ledger constraints           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};

/// Ensures a shift id is present before clock-out.
///
/// ## Example
/// ```rust
/// use posflow_core::validation::validate_shift_id;
///
/// assert_eq!(validate_shift_id(Some(" 42 ")).unwrap(), "42");
/// assert_eq!(validate_shift_id(None).unwrap_err().to_string(), "Shift ID is required");
/// ```
pub fn validate_shift_id(shift_id: Option<&str>) -> ValidationResult<&str> {
    match shift_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ValidationError::required("Shift ID")),
    }
}

/// Ensures the configured backend base URL uses an HTTP scheme.
pub fn validate_base_url(url: &str) -> ValidationResult<()> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::required("base_url"));
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ValidationError::InvalidFormat {
            field: "base_url".to_string(),
            reason: "must start with http:// or https://".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_id_missing_or_blank() {
        assert!(validate_shift_id(None).is_err());
        assert!(validate_shift_id(Some("")).is_err());
        assert!(validate_shift_id(Some("   ")).is_err());
        assert_eq!(validate_shift_id(Some("s-1")), Ok("s-1"));
    }

    #[test]
    fn test_base_url() {
        assert!(validate_base_url("http://localhost:5000").is_ok());
        assert!(validate_base_url("https://pos.example.com").is_ok());
        assert!(validate_base_url("").is_err());
        assert!(validate_base_url("ws://localhost").is_err());
    }
}
