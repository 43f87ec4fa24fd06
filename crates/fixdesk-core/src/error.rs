//! # Error Types
//!
//! Domain-specific error types for fixdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fixdesk-core errors (this file)                                       │
//! │  └── ValidationError  - Format configuration failures                  │
//! │                                                                         │
//! │  fixdesk-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── NumberingError   - Generation/preview failures                    │
//! │                                                                         │
//! │  API errors (in app)                                                   │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → NumberingError → ApiError → Client            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, bounds, value)
//! 3. Errors are enum variants, never String
//! 4. Validation runs at format-save time; the generation path trusts
//!    stored rows and never re-validates

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Format configuration validation errors.
///
/// Surfaced at format-save time, before a row reaches the store. A format
/// that passes validation is trusted by the generation path thereafter.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid content (e.g. disallowed characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ValidationError::Required {
            field: "prefix".to_string(),
        };
        assert_eq!(err.to_string(), "prefix is required");

        let err = ValidationError::OutOfRange {
            field: "sequence_length".to_string(),
            min: 1,
            max: 12,
        };
        assert_eq!(err.to_string(), "sequence_length must be between 1 and 12");
    }
}
