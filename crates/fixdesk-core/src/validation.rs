//! # Validation Module
//!
//! Format configuration validation for Fixdesk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Settings UI                                                  │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate admin feedback                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: PUT /document-numbers/{type} (Rust)                          │
//! │  └── THIS MODULE: validate_format before upsert                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── CHECK (sequence_length >= 1)                                      │
//! │                                                                         │
//! │  The generation path runs AFTER all three layers and trusts the        │
//! │  stored row - it never re-validates on the hot path.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::types::DocumentNumberFormat;
use crate::{MAX_PREFIX_LEN, MAX_SEQUENCE_LENGTH};

/// Validates a format configuration before it is saved.
///
/// ## Rules
/// - `prefix` is required, at most [`MAX_PREFIX_LEN`] characters, and
///   limited to letters, digits, and `#`
/// - `separator` is at most one character
/// - `sequence_length` is between 1 and [`MAX_SEQUENCE_LENGTH`]
///
/// ## Example
/// ```rust
/// use fixdesk_core::{validate_format, DocumentNumberFormat, DocumentType};
///
/// let mut format = DocumentNumberFormat::default_for("t1", DocumentType::Invoice);
/// assert!(validate_format(&format).is_ok());
///
/// format.sequence_length = 0;
/// assert!(validate_format(&format).is_err());
/// ```
pub fn validate_format(format: &DocumentNumberFormat) -> ValidationResult<()> {
    validate_prefix(&format.prefix)?;
    validate_separator(&format.separator)?;
    validate_sequence_length(format.sequence_length)?;
    Ok(())
}

/// Validates the number prefix.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most [`MAX_PREFIX_LEN`] characters
/// - Letters, digits, and `#` only (prefixes end up in file names and
///   barcode labels; whitespace and punctuation cause trouble downstream)
pub fn validate_prefix(prefix: &str) -> ValidationResult<()> {
    let prefix = prefix.trim();

    if prefix.is_empty() {
        return Err(ValidationError::Required {
            field: "prefix".to_string(),
        });
    }

    if prefix.chars().count() > MAX_PREFIX_LEN {
        return Err(ValidationError::TooLong {
            field: "prefix".to_string(),
            max: MAX_PREFIX_LEN,
        });
    }

    if !prefix.chars().all(|c| c.is_alphanumeric() || c == '#') {
        return Err(ValidationError::InvalidFormat {
            field: "prefix".to_string(),
            reason: "must contain only letters, digits, and '#'".to_string(),
        });
    }

    Ok(())
}

/// Validates the segment separator.
///
/// ## Rules
/// - Zero or one character ("" means direct concatenation)
pub fn validate_separator(separator: &str) -> ValidationResult<()> {
    if separator.chars().count() > 1 {
        return Err(ValidationError::TooLong {
            field: "separator".to_string(),
            max: 1,
        });
    }

    Ok(())
}

/// Validates the sequence zero-padding width.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed [`MAX_SEQUENCE_LENGTH`]
pub fn validate_sequence_length(sequence_length: u32) -> ValidationResult<()> {
    if sequence_length < 1 || sequence_length > MAX_SEQUENCE_LENGTH {
        return Err(ValidationError::OutOfRange {
            field: "sequence_length".to_string(),
            min: 1,
            max: MAX_SEQUENCE_LENGTH as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentType;

    #[test]
    fn test_default_formats_are_valid() {
        for dt in DocumentType::ALL {
            let format = DocumentNumberFormat::default_for("t1", dt);
            assert!(validate_format(&format).is_ok(), "{dt} default invalid");
        }
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("JS").is_ok());
        assert!(validate_prefix("INV2025").is_ok());
        assert!(validate_prefix("#R").is_ok());

        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("   ").is_err());
        assert!(validate_prefix("JS ").is_ok()); // trimmed
        assert!(validate_prefix("JS-X").is_err());
        assert!(validate_prefix("ABCDEFGHIJK").is_err()); // 11 chars
    }

    #[test]
    fn test_validate_separator() {
        assert!(validate_separator("").is_ok());
        assert!(validate_separator("-").is_ok());
        assert!(validate_separator("/").is_ok());
        assert!(validate_separator("--").is_err());
    }

    #[test]
    fn test_validate_sequence_length() {
        assert!(validate_sequence_length(1).is_ok());
        assert!(validate_sequence_length(12).is_ok());

        assert!(validate_sequence_length(0).is_err());
        assert!(validate_sequence_length(13).is_err());
    }
}
