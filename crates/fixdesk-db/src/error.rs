//! # Database Error Types
//!
//! Error types for database operations and the numbering service.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  NumberingError (this module) ← Generation-level taxonomy              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in apps/api) ← Mapped to HTTP status codes                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use fixdesk_core::{DocumentType, ValidationError};
use thiserror::Error;

// =============================================================================
// Database Error
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and retry classification.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Racing inserts outside the counter upsert path
    /// - Any UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    ///
    /// ## When This Occurs
    /// - SQLITE_BUSY under write contention (transient, retried by the
    ///   sequence allocator)
    /// - Runtime SQL error
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether retrying the operation may succeed.
    ///
    /// The sequence allocator retries only on this class of error;
    /// anything else (constraint violations, bad SQL) fails immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            DbError::PoolExhausted => true,
            DbError::QueryFailed(msg) => {
                // SQLITE_BUSY / SQLITE_LOCKED surface through sqlx as
                // database errors with these messages
                msg.contains("database is locked") || msg.contains("database table is locked")
            }
            _ => false,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Numbering Error
// =============================================================================

/// Failures of the document number generation path.
///
/// ## Taxonomy
/// ```text
/// FormatNotConfigured  missing config row       caller may fall back to a default
/// BranchRequired       caller error             not retried, nothing allocated
/// AllocationFailed     retries exhausted        transient, whole Generate is retryable
/// InvalidFormat        rejected at save time    never reaches the generation path
/// Db                   other storage faults     surfaced as-is
/// ```
///
/// Allocation failures must never be swallowed: a document creation flow
/// that cannot obtain a number must itself fail.
#[derive(Debug, Error)]
pub enum NumberingError {
    /// No format row exists for the (tenant, document type) pair.
    #[error("No document number format configured for {document_type} (tenant {tenant_id})")]
    FormatNotConfigured {
        tenant_id: String,
        document_type: DocumentType,
    },

    /// The format includes a branch segment but the caller supplied none.
    /// Nothing is allocated; the counter is untouched.
    #[error("Document number format for {document_type} requires a branch, but none was supplied")]
    BranchRequired { document_type: DocumentType },

    /// The allocator's retry budget is exhausted or the store is down.
    #[error("Sequence allocation failed for scope {scope}: {source}")]
    AllocationFailed {
        scope: String,
        #[source]
        source: DbError,
    },

    /// A candidate format failed validation (surfaced at save/preview time).
    #[error("Invalid document number format: {0}")]
    InvalidFormat(#[from] ValidationError),

    /// Other storage faults (format lookup, counter peek).
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for numbering operations.
pub type NumberingResult<T> = Result<T, NumberingError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DbError::PoolExhausted.is_transient());
        assert!(DbError::QueryFailed("database is locked".to_string()).is_transient());
        assert!(DbError::QueryFailed("database table is locked".to_string()).is_transient());

        assert!(!DbError::not_found("Format", "t1/invoice").is_transient());
        assert!(!DbError::QueryFailed("no such table: x".to_string()).is_transient());
        assert!(!DbError::MigrationFailed("checksum".to_string()).is_transient());
    }

    #[test]
    fn test_numbering_error_messages() {
        let err = NumberingError::BranchRequired {
            document_type: DocumentType::Invoice,
        };
        assert_eq!(
            err.to_string(),
            "Document number format for invoice requires a branch, but none was supplied"
        );

        let err = NumberingError::FormatNotConfigured {
            tenant_id: "t1".to_string(),
            document_type: DocumentType::JobSheet,
        };
        assert!(err.to_string().contains("job_sheet"));
        assert!(err.to_string().contains("t1"));
    }
}
