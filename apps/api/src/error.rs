//! # API Error Types
//!
//! Maps numbering and database errors to HTTP responses.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NumberingError                        HTTP                             │
//! │  ────────────────────────────────      ─────                            │
//! │  FormatNotConfigured                   404 Not Found                    │
//! │  BranchRequired                        400 Bad Request                  │
//! │  InvalidFormat                         400 Bad Request                  │
//! │  AllocationFailed                      503 Service Unavailable          │
//! │  Db                                    500 Internal Server Error        │
//! │                                                                         │
//! │  Entity creation that fails to obtain a number is rejected outright;   │
//! │  clients retry the whole operation.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use fixdesk_db::{DbError, NumberingError};

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request (bad document type, missing branch, invalid format).
    #[error("{0}")]
    BadRequest(String),

    /// Requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Transient failure; the client should retry the whole request.
    #[error("{0}")]
    Unavailable(String),

    /// Unexpected server-side failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });

        if status.is_server_error() {
            error!(status = %status, message = %self, "Request failed");
        } else {
            warn!(status = %status, message = %self, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

impl From<NumberingError> for ApiError {
    fn from(err: NumberingError) -> Self {
        match err {
            NumberingError::FormatNotConfigured { .. } => ApiError::NotFound(err.to_string()),
            NumberingError::BranchRequired { .. } => ApiError::BadRequest(err.to_string()),
            NumberingError::InvalidFormat(_) => ApiError::BadRequest(err.to_string()),
            // A document must never be created without a number; clients
            // retry the whole operation
            NumberingError::AllocationFailed { .. } => ApiError::Unavailable(err.to_string()),
            NumberingError::Db(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixdesk_core::DocumentType;

    #[test]
    fn test_status_mapping() {
        let err: ApiError = NumberingError::BranchRequired {
            document_type: DocumentType::Invoice,
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = NumberingError::FormatNotConfigured {
            tenant_id: "t1".to_string(),
            document_type: DocumentType::Invoice,
        }
        .into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = NumberingError::AllocationFailed {
            scope: "t1/invoice/-/2025".to_string(),
            source: DbError::PoolExhausted,
        }
        .into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
