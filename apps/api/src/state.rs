//! Shared application state and request extractors.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use fixdesk_db::{Database, DocumentNumberService};

/// Header carrying the caller's tenant.
///
/// Authentication/authorization live in front of this service; by the time
/// a request arrives here the tenant header is trusted.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub numbering: Arc<DocumentNumberService>,
}

/// Extractor for the tenant identity header.
///
/// ## Usage
/// ```rust,ignore
/// async fn list_formats(State(state): State<AppState>, TenantId(tenant): TenantId) { ... }
/// ```
pub struct TenantId(pub String);

impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::BadRequest(format!("missing {TENANT_HEADER} header")))?;

        Ok(TenantId(tenant.to_string()))
    }
}
