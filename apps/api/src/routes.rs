//! # REST Routes
//!
//! The document-numbers surface consumed by the settings UI and by
//! entity-creation flows.
//!
//! ## Route Map
//! ```text
//! GET  /health                                liveness probe
//! GET  /document-numbers                      list tenant's formats
//! GET  /document-numbers/{type}               fetch one format
//! PUT  /document-numbers/{type}               upsert a format (admin)
//! POST /document-numbers/preview              simulate next number
//! GET  /document-numbers/{type}/sequence      counter introspection
//! POST /document-numbers/{type}/generate      allocate a number (internal)
//! ```
//!
//! Generate is invoked by whatever service creates a job sheet / invoice /
//! estimate / service ticket - exactly once per entity, before persisting
//! the entity with the returned number.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::{AppState, TenantId};
use fixdesk_core::{
    BranchFormat, BranchRef, DocumentNumberFormat, DocumentType, ResetFrequency, SequenceInfo,
    YearFormat,
};
use fixdesk_db::GeneratedNumber;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/document-numbers", get(list_formats))
        .route("/document-numbers/preview", post(preview))
        .route(
            "/document-numbers/{document_type}",
            get(get_format).put(put_format),
        )
        .route("/document-numbers/{document_type}/sequence", get(sequence_info))
        .route("/document-numbers/{document_type}/generate", post(generate))
        .with_state(state)
}

// =============================================================================
// Request/Response Payloads
// =============================================================================

/// Format fields as sent by the settings UI.
///
/// Tenant and document type come from the header and path, never the body.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatPayload {
    pub prefix: String,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub sequence_reset_frequency: ResetFrequency,
    #[serde(default = "default_sequence_length")]
    pub sequence_length: u32,
    #[serde(default)]
    pub include_branch: bool,
    #[serde(default)]
    pub branch_format: BranchFormat,
    #[serde(default = "default_true")]
    pub include_year: bool,
    #[serde(default)]
    pub year_format: YearFormat,
    #[serde(default)]
    pub include_month: bool,
    #[serde(default)]
    pub include_day: bool,
}

fn default_separator() -> String {
    "-".to_string()
}

fn default_sequence_length() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

impl FormatPayload {
    /// Assembles a full format row. `created_at` is only honored on first
    /// insert; the repository preserves it on update.
    fn into_format(self, tenant_id: String, document_type: DocumentType) -> DocumentNumberFormat {
        let now = Utc::now();
        DocumentNumberFormat {
            tenant_id,
            document_type,
            prefix: self.prefix,
            separator: self.separator,
            sequence_reset_frequency: self.sequence_reset_frequency,
            sequence_length: self.sequence_length,
            include_branch: self.include_branch,
            branch_format: self.branch_format,
            include_year: self.include_year,
            year_format: self.year_format,
            include_month: self.include_month,
            include_day: self.include_day,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `POST /document-numbers/preview`.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub document_type: DocumentType,
    #[serde(flatten)]
    pub format: FormatPayload,
    #[serde(default)]
    pub branch: Option<BranchRef>,
}

/// Body of `POST /document-numbers/{type}/generate`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub branch: Option<BranchRef>,
}

/// Query string of `GET /document-numbers/{type}/sequence`.
#[derive(Debug, Default, Deserialize)]
pub struct SequenceQuery {
    pub branch_id: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = state.db.health_check().await;
    let (total, applied) = state.db.migration_status().await.unwrap_or((0, 0));
    Json(json!({
        "status": if database && applied == total { "ok" } else { "degraded" },
        "database": database,
        "migrations": { "applied": applied, "total": total },
    }))
}

/// GET /document-numbers
async fn list_formats(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
) -> Result<Json<Vec<DocumentNumberFormat>>, ApiError> {
    let formats = state.numbering.list_formats(&tenant_id).await?;
    Ok(Json(formats))
}

/// GET /document-numbers/{document_type}
async fn get_format(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(document_type): Path<String>,
) -> Result<Json<DocumentNumberFormat>, ApiError> {
    let document_type = parse_document_type(&document_type)?;
    let format = state.numbering.get_format(&tenant_id, document_type).await?;
    Ok(Json(format))
}

/// PUT /document-numbers/{document_type}
///
/// Administrative upsert. Validation happens in the service, once, at save
/// time; the generation path trusts stored rows afterwards.
async fn put_format(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(document_type): Path<String>,
    Json(payload): Json<FormatPayload>,
) -> Result<Json<DocumentNumberFormat>, ApiError> {
    let document_type = parse_document_type(&document_type)?;
    let format = payload.into_format(tenant_id.clone(), document_type);

    state.numbering.save_format(&format).await?;

    // Return the stored row (created_at reflects the original insert)
    let stored = state.numbering.get_format(&tenant_id, document_type).await?;
    Ok(Json(stored))
}

/// POST /document-numbers/preview
///
/// Simulates the next number for a candidate (possibly unsaved) format.
/// Never allocates; the settings UI calls this on every keystroke.
async fn preview(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<Value>, ApiError> {
    let format = request.format.into_format(tenant_id, request.document_type);
    let number = state.numbering.preview(&format, request.branch.as_ref()).await?;
    Ok(Json(json!({ "number": number })))
}

/// GET /document-numbers/{document_type}/sequence
async fn sequence_info(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(document_type): Path<String>,
    Query(query): Query<SequenceQuery>,
) -> Result<Json<SequenceInfo>, ApiError> {
    let document_type = parse_document_type(&document_type)?;
    let info = state
        .numbering
        .sequence_info(&tenant_id, document_type, query.branch_id.as_deref())
        .await?;
    Ok(Json(info))
}

/// POST /document-numbers/{document_type}/generate
///
/// The side-effecting call: allocates and returns the next number. A failed
/// allocation surfaces as 503 and the caller's entity creation must fail
/// with it - never proceed without a number.
async fn generate(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    Path(document_type): Path<String>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GeneratedNumber>, ApiError> {
    let document_type = parse_document_type(&document_type)?;
    let generated = state
        .numbering
        .generate(&tenant_id, document_type, request.branch.as_ref())
        .await?;
    Ok(Json(generated))
}

fn parse_document_type(raw: &str) -> Result<DocumentType, ApiError> {
    raw.parse::<DocumentType>().map_err(ApiError::BadRequest)
}
