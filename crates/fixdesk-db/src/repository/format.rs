//! # Format Repository
//!
//! Database operations for document number format configuration.
//!
//! ## Ownership
//! Format rows are owned by the administrative settings flow. The numbering
//! core holds only a read lease: `get` and `list` feed the generation path
//! (through the service's short-TTL cache), while `upsert` backs the
//! `PUT /document-numbers/{type}` route and must be followed by a cache
//! invalidation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use fixdesk_core::{DocumentNumberFormat, DocumentType};

const SELECT_COLUMNS: &str = r#"
    tenant_id,
    document_type,
    prefix,
    separator,
    sequence_reset_frequency,
    sequence_length,
    include_branch,
    branch_format,
    include_year,
    year_format,
    include_month,
    include_day,
    created_at,
    updated_at
"#;

/// Repository for format configuration rows.
#[derive(Debug, Clone)]
pub struct FormatRepository {
    pool: SqlitePool,
}

impl FormatRepository {
    /// Creates a new FormatRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FormatRepository { pool }
    }

    /// Fetches the format for one (tenant, document type) pair.
    pub async fn get(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> DbResult<Option<DocumentNumberFormat>> {
        let format = sqlx::query_as::<_, DocumentNumberFormat>(&format!(
            "SELECT {SELECT_COLUMNS} FROM document_number_formats \
             WHERE tenant_id = ?1 AND document_type = ?2"
        ))
        .bind(tenant_id)
        .bind(document_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(format)
    }

    /// Lists all configured formats for a tenant.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<DocumentNumberFormat>> {
        let formats = sqlx::query_as::<_, DocumentNumberFormat>(&format!(
            "SELECT {SELECT_COLUMNS} FROM document_number_formats \
             WHERE tenant_id = ?1 ORDER BY document_type"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(formats)
    }

    /// Inserts or updates a format row.
    ///
    /// ## Semantics
    /// Administrative upsert: all display fields are replaced; `created_at`
    /// is preserved on update. Callers validate the format *before* calling
    /// this (see `fixdesk_core::validate_format`) - the generation path
    /// trusts whatever is stored here.
    pub async fn upsert(&self, format: &DocumentNumberFormat) -> DbResult<()> {
        debug!(
            tenant_id = %format.tenant_id,
            document_type = %format.document_type,
            prefix = %format.prefix,
            "Upserting document number format"
        );

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO document_number_formats (
                tenant_id, document_type, prefix, separator,
                sequence_reset_frequency, sequence_length,
                include_branch, branch_format,
                include_year, year_format, include_month, include_day,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?13
            )
            ON CONFLICT (tenant_id, document_type) DO UPDATE SET
                prefix = excluded.prefix,
                separator = excluded.separator,
                sequence_reset_frequency = excluded.sequence_reset_frequency,
                sequence_length = excluded.sequence_length,
                include_branch = excluded.include_branch,
                branch_format = excluded.branch_format,
                include_year = excluded.include_year,
                year_format = excluded.year_format,
                include_month = excluded.include_month,
                include_day = excluded.include_day,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&format.tenant_id)
        .bind(format.document_type)
        .bind(&format.prefix)
        .bind(&format.separator)
        .bind(format.sequence_reset_frequency)
        .bind(format.sequence_length)
        .bind(format.include_branch)
        .bind(format.branch_format)
        .bind(format.include_year)
        .bind(format.year_format)
        .bind(format.include_month)
        .bind(format.include_day)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
