//! # Document Number Service
//!
//! Orchestrates format lookup, period resolution, sequence allocation, and
//! number formatting. This is the interface the rest of the system consumes.
//!
//! ## Generate Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              generate(tenant, document_type, branch?)                   │
//! │                                                                         │
//! │  1. Load format config        (short-TTL cache over FormatRepository)  │
//! │  2. Check branch requirement  (BranchRequired BEFORE any allocation)   │
//! │  3. Resolve period key        (clock → "2025", "202503", ...)          │
//! │  4. Allocate sequence value   (atomic upsert, the only side effect)    │
//! │  5. Format the number         (pure, fixdesk-core)                     │
//! │                                                                         │
//! │  preview() runs the same pipeline but PEEKS the counter at step 4      │
//! │  instead of incrementing - it can never consume a value.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cache Semantics
//! Format edits are rare; allocation is frequent. The cache holds format
//! rows for a short TTL and is explicitly invalidated by [`save_format`].
//! A stale format can only affect how a number *looks* for a few seconds -
//! never whether the underlying sequence value is unique.
//!
//! [`save_format`]: DocumentNumberService::save_format

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{NumberingError, NumberingResult};
use crate::repository::format::FormatRepository;
use crate::repository::sequence::SequenceAllocator;
use fixdesk_core::{
    format_number, period_key, validate_format, BranchRef, Clock, DocumentNumberFormat,
    DocumentType, SequenceInfo, SequenceScope, SystemClock,
};

/// How long a cached format row stays fresh.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

/// Placeholder branch rendered by previews when the candidate format
/// includes a branch but the settings UI has not picked one yet.
fn sample_branch() -> BranchRef {
    BranchRef::new("sample", "BR1", "Branch 1")
}

/// A freshly generated document number, with the allocation details
/// callers may want to log or display.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedNumber {
    /// The final formatted number, e.g. "JS-DS1-2025-001".
    pub number: String,
    /// The raw allocated sequence value.
    pub sequence_value: i64,
    /// The period scope the value was allocated in.
    pub period_key: String,
}

struct CachedFormat {
    format: DocumentNumberFormat,
    fetched_at: Instant,
}

/// The document numbering orchestrator.
///
/// One instance is shared across all request handlers (wrap in `Arc`).
/// Holds the format cache, the repositories, and an injectable clock.
pub struct DocumentNumberService {
    formats: FormatRepository,
    sequences: SequenceAllocator,
    cache: RwLock<HashMap<(String, DocumentType), CachedFormat>>,
    cache_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl DocumentNumberService {
    /// Creates a service over the given pool with the system clock.
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    /// Creates a service with an explicit clock (tests pin the calendar
    /// to exercise period rollover deterministically).
    pub fn with_clock(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        DocumentNumberService {
            formats: FormatRepository::new(pool.clone()),
            sequences: SequenceAllocator::new(pool),
            cache: RwLock::new(HashMap::new()),
            cache_ttl: DEFAULT_CACHE_TTL,
            clock,
        }
    }

    /// Overrides the format cache TTL.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    // =========================================================================
    // Generate
    // =========================================================================

    /// Generates the next document number for a (tenant, document type).
    ///
    /// This is the only call that consumes a sequence value. The returned
    /// number must be stored immutably on the business entity it was minted
    /// for, exactly once per entity.
    ///
    /// ## Errors
    /// - [`NumberingError::FormatNotConfigured`] - no format row
    /// - [`NumberingError::BranchRequired`] - format demands a branch,
    ///   none supplied; the counter is untouched
    /// - [`NumberingError::AllocationFailed`] - retries exhausted or store
    ///   down; the caller must fail rather than proceed without a number
    pub async fn generate(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
        branch: Option<&BranchRef>,
    ) -> NumberingResult<GeneratedNumber> {
        let format = self.load_format(tenant_id, document_type).await?;

        // Branch check happens before allocation so a caller error never
        // burns a sequence value
        if format.include_branch && branch.is_none() {
            return Err(NumberingError::BranchRequired { document_type });
        }

        let now = self.clock.now();
        let period = period_key(format.sequence_reset_frequency, now);
        let scope = SequenceScope::new(
            tenant_id,
            document_type,
            branch.filter(|_| format.include_branch).map(|b| b.id.as_str()),
            period.clone(),
        );

        let value = self
            .sequences
            .allocate(&scope)
            .await
            .map_err(|source| NumberingError::AllocationFailed {
                scope: scope.to_string(),
                source,
            })?;

        let number = format_number(&format, branch, now, value);

        info!(
            tenant_id,
            document_type = %document_type,
            number = %number,
            sequence_value = value,
            period_key = %period,
            "Generated document number"
        );

        Ok(GeneratedNumber {
            number,
            sequence_value: value,
            period_key: period,
        })
    }

    // =========================================================================
    // Preview
    // =========================================================================

    /// Simulates what the next number would look like for a candidate
    /// (possibly unsaved) format, without allocating anything.
    ///
    /// Used by the settings UI to show a live example as an administrator
    /// edits the format. Reads the current counter for the implied scope
    /// (assuming 1 when the scope has never allocated) and formats.
    ///
    /// When the candidate includes a branch segment but no branch is
    /// supplied, a placeholder branch ("BR1") is rendered so the admin
    /// still sees a representative example.
    pub async fn preview(
        &self,
        format: &DocumentNumberFormat,
        branch: Option<&BranchRef>,
    ) -> NumberingResult<String> {
        validate_format(format)?;

        let placeholder;
        let branch = match (format.include_branch, branch) {
            (true, Some(branch)) => Some(branch),
            (true, None) => {
                placeholder = sample_branch();
                Some(&placeholder)
            }
            (false, _) => None,
        };

        let now = self.clock.now();
        let period = period_key(format.sequence_reset_frequency, now);
        let scope = SequenceScope::new(
            &format.tenant_id,
            format.document_type,
            branch.map(|b| b.id.as_str()),
            period,
        );

        let current = self.sequences.current_value(&scope).await?;
        let next = current.unwrap_or(0) + 1;

        debug!(scope = %scope, next, "Previewing document number");

        Ok(format_number(format, branch, now, next))
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns the current counter value and period key for a scope.
    ///
    /// Read-only, for operational visibility. `current_value` is 0 when the
    /// scope has never allocated.
    pub async fn sequence_info(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
        branch_id: Option<&str>,
    ) -> NumberingResult<SequenceInfo> {
        let format = self.load_format(tenant_id, document_type).await?;

        let period = period_key(format.sequence_reset_frequency, self.clock.now());
        let scope = SequenceScope::new(
            tenant_id,
            document_type,
            branch_id.filter(|_| format.include_branch),
            period.clone(),
        );

        let current = self.sequences.current_value(&scope).await?;

        Ok(SequenceInfo {
            current_value: current.unwrap_or(0),
            period_key: period,
        })
    }

    // =========================================================================
    // Format administration
    // =========================================================================

    /// Validates and persists a format, then invalidates the cache entry.
    ///
    /// Administrative path backing `PUT /document-numbers/{type}`.
    /// Validation happens here, once, at save time - the generation path
    /// trusts stored rows.
    pub async fn save_format(&self, format: &DocumentNumberFormat) -> NumberingResult<()> {
        validate_format(format)?;
        self.formats.upsert(format).await?;
        self.invalidate(&format.tenant_id, format.document_type).await;

        info!(
            tenant_id = %format.tenant_id,
            document_type = %format.document_type,
            "Saved document number format"
        );
        Ok(())
    }

    /// Fetches one format, bypassing the cache (administrative reads want
    /// the stored truth, not a snapshot).
    pub async fn get_format(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> NumberingResult<DocumentNumberFormat> {
        self.formats
            .get(tenant_id, document_type)
            .await?
            .ok_or(NumberingError::FormatNotConfigured {
                tenant_id: tenant_id.to_string(),
                document_type,
            })
    }

    /// Lists all configured formats for a tenant.
    pub async fn list_formats(&self, tenant_id: &str) -> NumberingResult<Vec<DocumentNumberFormat>> {
        Ok(self.formats.list(tenant_id).await?)
    }

    /// Drops the cached entry for one (tenant, document type).
    pub async fn invalidate(&self, tenant_id: &str, document_type: DocumentType) {
        let mut cache = self.cache.write().await;
        cache.remove(&(tenant_id.to_string(), document_type));
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Loads a format through the short-TTL cache.
    async fn load_format(
        &self,
        tenant_id: &str,
        document_type: DocumentType,
    ) -> NumberingResult<DocumentNumberFormat> {
        let key = (tenant_id.to_string(), document_type);

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&key) {
                if cached.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(cached.format.clone());
                }
            }
        }

        let format = self.get_format(tenant_id, document_type).await?;

        let mut cache = self.cache.write().await;
        cache.insert(
            key,
            CachedFormat {
                format: format.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(format)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{DateTime, TimeZone, Utc};
    use fixdesk_core::{FixedClock, ResetFrequency};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn service_at(db: &Database, now: DateTime<Utc>) -> DocumentNumberService {
        DocumentNumberService::with_clock(db.pool().clone(), Arc::new(FixedClock(now)))
    }

    async fn seed_format(db: &Database, format: &DocumentNumberFormat) {
        db.formats().upsert(format).await.unwrap();
    }

    #[tokio::test]
    async fn test_generate_formats_and_increments() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 3, 14, 9, 0, 0));
        seed_format(&db, &DocumentNumberFormat::default_for("t1", DocumentType::JobSheet)).await;

        let first = service
            .generate("t1", DocumentType::JobSheet, None)
            .await
            .unwrap();
        assert_eq!(first.number, "JS-2025-001");
        assert_eq!(first.sequence_value, 1);
        assert_eq!(first.period_key, "2025");

        let second = service
            .generate("t1", DocumentType::JobSheet, None)
            .await
            .unwrap();
        assert_eq!(second.number, "JS-2025-002");
    }

    #[tokio::test]
    async fn test_generate_with_branch_segment() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 3, 14, 9, 0, 0));

        let mut format = DocumentNumberFormat::default_for("t1", DocumentType::JobSheet);
        format.include_branch = true;
        seed_format(&db, &format).await;

        let branch = BranchRef::new("b1", "DS1", "Downtown");
        let generated = service
            .generate("t1", DocumentType::JobSheet, Some(&branch))
            .await
            .unwrap();
        assert_eq!(generated.number, "JS-DS1-2025-001");

        // A second branch gets its own counter
        let other = BranchRef::new("b2", "DS2", "Uptown");
        let generated = service
            .generate("t1", DocumentType::JobSheet, Some(&other))
            .await
            .unwrap();
        assert_eq!(generated.number, "JS-DS2-2025-001");
    }

    #[tokio::test]
    async fn test_missing_format_is_an_error() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 1, 1, 0, 0, 0));

        let err = service
            .generate("t1", DocumentType::Invoice, None)
            .await
            .unwrap_err();
        assert!(matches!(err, NumberingError::FormatNotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_branch_required_allocates_nothing() {
        let db = test_db().await;
        let now = at(2025, 3, 14, 9, 0, 0);
        let service = service_at(&db, now);

        let mut format = DocumentNumberFormat::default_for("t1", DocumentType::Invoice);
        format.include_branch = true;
        seed_format(&db, &format).await;

        let err = service
            .generate("t1", DocumentType::Invoice, None)
            .await
            .unwrap_err();
        assert!(matches!(err, NumberingError::BranchRequired { .. }));

        // The counter must be untouched: next branch-supplied call gets 1
        let branch = BranchRef::new("b1", "DS1", "Downtown");
        let generated = service
            .generate("t1", DocumentType::Invoice, Some(&branch))
            .await
            .unwrap();
        assert_eq!(generated.sequence_value, 1);
    }

    #[tokio::test]
    async fn test_monthly_rollover_restarts_at_one() {
        let db = test_db().await;

        let mut format = DocumentNumberFormat::default_for("t1", DocumentType::Invoice);
        format.sequence_reset_frequency = ResetFrequency::Monthly;
        format.include_year = false;
        seed_format(&db, &format).await;

        // Last second of March
        let march = service_at(&db, at(2025, 3, 31, 23, 59, 59));
        let a = march.generate("t1", DocumentType::Invoice, None).await.unwrap();
        let b = march.generate("t1", DocumentType::Invoice, None).await.unwrap();
        assert_eq!(a.period_key, "202503");
        assert_eq!((a.sequence_value, b.sequence_value), (1, 2));

        // First second of April: new scope, counter restarts at 1
        let april = service_at(&db, at(2025, 4, 1, 0, 0, 1));
        let c = april.generate("t1", DocumentType::Invoice, None).await.unwrap();
        assert_eq!(c.period_key, "202504");
        assert_eq!(c.sequence_value, 1);

        // March's counter row is untouched history
        let info = march
            .sequence_info("t1", DocumentType::Invoice, None)
            .await
            .unwrap();
        assert_eq!(info.current_value, 2);
        assert_eq!(info.period_key, "202503");
    }

    #[tokio::test]
    async fn test_preview_has_no_side_effects() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 3, 14, 9, 0, 0));
        let format = DocumentNumberFormat::default_for("t1", DocumentType::Estimate);
        seed_format(&db, &format).await;

        // Any number of previews...
        for _ in 0..10 {
            let preview = service.preview(&format, None).await.unwrap();
            assert_eq!(preview, "EST-2025-001");
        }

        // ...never consume the value the next generate returns
        let generated = service
            .generate("t1", DocumentType::Estimate, None)
            .await
            .unwrap();
        assert_eq!(generated.number, "EST-2025-001");

        // And preview now shows the following number
        let preview = service.preview(&format, None).await.unwrap();
        assert_eq!(preview, "EST-2025-002");
    }

    #[tokio::test]
    async fn test_preview_rejects_invalid_candidate() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 1, 1, 0, 0, 0));

        let mut format = DocumentNumberFormat::default_for("t1", DocumentType::Estimate);
        format.sequence_length = 0;

        let err = service.preview(&format, None).await.unwrap_err();
        assert!(matches!(err, NumberingError::InvalidFormat(_)));
    }

    #[tokio::test]
    async fn test_preview_uses_placeholder_branch() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 3, 14, 9, 0, 0));

        let mut format = DocumentNumberFormat::default_for("t1", DocumentType::JobSheet);
        format.include_branch = true;

        let preview = service.preview(&format, None).await.unwrap();
        assert_eq!(preview, "JS-BR1-2025-001");
    }

    #[tokio::test]
    async fn test_sequence_info_for_unallocated_scope() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 3, 14, 9, 0, 0));
        seed_format(&db, &DocumentNumberFormat::default_for("t1", DocumentType::JobSheet)).await;

        let info = service
            .sequence_info("t1", DocumentType::JobSheet, None)
            .await
            .unwrap();
        assert_eq!(info.current_value, 0);
        assert_eq!(info.period_key, "2025");
    }

    #[tokio::test]
    async fn test_save_format_invalidates_cache() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 3, 14, 9, 0, 0));

        let mut format = DocumentNumberFormat::default_for("t1", DocumentType::Invoice);
        service.save_format(&format).await.unwrap();

        // Prime the cache
        let generated = service.generate("t1", DocumentType::Invoice, None).await.unwrap();
        assert_eq!(generated.number, "INV-2025-001");

        // Edit the prefix; the save must invalidate the cached row
        format.prefix = "RG".to_string();
        service.save_format(&format).await.unwrap();

        let generated = service.generate("t1", DocumentType::Invoice, None).await.unwrap();
        assert_eq!(generated.number, "RG-2025-002");
    }

    #[tokio::test]
    async fn test_save_format_rejects_invalid() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 1, 1, 0, 0, 0));

        let mut format = DocumentNumberFormat::default_for("t1", DocumentType::Invoice);
        format.prefix = String::new();

        let err = service.save_format(&format).await.unwrap_err();
        assert!(matches!(err, NumberingError::InvalidFormat(_)));

        // Nothing was stored
        let err = service.get_format("t1", DocumentType::Invoice).await.unwrap_err();
        assert!(matches!(err, NumberingError::FormatNotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_never_reset_uses_lifetime_scope() {
        let db = test_db().await;

        let mut format = DocumentNumberFormat::default_for("t1", DocumentType::ServiceTicket);
        format.sequence_reset_frequency = ResetFrequency::Never;
        format.include_year = false;
        seed_format(&db, &format).await;

        // Counter carries across years
        let y2025 = service_at(&db, at(2025, 6, 1, 0, 0, 0));
        let y2026 = service_at(&db, at(2026, 6, 1, 0, 0, 0));

        assert_eq!(
            y2025.generate("t1", DocumentType::ServiceTicket, None).await.unwrap().number,
            "ST-001"
        );
        let next = y2026.generate("t1", DocumentType::ServiceTicket, None).await.unwrap();
        assert_eq!(next.number, "ST-002");
        assert_eq!(next.period_key, "*");
    }

    #[tokio::test]
    async fn test_allocation_failure_surfaces_as_allocation_failed() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 3, 14, 9, 0, 0));
        seed_format(&db, &DocumentNumberFormat::default_for("t1", DocumentType::JobSheet)).await;

        // Prime the format cache, then take the store down
        service
            .generate("t1", DocumentType::JobSheet, None)
            .await
            .unwrap();
        db.close().await;

        // The caller must see a hard allocation failure, never a number
        let err = service
            .generate("t1", DocumentType::JobSheet, None)
            .await
            .unwrap_err();
        assert!(matches!(err, NumberingError::AllocationFailed { .. }));
    }

    #[tokio::test]
    async fn test_overflow_renders_full_width() {
        let db = test_db().await;
        let service = service_at(&db, at(2025, 1, 1, 0, 0, 0));

        let mut format = DocumentNumberFormat::default_for("t1", DocumentType::JobSheet);
        format.include_year = false;
        seed_format(&db, &format).await;

        for _ in 0..999 {
            service.generate("t1", DocumentType::JobSheet, None).await.unwrap();
        }
        let thousandth = service
            .generate("t1", DocumentType::JobSheet, None)
            .await
            .unwrap();
        assert_eq!(thousandth.number, "JS-1000");
    }
}
