//! # Sequence Allocator
//!
//! Atomic sequence allocation - the only shared mutable state in the system.
//!
//! ## Allocation Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Atomic Increment-or-Insert                          │
//! │                                                                         │
//! │  allocate(scope)                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO sequence_counters (.., current_value = 1)                 │
//! │  ON CONFLICT (tenant, type, branch, period)                            │
//! │  DO UPDATE SET current_value = current_value + 1                       │
//! │  RETURNING current_value                                               │
//! │       │                                                                 │
//! │       ├── Row existed:  increment happens INSIDE the statement,        │
//! │       │                 under the store's row lock                     │
//! │       │                                                                 │
//! │       └── First allocation race: exactly one caller inserts "1",       │
//! │                 the loser's INSERT becomes an increment to "2"         │
//! │                                                                         │
//! │  NEVER: read value → increment in app memory → write back.             │
//! │  That is the classic lost-update bug; two racing callers would         │
//! │  both read N and both write N+1.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contention Model
//! The single upsert statement is the only serialization point, scoped to
//! one (tenant, document type, branch, period) row. Different document
//! types, branches, or tenants never contend with each other. Under
//! SQLITE_BUSY the attempt is retried with bounded exponential backoff,
//! never an infinite loop.
//!
//! ## Durability
//! The statement commits before `allocate` returns, so a returned value is
//! "spent" even if the caller crashes before using it. That yields
//! at-least-once semantics for the *document* and not-more-than-once for
//! the *number*: gaps are possible under failure, duplicates are not.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::Utc;
use sqlx::SqlitePool;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::DbResult;
use fixdesk_core::SequenceScope;

/// Backoff before the first retry; doubles per attempt (25/50/100/200 ms).
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(25);

/// Cap on a single backoff interval.
const MAX_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Total retry budget. Once this much time has elapsed the next transient
/// failure surfaces as a hard error (roughly five attempts at the delays
/// above).
const MAX_RETRY_ELAPSED: Duration = Duration::from_millis(500);

/// Retry policy for transient store failures.
fn retry_policy() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: INITIAL_RETRY_DELAY,
        max_interval: MAX_RETRY_DELAY,
        multiplier: 2.0,
        randomization_factor: 0.0,
        max_elapsed_time: Some(MAX_RETRY_ELAPSED),
        ..Default::default()
    }
}

/// Runs a store operation, retrying transient failures per the policy.
///
/// Non-transient errors surface immediately; transient ones are retried
/// until the policy's elapsed-time budget runs out, then surface as hard
/// errors. Callers must not proceed without a result.
async fn retry_transient<T, Op, Fut>(mut policy: ExponentialBackoff, operation: Op) -> DbResult<T>
where
    Op: Fn() -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => match policy.next_backoff() {
                Some(delay) => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient store failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    warn!(attempt, error = %err, "Retry budget exhausted");
                    return Err(err);
                }
            },
            Err(err) => return Err(err),
        }
    }
}

/// Allocator for per-scope sequence counters.
///
/// This type exclusively owns read-modify-write access to the
/// `sequence_counters` table. No other component may mutate
/// `current_value`.
#[derive(Debug, Clone)]
pub struct SequenceAllocator {
    pool: SqlitePool,
}

impl SequenceAllocator {
    /// Creates a new SequenceAllocator.
    pub fn new(pool: SqlitePool) -> Self {
        SequenceAllocator { pool }
    }

    /// Atomically allocates the next sequence value for a scope.
    ///
    /// ## Guarantees
    /// - Two concurrent calls for the same scope never return the same value
    /// - Values for a scope are strictly increasing across calls, including
    ///   across process restarts (the counter row is durable)
    /// - The first allocation for a brand-new scope returns 1
    ///
    /// ## Errors
    /// Transient store errors (SQLITE_BUSY, pool exhaustion) are retried
    /// with exponential backoff until [`MAX_RETRY_ELAPSED`] runs out.
    /// Exhausting the budget, or any non-transient error, surfaces as a
    /// hard failure - callers must not proceed without a number.
    pub async fn allocate(&self, scope: &SequenceScope) -> DbResult<i64> {
        let value = retry_transient(retry_policy(), || self.try_allocate(scope))
            .await
            .map_err(|err| {
                warn!(scope = %scope, error = %err, "Sequence allocation failed");
                err
            })?;

        debug!(scope = %scope, value, "Allocated sequence value");
        Ok(value)
    }

    /// One allocation attempt: a single atomic upsert statement.
    ///
    /// The increment executes inside the statement under SQLite's write
    /// lock, and the insert/increment race on a brand-new scope resolves
    /// via the primary-key conflict target - one winner inserts 1, the
    /// other increments to 2. Never two rows, never two callers seeing
    /// the same value.
    async fn try_allocate(&self, scope: &SequenceScope) -> DbResult<i64> {
        let now = Utc::now();

        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sequence_counters (
                tenant_id, document_type, branch_id, period_key,
                current_value, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            ON CONFLICT (tenant_id, document_type, branch_id, period_key)
            DO UPDATE SET
                current_value = current_value + 1,
                updated_at = excluded.updated_at
            RETURNING current_value
            "#,
        )
        .bind(&scope.tenant_id)
        .bind(scope.document_type)
        .bind(&scope.branch_id)
        .bind(&scope.period_key)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }

    /// Reads the current counter value for a scope without incrementing.
    ///
    /// Used by previews and sequence introspection. Returns `None` when the
    /// scope has never allocated. Never takes the write lock.
    pub async fn current_value(&self, scope: &SequenceScope) -> DbResult<Option<i64>> {
        let value: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT current_value FROM sequence_counters
            WHERE tenant_id = ?1 AND document_type = ?2
              AND branch_id = ?3 AND period_key = ?4
            "#,
        )
        .bind(&scope.tenant_id)
        .bind(scope.document_type)
        .bind(&scope.branch_id)
        .bind(&scope.period_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use fixdesk_core::DocumentType;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn scope(period_key: &str) -> SequenceScope {
        SequenceScope::new("t1", DocumentType::Invoice, None, period_key)
    }

    #[tokio::test]
    async fn test_first_allocation_is_one() {
        let db = test_db().await;
        let allocator = db.sequences();

        assert_eq!(allocator.allocate(&scope("2025")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sequential_allocations_are_strictly_increasing() {
        let db = test_db().await;
        let allocator = db.sequences();
        let scope = scope("2025");

        let mut previous = 0;
        for _ in 0..20 {
            let value = allocator.allocate(&scope).await.unwrap();
            assert!(value > previous, "{value} not greater than {previous}");
            previous = value;
        }
        assert_eq!(previous, 20);
    }

    #[tokio::test]
    async fn test_distinct_scopes_are_independent() {
        let db = test_db().await;
        let allocator = db.sequences();

        let jan = scope("202501");
        let feb = scope("202502");
        let branch = SequenceScope::new("t1", DocumentType::Invoice, Some("b1"), "202501");
        let other_type = SequenceScope::new("t1", DocumentType::Estimate, None, "202501");
        let other_tenant = SequenceScope::new("t2", DocumentType::Invoice, None, "202501");

        allocator.allocate(&jan).await.unwrap();
        allocator.allocate(&jan).await.unwrap();

        // Every other scope starts fresh at 1
        assert_eq!(allocator.allocate(&feb).await.unwrap(), 1);
        assert_eq!(allocator.allocate(&branch).await.unwrap(), 1);
        assert_eq!(allocator.allocate(&other_type).await.unwrap(), 1);
        assert_eq!(allocator.allocate(&other_tenant).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fresh_allocator_resumes_from_persisted_value() {
        let db = test_db().await;
        let scope = scope("2025");

        for _ in 0..3 {
            db.sequences().allocate(&scope).await.unwrap();
        }

        // Simulated restart: a brand-new allocator over the same store
        let resumed = SequenceAllocator::new(db.pool().clone());
        assert_eq!(resumed.allocate(&scope).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_current_value_does_not_consume() {
        let db = test_db().await;
        let allocator = db.sequences();
        let scope = scope("2025");

        assert_eq!(allocator.current_value(&scope).await.unwrap(), None);

        allocator.allocate(&scope).await.unwrap();
        for _ in 0..5 {
            assert_eq!(allocator.current_value(&scope).await.unwrap(), Some(1));
        }

        assert_eq!(allocator.allocate(&scope).await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_allocations_are_unique() {
        let db = test_db().await;
        let scope = scope("2025");

        const TASKS: usize = 200;
        let mut handles = Vec::with_capacity(TASKS);
        for _ in 0..TASKS {
            let allocator = db.sequences();
            let scope = scope.clone();
            handles.push(tokio::spawn(async move {
                allocator.allocate(&scope).await.unwrap()
            }));
        }

        let mut values = HashSet::new();
        for handle in handles {
            let value = handle.await.unwrap();
            assert!(values.insert(value), "duplicate sequence value {value}");
        }

        assert_eq!(values.len(), TASKS);
        assert_eq!(values.iter().max(), Some(&(TASKS as i64)));
        assert_eq!(values.iter().min(), Some(&1));
    }

    #[tokio::test]
    async fn test_transient_failures_exhaust_the_retry_budget() {
        let attempts = AtomicU32::new(0);

        let result: DbResult<i64> = retry_transient(retry_policy(), || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(DbError::QueryFailed("database is locked".to_string()))
        })
        .await;

        // The transient error surfaces as a hard failure once the budget
        // runs out - never an infinite loop
        assert!(matches!(result, Err(DbError::QueryFailed(_))));

        let attempts = attempts.load(Ordering::SeqCst);
        assert!(attempts > 1, "transient failure was never retried");
        assert!(attempts <= 10, "{attempts} attempts, budget not enforced");
    }

    #[tokio::test]
    async fn test_non_transient_failure_is_not_retried() {
        let attempts = AtomicU32::new(0);

        let result: DbResult<i64> = retry_transient(retry_policy(), || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(DbError::Internal("no such table: sequence_counters".to_string()))
        })
        .await;

        assert!(matches!(result, Err(DbError::Internal(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_allocate_on_closed_pool_is_a_hard_error() {
        let db = test_db().await;
        let allocator = db.sequences();
        db.close().await;

        let err = allocator.allocate(&scope("2025")).await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }
}
