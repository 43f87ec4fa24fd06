//! # Period Key Resolution
//!
//! Maps a reset frequency and a point in time to a stable period identifier.
//!
//! ## Period Keys
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Period Key Resolution                             │
//! │                                                                         │
//! │  ResetFrequency   Time (UTC)              Period Key                   │
//! │  ──────────────   ─────────────────────   ──────────                   │
//! │  Never            (any)                   "*"                          │
//! │  Daily            2025-03-14T09:30:00Z    "20250314"                   │
//! │  Monthly          2025-03-14T09:30:00Z    "202503"                     │
//! │  Yearly           2025-03-14T09:30:00Z    "2025"                       │
//! │                                                                         │
//! │  The period key is the calendar component of the counter scope.        │
//! │  When it changes, allocation lands on a brand-new counter row and      │
//! │  the sequence restarts at 1. Old rows are never touched again.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All resolution happens in UTC. Tenant-local time zones are a settings
//! concern outside this core; a tenant that needs local-midnight rollover
//! configures it upstream.

use chrono::{DateTime, Utc};

use crate::types::ResetFrequency;
use crate::LIFETIME_PERIOD_KEY;

/// Resolves the period key for a reset frequency at a point in time.
///
/// Pure and side-effect free. No errors are possible: every frequency
/// maps every instant to exactly one key.
///
/// ## Example
/// ```rust
/// use fixdesk_core::{period_key, ResetFrequency};
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
/// assert_eq!(period_key(ResetFrequency::Never, at), "*");
/// assert_eq!(period_key(ResetFrequency::Daily, at), "20250314");
/// assert_eq!(period_key(ResetFrequency::Monthly, at), "202503");
/// assert_eq!(period_key(ResetFrequency::Yearly, at), "2025");
/// ```
pub fn period_key(frequency: ResetFrequency, at: DateTime<Utc>) -> String {
    match frequency {
        ResetFrequency::Never => LIFETIME_PERIOD_KEY.to_string(),
        ResetFrequency::Daily => at.format("%Y%m%d").to_string(),
        ResetFrequency::Monthly => at.format("%Y%m").to_string(),
        ResetFrequency::Yearly => at.format("%Y").to_string(),
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for period resolution and calendar number segments.
///
/// ## Why a trait?
/// Period rollover is calendar-driven. Injecting the clock lets tests pin
/// an allocation to `2025-03-31T23:59:59` and the next one to
/// `2025-04-01T00:00:01` and observe two distinct scopes - something
/// `Utc::now()` sprinkled through the code would make untestable.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a fixed instant. Used by tests and by callers that
/// need deterministic previews.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_never_is_constant() {
        assert_eq!(period_key(ResetFrequency::Never, at(2025, 3, 14, 9, 0, 0)), "*");
        assert_eq!(period_key(ResetFrequency::Never, at(1999, 1, 1, 0, 0, 0)), "*");
    }

    #[test]
    fn test_daily_monthly_yearly() {
        let t = at(2025, 3, 14, 9, 30, 0);
        assert_eq!(period_key(ResetFrequency::Daily, t), "20250314");
        assert_eq!(period_key(ResetFrequency::Monthly, t), "202503");
        assert_eq!(period_key(ResetFrequency::Yearly, t), "2025");
    }

    #[test]
    fn test_single_digit_components_are_padded() {
        let t = at(2025, 1, 5, 0, 0, 0);
        assert_eq!(period_key(ResetFrequency::Daily, t), "20250105");
        assert_eq!(period_key(ResetFrequency::Monthly, t), "202501");
    }

    #[test]
    fn test_month_boundary_produces_distinct_keys() {
        let before = at(2025, 3, 31, 23, 59, 59);
        let after = at(2025, 4, 1, 0, 0, 1);
        assert_eq!(period_key(ResetFrequency::Monthly, before), "202503");
        assert_eq!(period_key(ResetFrequency::Monthly, after), "202504");
    }

    #[test]
    fn test_fixed_clock() {
        let t = at(2025, 6, 1, 12, 0, 0);
        let clock = FixedClock(t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), t);
    }
}
