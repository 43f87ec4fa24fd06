//! # Domain Types
//!
//! Core domain types for the document numbering subsystem.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐   ┌──────────────────┐   ┌────────────────┐  │
//! │  │ DocumentNumberFormat │   │  SequenceScope   │   │   BranchRef    │  │
//! │  │  ──────────────────  │   │  ──────────────  │   │  ────────────  │  │
//! │  │  tenant_id           │   │  tenant_id       │   │  id (UUID)     │  │
//! │  │  document_type       │   │  document_type   │   │  code ("DS1")  │  │
//! │  │  prefix, separator   │   │  branch_id       │   │  name          │  │
//! │  │  include_* flags     │   │  period_key      │   └────────────────┘  │
//! │  │  sequence_length     │   └──────────────────┘                       │
//! │  └──────────────────────┘                                              │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐      │
//! │  │  DocumentType    │  │  ResetFrequency  │  │  YearFormat      │      │
//! │  │  ──────────────  │  │  ──────────────  │  │  ──────────────  │      │
//! │  │  JobSheet        │  │  Never           │  │  Full   (2025)   │      │
//! │  │  Invoice         │  │  Daily           │  │  Short  (25)     │      │
//! │  │  Estimate        │  │  Monthly         │  └──────────────────┘      │
//! │  │  ServiceTicket   │  │  Yearly          │                            │
//! │  └──────────────────┘  └──────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership Boundaries
//! `DocumentNumberFormat` rows are created and edited by the administrative
//! settings flow; the numbering core only reads them. `SequenceScope` is the
//! composite identity a counter row is allocated per - the allocator in
//! fixdesk-db is the only component allowed to mutate counter values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{LIFETIME_PERIOD_KEY, NO_BRANCH};

// =============================================================================
// Document Type
// =============================================================================

/// The kind of business document a number is minted for.
///
/// Each (tenant, document type) pair owns exactly one format configuration
/// and an independent family of sequence counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Workshop job sheet opened when a unit comes in for repair.
    JobSheet,
    /// Customer invoice.
    Invoice,
    /// Pre-work estimate/quotation.
    Estimate,
    /// Service ticket for warranty and support flows.
    ServiceTicket,
}

impl DocumentType {
    /// All document types, in display order.
    pub const ALL: [DocumentType; 4] = [
        DocumentType::JobSheet,
        DocumentType::Invoice,
        DocumentType::Estimate,
        DocumentType::ServiceTicket,
    ];

    /// Stable snake_case name, matching the serde and database encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::JobSheet => "job_sheet",
            DocumentType::Invoice => "invoice",
            DocumentType::Estimate => "estimate",
            DocumentType::ServiceTicket => "service_ticket",
        }
    }

    /// Default number prefix used when a tenant is provisioned.
    pub fn default_prefix(&self) -> &'static str {
        match self {
            DocumentType::JobSheet => "JS",
            DocumentType::Invoice => "INV",
            DocumentType::Estimate => "EST",
            DocumentType::ServiceTicket => "ST",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    /// Parses the snake_case name. Hyphens are accepted as well so the
    /// REST path segment `job-sheet` round-trips.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "job_sheet" => Ok(DocumentType::JobSheet),
            "invoice" => Ok(DocumentType::Invoice),
            "estimate" => Ok(DocumentType::Estimate),
            "service_ticket" => Ok(DocumentType::ServiceTicket),
            other => Err(format!("unknown document type: {other}")),
        }
    }
}

// =============================================================================
// Reset Frequency
// =============================================================================

/// How often the sequence counter scope rolls over to a fresh period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ResetFrequency {
    /// One lifetime scope; the counter never resets.
    Never,
    /// New scope every calendar day (UTC).
    Daily,
    /// New scope every calendar month (UTC).
    Monthly,
    /// New scope every calendar year (UTC).
    Yearly,
}

impl Default for ResetFrequency {
    fn default() -> Self {
        ResetFrequency::Yearly
    }
}

// =============================================================================
// Year Format
// =============================================================================

/// How the year segment is rendered when `include_year` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum YearFormat {
    /// Four digits: `2025`.
    Full,
    /// Last two digits: `25`.
    Short,
}

impl Default for YearFormat {
    fn default() -> Self {
        YearFormat::Full
    }
}

// =============================================================================
// Branch Format
// =============================================================================

/// How the branch segment is rendered when `include_branch` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BranchFormat {
    /// Render the branch's short code, e.g. `DS1`.
    Code,
    /// Render the branch's display name, e.g. `Downtown`.
    Name,
}

impl Default for BranchFormat {
    fn default() -> Self {
        BranchFormat::Code
    }
}

// =============================================================================
// Branch Reference
// =============================================================================

/// A lightweight reference to a branch, carried by callers at generation time.
///
/// The numbering core does not own branch entities; it only needs the
/// identity (for the counter scope) and the renderable code/name (for the
/// number string).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    /// Branch identifier (UUID v4) - keys the counter scope.
    pub id: String,
    /// Short code shown inside document numbers, e.g. "DS1".
    pub code: String,
    /// Display name, used when the format renders branches by name.
    pub name: String,
}

impl BranchRef {
    /// Convenience constructor.
    pub fn new(id: impl Into<String>, code: impl Into<String>, name: impl Into<String>) -> Self {
        BranchRef {
            id: id.into(),
            code: code.into(),
            name: name.into(),
        }
    }

    /// Returns the segment text for the given branch rendering mode.
    pub fn render(&self, format: BranchFormat) -> &str {
        match format {
            BranchFormat::Code => &self.code,
            BranchFormat::Name => &self.name,
        }
    }
}

// =============================================================================
// Document Number Format
// =============================================================================

/// Format configuration for one (tenant, document type) pair.
///
/// ## Lifecycle
/// Created with defaults when a tenant is provisioned, mutated only by
/// tenant administrators through the settings UI. The generation path
/// trusts stored rows; validation runs once at save time
/// (see [`crate::validation::validate_format`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DocumentNumberFormat {
    /// Tenant this format belongs to.
    pub tenant_id: String,

    /// Document type this format applies to.
    pub document_type: DocumentType,

    /// Leading segment, e.g. "JS" or "INV". Always present.
    pub prefix: String,

    /// Separator placed between segments. Empty means direct concatenation;
    /// at most one character.
    pub separator: String,

    /// How often the counter scope rolls over.
    pub sequence_reset_frequency: ResetFrequency,

    /// Minimum digit width of the sequence segment (zero-padded).
    /// Values wider than this render at full width, never truncated.
    pub sequence_length: u32,

    /// Whether a branch segment appears. When true, callers must supply
    /// a branch at generation time.
    pub include_branch: bool,

    /// How the branch segment is rendered.
    pub branch_format: BranchFormat,

    /// Whether a year segment appears.
    pub include_year: bool,

    /// Full or two-digit year rendering.
    pub year_format: YearFormat,

    /// Whether a two-digit month segment appears.
    pub include_month: bool,

    /// Whether a two-digit day segment appears.
    pub include_day: bool,

    /// When the format row was created.
    pub created_at: DateTime<Utc>,

    /// When the format row was last edited.
    pub updated_at: DateTime<Utc>,
}

impl DocumentNumberFormat {
    /// The default format a tenant receives at provisioning time.
    ///
    /// ## Defaults
    /// - prefix per document type ("JS", "INV", "EST", "ST")
    /// - "-" separator, full year segment, yearly reset
    /// - sequence padded to 3 digits, no branch/month/day segments
    pub fn default_for(tenant_id: impl Into<String>, document_type: DocumentType) -> Self {
        let now = Utc::now();
        DocumentNumberFormat {
            tenant_id: tenant_id.into(),
            document_type,
            prefix: document_type.default_prefix().to_string(),
            separator: "-".to_string(),
            sequence_reset_frequency: ResetFrequency::Yearly,
            sequence_length: 3,
            include_branch: false,
            branch_format: BranchFormat::Code,
            include_year: true,
            year_format: YearFormat::Full,
            include_month: false,
            include_day: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Sequence Scope
// =============================================================================

/// The composite identity a sequence counter is allocated per.
///
/// Two scopes that differ in any component never contend with each other:
/// different tenants, document types, branches, and periods each get an
/// independent counter row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceScope {
    pub tenant_id: String,
    pub document_type: DocumentType,
    /// Branch identifier, or [`NO_BRANCH`] when the format has no
    /// branch segment.
    pub branch_id: String,
    /// Period identifier derived from the reset frequency, or
    /// [`LIFETIME_PERIOD_KEY`] for never-resetting scopes.
    pub period_key: String,
}

impl SequenceScope {
    /// Builds a scope key from its parts. A missing branch collapses to
    /// the [`NO_BRANCH`] sentinel so the composite key stays total.
    pub fn new(
        tenant_id: impl Into<String>,
        document_type: DocumentType,
        branch_id: Option<&str>,
        period_key: impl Into<String>,
    ) -> Self {
        SequenceScope {
            tenant_id: tenant_id.into(),
            document_type,
            branch_id: branch_id.unwrap_or(NO_BRANCH).to_string(),
            period_key: period_key.into(),
        }
    }

    /// True when this scope belongs to a never-resetting counter.
    pub fn is_lifetime(&self) -> bool {
        self.period_key == LIFETIME_PERIOD_KEY
    }
}

impl fmt::Display for SequenceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.tenant_id,
            self.document_type,
            if self.branch_id.is_empty() { "-" } else { &self.branch_id },
            self.period_key
        )
    }
}

// =============================================================================
// Sequence Info
// =============================================================================

/// Read-only snapshot of a counter scope, for operational visibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceInfo {
    /// The last value handed out for the scope. Zero when the scope has
    /// never allocated.
    pub current_value: i64,
    /// The period key the scope is currently in.
    pub period_key: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_round_trip() {
        for dt in DocumentType::ALL {
            assert_eq!(dt.as_str().parse::<DocumentType>().unwrap(), dt);
        }
    }

    #[test]
    fn test_document_type_accepts_hyphens() {
        assert_eq!(
            "job-sheet".parse::<DocumentType>().unwrap(),
            DocumentType::JobSheet
        );
        assert_eq!(
            "service-ticket".parse::<DocumentType>().unwrap(),
            DocumentType::ServiceTicket
        );
        assert!("receipt".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_default_format() {
        let format = DocumentNumberFormat::default_for("t1", DocumentType::Invoice);
        assert_eq!(format.prefix, "INV");
        assert_eq!(format.separator, "-");
        assert_eq!(format.sequence_reset_frequency, ResetFrequency::Yearly);
        assert_eq!(format.sequence_length, 3);
        assert!(format.include_year);
        assert!(!format.include_branch);
    }

    #[test]
    fn test_scope_collapses_missing_branch() {
        let scope = SequenceScope::new("t1", DocumentType::JobSheet, None, "2025");
        assert_eq!(scope.branch_id, NO_BRANCH);

        let scoped = SequenceScope::new("t1", DocumentType::JobSheet, Some("b1"), "2025");
        assert_ne!(scope, scoped);
    }

    #[test]
    fn test_branch_render() {
        let branch = BranchRef::new("b1", "DS1", "Downtown");
        assert_eq!(branch.render(BranchFormat::Code), "DS1");
        assert_eq!(branch.render(BranchFormat::Name), "Downtown");
    }
}
