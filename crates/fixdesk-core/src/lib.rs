//! # fixdesk-core: Pure Numbering Logic for Fixdesk
//!
//! This crate is the **heart** of the Fixdesk document numbering subsystem.
//! It contains everything that can be computed without touching a database:
//! format configuration types, period key resolution, number formatting,
//! and format validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Fixdesk Numbering Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   REST API (apps/api)                           │   │
//! │  │   GET/PUT /document-numbers, POST /document-numbers/preview     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            fixdesk-db: DocumentNumberService                    │   │
//! │  │        format cache • sequence allocator • repositories         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ fixdesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  period   │  │  format   │  │ validation│  │   │
//! │  │   │  Format   │  │ PeriodKey │  │ Formatter │  │   rules   │  │   │
//! │  │   │  Scope    │  │  Clock    │  │ segments  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (DocumentNumberFormat, SequenceScope, etc.)
//! - [`period`] - Period key resolution and the injectable Clock
//! - [`format`] - Assembling the final document number string
//! - [`error`] - Domain error types
//! - [`validation`] - Format configuration validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Injected Time**: Nothing calls `Utc::now()` directly; time flows in
//!    through the [`period::Clock`] trait so tests can pin the calendar
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use fixdesk_core::{format_number, period_key, DocumentNumberFormat, DocumentType};
//! use chrono::{TimeZone, Utc};
//!
//! let format = DocumentNumberFormat::default_for("tenant-1", DocumentType::JobSheet);
//! let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
//!
//! // "JS-2025-001": prefix, full year, sequence padded to 3 digits
//! let number = format_number(&format, None, at, 1);
//! assert_eq!(number, "JS-2025-001");
//!
//! // Yearly reset frequency keys the counter scope by year
//! assert_eq!(period_key(format.sequence_reset_frequency, at), "2025");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod format;
pub mod period;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use fixdesk_core::DocumentType` instead of
// `use fixdesk_core::types::DocumentType`

pub use error::ValidationError;
pub use format::format_number;
pub use period::{period_key, Clock, FixedClock, SystemClock};
pub use types::*;
pub use validation::validate_format;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Period key used when the reset frequency is [`types::ResetFrequency::Never`].
///
/// ## Why a constant?
/// A scope that never resets still needs a stable period component so the
/// counter table can use one composite key shape for every frequency.
pub const LIFETIME_PERIOD_KEY: &str = "*";

/// Branch column value stored when a format does not include a branch.
///
/// ## Why not NULL?
/// SQLite treats NULLs as distinct in unique indexes, which would break the
/// upsert conflict target on the counter table. An empty string keeps the
/// composite key total.
pub const NO_BRANCH: &str = "";

/// Maximum length of a format prefix.
pub const MAX_PREFIX_LEN: usize = 10;

/// Maximum configurable zero-padding width for the sequence segment.
///
/// ## Business Reason
/// Prevents administrators from configuring absurdly wide numbers
/// (e.g. typing 100 instead of 10). Overflow past the configured width
/// is still allowed at generation time.
pub const MAX_SEQUENCE_LENGTH: u32 = 12;
