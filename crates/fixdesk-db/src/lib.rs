//! # fixdesk-db: Database Layer for Fixdesk
//!
//! This crate provides persistence for the document numbering subsystem.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fixdesk Data Flow                                │
//! │                                                                         │
//! │  REST handler (POST /document-numbers/{type}/generate)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     fixdesk-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────────┐    ┌───────────────────┐                │   │
//! │  │   │ DocumentNumber   │    │   Repositories    │                │   │
//! │  │   │ Service          │───►│ FormatRepository  │                │   │
//! │  │   │ (numbering.rs)   │    │ SequenceAllocator │                │   │
//! │  │   │                  │    └─────────┬─────────┘                │   │
//! │  │   │ cache • validate │              │                          │   │
//! │  │   │ period • format  │    ┌─────────▼─────────┐                │   │
//! │  │   └──────────────────┘    │ Database (pool.rs)│                │   │
//! │  │                           │ WAL • migrations  │                │   │
//! │  │                           └───────────────────┘                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: document_number_formats, sequence_counters                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and numbering error types
//! - [`repository`] - Format repository and the sequence allocator
//! - [`numbering`] - The DocumentNumberService orchestrator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fixdesk_db::{Database, DbConfig, DocumentNumberService};
//! use fixdesk_core::DocumentType;
//!
//! let db = Database::new(DbConfig::new("path/to/fixdesk.db")).await?;
//! let numbering = DocumentNumberService::new(db.pool().clone());
//!
//! let generated = numbering
//!     .generate("tenant-1", DocumentType::Invoice, None)
//!     .await?;
//! println!("{}", generated.number); // e.g. "INV-2025-001"
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod numbering;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, NumberingError};
pub use numbering::{DocumentNumberService, GeneratedNumber};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::format::FormatRepository;
pub use repository::sequence::SequenceAllocator;
