//! # Repository Module
//!
//! Database repository implementations for the numbering subsystem.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  DocumentNumberService                                                 │
//! │       │                                                                 │
//! │       │  sequences.allocate(&scope)                                    │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  SequenceAllocator                                                     │
//! │  ├── allocate(&self, scope)        ← atomic increment-or-insert        │
//! │  └── current_value(&self, scope)   ← read-only peek                    │
//! │       │                                                                 │
//! │       │  SQL (single upsert statement)                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • The concurrency-critical statement has exactly one owner            │
//! │  • Easy to test against an in-memory database                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`format::FormatRepository`] - Format configuration read/upsert
//! - [`sequence::SequenceAllocator`] - Atomic sequence allocation

pub mod format;
pub mod sequence;
