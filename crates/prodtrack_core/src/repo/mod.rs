//! Persistence contracts for production records.
//!
//! # Responsibility
//! - Define storage-agnostic repository traits used by services.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate record shape before SQL mutations.
//! - Committed updates are compare-and-set on the record version.

pub mod record_repo;
