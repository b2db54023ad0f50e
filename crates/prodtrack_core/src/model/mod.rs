//! Canonical domain model for production records.
//!
//! # Responsibility
//! - Define the record shape evaluated by the completion engine.
//! - Keep one canonical shape for every caller (create, edit, report).
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`.
//! - `finalized_at` is present if and only if the record is finalized.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod legacy;
pub mod record;
