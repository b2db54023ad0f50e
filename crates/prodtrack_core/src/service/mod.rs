//! Use-case services wiring the completion engine to persistence.
//!
//! # Responsibility
//! - Provide stable entry points for callers (create, edit, finalize,
//!   report).
//! - Delegate completion rules to the engine and storage to repositories.
//!
//! # Invariants
//! - Services never re-derive completion rules; the engine is the single
//!   source of truth.
//! - The system clock enters the domain only through this layer.

pub mod record_service;
