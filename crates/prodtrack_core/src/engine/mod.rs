//! Completion and progress engine for production records.
//!
//! # Responsibility
//! - Own the one authoritative rule set for "is this record done".
//! - Evaluate category states into progress scores and finalization
//!   decisions without performing any I/O.
//!
//! # Invariants
//! - Every operation is pure: inputs are never mutated, the clock enters as
//!   an explicit parameter.
//! - `can_finalize` is the single source of truth; no caller re-derives the
//!   required-category condition.
//! - A `Finalized` record is never regressed to `InProgress`.
//!
//! # See also
//! - docs/architecture/completion-rules.md

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod progress;
pub mod report;
pub mod taxonomy;
pub mod transition;

pub use progress::ProgressSummary;
pub use report::{CategoryPending, FleetReport};
pub use taxonomy::{OptionalShareRule, Taxonomy, TaxonomyError};
pub use transition::{FinalizationTransition, UpdateOutcome};

/// Evaluation errors surfaced to callers before any state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Update referenced a category outside the taxonomy vocabulary.
    UnknownCategory {
        name: String,
        known: Vec<String>,
    },
    /// Explicit finalization attempted with required work still open.
    IncompleteRequiredCategories(Vec<String>),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCategory { name, known } => write!(
                f,
                "unknown category `{name}`; known categories: {}",
                known.join(", ")
            ),
            Self::IncompleteRequiredCategories(missing) => write!(
                f,
                "cannot finalize: required categories incomplete: {}",
                missing.join(", ")
            ),
        }
    }
}

impl Error for EngineError {}

/// Pure evaluator over an injected category taxonomy.
///
/// Construct one per configured taxonomy and share it freely: the engine is
/// stateless between calls and safe for any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct CompletionEngine {
    taxonomy: Taxonomy,
}

impl CompletionEngine {
    /// Creates an engine over a validated taxonomy.
    ///
    /// # Errors
    /// Returns `TaxonomyError` when the injected taxonomy is malformed
    /// (empty required set, duplicate names, weights not summing to 100).
    /// Deserialized taxonomies are validated here, at the injection point.
    pub fn new(taxonomy: Taxonomy) -> Result<Self, TaxonomyError> {
        taxonomy.validate()?;
        Ok(Self { taxonomy })
    }

    /// Creates an engine over the standard production taxonomy.
    pub fn standard() -> Self {
        Self {
            taxonomy: Taxonomy::standard(),
        }
    }

    /// Returns the taxonomy this engine evaluates against.
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }
}
