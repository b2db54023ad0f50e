//! Production record domain model.
//!
//! # Responsibility
//! - Define the canonical record the completion engine evaluates.
//! - Provide shape validation shared by every write path.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another record.
//! - `finalized_at` is set if and only if `status == Finalized`.
//! - A category absent from `categories` counts as not completed.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a production record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type RecordId = Uuid;

/// Lifecycle status of a production record.
///
/// Monotonic in normal operation: once `Finalized`, nothing in the engine
/// regresses the record to `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// At least one required category is still open.
    InProgress,
    /// Terminal state; all required categories were completed.
    Finalized,
}

/// Per-category completion state inside a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryState {
    /// Whether the category work is done.
    pub completed: bool,
    /// Free-text notes attached by the reporter.
    pub notes: String,
    /// Who reported the state (email or display name).
    pub updated_by: String,
    /// Unix epoch milliseconds of the last state change.
    pub updated_at: i64,
}

impl CategoryState {
    /// Builds a completed state stamped with reporter and time.
    pub fn completed_by(updated_by: impl Into<String>, updated_at: i64) -> Self {
        Self {
            completed: true,
            notes: String::new(),
            updated_by: updated_by.into(),
            updated_at,
        }
    }
}

/// Canonical production record.
///
/// Category keys are drawn from the taxonomy vocabulary; unknown keys coming
/// from legacy data are tolerated on read and ignored by scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Stable global ID used for linking, auditing and storage.
    pub uuid: RecordId,
    /// Human-facing project number ("N/A" when unassigned).
    pub project_number: String,
    /// Plaza/site the work belongs to.
    pub plaza: String,
    /// User who logged the record.
    pub owner: String,
    /// Free-text work phase. Successor of the legacy revision flag.
    pub phase: Option<String>,
    /// Category name -> completion state. Absent key means not completed.
    pub categories: BTreeMap<String, CategoryState>,
    /// Production point tallies by kind (retrofit, remodeling, ...).
    pub points: BTreeMap<String, u32>,
    /// Lifecycle status.
    pub status: RecordStatus,
    /// Unix epoch milliseconds of finalization. Set exactly once.
    pub finalized_at: Option<i64>,
    /// Whether finalization was engine-driven rather than requested.
    pub finalized_automatically: bool,
}

/// Shape-level validation failures for `ProjectRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    /// The nil UUID is reserved and never a valid record ID.
    NilUuid,
    /// `status == Finalized` requires a finalization timestamp.
    MissingFinalizedAt,
    /// `finalized_at` must stay empty while the record is in progress.
    UnexpectedFinalizedAt,
    /// `finalized_automatically` is meaningful only on finalized records.
    AutomaticFlagWithoutFinalization,
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "record uuid must not be nil"),
            Self::MissingFinalizedAt => {
                write!(f, "finalized record is missing finalized_at")
            }
            Self::UnexpectedFinalizedAt => {
                write!(f, "in-progress record must not carry finalized_at")
            }
            Self::AutomaticFlagWithoutFinalization => {
                write!(f, "finalized_automatically set on a non-finalized record")
            }
        }
    }
}

impl Error for RecordValidationError {}

impl ProjectRecord {
    /// Creates a new in-progress record with a generated stable ID.
    pub fn new(
        project_number: impl Into<String>,
        plaza: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            project_number: project_number.into(),
            plaza: plaza.into(),
            owner: owner.into(),
            phase: None,
            categories: BTreeMap::new(),
            points: BTreeMap::new(),
            status: RecordStatus::InProgress,
            finalized_at: None,
            finalized_automatically: false,
        }
    }

    /// Creates a record with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    ///
    /// # Errors
    /// Returns `RecordValidationError::NilUuid` for the nil UUID.
    pub fn with_id(
        uuid: RecordId,
        project_number: impl Into<String>,
        plaza: impl Into<String>,
        owner: impl Into<String>,
    ) -> Result<Self, RecordValidationError> {
        if uuid.is_nil() {
            return Err(RecordValidationError::NilUuid);
        }
        let mut record = Self::new(project_number, plaza, owner);
        record.uuid = uuid;
        Ok(record)
    }

    /// Checks shape invariants that hold independent of any taxonomy.
    ///
    /// Taxonomy-dependent rules (required categories complete before
    /// finalization) are enforced by the completion engine, which owns the
    /// category vocabulary.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.uuid.is_nil() {
            return Err(RecordValidationError::NilUuid);
        }
        match self.status {
            RecordStatus::Finalized => {
                if self.finalized_at.is_none() {
                    return Err(RecordValidationError::MissingFinalizedAt);
                }
            }
            RecordStatus::InProgress => {
                if self.finalized_at.is_some() {
                    return Err(RecordValidationError::UnexpectedFinalizedAt);
                }
                if self.finalized_automatically {
                    return Err(RecordValidationError::AutomaticFlagWithoutFinalization);
                }
            }
        }
        Ok(())
    }

    /// Returns whether the named category is completed.
    ///
    /// Absent keys count as not completed.
    pub fn category_completed(&self, category: &str) -> bool {
        self.categories
            .get(category)
            .map_or(false, |state| state.completed)
    }

    /// Returns whether this record reached the terminal state.
    pub fn is_finalized(&self) -> bool {
        self.status == RecordStatus::Finalized
    }

    /// Sums production points across all kinds.
    pub fn total_points(&self) -> u32 {
        self.points.values().sum()
    }
}
