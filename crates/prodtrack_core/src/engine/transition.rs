//! The one state transition a record may undergo.
//!
//! # Responsibility
//! - Apply category updates and decide whether they promote the record to
//!   `Finalized`.
//! - Guard the explicit (administrative) finalization path.
//!
//! # Invariants
//! - `InProgress -> Finalized` is the only transition; it is terminal.
//! - `finalized_at` is assigned exactly once.
//! - Re-applying an already-satisfied update yields an equal record and no
//!   second transition.

use crate::engine::{CompletionEngine, EngineError};
use crate::model::record::{CategoryState, ProjectRecord, RecordStatus};
use serde::Serialize;

/// Caller-facing description of an executed finalization.
///
/// Callers persist the returned record and may surface this value as a
/// user-facing notice or a log line; the engine itself performs neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizationTransition {
    /// Unix epoch milliseconds the transition was stamped with.
    pub finalized_at: i64,
    /// Engine-driven promotion versus explicit request.
    pub automatic: bool,
    /// The required categories that were complete at transition time.
    pub required_complete: Vec<String>,
}

/// Result of evaluating a record change.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// The record after the change (and possible promotion).
    pub record: ProjectRecord,
    /// Present only when this evaluation executed the transition.
    pub transition: Option<FinalizationTransition>,
}

impl CompletionEngine {
    /// Replaces one category state and auto-finalizes when that satisfies
    /// the required set.
    ///
    /// # Contract
    /// - `category` must belong to the taxonomy vocabulary; unknown names
    ///   are rejected before any state change.
    /// - Already-finalized records accept the category update (optional
    ///   work may be added after finalization) but never change status and
    ///   never re-emit a transition.
    ///
    /// # Errors
    /// `EngineError::UnknownCategory` for names outside the vocabulary.
    pub fn apply_category_update(
        &self,
        record: &ProjectRecord,
        category: &str,
        new_state: CategoryState,
        now_epoch_ms: i64,
    ) -> Result<UpdateOutcome, EngineError> {
        if !self.taxonomy().contains(category) {
            return Err(EngineError::UnknownCategory {
                name: category.to_string(),
                known: self.taxonomy().vocabulary().map(str::to_string).collect(),
            });
        }

        let mut updated = record.clone();
        updated.categories.insert(category.to_string(), new_state);

        if updated.is_finalized() {
            return Ok(UpdateOutcome {
                record: updated,
                transition: None,
            });
        }

        Ok(self.promote_if_eligible(updated, now_epoch_ms))
    }

    /// Auto-finalizes a whole record when the required set is satisfied.
    ///
    /// Used by the create/bulk-import path, where a record may arrive with
    /// every required category already completed.
    pub fn auto_finalize(&self, record: &ProjectRecord, now_epoch_ms: i64) -> UpdateOutcome {
        if record.is_finalized() {
            return UpdateOutcome {
                record: record.clone(),
                transition: None,
            };
        }
        self.promote_if_eligible(record.clone(), now_epoch_ms)
    }

    /// Explicit finalization for administrative override and correction.
    ///
    /// Identical to the automatic path on success, except
    /// `finalized_automatically` stays false. Finalizing an
    /// already-finalized record is an idempotent no-op: the original
    /// timestamp is never overwritten.
    ///
    /// # Errors
    /// `EngineError::IncompleteRequiredCategories` naming every unmet
    /// required category, in vocabulary order.
    pub fn finalize(
        &self,
        record: &ProjectRecord,
        now_epoch_ms: i64,
    ) -> Result<ProjectRecord, EngineError> {
        if record.is_finalized() {
            return Ok(record.clone());
        }

        let missing = self.missing_required(record);
        if !missing.is_empty() {
            return Err(EngineError::IncompleteRequiredCategories(missing));
        }

        let mut updated = record.clone();
        updated.status = RecordStatus::Finalized;
        updated.finalized_at = Some(now_epoch_ms);
        updated.finalized_automatically = false;
        Ok(updated)
    }

    fn promote_if_eligible(&self, mut record: ProjectRecord, now_epoch_ms: i64) -> UpdateOutcome {
        if !self.can_finalize(&record) {
            return UpdateOutcome {
                record,
                transition: None,
            };
        }

        record.status = RecordStatus::Finalized;
        record.finalized_at = Some(now_epoch_ms);
        record.finalized_automatically = true;

        let transition = FinalizationTransition {
            finalized_at: now_epoch_ms,
            automatic: true,
            required_complete: self.taxonomy().required().to_vec(),
        };

        UpdateOutcome {
            record,
            transition: Some(transition),
        }
    }
}
