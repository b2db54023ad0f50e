//! Progress scoring and finalization eligibility.
//!
//! # Responsibility
//! - Turn a record's category states into a weighted progress percentage.
//! - Answer the finalization-eligibility predicate every write path shares.
//!
//! # Invariants
//! - `total_percent` stays within `[0, 100]`.
//! - `eligible_for_finalization` always equals `can_finalize` for the same
//!   record.
//! - Missing or unknown category entries never fail; they score as
//!   not completed.

use crate::engine::taxonomy::OptionalShareRule;
use crate::engine::CompletionEngine;
use crate::model::record::ProjectRecord;
use serde::{Deserialize, Serialize};

/// Snapshot of how complete one record is.
///
/// The same value feeds progress bars, export rows and the write-path
/// eligibility check, so read and write sides never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Weighted completion percentage in `[0, 100]`.
    pub total_percent: f64,
    /// Completed categories from the required set.
    pub required_completed: usize,
    /// Size of the required set.
    pub required_total: usize,
    /// Whether any optional category is completed.
    pub optional_completed: bool,
    /// Whether every required category is completed.
    pub eligible_for_finalization: bool,
}

impl CompletionEngine {
    /// Computes the progress summary for one record.
    ///
    /// Pure arithmetic over the category map; records missing their category
    /// map entirely score as all-incomplete rather than failing.
    pub fn compute_progress(&self, record: &ProjectRecord) -> ProgressSummary {
        let taxonomy = self.taxonomy();

        let required_total = taxonomy.required().len();
        let required_completed = taxonomy
            .required()
            .iter()
            .filter(|category| record.category_completed(category))
            .count();

        let optional_total = taxonomy.optional().len();
        let optional_done = taxonomy
            .optional()
            .iter()
            .filter(|category| record.category_completed(category))
            .count();
        let optional_completed = optional_done > 0;

        let required_share =
            (required_completed as f64 / required_total as f64) * taxonomy.required_weight();
        let optional_share = match taxonomy.optional_share_rule() {
            OptionalShareRule::AllOrNothing => {
                if optional_completed {
                    taxonomy.optional_weight()
                } else {
                    0.0
                }
            }
            OptionalShareRule::ProRated => {
                if optional_total == 0 {
                    0.0
                } else {
                    (optional_done as f64 / optional_total as f64) * taxonomy.optional_weight()
                }
            }
        };

        ProgressSummary {
            total_percent: (required_share + optional_share).clamp(0.0, 100.0),
            required_completed,
            required_total,
            optional_completed,
            eligible_for_finalization: required_completed == required_total,
        }
    }

    /// Returns true iff every required category is completed.
    ///
    /// Single source of truth for the finalization condition: the explicit
    /// finalize guard, the auto-finalize trigger and the fleet report all
    /// call this predicate.
    pub fn can_finalize(&self, record: &ProjectRecord) -> bool {
        self.taxonomy()
            .required()
            .iter()
            .all(|category| record.category_completed(category))
    }

    /// Unmet required categories in vocabulary order.
    ///
    /// Empty exactly when `can_finalize` is true.
    pub fn missing_required(&self, record: &ProjectRecord) -> Vec<String> {
        self.taxonomy()
            .required()
            .iter()
            .filter(|category| !record.category_completed(category))
            .cloned()
            .collect()
    }
}
