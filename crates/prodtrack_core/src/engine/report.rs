//! Fleet-wide reporting aggregate.
//!
//! # Responsibility
//! - Fold a collection of records into the administrative health report.
//!
//! # Invariants
//! - Uses the same `can_finalize`/`compute_progress` predicates as the
//!   write path, so read-side and write-side views never disagree.
//! - A single malformed record never aborts the fold; decode-level
//!   filtering happens before records reach this function.

use crate::engine::CompletionEngine;
use crate::model::record::ProjectRecord;
use serde::Serialize;

/// Pending count for one vocabulary category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryPending {
    pub category: String,
    pub pending: usize,
}

/// Administrative health report over a record fleet.
///
/// `ready_to_finalize` counts records whose required set is satisfied while
/// the stored status still says `InProgress` — a consistency signal that an
/// external updater failed to commit the transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FleetReport {
    /// Records folded into this report.
    pub total: usize,
    /// Records in the terminal state.
    pub finalized: usize,
    /// In-progress records that already satisfy the required set.
    pub ready_to_finalize: usize,
    /// Records with required work genuinely open.
    pub in_progress: usize,
    /// Pending counts in vocabulary order. Only genuinely in-progress
    /// records contribute.
    pub pending_by_category: Vec<CategoryPending>,
}

impl CompletionEngine {
    /// Folds records into a `FleetReport`.
    ///
    /// Pure and storage-independent; callers stream any iterable of
    /// records through it.
    pub fn summarize_fleet<'a, I>(&self, records: I) -> FleetReport
    where
        I: IntoIterator<Item = &'a ProjectRecord>,
    {
        let vocabulary: Vec<String> = self.taxonomy().vocabulary().map(str::to_string).collect();
        let mut pending = vec![0usize; vocabulary.len()];

        let mut total = 0;
        let mut finalized = 0;
        let mut ready_to_finalize = 0;
        let mut in_progress = 0;

        for record in records {
            total += 1;
            if record.is_finalized() {
                finalized += 1;
            } else if self.can_finalize(record) {
                ready_to_finalize += 1;
            } else {
                in_progress += 1;
                for (index, category) in vocabulary.iter().enumerate() {
                    if !record.category_completed(category) {
                        pending[index] += 1;
                    }
                }
            }
        }

        FleetReport {
            total,
            finalized,
            ready_to_finalize,
            in_progress,
            pending_by_category: vocabulary
                .into_iter()
                .zip(pending)
                .map(|(category, count)| CategoryPending {
                    category,
                    pending: count,
                })
                .collect(),
        }
    }
}
