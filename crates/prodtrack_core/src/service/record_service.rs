//! Record use-case service.
//!
//! # Responsibility
//! - Run the read -> evaluate -> compare-and-set write cycle around the
//!   pure completion engine.
//! - Stamp wall-clock time; the engine itself never reads the clock.
//!
//! # Invariants
//! - Every completion decision goes through the injected engine.
//! - Lost updates are handled here: version conflicts re-read and retry a
//!   bounded number of times, then surface to the caller.

use crate::engine::{CompletionEngine, EngineError, FleetReport, ProgressSummary, UpdateOutcome};
use crate::model::record::{CategoryState, ProjectRecord, RecordId};
use crate::repo::record_repo::{RecordListQuery, RecordRepository, RepoError};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Service error for record use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Target record does not exist.
    RecordNotFound(RecordId),
    /// Completion-rule rejection (unknown category, incomplete required).
    Engine(EngineError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Compare-and-set kept losing against concurrent writers.
    ConcurrentUpdate { id: RecordId, attempts: u32 },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecordNotFound(id) => write!(f, "record not found: {id}"),
            Self::Engine(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::ConcurrentUpdate { id, attempts } => write!(
                f,
                "gave up updating record {id} after {attempts} conflicting attempts"
            ),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EngineError> for ServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::RecordNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Draft for the create path (the submit form / bulk import shape).
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
    pub project_number: String,
    pub plaza: String,
    pub owner: String,
    pub phase: Option<String>,
    /// Category name -> completed flag, as submitted.
    pub categories: BTreeMap<String, bool>,
    pub points: BTreeMap<String, u32>,
}

/// One category change as submitted by a reporter.
#[derive(Debug, Clone)]
pub struct CategoryUpdateRequest {
    pub completed: bool,
    pub notes: String,
    pub updated_by: String,
}

/// Fleet report plus how many stored rows could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetReportOutcome {
    pub report: FleetReport,
    pub skipped: usize,
}

/// Use-case service wrapper around engine and repository.
pub struct RecordService<R: RecordRepository> {
    engine: CompletionEngine,
    repo: R,
}

impl<R: RecordRepository> RecordService<R> {
    /// Creates a service using the provided engine and repository.
    pub fn new(engine: CompletionEngine, repo: R) -> Self {
        Self { engine, repo }
    }

    /// Returns the engine this service evaluates with.
    pub fn engine(&self) -> &CompletionEngine {
        &self.engine
    }

    /// Logs a new production record.
    ///
    /// # Contract
    /// - Category names must belong to the taxonomy vocabulary.
    /// - A submission with every required category completed is finalized
    ///   on the spot (`finalized_automatically = true`), mirroring the
    ///   category-update path.
    pub fn log_record(&self, draft: NewRecord) -> Result<UpdateOutcome, ServiceError> {
        let now = now_epoch_ms();
        let mut record = ProjectRecord::new(draft.project_number, draft.plaza, draft.owner);
        record.phase = draft.phase;
        record.points = draft.points;

        for (name, completed) in draft.categories {
            if !self.engine.taxonomy().contains(&name) {
                return Err(EngineError::UnknownCategory {
                    name,
                    known: self
                        .engine
                        .taxonomy()
                        .vocabulary()
                        .map(str::to_string)
                        .collect(),
                }
                .into());
            }
            record.categories.insert(
                name,
                CategoryState {
                    completed,
                    notes: String::new(),
                    updated_by: record.owner.clone(),
                    updated_at: now,
                },
            );
        }

        let outcome = self.engine.auto_finalize(&record, now);
        self.repo.create_record(&outcome.record)?;

        info!(
            "event=record_create module=service status=ok record={} finalized={}",
            outcome.record.uuid,
            outcome.record.is_finalized()
        );
        if outcome.transition.is_some() {
            info!(
                "event=auto_finalize module=service status=ok record={} trigger=create",
                outcome.record.uuid
            );
        }

        Ok(outcome)
    }

    /// Applies one category update with optimistic-concurrency retry.
    ///
    /// Re-reads and re-evaluates on version conflict, so the engine always
    /// decides against the freshest stored state.
    pub fn update_category(
        &self,
        id: RecordId,
        category: &str,
        request: CategoryUpdateRequest,
    ) -> Result<UpdateOutcome, ServiceError> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let versioned = self
                .repo
                .get_record(id)?
                .ok_or(ServiceError::RecordNotFound(id))?;

            let now = now_epoch_ms();
            let state = CategoryState {
                completed: request.completed,
                notes: request.notes.clone(),
                updated_by: request.updated_by.clone(),
                updated_at: now,
            };
            let outcome = self
                .engine
                .apply_category_update(&versioned.record, category, state, now)?;

            match self.repo.update_record(&outcome.record, versioned.version) {
                Ok(_) => {
                    info!(
                        "event=category_update module=service status=ok record={id} category={category} completed={}",
                        request.completed
                    );
                    if outcome.transition.is_some() {
                        info!(
                            "event=auto_finalize module=service status=ok record={id} trigger=category category={category}"
                        );
                    }
                    return Ok(outcome);
                }
                Err(RepoError::Conflict { .. }) => {
                    warn!(
                        "event=category_update module=service status=retry record={id} category={category} attempt={attempt}"
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(ServiceError::ConcurrentUpdate {
            id,
            attempts: MAX_COMMIT_ATTEMPTS,
        })
    }

    /// Finalizes a record through the explicit (administrative) path.
    pub fn finalize_record(&self, id: RecordId) -> Result<ProjectRecord, ServiceError> {
        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let versioned = self
                .repo
                .get_record(id)?
                .ok_or(ServiceError::RecordNotFound(id))?;

            let finalized = self.engine.finalize(&versioned.record, now_epoch_ms())?;
            if finalized == versioned.record {
                // Already finalized; nothing to persist.
                return Ok(finalized);
            }

            match self.repo.update_record(&finalized, versioned.version) {
                Ok(_) => {
                    info!(
                        "event=explicit_finalize module=service status=ok record={id}"
                    );
                    return Ok(finalized);
                }
                Err(RepoError::Conflict { .. }) => {
                    warn!(
                        "event=explicit_finalize module=service status=retry record={id} attempt={attempt}"
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(ServiceError::ConcurrentUpdate {
            id,
            attempts: MAX_COMMIT_ATTEMPTS,
        })
    }

    /// Computes the progress summary for one stored record.
    pub fn record_progress(&self, id: RecordId) -> Result<ProgressSummary, ServiceError> {
        let versioned = self
            .repo
            .get_record(id)?
            .ok_or(ServiceError::RecordNotFound(id))?;
        Ok(self.engine.compute_progress(&versioned.record))
    }

    /// Lists stored records using filter and pagination options.
    pub fn list_records(&self, query: &RecordListQuery) -> Result<Vec<ProjectRecord>, ServiceError> {
        Ok(self.repo.list_records(query)?)
    }

    /// Builds the administrative fleet report.
    ///
    /// Undecodable rows are skipped and counted, never fatal: one bad
    /// record must not stop a fleet-wide report.
    pub fn fleet_report(&self) -> Result<FleetReportOutcome, ServiceError> {
        let scan = self.repo.scan_records()?;
        let report = self.engine.summarize_fleet(scan.records.iter());

        info!(
            "event=fleet_report module=service status=ok total={} finalized={} ready={} in_progress={} skipped={}",
            report.total, report.finalized, report.ready_to_finalize, report.in_progress, scan.skipped
        );

        Ok(FleetReportOutcome {
            report,
            skipped: scan.skipped,
        })
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
