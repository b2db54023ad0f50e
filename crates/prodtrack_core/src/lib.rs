//! Core domain logic for ProdTrack.
//! This crate is the single source of truth for completion rules.

pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use engine::{
    CategoryPending, CompletionEngine, EngineError, FinalizationTransition, FleetReport,
    OptionalShareRule, ProgressSummary, Taxonomy, TaxonomyError, UpdateOutcome,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::legacy::LegacyProjectDoc;
pub use model::record::{
    CategoryState, ProjectRecord, RecordId, RecordStatus, RecordValidationError,
};
pub use repo::record_repo::{
    RecordListQuery, RecordRepository, RecordScan, RepoError, RepoResult,
    SqliteRecordRepository, VersionedRecord,
};
pub use service::record_service::{
    CategoryUpdateRequest, FleetReportOutcome, NewRecord, RecordService, ServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
