use prodtrack_core::{
    CategoryState, CompletionEngine, EngineError, ProjectRecord, RecordStatus,
};

const UPDATED_AT: i64 = 1_700_000_000_000;
const NOW: i64 = 1_700_000_360_000;

fn record_with(completed: &[&str]) -> ProjectRecord {
    let mut record = ProjectRecord::new("P-100", "central", "ana@example.com");
    for name in completed {
        record.categories.insert(
            (*name).to_string(),
            CategoryState::completed_by("ana@example.com", UPDATED_AT),
        );
    }
    record
}

fn completed_state(updated_by: &str) -> CategoryState {
    CategoryState {
        completed: true,
        notes: "done".to_string(),
        updated_by: updated_by.to_string(),
        updated_at: NOW,
    }
}

#[test]
fn completing_the_last_required_category_finalizes_automatically() {
    let engine = CompletionEngine::standard();
    let record = record_with(&["lighting", "electrical"]);

    let outcome = engine
        .apply_category_update(&record, "budget", completed_state("rui@example.com"), NOW)
        .unwrap();

    assert_eq!(outcome.record.status, RecordStatus::Finalized);
    assert_eq!(outcome.record.finalized_at, Some(NOW));
    assert!(outcome.record.finalized_automatically);
    outcome.record.validate().expect("finalized record is valid");

    let transition = outcome.transition.expect("transition should be emitted");
    assert!(transition.automatic);
    assert_eq!(transition.finalized_at, NOW);
    assert_eq!(
        transition.required_complete,
        ["lighting", "electrical", "budget"]
    );
}

#[test]
fn reapplying_a_satisfied_update_is_idempotent() {
    let engine = CompletionEngine::standard();
    let record = record_with(&["lighting", "electrical"]);
    let state = completed_state("rui@example.com");

    let first = engine
        .apply_category_update(&record, "budget", state.clone(), NOW)
        .unwrap();
    let second = engine
        .apply_category_update(&first.record, "budget", state, NOW)
        .unwrap();

    assert_eq!(second.record, first.record);
    assert!(second.transition.is_none(), "no second transition");
}

#[test]
fn partial_required_update_does_not_finalize() {
    let engine = CompletionEngine::standard();
    let record = record_with(&[]);

    let outcome = engine
        .apply_category_update(&record, "lighting", completed_state("ana"), NOW)
        .unwrap();

    assert_eq!(outcome.record.status, RecordStatus::InProgress);
    assert_eq!(outcome.record.finalized_at, None);
    assert!(outcome.transition.is_none());
}

#[test]
fn optional_category_never_triggers_finalization() {
    let engine = CompletionEngine::standard();
    let record = record_with(&[]);

    let outcome = engine
        .apply_category_update(&record, "sketch", completed_state("ana"), NOW)
        .unwrap();

    assert_eq!(outcome.record.status, RecordStatus::InProgress);
    assert!(outcome.transition.is_none());
}

#[test]
fn finalized_record_accepts_optional_edits_without_transition() {
    let engine = CompletionEngine::standard();
    let record = record_with(&["lighting", "electrical"]);
    let finalized = engine
        .apply_category_update(&record, "budget", completed_state("rui"), NOW)
        .unwrap()
        .record;

    let later = NOW + 60_000;
    let outcome = engine
        .apply_category_update(
            &finalized,
            "sketch",
            CategoryState {
                completed: true,
                notes: "drawings for the archive".to_string(),
                updated_by: "designer@example.com".to_string(),
                updated_at: later,
            },
            later,
        )
        .unwrap();

    assert_eq!(outcome.record.status, RecordStatus::Finalized);
    assert_eq!(outcome.record.finalized_at, Some(NOW), "timestamp untouched");
    assert!(outcome.record.category_completed("sketch"));
    assert!(outcome.transition.is_none());
}

#[test]
fn no_update_sequence_regresses_a_finalized_record() {
    let engine = CompletionEngine::standard();
    let record = record_with(&["lighting", "electrical"]);
    let mut current = engine
        .apply_category_update(&record, "budget", completed_state("rui"), NOW)
        .unwrap()
        .record;

    // Even reopening a required category leaves the terminal status alone.
    for (index, category) in ["budget", "lighting", "sketch"].into_iter().enumerate() {
        let outcome = engine
            .apply_category_update(
                &current,
                category,
                CategoryState::default(),
                NOW + index as i64,
            )
            .unwrap();
        assert_eq!(outcome.record.status, RecordStatus::Finalized);
        assert!(outcome.transition.is_none());
        current = outcome.record;
    }
}

#[test]
fn unknown_category_is_rejected_before_any_state_change() {
    let engine = CompletionEngine::standard();
    let record = record_with(&["lighting", "electrical"]);

    let err = engine
        .apply_category_update(&record, "paving", completed_state("ana"), NOW)
        .unwrap_err();

    match &err {
        EngineError::UnknownCategory { name, known } => {
            assert_eq!(name, "paving");
            assert_eq!(known, &["lighting", "electrical", "budget", "sketch"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("known categories"));
}

#[test]
fn inputs_are_never_mutated() {
    let engine = CompletionEngine::standard();
    let record = record_with(&["lighting", "electrical"]);
    let snapshot = record.clone();

    engine
        .apply_category_update(&record, "budget", completed_state("rui"), NOW)
        .unwrap();
    engine.finalize(&record, NOW).unwrap_err();

    assert_eq!(record, snapshot);
}

#[test]
fn explicit_finalize_names_every_missing_required_category() {
    let engine = CompletionEngine::standard();
    let mut record = record_with(&["lighting", "budget"]);
    record
        .categories
        .insert("electrical".to_string(), CategoryState::default());

    let err = engine.finalize(&record, NOW).unwrap_err();
    assert_eq!(
        err,
        EngineError::IncompleteRequiredCategories(vec!["electrical".to_string()])
    );

    let err = engine.finalize(&record_with(&[]), NOW).unwrap_err();
    assert_eq!(
        err,
        EngineError::IncompleteRequiredCategories(vec![
            "lighting".to_string(),
            "electrical".to_string(),
            "budget".to_string(),
        ])
    );
}

#[test]
fn explicit_finalize_marks_the_transition_as_manual() {
    let engine = CompletionEngine::standard();
    let record = record_with(&["lighting", "electrical", "budget"]);

    let finalized = engine.finalize(&record, NOW).unwrap();

    assert_eq!(finalized.status, RecordStatus::Finalized);
    assert_eq!(finalized.finalized_at, Some(NOW));
    assert!(!finalized.finalized_automatically);
    finalized.validate().expect("finalized record is valid");
}

#[test]
fn explicit_finalize_is_idempotent_on_finalized_records() {
    let engine = CompletionEngine::standard();
    let record = record_with(&["lighting", "electrical", "budget"]);
    let finalized = engine.finalize(&record, NOW).unwrap();

    let again = engine.finalize(&finalized, NOW + 5_000).unwrap();
    assert_eq!(again, finalized, "original timestamp is never overwritten");
}

#[test]
fn auto_finalize_promotes_complete_drafts() {
    let engine = CompletionEngine::standard();

    let outcome = engine.auto_finalize(&record_with(&["lighting", "electrical", "budget"]), NOW);
    assert_eq!(outcome.record.status, RecordStatus::Finalized);
    assert!(outcome.record.finalized_automatically);
    assert!(outcome.transition.is_some());

    let outcome = engine.auto_finalize(&record_with(&["lighting"]), NOW);
    assert_eq!(outcome.record.status, RecordStatus::InProgress);
    assert!(outcome.transition.is_none());
}
