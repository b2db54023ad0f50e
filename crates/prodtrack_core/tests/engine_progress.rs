use prodtrack_core::{
    CategoryState, CompletionEngine, OptionalShareRule, ProjectRecord, Taxonomy,
};

const UPDATED_AT: i64 = 1_700_000_000_000;

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

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn empty_record_scores_zero() {
    let engine = CompletionEngine::standard();
    let summary = engine.compute_progress(&record_with(&[]));

    assert_close(summary.total_percent, 0.0);
    assert_eq!(summary.required_completed, 0);
    assert_eq!(summary.required_total, 3);
    assert!(!summary.optional_completed);
    assert!(!summary.eligible_for_finalization);
}

#[test]
fn two_required_categories_score_fifty_percent() {
    let engine = CompletionEngine::standard();
    let summary = engine.compute_progress(&record_with(&["lighting", "electrical"]));

    assert_close(summary.total_percent, 50.0);
    assert_eq!(summary.required_completed, 2);
    assert!(!summary.optional_completed);
    assert!(!summary.eligible_for_finalization);
}

#[test]
fn all_required_categories_score_seventy_five_percent() {
    let engine = CompletionEngine::standard();
    let summary = engine.compute_progress(&record_with(&["lighting", "electrical", "budget"]));

    assert_close(summary.total_percent, 75.0);
    assert!(summary.eligible_for_finalization);
}

#[test]
fn optional_category_alone_scores_the_bonus_share() {
    let engine = CompletionEngine::standard();
    let summary = engine.compute_progress(&record_with(&["sketch"]));

    assert_close(summary.total_percent, 25.0);
    assert!(summary.optional_completed);
    assert!(!summary.eligible_for_finalization);
}

#[test]
fn full_record_scores_one_hundred_percent() {
    let engine = CompletionEngine::standard();
    let summary =
        engine.compute_progress(&record_with(&["lighting", "electrical", "budget", "sketch"]));

    assert_close(summary.total_percent, 100.0);
    assert!(summary.eligible_for_finalization);
}

#[test]
fn explicitly_incomplete_entries_do_not_count() {
    let engine = CompletionEngine::standard();
    let mut record = record_with(&["lighting"]);
    record
        .categories
        .insert("electrical".to_string(), CategoryState::default());

    let summary = engine.compute_progress(&record);
    assert_eq!(summary.required_completed, 1);
}

#[test]
fn unknown_category_keys_are_ignored_by_scoring() {
    let engine = CompletionEngine::standard();
    let mut record = record_with(&[]);
    record.categories.insert(
        "paving".to_string(),
        CategoryState::completed_by("ana", UPDATED_AT),
    );

    let summary = engine.compute_progress(&record);
    assert_close(summary.total_percent, 0.0);
}

#[test]
fn progress_stays_within_bounds_for_every_combination() {
    let engine = CompletionEngine::standard();
    let vocabulary = ["lighting", "electrical", "budget", "sketch"];

    for mask in 0..(1 << vocabulary.len()) {
        let completed: Vec<&str> = vocabulary
            .iter()
            .enumerate()
            .filter(|(index, _)| mask & (1 << index) != 0)
            .map(|(_, name)| *name)
            .collect();
        let record = record_with(&completed);
        let summary = engine.compute_progress(&record);

        assert!(summary.total_percent >= 0.0);
        assert!(summary.total_percent <= 100.0);
        assert_eq!(
            summary.eligible_for_finalization,
            engine.can_finalize(&record),
            "eligibility must agree with can_finalize for {completed:?}"
        );
    }
}

#[test]
fn missing_required_lists_unmet_categories_in_vocabulary_order() {
    let engine = CompletionEngine::standard();
    let record = record_with(&["electrical"]);

    assert_eq!(engine.missing_required(&record), ["lighting", "budget"]);
    assert!(engine
        .missing_required(&record_with(&["lighting", "electrical", "budget"]))
        .is_empty());
}

#[test]
fn all_or_nothing_grants_full_share_for_any_optional() {
    let taxonomy = Taxonomy::new(
        vec!["lighting".to_string()],
        vec!["sketch".to_string(), "survey".to_string()],
        50.0,
        50.0,
    )
    .unwrap();
    let engine = CompletionEngine::new(taxonomy).unwrap();

    let summary = engine.compute_progress(&record_with(&["sketch"]));
    assert_close(summary.total_percent, 50.0);
}

#[test]
fn pro_rated_rule_scales_the_optional_share() {
    let taxonomy = Taxonomy::new(
        vec!["lighting".to_string()],
        vec!["sketch".to_string(), "survey".to_string()],
        50.0,
        50.0,
    )
    .unwrap()
    .with_optional_share_rule(OptionalShareRule::ProRated);
    let engine = CompletionEngine::new(taxonomy).unwrap();

    let summary = engine.compute_progress(&record_with(&["sketch"]));
    assert_close(summary.total_percent, 25.0);

    let summary = engine.compute_progress(&record_with(&["sketch", "survey"]));
    assert_close(summary.total_percent, 50.0);
}
