use prodtrack_core::{CompletionEngine, LegacyProjectDoc, RecordStatus};
use serde_json::json;

fn decode(value: serde_json::Value) -> LegacyProjectDoc {
    serde_json::from_value(value).expect("legacy document should decode")
}

#[test]
fn manager_era_document_maps_to_canonical_record() {
    let doc = decode(json!({
        "projectNumber": "PROJ-001",
        "plaza": "central",
        "userName": "Ana Souza",
        "status": "finalizado",
        "finalizadoAutomaticamente": true,
        "dataFinalizacao": "2024-05-02T12:30:00Z",
        "isRevision": false,
        "categories": {
            "luminotecnico": {
                "concluido": true,
                "observacoes": "aprovado pelo cliente",
                "usuario": "joao@example.com",
                "dataAtualizacao": "2024-05-01T08:00:00Z"
            },
            "eletrico": {
                "concluido": true,
                "usuario": "maria@example.com",
                "dataAtualizacao": 1714580000000_i64
            },
            "planilhao": { "concluido": true },
            "croqui": { "concluido": false }
        },
        "points": { "retrofit": 12, "remodeling_v": 3 }
    }));

    let record = doc.into_record();
    record.validate().expect("converted record should be valid");

    assert_eq!(record.project_number, "PROJ-001");
    assert_eq!(record.plaza, "central");
    assert_eq!(record.owner, "Ana Souza");
    assert_eq!(record.phase, None);
    assert_eq!(record.status, RecordStatus::Finalized);
    assert_eq!(record.finalized_at, Some(1_714_653_000_000));
    assert!(record.finalized_automatically);
    assert_eq!(record.total_points(), 15);

    let lighting = &record.categories["lighting"];
    assert!(lighting.completed);
    assert_eq!(lighting.notes, "aprovado pelo cliente");
    assert_eq!(lighting.updated_by, "joao@example.com");
    assert_eq!(lighting.updated_at, 1_714_550_400_000);

    assert_eq!(record.categories["electrical"].updated_at, 1_714_580_000_000);
    assert!(record.category_completed("budget"));
    assert!(!record.category_completed("sketch"));
}

#[test]
fn dashboard_era_boolean_categories_decode() {
    let doc = decode(json!({
        "projectNumber": "PROJ-002",
        "plaza": "north",
        "userEmail": "rui@example.com",
        "status": "em_andamento",
        "revisao": true,
        "categories": {
            "luminotecnico": true,
            "eletrico": false,
            "croqui": true
        }
    }));

    let record = doc.into_record();
    record.validate().expect("converted record should be valid");

    assert_eq!(record.owner, "rui@example.com");
    assert_eq!(record.status, RecordStatus::InProgress);
    assert_eq!(record.finalized_at, None);
    assert_eq!(record.phase.as_deref(), Some("revision"));
    assert!(record.category_completed("lighting"));
    assert!(!record.category_completed("electrical"));
    assert!(record.category_completed("sketch"));
}

#[test]
fn missing_category_map_means_all_incomplete() {
    let record = decode(json!({ "status": "em_andamento" })).into_record();
    record.validate().expect("bare record should be valid");

    assert!(record.categories.is_empty());

    let engine = CompletionEngine::standard();
    let summary = engine.compute_progress(&record);
    assert_eq!(summary.total_percent, 0.0);
    assert!(!summary.eligible_for_finalization);
}

#[test]
fn explicit_phase_wins_over_the_revision_flag() {
    let record = decode(json!({ "isRevision": true, "phase": "as_built" })).into_record();
    assert_eq!(record.phase.as_deref(), Some("as_built"));

    let record = decode(json!({ "isRevision": false })).into_record();
    assert_eq!(record.phase, None);
}

#[test]
fn finalized_without_timestamp_falls_back_to_latest_category_update() {
    let record = decode(json!({
        "status": "finalizado",
        "categories": {
            "luminotecnico": { "concluido": true, "dataAtualizacao": 100 },
            "eletrico": { "concluido": true, "dataAtualizacao": 300 },
            "planilhao": { "concluido": true, "dataAtualizacao": 200 }
        }
    }))
    .into_record();

    record.validate().expect("converted record should be valid");
    assert_eq!(record.finalized_at, Some(300));
}

#[test]
fn unknown_status_text_degrades_to_in_progress() {
    let record = decode(json!({ "status": "arquivado" })).into_record();
    assert_eq!(record.status, RecordStatus::InProgress);
    assert_eq!(record.finalized_at, None);
}

#[test]
fn unmapped_category_keys_survive_conversion_without_scoring() {
    let doc = decode(json!({
        "categories": {
            "luminotecnico": true,
            "pavimentacao": true
        }
    }));

    let record = doc.into_record();
    assert!(record.category_completed("lighting"));
    assert!(record.category_completed("pavimentacao"));

    let engine = CompletionEngine::standard();
    let summary = engine.compute_progress(&record);
    assert_eq!(summary.required_completed, 1);
    assert!(!summary.optional_completed);
}
