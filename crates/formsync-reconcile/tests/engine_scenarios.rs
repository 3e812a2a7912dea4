//! End-to-end reconciliation scenarios
//!
//! Exercises the engine the way the save/submit workflow uses it: snapshot
//! batches arriving as JSON from independent sessions, reconciled under
//! different strategies.

use formsync_core::domain::{AnswerValue, ConflictKind, FormState, Severity, Strategy};
use formsync_reconcile::{
    aggregate_answers, ReconcileConfig, ReconcileEngine, ResolutionOptions, ResolutionOptionsPatch,
};

fn john() -> FormState {
    FormState::new("tab-1", "2026-03-01T10:00:00Z")
        .with_answer("name", "John Doe")
        .with_answer(
            "interests",
            AnswerValue::List(vec!["sports".into(), "music".into()]),
        )
}

fn jane() -> FormState {
    FormState::new("tab-2", "2026-03-01T10:30:00Z")
        .with_answer("name", "Jane Smith")
        .with_answer(
            "interests",
            AnswerValue::List(vec!["art".into(), "music".into()]),
        )
}

#[test]
fn two_sessions_timestamp_resolution() {
    let mut engine = ReconcileEngine::new(ResolutionOptions::new(Strategy::Timestamp)).unwrap();

    let result = engine.aggregate(&[john(), jane()]);

    // Both fields conflict at Value/Low
    assert_eq!(result.conflicts().len(), 2);
    for conflict in result.conflicts() {
        assert_eq!(conflict.kind(), ConflictKind::Value);
        assert_eq!(conflict.severity(), Severity::Low);
    }

    // The later session wins both fields
    assert_eq!(
        result.aggregated_data().get("name"),
        Some(&"Jane Smith".into())
    );
    assert_eq!(
        result.aggregated_data().get("interests"),
        Some(&AnswerValue::List(vec!["art".into(), "music".into()]))
    );
}

#[test]
fn two_sessions_merge_resolution() {
    let mut engine = ReconcileEngine::new(ResolutionOptions::new(Strategy::Merge)).unwrap();

    let result = engine.aggregate(&[john(), jane()]);

    // Lists union in first-seen order; scalars fall back to timestamp
    assert_eq!(
        result.aggregated_data().get("interests"),
        Some(&AnswerValue::List(vec![
            "sports".into(),
            "music".into(),
            "art".into()
        ]))
    );
    assert_eq!(
        result.aggregated_data().get("name"),
        Some(&"Jane Smith".into())
    );
}

#[test]
fn array_vs_string_is_structure_high() {
    let typed = FormState::new("tab-1", "2026-03-01T10:00:00Z").with_answer(
        "interests",
        AnswerValue::List(vec!["sports".into(), "music".into()]),
    );
    let stringly =
        FormState::new("tab-2", "2026-03-01T10:05:00Z").with_answer("interests", "sports,music");

    let mut engine = ReconcileEngine::new(ResolutionOptions::default()).unwrap();
    let result = engine.aggregate(&[typed, stringly]);

    assert_eq!(result.conflicts().len(), 1);
    assert_eq!(result.conflicts()[0].kind(), ConflictKind::Structure);
    assert_eq!(result.conflicts()[0].severity(), Severity::High);
}

#[test]
fn manual_consumer_round_trip() {
    // First pass: manual strategy leaves the disagreement pending
    let mut engine = ReconcileEngine::new(ResolutionOptions::new(Strategy::Manual)).unwrap();

    let result = engine.aggregate(&[john(), jane()]);
    assert!(result.has_pending());
    assert_eq!(result.resolution().pending_count(), 2);

    // The UI shows the conflicts, the user decides, and the workflow
    // re-aggregates with a snapshot encoding the chosen values.
    let decided = FormState::new("user-review", "2026-03-01T11:00:00Z")
        .with_answer("name", "Jane Smith")
        .with_answer(
            "interests",
            AnswerValue::List(vec!["sports".into(), "music".into(), "art".into()]),
        );

    engine
        .update_options(ResolutionOptionsPatch {
            strategy: Some(Strategy::Timestamp),
            ..Default::default()
        })
        .unwrap();

    let result = engine.aggregate(&[john(), jane(), decided]);
    assert!(!result.has_pending());
    assert_eq!(
        result.aggregated_data().get("name"),
        Some(&"Jane Smith".into())
    );

    // Both passes are on the ledger
    assert_eq!(engine.conflict_history().len(), 4);
}

#[test]
fn snapshots_arrive_as_json() {
    let batch: Vec<FormState> = serde_json::from_str(
        r#"[
            {
                "form_id": "phone",
                "current_section": "profile",
                "answers": {"name": "John Doe", "age": 34},
                "progress": {"completed_sections": ["profile"], "overall_progress": 25},
                "last_saved": "2026-03-01T10:00:00Z",
                "version": "v3"
            },
            {
                "form_id": "laptop",
                "answers": {"name": "J. Doe", "age": 34},
                "last_saved": "2026-03-01T10:04:00Z",
                "version": "v4"
            }
        ]"#,
    )
    .unwrap();

    let mut engine = ReconcileEngine::new(ResolutionOptions::default()).unwrap();
    let result = engine.aggregate(&batch);

    // "age" agrees, "name" conflicts within the default window
    assert_eq!(result.conflicts().len(), 1);
    assert_eq!(result.conflicts()[0].kind(), ConflictKind::ConcurrentEdit);
    assert!(result.conflicts()[0].is_concurrent());
    assert_eq!(
        result.aggregated_data().get("name"),
        Some(&"J. Doe".into())
    );
    assert_eq!(
        result.aggregated_data().get("age"),
        Some(&AnswerValue::Number(34.0))
    );
}

#[test]
fn config_driven_engine() {
    let config: ReconcileConfig = serde_yaml::from_str(
        r#"
default_strategy: timestamp
auto_resolve: true
conflict_window_secs: 60
critical_fields:
  - name
rules:
  - pattern: "interests"
    strategy: merge
"#,
    )
    .unwrap();

    let mut engine = ReconcileEngine::from_config(config).unwrap();
    let result = engine.aggregate(&[john(), jane()]);

    // Critical field reported at Medium, rule-driven merge on interests
    let name_conflict = result
        .conflicts()
        .iter()
        .find(|c| c.field_id().as_str() == "name")
        .unwrap();
    assert_eq!(name_conflict.severity(), Severity::Medium);

    assert_eq!(
        result.aggregated_data().get("interests"),
        Some(&AnswerValue::List(vec![
            "sports".into(),
            "music".into(),
            "art".into()
        ]))
    );
}

#[test]
fn pure_aggregator_ignores_conflicts() {
    let merged = aggregate_answers([&john(), &jane()]);

    // Plain last-wins, no history, no classification
    assert_eq!(merged.get("name"), Some(&"Jane Smith".into()));
    assert_eq!(merged.len(), 2);
}

#[test]
fn result_serializes_for_audit_trails() {
    let mut engine = ReconcileEngine::new(ResolutionOptions::default()).unwrap();
    let result = engine.aggregate(&[john(), jane()]);

    let json = serde_json::to_string(&result).unwrap();
    let back: formsync_reconcile::AggregationResult = serde_json::from_str(&json).unwrap();

    assert_eq!(back.aggregated_data(), result.aggregated_data());
    assert_eq!(
        back.resolution().resolved_count(),
        result.resolution().resolved_count()
    );
}
