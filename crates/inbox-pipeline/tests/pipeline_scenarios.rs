//! End-to-end pipeline scenarios against the mock provider and in-memory store

use async_trait::async_trait;
use inbox_domain::{
    Completion, CompletionRequest, CompletionService, NoteId, Priority, RawNote, TaskStatus,
};
use inbox_gatekeeper::{RejectionReason, ThresholdConfig};
use inbox_llm::{LlmError, MockProvider};
use inbox_pipeline::{InboxConfig, NoteOutcome, Pipeline};
use inbox_processor::{Stage, StageError};
use inbox_store::{MemoryTaskStore, SqliteTaskStore};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn test_config() -> InboxConfig {
    let mut config = InboxConfig::default();
    config.retry.backoff_ms = 0;
    config.pipeline.known_projects = vec!["Home".to_string(), "Work".to_string()];
    config
}

fn pipeline(llm: &MockProvider, store: &Arc<MemoryTaskStore>) -> Pipeline<MockProvider, MemoryTaskStore> {
    Pipeline::new(Arc::new(llm.clone()), Arc::clone(store), &test_config()).unwrap()
}

fn classify(llm: &MockProvider, needle: &str, project: &str) {
    llm.add_reply(
        "classification",
        needle,
        json!({"project": project, "category": "task", "reasoning": "test"}),
    );
}

fn rank(llm: &MockProvider, needle: &str, scores: [f64; 3], confidence: f64) {
    llm.add_reply(
        "ranking",
        needle,
        json!({
            "title": "",
            "importance": scores[0],
            "urgency": scores[1],
            "impact": scores[2],
            "confidence": confidence,
            "reasoning": "test"
        }),
    );
}

fn enrich(llm: &MockProvider, needle: &str, summary: &str) {
    llm.add_reply(
        "enrichment",
        needle,
        json!({
            "summary": summary,
            "subtasks": ["Page on-call", "Roll back the deploy"],
            "suggested_actions": ["Open an incident channel"],
            "lenses": ["A", "D"]
        }),
    );
}

/// Script a note that passes the gate and enriches cleanly
fn script_urgent(llm: &MockProvider, needle: &str) {
    classify(llm, needle, "Work");
    rank(llm, needle, [0.9, 1.0, 0.9], 0.95);
    enrich(llm, needle, "Restore service, then find the root cause.");
}

#[tokio::test]
async fn test_buy_milk_is_filtered_out() {
    let llm = MockProvider::default();
    classify(&llm, "Buy milk", "Home");
    rank(&llm, "Buy milk", [0.1, 0.2, 0.1], 0.9);
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store)
        .run(vec![RawNote::new("n1", "Buy milk", 0)])
        .await;

    match &result.reports[0].outcome {
        NoteOutcome::FilteredOut(decision) => {
            assert!(!decision.passed);
            assert!(matches!(
                decision.reasons[0],
                RejectionReason::BelowThreshold { .. }
            ));
        }
        other => panic!("Expected FilteredOut, got {:?}", other),
    }
    assert_eq!(store.create_calls(), 0);
    assert_eq!(llm.calls_for("enrichment"), 0);
    assert_eq!(result.metrics.filtered, 1);
}

#[tokio::test]
async fn test_production_outage_is_enriched_and_stored() {
    let llm = MockProvider::default();
    script_urgent(&llm, "Production outage");
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store)
        .run(vec![RawNote::new(
            "n1",
            "Production outage: checkout API returns 500s",
            0,
        )])
        .await;

    match &result.reports[0].outcome {
        NoteOutcome::Stored {
            priority,
            status,
            enrichment_error,
            ..
        } => {
            assert_eq!(*priority, Priority::Critical);
            assert_eq!(*status, TaskStatus::Processed);
            assert!(enrichment_error.is_none());
        }
        other => panic!("Expected Stored, got {:?}", other),
    }

    assert_eq!(llm.calls_for("enrichment"), 1);
    let tasks = store.tasks();
    assert_eq!(tasks.len(), 1);
    let record = &tasks[0].record;
    assert_eq!(record.project, "Work");
    assert_eq!(record.title, "Production outage: checkout API returns 500s");
    assert!(record.body.contains("Restore service, then find the root cause."));
    assert!(record.body.contains("- [ ] Page on-call"));
    assert!(record.body.contains("First Principles, Devil's Advocate"));
}

#[tokio::test]
async fn test_malformed_ranking_goes_to_review_queue() {
    let llm = MockProvider::default();
    classify(&llm, "Reorganize", "Home");
    llm.add_reply("ranking", "Reorganize", "{\"importance\": 0.4,");
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store)
        .run(vec![RawNote::new("n1", "Reorganize the garage", 0)])
        .await;

    let report = &result.reports[0];
    assert!(matches!(
        report.outcome,
        NoteOutcome::Failed {
            stage: Stage::Rank,
            error: StageError::Ranking(_)
        }
    ));

    let review = result.review_queue();
    assert_eq!(review.len(), 1);
    assert!(review[0].needs_review);
    assert_eq!(review[0].confidence, 0.0);
    assert_eq!(review[0].project(), "Home");

    assert_eq!(llm.calls_for("ranking"), 2);
    assert_eq!(llm.calls_for("enrichment"), 0);
    assert_eq!(store.create_calls(), 0);
    assert_eq!(result.metrics.failed.get(&Stage::Rank), Some(&1));
}

#[tokio::test]
async fn test_failures_are_isolated_per_note() {
    let llm = MockProvider::default();
    llm.add_error(
        "classification",
        "Mystery",
        LlmError::ModelNotAvailable("llama3.2".to_string()),
    );
    script_urgent(&llm, "Server down");
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store)
        .run(vec![
            RawNote::new("blank", "   ", 0),
            RawNote::new("mystery", "Mystery note", 0),
            RawNote::new("urgent", "Server down in eu-west", 0),
        ])
        .await;

    assert!(matches!(
        result.reports[0].outcome,
        NoteOutcome::Failed {
            stage: Stage::Route,
            error: StageError::InvalidInput(_)
        }
    ));
    assert!(matches!(
        result.reports[1].outcome,
        NoteOutcome::Failed {
            stage: Stage::Route,
            error: StageError::Classification(_)
        }
    ));
    assert!(result.reports[2].outcome.is_stored());

    // Non-retryable errors are not retried
    let mystery_calls = llm
        .requests()
        .iter()
        .filter(|r| r.prompt.contains("Mystery"))
        .count();
    assert_eq!(mystery_calls, 1);

    assert_eq!(result.failures().len(), 2);
    assert_eq!(result.metrics.stored, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let llm = MockProvider::default();
    script_urgent(&llm, "Renew passport");
    let store = Arc::new(MemoryTaskStore::new());
    let pipeline = pipeline(&llm, &store);
    let note = RawNote::new("passport", "Renew passport before trip", 0);

    let first = pipeline.run(vec![note.clone()]).await;
    let second = pipeline.run(vec![note]).await;

    let id_of = |outcome: &NoteOutcome| match outcome {
        NoteOutcome::Stored { record_id, .. } => record_id.clone(),
        other => panic!("Expected Stored, got {:?}", other),
    };
    assert_eq!(
        id_of(&first.reports[0].outcome),
        id_of(&second.reports[0].outcome)
    );
    assert_eq!(store.create_calls(), 2);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_rerun_against_sqlite_store() {
    let llm = MockProvider::default();
    script_urgent(&llm, "Renew passport");
    let store = Arc::new(SqliteTaskStore::in_memory().unwrap());
    let pipeline = Pipeline::new(Arc::new(llm), Arc::clone(&store), &test_config()).unwrap();
    let note = RawNote::new("passport", "Renew passport before trip", 0);

    pipeline.run(vec![note.clone()]).await;
    let second = pipeline.run(vec![note]).await;

    assert!(second.reports[0].outcome.is_stored());
    assert_eq!(store.count().unwrap(), 1);
}

#[tokio::test]
async fn test_out_of_range_scores_are_clamped() {
    let llm = MockProvider::default();
    classify(&llm, "Taxes", "Home");
    rank(&llm, "Taxes", [1.7, 3.0, -0.5], 4.0);
    enrich(&llm, "Taxes", "File before the deadline.");
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store)
        .run(vec![RawNote::new("n1", "Taxes due Friday", 0)])
        .await;

    // (1 + 1 + 0) / 3
    match &result.reports[0].outcome {
        NoteOutcome::Stored {
            priority, status, ..
        } => {
            assert_eq!(*priority, Priority::High);
            assert_eq!(*status, TaskStatus::Processed);
        }
        other => panic!("Expected Stored, got {:?}", other),
    }
    assert!(store.tasks()[0].record.body.contains("Confidence: 1.00"));
}

#[tokio::test]
async fn test_threshold_boundary_is_inclusive() {
    let llm = MockProvider::default();
    classify(&llm, "Boundary", "Work");
    rank(&llm, "Boundary", [0.5, 0.5, 0.5], 0.5);
    enrich(&llm, "Boundary", "Exactly on the line.");
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store)
        .run(vec![RawNote::new("n1", "Boundary case", 0)])
        .await;

    assert!(result.reports[0].outcome.is_stored());
    assert_eq!(llm.calls_for("enrichment"), 1);
}

#[tokio::test]
async fn test_boundary_mean_with_inexact_floats_is_enriched() {
    let llm = MockProvider::default();
    classify(&llm, "Rounding", "Work");
    rank(&llm, "Rounding", [0.6, 0.7, 0.2], 0.9);
    enrich(&llm, "Rounding", "Mean is exactly one half.");
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store)
        .run(vec![RawNote::new("n1", "Rounding edge", 0)])
        .await;

    assert!(result.reports[0].outcome.is_stored());
    assert_eq!(llm.calls_for("enrichment"), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_low_confidence_is_filtered_even_when_urgent() {
    let llm = MockProvider::default();
    classify(&llm, "Vague", "Work");
    rank(&llm, "Vague", [1.0, 1.0, 1.0], 0.2);
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store)
        .run(vec![RawNote::new("n1", "Vague thing", 0)])
        .await;

    match &result.reports[0].outcome {
        NoteOutcome::FilteredOut(decision) => {
            assert_eq!(decision.reasons.len(), 1);
            assert!(matches!(
                decision.reasons[0],
                RejectionReason::LowConfidence { .. }
            ));
        }
        other => panic!("Expected FilteredOut, got {:?}", other),
    }
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn test_enrichment_failure_stores_minimal_task() {
    let llm = MockProvider::default();
    classify(&llm, "Outage", "Work");
    rank(&llm, "Outage", [0.9, 0.9, 0.9], 0.95);
    llm.add_reply("enrichment", "Outage", json!({"summary": "", "subtasks": []}));
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store)
        .run(vec![RawNote::new("n1", "Outage in billing", 0)])
        .await;

    match &result.reports[0].outcome {
        NoteOutcome::Stored {
            enrichment_error, ..
        } => assert!(enrichment_error
            .as_deref()
            .is_some_and(|e| e.contains("empty summary"))),
        other => panic!("Expected Stored, got {:?}", other),
    }
    assert_eq!(llm.calls_for("enrichment"), 2);
    assert_eq!(result.metrics.degraded, 1);

    let body = &store.tasks()[0].record.body;
    assert!(!body.contains("## Summary"));
    assert!(body.contains("Outage in billing"));
}

#[tokio::test]
async fn test_store_failure_is_reported() {
    let llm = MockProvider::default();
    script_urgent(&llm, "Locked");
    let store = Arc::new(MemoryTaskStore::new());
    store.fail_note("n1");

    let result = pipeline(&llm, &store)
        .run(vec![RawNote::new("n1", "Locked out of account", 0)])
        .await;

    assert!(matches!(
        result.reports[0].outcome,
        NoteOutcome::Failed {
            stage: Stage::Store,
            error: StageError::Store(_)
        }
    ));
    assert_eq!(store.create_calls(), 1);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_low_confidence_task_is_ambiguous() {
    let llm = MockProvider::default();
    script_urgent(&llm, "Hiring");
    let store = Arc::new(MemoryTaskStore::new());
    let mut config = test_config();
    config.gate = ThresholdConfig::permissive();
    config.pipeline.ambiguity_threshold = 0.99;
    let pipeline = Pipeline::new(Arc::new(llm), Arc::clone(&store), &config).unwrap();

    let result = pipeline
        .run(vec![RawNote::new("n1", "Hiring plan for Q3", 0)])
        .await;

    match &result.reports[0].outcome {
        NoteOutcome::Stored { status, .. } => assert_eq!(*status, TaskStatus::Ambiguous),
        other => panic!("Expected Stored, got {:?}", other),
    }
}

#[tokio::test]
async fn test_new_projects_are_offered_to_later_notes() {
    let llm = MockProvider::default();
    classify(&llm, "tomatoes", "Garden");
    rank(&llm, "tomatoes", [0.1, 0.1, 0.1], 0.9);
    classify(&llm, "compost", "garden");
    rank(&llm, "compost", [0.1, 0.1, 0.1], 0.9);
    let store = Arc::new(MemoryTaskStore::new());
    let pipeline = pipeline(&llm, &store);

    pipeline
        .run(vec![
            RawNote::new("n1", "Plant tomatoes", 0),
            RawNote::new("n2", "Turn the compost", 0),
        ])
        .await;

    assert!(pipeline.registry().contains("Garden"));
    assert_eq!(pipeline.registry().len(), 3);

    let second_classification = llm
        .requests()
        .into_iter()
        .find(|r| r.schema_name() == Some("classification") && r.prompt.contains("compost"))
        .unwrap();
    assert!(second_classification.prompt.contains("Garden"));
}

#[tokio::test]
async fn test_run_concurrent_keeps_input_order() {
    let llm = MockProvider::default();
    let mut notes = Vec::new();
    for i in 0..6 {
        let text = format!("Incident number {}", i);
        script_urgent(&llm, &text);
        notes.push(RawNote::new(format!("n{}", i), text, 0));
    }
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store).run_concurrent(notes, 3).await;

    let ids: Vec<&str> = result.reports.iter().map(|r| r.note_id.as_str()).collect();
    assert_eq!(ids, vec!["n0", "n1", "n2", "n3", "n4", "n5"]);
    assert_eq!(result.metrics.stored, 6);
    assert_eq!(store.len(), 6);
}

/// Completion service that sleeps before delegating, tracking peak
/// concurrency
struct SlowProvider {
    inner: MockProvider,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowProvider {
    fn new(inner: MockProvider, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionService for SlowProvider {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if request.prompt.contains("slow") {
            tokio::time::sleep(self.delay).await;
        } else {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.complete(request).await
    }
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let llm = MockProvider::default();
    let mut notes = Vec::new();
    for i in 0..8 {
        let text = format!("Ticket {}", i);
        classify(&llm, &text, "Work");
        rank(&llm, &text, [0.1, 0.1, 0.1], 0.9);
        notes.push(RawNote::new(format!("n{}", i), text, 0));
    }
    let provider = Arc::new(SlowProvider::new(llm, Duration::from_millis(5)));
    let store = Arc::new(MemoryTaskStore::new());
    let pipeline = Pipeline::new(Arc::clone(&provider), store, &test_config()).unwrap();

    let result = pipeline.run_concurrent(notes, 2).await;

    assert_eq!(result.metrics.filtered, 8);
    assert!(provider.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_notes() {
    let llm = MockProvider::default();
    script_urgent(&llm, "quick fix");
    script_urgent(&llm, "slow migration");
    let provider = Arc::new(SlowProvider::new(llm, Duration::from_secs(30)));
    let store = Arc::new(MemoryTaskStore::new());
    let pipeline = Pipeline::new(provider, Arc::clone(&store), &test_config()).unwrap();

    let result = pipeline
        .run_until(
            vec![
                RawNote::new("fast", "quick fix for the login page", 0),
                RawNote::new("slow", "slow migration of the database", 0),
            ],
            tokio::time::sleep(Duration::from_millis(500)),
        )
        .await;

    assert!(result.reports[0].outcome.is_stored());
    assert_eq!(result.reports[1].note_id, NoteId::new("slow"));
    assert_eq!(result.reports[1].outcome, NoteOutcome::Cancelled);
    assert_eq!(result.metrics.cancelled, 1);
    assert_eq!(store.len(), 1);
}

/// Completion service that panics while ranking notes mentioning "explode"
struct PanickingRanker {
    inner: MockProvider,
}

#[async_trait]
impl CompletionService for PanickingRanker {
    type Error = LlmError;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let ranking = request.schema.as_ref().map(|s| s.name.as_str()) == Some("ranking");
        if ranking && request.prompt.contains("explode") {
            panic!("ranker exploded");
        }
        self.inner.complete(request).await
    }
}

fn panicking_pipeline(store: &Arc<MemoryTaskStore>) -> Pipeline<PanickingRanker, MemoryTaskStore> {
    let llm = MockProvider::default();
    classify(&llm, "explode", "Work");
    script_urgent(&llm, "outage");
    let provider = Arc::new(PanickingRanker { inner: llm });
    Pipeline::new(provider, Arc::clone(store), &test_config()).unwrap()
}

fn panicking_notes() -> Vec<RawNote> {
    vec![
        RawNote::new("bad", "this note will explode", 0),
        RawNote::new("good", "Production outage on checkout", 0),
    ]
}

fn assert_panic_is_isolated(result: &inbox_pipeline::PipelineResult) {
    match &result.reports[0].outcome {
        NoteOutcome::Failed { stage, error } => {
            assert_eq!(*stage, Stage::Rank);
            assert_eq!(
                *error,
                StageError::Panicked {
                    stage: Stage::Rank,
                    message: "ranker exploded".to_string(),
                }
            );
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert!(result.reports[1].outcome.is_stored());
    assert_eq!(result.metrics.failed.get(&Stage::Rank), Some(&1));
    assert_eq!(result.metrics.cancelled, 0);
}

#[tokio::test]
async fn test_panic_in_sequential_run_fails_only_that_note() {
    let store = Arc::new(MemoryTaskStore::new());
    let result = panicking_pipeline(&store).run(panicking_notes()).await;

    assert_panic_is_isolated(&result);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_panic_in_concurrent_run_is_a_failure_not_a_cancellation() {
    let store = Arc::new(MemoryTaskStore::new());
    let result = panicking_pipeline(&store)
        .run_concurrent(panicking_notes(), 2)
        .await;

    assert_panic_is_isolated(&result);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = test_config();
    config.gate.min_confidence = -0.1;
    let result = Pipeline::new(
        Arc::new(MockProvider::default()),
        Arc::new(MemoryTaskStore::new()),
        &config,
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_report_serializes_as_json() {
    let llm = MockProvider::default();
    classify(&llm, "Buy milk", "Home");
    rank(&llm, "Buy milk", [0.1, 0.2, 0.1], 0.9);
    let store = Arc::new(MemoryTaskStore::new());

    let result = pipeline(&llm, &store)
        .run(vec![RawNote::new("n1", "Buy milk", 0)])
        .await;

    let value: Value = serde_json::to_value(&result.reports[0]).unwrap();
    assert_eq!(value["note_id"], "n1");
    assert_eq!(value["outcome"], "filtered_out");
    assert_eq!(value["passed"], false);
    assert_eq!(value["reasons"][0]["reason"], "below_threshold");
}
