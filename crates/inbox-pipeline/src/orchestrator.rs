//! Batch orchestration: Route → Rank → Filter → (Enrich) → Store per note

use crate::config::InboxConfig;
use crate::error::PipelineError;
use crate::outcome::{NoteOutcome, NoteReport, PipelineResult};
use crate::registry::ProjectRegistry;
use crate::task::TaskAssembler;
use inbox_domain::{
    CompletionService, NoteId, RankedNote, RawNote, RecordId, TaskRecord, TaskStore,
};
use inbox_gatekeeper::{GateDecision, Gatekeeper};
use inbox_processor::{
    EnrichmentProcessor, MetadataProcessor, RankingProcessor, Stage, StageError,
};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, instrument, warn, Instrument, Level};

/// Log target for stage artifacts
pub const ARTIFACT_TARGET: &str = "inbox::artifact";

fn emit_artifact<T: Serialize>(stage: &str, value: &T) {
    if tracing::enabled!(target: ARTIFACT_TARGET, Level::DEBUG) {
        match serde_json::to_string(value) {
            Ok(json) => debug!(target: ARTIFACT_TARGET, stage, artifact = %json),
            Err(e) => debug!(target: ARTIFACT_TARGET, stage, error = %e, "Artifact not serializable"),
        }
    }
}

/// Stage a note has reached, still readable after its task panics
#[derive(Debug, Default)]
struct StageCursor(AtomicUsize);

impl StageCursor {
    fn enter(&self, stage: Stage) {
        self.0.store(stage as usize, Ordering::Relaxed);
    }

    fn current(&self) -> Stage {
        Stage::ALL
            .get(self.0.load(Ordering::Relaxed))
            .copied()
            .unwrap_or(Stage::Route)
    }
}

/// The decision pipeline
///
/// Cloning is cheap: stage processors, the store and the project registry
/// are shared.
pub struct Pipeline<C: ?Sized, S: ?Sized> {
    metadata: Arc<MetadataProcessor<C>>,
    ranking: Arc<RankingProcessor<C>>,
    enrichment: Arc<EnrichmentProcessor<C>>,
    gatekeeper: Gatekeeper,
    assembler: TaskAssembler,
    store: Arc<S>,
    registry: ProjectRegistry,
    concurrency: usize,
}

impl<C: ?Sized, S: ?Sized> Clone for Pipeline<C, S> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
            ranking: Arc::clone(&self.ranking),
            enrichment: Arc::clone(&self.enrichment),
            gatekeeper: self.gatekeeper.clone(),
            assembler: self.assembler.clone(),
            store: Arc::clone(&self.store),
            registry: self.registry.clone(),
            concurrency: self.concurrency,
        }
    }
}

impl<C, S> Pipeline<C, S>
where
    C: CompletionService + ?Sized + 'static,
    S: TaskStore + ?Sized + 'static,
{
    /// Build a pipeline over `service` and `store`
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] when `config` fails validation.
    pub fn new(service: Arc<C>, store: Arc<S>, config: &InboxConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let gatekeeper = Gatekeeper::new(config.gate);
        Ok(Self {
            metadata: Arc::new(MetadataProcessor::new(
                Arc::clone(&service),
                config.metadata.clone(),
                config.retry.clone(),
            )),
            ranking: Arc::new(RankingProcessor::new(
                Arc::clone(&service),
                config.ranking.clone(),
                config.retry.clone(),
            )),
            enrichment: Arc::new(EnrichmentProcessor::new(
                service,
                config.enrichment.clone(),
                config.retry.clone(),
            )),
            assembler: TaskAssembler::new(gatekeeper.clone(), config.pipeline.ambiguity_threshold),
            gatekeeper,
            store,
            registry: ProjectRegistry::new(config.pipeline.known_projects.iter().cloned()),
            concurrency: config.pipeline.concurrency,
        })
    }

    /// Known projects, including those discovered by earlier notes
    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    /// The gate this pipeline filters with
    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    /// Process `notes` one after another
    ///
    /// Each note runs in its own task, so a panic fails that note only.
    #[instrument(skip_all, fields(notes = notes.len()))]
    pub async fn run(&self, notes: Vec<RawNote>) -> PipelineResult {
        let started = Instant::now();
        let mut reports = Vec::with_capacity(notes.len());
        for note in notes {
            let note_id = note.id.clone();
            let cursor = Arc::new(StageCursor::default());
            let pipeline = self.clone();
            let task_cursor = Arc::clone(&cursor);
            let handle = tokio::spawn(
                async move { pipeline.process_tracked(note, &task_cursor).await }
                    .in_current_span(),
            );
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => self.join_failure(note_id, cursor.current(), e),
            };
            reports.push(report);
        }
        self.finish(reports, started)
    }

    /// Process `notes` with at most `limit` in flight
    pub async fn run_concurrent(&self, notes: Vec<RawNote>, limit: usize) -> PipelineResult {
        self.run_batch(notes, limit, std::future::pending()).await
    }

    /// Process `notes` concurrently until done or until `shutdown` resolves
    ///
    /// On shutdown, notes still in flight are abandoned and reported as
    /// [`NoteOutcome::Cancelled`]. Records already stored stay stored.
    pub async fn run_until<F>(&self, notes: Vec<RawNote>, shutdown: F) -> PipelineResult
    where
        F: Future<Output = ()>,
    {
        self.run_batch(notes, self.concurrency, shutdown).await
    }

    #[instrument(skip_all, fields(notes = notes.len(), limit = limit))]
    async fn run_batch<F>(&self, notes: Vec<RawNote>, limit: usize, shutdown: F) -> PipelineResult
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(limit.max(1)));
        let ids: Vec<_> = notes.iter().map(|n| n.id.clone()).collect();
        let mut slots: Vec<Option<NoteReport>> = vec![None; notes.len()];
        let cursors: Vec<Arc<StageCursor>> =
            notes.iter().map(|_| Arc::new(StageCursor::default())).collect();
        let mut positions = HashMap::with_capacity(notes.len());

        let mut tasks = JoinSet::new();
        for (index, note) in notes.into_iter().enumerate() {
            let pipeline = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let cursor = Arc::clone(&cursors[index]);
            let handle = tasks.spawn(
                async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    (index, pipeline.process_tracked(note, &cursor).await)
                }
                .in_current_span(),
            );
            positions.insert(handle.id(), index);
        }

        tokio::pin!(shutdown);
        let mut cancelled = false;
        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, report))) => slots[index] = Some(report),
                    Some(Err(e)) if e.is_cancelled() => {}
                    Some(Err(e)) => match positions.get(&e.id()) {
                        Some(&index) => {
                            let report = self.join_failure(ids[index].clone(), cursors[index].current(), e);
                            slots[index] = Some(report);
                        }
                        None => error!(error = %e, "Unknown note task failed"),
                    },
                    None => break,
                },
                _ = &mut shutdown, if !cancelled => {
                    warn!(in_flight = tasks.len(), "Shutdown requested, abandoning in-flight notes");
                    cancelled = true;
                    tasks.abort_all();
                }
            }
        }

        let reports = ids
            .into_iter()
            .zip(slots)
            .map(|(id, slot)| slot.unwrap_or_else(|| NoteReport::new(id, NoteOutcome::Cancelled)))
            .collect();
        self.finish(reports, started)
    }

    fn finish(&self, reports: Vec<NoteReport>, started: Instant) -> PipelineResult {
        let result = PipelineResult::from_reports(reports, started.elapsed());
        let metrics = &result.metrics;
        info!(
            stored = metrics.stored,
            filtered = metrics.filtered,
            failed = metrics.total_failed(),
            degraded = metrics.degraded,
            cancelled = metrics.cancelled,
            elapsed_ms = metrics.elapsed_ms,
            "Batch complete"
        );
        result
    }

    /// Report for a note whose task ended without returning
    fn join_failure(&self, note_id: NoteId, stage: Stage, error: JoinError) -> NoteReport {
        if error.is_cancelled() {
            return NoteReport::new(note_id, NoteOutcome::Cancelled);
        }
        let message = match error.try_into_panic() {
            Ok(payload) => match payload.downcast::<String>() {
                Ok(message) => *message,
                Err(payload) => payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "non-string panic payload".to_string()),
            },
            Err(e) => e.to_string(),
        };
        self.fail(NoteReport::new(
            note_id,
            NoteOutcome::failed(StageError::Panicked { stage, message }),
        ))
    }

    /// Run one note through every stage
    ///
    /// Never fails: stage errors become [`NoteOutcome::Failed`]. A panic
    /// inside an adapter unwinds out of this call; [`Pipeline::run`] and the
    /// concurrent runners contain it to the note.
    pub async fn process(&self, note: RawNote) -> NoteReport {
        self.process_tracked(note, &StageCursor::default()).await
    }

    #[instrument(name = "note", skip_all, fields(note_id = %note.id))]
    async fn process_tracked(&self, note: RawNote, cursor: &StageCursor) -> NoteReport {
        let note_id = note.id.clone();
        emit_artifact("input", &note);

        let known_projects = self.registry.snapshot();
        let classified = match self.metadata.classify(&note, &known_projects).await {
            Ok(classified) => classified,
            Err(e) => return self.fail(NoteReport::new(note_id, NoteOutcome::failed(e))),
        };
        if classified.new_project && self.registry.record(&classified.project) {
            info!(project = %classified.project, "New project discovered");
        }
        emit_artifact("route", &classified);

        cursor.enter(Stage::Rank);
        let ranked = match self.ranking.rank(&classified).await {
            Ok(ranked) => ranked,
            Err(e) => {
                let review = RankedNote::for_review(classified);
                emit_artifact("review", &review);
                let mut report = NoteReport::new(note_id, NoteOutcome::failed(e));
                report.review = Some(review);
                return self.fail(report);
            }
        };
        emit_artifact("rank", &ranked);

        let decision = self.gatekeeper.evaluate(&ranked);
        emit_artifact("filter", &decision);
        if !decision.passed {
            return self.filtered(note_id, decision);
        }

        cursor.enter(Stage::Enrich);
        let (record, enrichment_error) = match self.enrichment.enrich(&ranked).await {
            Ok(enriched) => {
                emit_artifact("enrich", &enriched);
                (self.assembler.from_enriched(&enriched), None)
            }
            Err(e) => {
                warn!(error = %e, "Enrichment failed, storing minimal task");
                (self.assembler.minimal(&ranked), Some(e.to_string()))
            }
        };

        cursor.enter(Stage::Store);
        let outcome = match self.store(&record).await {
            Ok(record_id) => NoteOutcome::Stored {
                record_id,
                priority: record.priority,
                status: record.status,
                enrichment_error,
            },
            Err(e) => return self.fail(NoteReport::new(note_id, NoteOutcome::failed(e))),
        };
        info!(outcome = outcome.label(), "Note processed");
        NoteReport::new(note_id, outcome)
    }

    async fn store(&self, record: &TaskRecord) -> Result<RecordId, StageError> {
        emit_artifact("store", record);
        let id = self
            .store
            .create(record)
            .await
            .map_err(|e| StageError::Store(e.to_string()))?;
        debug!(record_id = %id, priority = %record.priority, status = %record.status, "Task stored");
        Ok(id)
    }

    fn filtered(&self, note_id: NoteId, decision: GateDecision) -> NoteReport {
        let reasons: Vec<String> = decision.reasons.iter().map(|r| r.to_string()).collect();
        info!(composite = decision.composite, reasons = ?reasons, "Note filtered out");
        NoteReport::new(note_id, NoteOutcome::FilteredOut(decision))
    }

    fn fail(&self, report: NoteReport) -> NoteReport {
        if let NoteOutcome::Failed { stage, error } = &report.outcome {
            error!(stage = %stage, error = %error, "Note failed");
        }
        report
    }
}
