// SPDX-License-Identifier: MIT

//! The migration service: job lifecycle, state persistence, cancellation,
//! recovery, and the background tasks that drive adapter operations.
//!
//! One service instance owns the in-memory job table. Every job is
//! driven by exactly one background task (its single writer); external
//! readers get snapshots. The job table and the cancellation map share
//! one RW-lock, and lock guards are never held across I/O: persisted
//! writes clone the record under the read lock and write the clone
//! outside it.

use crate::error::ServiceError;
use crate::event_bus::MigrationBus;
use airlift_catalog::{BlobStore, Catalog, OrphanScanner};
use airlift_core::{
    classify, Clock, IdGen, ImportResult, Job, JobOptions, JobStatus, MigrationEvent, Selections,
    StagedImport, StagedStatus, SystemClock, UuidIdGen,
};
use airlift_sources::{ImportCtx, ProgressFn, ProgressUpdate, SourceAdapter, SourceError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Error text written onto jobs found `running` at process start.
pub const STALE_RECOVERY_ERROR: &str =
    "import interrupted by server restart - use restart button to try again";

/// In-memory state: job table, staged-import cache, and the per-job
/// cancellation tokens. Guarded by one RW-lock.
#[derive(Default)]
struct State {
    jobs: HashMap<String, Job>,
    staged: HashMap<String, StagedImport>,
    cancels: HashMap<String, CancellationToken>,
}

struct Inner<C: Clock> {
    catalog: Catalog,
    store: Arc<dyn BlobStore>,
    orphans: Option<Arc<dyn OrphanScanner>>,
    adapters: RwLock<HashMap<String, Arc<dyn SourceAdapter>>>,
    state: RwLock<State>,
    bus: MigrationBus,
    ids: UuidIdGen,
    clock: C,
}

/// The orchestrator. Cheap to clone; all clones share one instance.
pub struct MigrationService<C: Clock = SystemClock> {
    inner: Arc<Inner<C>>,
}

impl<C: Clock> Clone for MigrationService<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl MigrationService<SystemClock> {
    pub fn new(catalog: Catalog, store: Arc<dyn BlobStore>) -> Self {
        Self::with_clock(catalog, store, SystemClock)
    }
}

impl<C: Clock> MigrationService<C> {
    pub fn with_clock(catalog: Catalog, store: Arc<dyn BlobStore>, clock: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog,
                store,
                orphans: None,
                adapters: RwLock::new(HashMap::new()),
                state: RwLock::new(State::default()),
                bus: MigrationBus::new(),
                ids: UuidIdGen,
                clock,
            }),
        }
    }

    /// Enable orphan adoption. Must be called before jobs start.
    pub fn with_orphans(mut self, orphans: Arc<dyn OrphanScanner>) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.orphans = Some(orphans),
            // Clones exist already; too late to reconfigure.
            None => tracing::warn!("with_orphans ignored: service already shared"),
        }
        self
    }

    /// Install an adapter under its source-type tag. Startup-time only.
    pub fn register_adapter(&self, adapter: Arc<dyn SourceAdapter>) {
        let tag = adapter.source_type().to_string();
        tracing::info!(source_type = %tag, "adapter registered");
        self.inner.adapters.write().insert(tag, adapter);
    }

    pub fn bus(&self) -> &MigrationBus {
        &self.inner.bus
    }

    fn adapter(&self, source_type: &str) -> Result<Arc<dyn SourceAdapter>, ServiceError> {
        self.inner
            .adapters
            .read()
            .get(source_type)
            .cloned()
            .ok_or_else(|| ServiceError::UnknownSource(source_type.to_string()))
    }

    fn import_ctx(&self, cancel: CancellationToken) -> ImportCtx {
        let mut ctx = ImportCtx::new(self.inner.catalog.clone(), Arc::clone(&self.inner.store))
            .with_cancel(cancel);
        if let Some(orphans) = &self.inner.orphans {
            ctx = ctx.with_orphans(Arc::clone(orphans));
        }
        ctx
    }

    // ── Job creation ───────────────────────────────────────────────────

    /// Validate options against the adapter and persist a `pending` job.
    pub async fn create_job(&self, options: JobOptions) -> Result<Job, ServiceError> {
        self.create_job_inner(options, false).await
    }

    /// Same as [`create_job`](Self::create_job), but staged: the job is
    /// born `analyzing` and runs the two-phase workflow.
    pub async fn create_staged_job(&self, options: JobOptions) -> Result<Job, ServiceError> {
        self.create_job_inner(options, true).await
    }

    async fn create_job_inner(
        &self,
        mut options: JobOptions,
        staged: bool,
    ) -> Result<Job, ServiceError> {
        let adapter = self.adapter(&options.source_type)?;
        adapter
            .validate(&options)
            .await
            .map_err(|err| ServiceError::Validation(err.to_string()))?;

        let id = self.inner.ids.next();
        options.job_id = Some(id.clone());
        let staged = staged || options.staged_mode;
        options.staged_mode = staged;

        let job = if staged {
            Job::new_staged(&id, options, self.inner.clock.now())
        } else {
            Job::new(&id, options, self.inner.clock.now())
        };

        self.inner.state.write().jobs.insert(id.clone(), job.clone());
        self.persist_job(&id).await?;
        self.publish_status(&job, Vec::new());
        tracing::info!(job_id = %id, source_type = %job.source_type, staged, "job created");
        Ok(job)
    }

    // ── Reads ──────────────────────────────────────────────────────────

    /// Snapshot of one job; never the live record.
    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.inner.state.read().jobs.get(job_id).cloned()
    }

    /// Snapshots of every job, oldest first.
    pub fn list_jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.inner.state.read().jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        jobs
    }

    /// Snapshot of a staged import, loading from the catalog after a
    /// restart.
    pub async fn get_staged_import(
        &self,
        staged_id: &str,
    ) -> Result<StagedImport, ServiceError> {
        if let Some(staged) = self.inner.state.read().staged.get(staged_id).cloned() {
            return Ok(staged);
        }
        let staged = self
            .inner
            .catalog
            .load_staged_import(staged_id)
            .await
            .map_err(|_| ServiceError::StagedNotFound(staged_id.to_string()))?;
        self.inner
            .state
            .write()
            .staged
            .insert(staged_id.to_string(), staged.clone());
        Ok(staged)
    }

    // ── Lifecycle transitions ──────────────────────────────────────────

    /// `pending → running`: launch the adapter's one-shot import.
    pub async fn start_job(&self, job_id: &str) -> Result<(), ServiceError> {
        let job = self.transition(job_id, "start_job", JobStatus::Pending, JobStatus::Running)?;
        self.persist_job(job_id).await?;
        self.publish_status(&job, Vec::new());

        let adapter = self.adapter(&job.source_type)?;
        let cancel = self.new_cancel_token(job_id);
        let service = self.clone();
        let job_id = job_id.to_string();
        self.spawn_supervised(job_id.clone(), async move {
            let ctx = service.import_ctx(cancel);
            let progress = service.progress_fn(&job_id);
            let outcome = adapter.import(&ctx, &job.options, &progress).await;
            service.finish_job(&job_id, outcome).await;
        });
        Ok(())
    }

    /// `analyzing → staged`: launch the adapter's staged analysis.
    pub async fn start_staged_job(&self, job_id: &str) -> Result<(), ServiceError> {
        let job = {
            let state = self.inner.state.read();
            let job = state
                .jobs
                .get(job_id)
                .ok_or_else(|| ServiceError::JobNotFound(job_id.to_string()))?;
            if job.status != JobStatus::Analyzing {
                return Err(ServiceError::InvalidState {
                    job_id: job_id.to_string(),
                    action: "start_staged_job",
                    required: "analyzing",
                    actual: job.status.to_string(),
                });
            }
            job.clone()
        };

        let adapter = self.adapter(&job.source_type)?;
        if adapter.staging().is_none() {
            return Err(ServiceError::StagingUnsupported(job.source_type.clone()));
        }

        let cancel = self.new_cancel_token(job_id);
        let service = self.clone();
        let job_id = job_id.to_string();
        self.spawn_supervised(job_id.clone(), async move {
            let ctx = service.import_ctx(cancel);
            let outcome = match adapter.staging() {
                Some(staged_src) => {
                    staged_src
                        .analyze_for_staging(&ctx, &job_id, &job.options)
                        .await
                }
                None => Err(SourceError::Malformed(
                    "adapter lost staged support".to_string(),
                )),
            };
            service.finish_analysis(&job_id, outcome).await;
        });
        Ok(())
    }

    /// `staged → running → completed`: replay the user's selections.
    pub async fn commit_staged_import(&self, staged_id: &str) -> Result<(), ServiceError> {
        let staged = self.get_staged_import(staged_id).await?;
        if staged.status != StagedStatus::Ready {
            return Err(ServiceError::InvalidStagedState {
                staged_id: staged_id.to_string(),
                action: "commit_staged_import",
                required: "ready",
                actual: staged.status.to_string(),
            });
        }
        let job_id = staged.job_id.clone();
        let source_type = self
            .get_job(&job_id)
            .ok_or_else(|| ServiceError::JobNotFound(job_id.clone()))?
            .source_type;
        let adapter = self.adapter(&source_type)?;
        if adapter.staging().is_none() {
            return Err(ServiceError::StagingUnsupported(source_type));
        }

        let job = self.transition(&job_id, "commit_staged_import", JobStatus::Staged, JobStatus::Running)?;
        self.persist_job(&job_id).await?;
        self.publish_status(&job, vec![("staged_id", staged_id.into())]);

        let cancel = self.new_cancel_token(&job_id);
        let service = self.clone();
        let mut staged = staged;
        self.spawn_supervised(job_id.clone(), async move {
            let ctx = service.import_ctx(cancel);
            let progress = service.progress_fn(&job_id);
            let outcome = match adapter.staging() {
                Some(staged_src) => {
                    staged_src
                        .commit_staged_import(&ctx, &mut staged, &job_id, &job.options, &progress)
                        .await
                }
                None => Err(SourceError::Malformed(
                    "adapter lost staged support".to_string(),
                )),
            };
            if outcome.is_ok() {
                service.store_staged(staged).await;
            }
            service.finish_job(&job_id, outcome).await;
        });
        Ok(())
    }

    /// Signal a running job's cancellation token. The job task observes
    /// it cooperatively and finishes as `cancelled`.
    pub fn cancel_job(&self, job_id: &str) -> Result<(), ServiceError> {
        let state = self.inner.state.read();
        let job = state
            .jobs
            .get(job_id)
            .ok_or_else(|| ServiceError::JobNotFound(job_id.to_string()))?;
        if job.status != JobStatus::Running {
            return Err(ServiceError::InvalidState {
                job_id: job_id.to_string(),
                action: "cancel_job",
                required: "running",
                actual: job.status.to_string(),
            });
        }
        if let Some(token) = state.cancels.get(job_id) {
            token.cancel();
        }
        tracing::info!(job_id, "cancellation requested");
        Ok(())
    }

    /// Remove a job (and its staged import). Forbidden while running.
    pub async fn delete_job(&self, job_id: &str) -> Result<(), ServiceError> {
        let staged_id = {
            let mut state = self.inner.state.write();
            let job = state
                .jobs
                .get(job_id)
                .ok_or_else(|| ServiceError::JobNotFound(job_id.to_string()))?;
            if !job.is_deletable() {
                return Err(ServiceError::JobRunning(job_id.to_string()));
            }
            let staged_id = job.staged_import_id.clone();
            state.jobs.remove(job_id);
            state.cancels.remove(job_id);
            if let Some(id) = &staged_id {
                state.staged.remove(id);
            }
            staged_id
        };

        self.inner.catalog.delete_job_row(job_id).await?;
        if let Some(id) = staged_id {
            self.inner.catalog.delete_staged_import(&id).await?;
        }
        tracing::info!(job_id, "job deleted");
        Ok(())
    }

    /// Load persisted jobs at process start; anything still `running`
    /// was interrupted and is rewritten to `failed`.
    pub async fn recover_stale_jobs(&self) -> Result<usize, ServiceError> {
        let jobs = self.inner.catalog.load_jobs().await?;
        let mut stale = Vec::new();
        {
            let mut state = self.inner.state.write();
            for mut job in jobs {
                if job.status == JobStatus::Running {
                    job.status = JobStatus::Failed;
                    job.error = Some(STALE_RECOVERY_ERROR.to_string());
                    job.completed_at = Some(self.inner.clock.now());
                    stale.push(job.id.clone());
                }
                state.jobs.insert(job.id.clone(), job);
            }
        }
        for job_id in &stale {
            self.persist_job(job_id).await?;
            if let Some(job) = self.get_job(job_id) {
                self.publish_status(&job, Vec::new());
            }
            tracing::warn!(job_id = %job_id, "stale running job recovered as failed");
        }
        Ok(stale.len())
    }

    // ── Staged-import review ───────────────────────────────────────────

    /// Rewrite per-item selected flags from the submitted selections.
    /// Only legal while the artifact is `ready`.
    pub async fn update_selections(
        &self,
        staged_id: &str,
        selections: Selections,
    ) -> Result<StagedImport, ServiceError> {
        let mut staged = self.get_staged_import(staged_id).await?;
        if staged.status != StagedStatus::Ready {
            return Err(ServiceError::InvalidStagedState {
                staged_id: staged_id.to_string(),
                action: "update_selections",
                required: "ready",
                actual: staged.status.to_string(),
            });
        }
        staged.apply_selections(selections);
        self.store_staged(staged.clone()).await;
        Ok(staged)
    }

    /// `ready → rejected`; the owning job ends `cancelled`.
    pub async fn reject_staged_import(&self, staged_id: &str) -> Result<(), ServiceError> {
        let mut staged = self.get_staged_import(staged_id).await?;
        if staged.status != StagedStatus::Ready {
            return Err(ServiceError::InvalidStagedState {
                staged_id: staged_id.to_string(),
                action: "reject_staged_import",
                required: "ready",
                actual: staged.status.to_string(),
            });
        }
        staged.status = StagedStatus::Rejected;
        let job_id = staged.job_id.clone();
        self.store_staged(staged).await;

        let job = self.transition(&job_id, "reject_staged_import", JobStatus::Staged, JobStatus::Cancelled)?;
        self.persist_job(&job_id).await?;
        self.publish_status(&job, vec![("staged_id", staged_id.into())]);
        tracing::info!(job_id = %job_id, staged_id, "staged import rejected");
        Ok(())
    }

    // ── Rollback / redo / reset ────────────────────────────────────────

    /// Delete everything a completed job imported, in FK order, inside
    /// one transaction. `completed → rolled_back`.
    pub async fn rollback_import(&self, job_id: &str) -> Result<u64, ServiceError> {
        let job = {
            let state = self.inner.state.read();
            let job = state
                .jobs
                .get(job_id)
                .ok_or_else(|| ServiceError::JobNotFound(job_id.to_string()))?;
            if job.status != JobStatus::Completed {
                return Err(ServiceError::InvalidState {
                    job_id: job_id.to_string(),
                    action: "rollback_import",
                    required: "completed",
                    actual: job.status.to_string(),
                });
            }
            job.clone()
        };

        // Prefer the persisted index; reconstruct from provenance when a
        // job predates it.
        let items = match job.imported {
            Some(items) => items,
            None => self.inner.catalog.imported_items_for_job(job_id).await?,
        };
        let deleted = self.inner.catalog.rollback_items(&items).await?;

        let job = {
            let mut state = self.inner.state.write();
            if let Some(job) = state.jobs.get_mut(job_id) {
                job.status = JobStatus::RolledBack;
                job.completed_at = Some(self.inner.clock.now());
            }
            state.jobs.get(job_id).cloned()
        };
        self.persist_job(job_id).await?;
        if let Some(job) = job {
            self.publish_status(&job, vec![("items_deleted", (deleted as i64).into())]);
        }
        tracing::info!(job_id, deleted, "import rolled back");
        Ok(deleted)
    }

    /// Materialize a new job with the same options, cross-linked to the
    /// original. Staged clones restart at `analyzing`.
    pub async fn clone_job_for_redo(&self, job_id: &str) -> Result<Job, ServiceError> {
        let original = self
            .get_job(job_id)
            .ok_or_else(|| ServiceError::JobNotFound(job_id.to_string()))?;

        let id = self.inner.ids.next();
        let mut options = original.options.clone();
        options.job_id = Some(id.clone());

        let mut job = if original.staged_mode {
            Job::new_staged(&id, options, self.inner.clock.now())
        } else {
            Job::new(&id, options, self.inner.clock.now())
        };
        job.redo_of_job_id = Some(job_id.to_string());

        self.inner.state.write().jobs.insert(id.clone(), job.clone());
        self.persist_job(&id).await?;
        self.publish_status(&job, vec![("redo_of", job_id.into())]);
        tracing::info!(job_id = %id, redo_of = %job_id, "job cloned for redo");
        Ok(job)
    }

    /// Truncate every catalog table. Destructive, last-resort.
    pub async fn reset_imported_data(&self) -> Result<u64, ServiceError> {
        let deleted = self.inner.catalog.reset_imported_data().await?;
        tracing::warn!(deleted, "imported data reset");
        Ok(deleted)
    }

    // ── Internals ──────────────────────────────────────────────────────

    /// Check-and-set a status transition; returns the post-transition
    /// snapshot. Illegal transitions are rejected with no mutation.
    fn transition(
        &self,
        job_id: &str,
        action: &'static str,
        required: JobStatus,
        to: JobStatus,
    ) -> Result<Job, ServiceError> {
        let mut state = self.inner.state.write();
        let job = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| ServiceError::JobNotFound(job_id.to_string()))?;
        if job.status != required || !job.status.can_transition(to) {
            return Err(ServiceError::InvalidState {
                job_id: job_id.to_string(),
                action,
                required: match required {
                    JobStatus::Pending => "pending",
                    JobStatus::Analyzing => "analyzing",
                    JobStatus::Staged => "staged",
                    JobStatus::Running => "running",
                    JobStatus::Completed => "completed",
                    _ => "a non-terminal state",
                },
                actual: job.status.to_string(),
            });
        }
        job.status = to;
        let now = self.inner.clock.now();
        match to {
            JobStatus::Running => job.started_at = Some(now),
            JobStatus::Cancelled => job.completed_at = Some(now),
            _ => {}
        }
        Ok(job.clone())
    }

    fn new_cancel_token(&self, job_id: &str) -> CancellationToken {
        let token = CancellationToken::new();
        self.inner
            .state
            .write()
            .cancels
            .insert(job_id.to_string(), token.clone());
        token
    }

    /// Spawn a job task under a panic barrier: a panicking task still
    /// leaves the job `failed` and publishes a completion event.
    fn spawn_supervised<F>(&self, job_id: String, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let service = self.clone();
        let handle = tokio::spawn(fut);
        tokio::spawn(async move {
            if let Err(join_err) = handle.await {
                if join_err.is_panic() {
                    let message = panic_message(join_err.into_panic());
                    tracing::error!(job_id = %job_id, %message, "job task panicked");
                    service.fail_job(&job_id, format!("panic: {message}")).await;
                }
            }
        });
    }

    /// Persist a job: clone under the read lock, write outside it.
    async fn persist_job(&self, job_id: &str) -> Result<(), ServiceError> {
        let snapshot = self.inner.state.read().jobs.get(job_id).cloned();
        if let Some(job) = snapshot {
            self.inner.catalog.save_job(&job).await?;
        }
        Ok(())
    }

    async fn store_staged(&self, staged: StagedImport) {
        if let Err(err) = self.inner.catalog.save_staged_import(&staged).await {
            tracing::error!(staged_id = %staged.id, error = %err, "staged import persist failed");
        }
        self.inner
            .state
            .write()
            .staged
            .insert(staged.id.clone(), staged);
    }

    fn publish_status(&self, job: &Job, extra: Vec<(&str, serde_json::Value)>) {
        let mut event = MigrationEvent::new(&job.id, job.status);
        if let Some(error) = &job.error {
            event = event.with_field("error", error.clone());
        }
        if let Some(staged_id) = &job.staged_import_id {
            event = event.with_field("staged_id", staged_id.clone());
        }
        for (key, value) in extra {
            event = event.with_field(key, value);
        }
        self.inner.bus.publish(event);
    }

    fn progress_fn(&self, job_id: &str) -> ProgressFn {
        let service = self.clone();
        let job_id = job_id.to_string();
        Arc::new(move |update: ProgressUpdate| {
            let now = service.inner.clock.now();
            let mut percentage = 0.0;
            {
                let mut state = service.inner.state.write();
                if let Some(job) = state.jobs.get_mut(&job_id) {
                    job.progress.record(
                        &update.phase,
                        &update.step,
                        update.completed,
                        update.total,
                        now,
                    );
                    for (key, value) in &update.counters {
                        job.progress.set_counter(key, *value);
                    }
                    percentage = job.progress.percentage;
                }
            }
            service.inner.bus.publish(
                MigrationEvent::new(&job_id, JobStatus::Running)
                    .with_field("progress", format!("{}/{}", update.phase, update.step))
                    .with_field("percentage", percentage),
            );
        })
    }

    /// Record a finished analysis: store the artifact and move the job
    /// to `staged`, or fail it.
    async fn finish_analysis(&self, job_id: &str, outcome: Result<StagedImport, SourceError>) {
        self.drop_cancel_token(job_id);
        match outcome {
            Ok(staged) => {
                let staged_id = staged.id.clone();
                self.store_staged(staged).await;
                let job = {
                    let mut state = self.inner.state.write();
                    if let Some(job) = state.jobs.get_mut(job_id) {
                        job.status = JobStatus::Staged;
                        job.staged_import_id = Some(staged_id.clone());
                    }
                    state.jobs.get(job_id).cloned()
                };
                if let Err(err) = self.persist_job(job_id).await {
                    tracing::error!(job_id, error = %err, "job persist failed");
                }
                if let Some(job) = job {
                    self.publish_status(&job, Vec::new());
                }
                tracing::info!(job_id, staged_id = %staged_id, "analysis ready for review");
            }
            Err(err) => self.record_failure(job_id, err).await,
        }
    }

    /// Record a finished import or commit on the job and publish the
    /// terminal event.
    async fn finish_job(&self, job_id: &str, outcome: Result<ImportResult, SourceError>) {
        self.drop_cancel_token(job_id);
        match outcome {
            Ok(result) => {
                let imported = match self.inner.catalog.imported_items_for_job(job_id).await {
                    Ok(items) => Some(items),
                    Err(err) => {
                        tracing::error!(job_id, error = %err, "imported-items index rebuild failed");
                        None
                    }
                };
                let anomalies = classify(&result);
                let job = {
                    let mut state = self.inner.state.write();
                    if let Some(job) = state.jobs.get_mut(job_id) {
                        job.status = JobStatus::Completed;
                        job.completed_at = Some(self.inner.clock.now());
                        job.result = Some(result.clone());
                        job.anomalies = anomalies;
                        job.imported = imported;
                    }
                    state.jobs.get(job_id).cloned()
                };
                if let Err(err) = self.persist_job(job_id).await {
                    tracing::error!(job_id, error = %err, "job persist failed");
                }
                if let Some(job) = job {
                    let result_json =
                        serde_json::to_value(&result).unwrap_or(serde_json::Value::Null);
                    self.publish_status(&job, vec![("result", result_json)]);
                }
                tracing::info!(job_id, "job completed");
            }
            Err(err) if err.is_cancelled() => {
                let job = {
                    let mut state = self.inner.state.write();
                    if let Some(job) = state.jobs.get_mut(job_id) {
                        job.status = JobStatus::Cancelled;
                        job.completed_at = Some(self.inner.clock.now());
                    }
                    state.jobs.get(job_id).cloned()
                };
                if let Err(err) = self.persist_job(job_id).await {
                    tracing::error!(job_id, error = %err, "job persist failed");
                }
                if let Some(job) = job {
                    self.publish_status(&job, Vec::new());
                }
                tracing::info!(job_id, "job cancelled");
            }
            Err(err) => self.record_failure(job_id, err).await,
        }
    }

    async fn record_failure(&self, job_id: &str, err: SourceError) {
        self.fail_job(job_id, err.to_string()).await;
    }

    /// Move a job to `failed` with the given error text and publish the
    /// terminal event.
    async fn fail_job(&self, job_id: &str, message: String) {
        self.drop_cancel_token(job_id);
        let job = {
            let mut state = self.inner.state.write();
            if let Some(job) = state.jobs.get_mut(job_id) {
                job.status = JobStatus::Failed;
                job.error = Some(message.clone());
                job.completed_at = Some(self.inner.clock.now());
            }
            state.jobs.get(job_id).cloned()
        };
        if let Err(err) = self.persist_job(job_id).await {
            tracing::error!(job_id, error = %err, "job persist failed");
        }
        if let Some(job) = job {
            self.publish_status(&job, Vec::new());
        }
        tracing::warn!(job_id, error = %message, "job failed");
    }

    fn drop_cancel_token(&self, job_id: &str) {
        self.inner.state.write().cancels.remove(job_id);
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
