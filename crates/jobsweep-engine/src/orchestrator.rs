//! The run orchestrator.
//!
//! Drives every enabled platform through authenticate, search, and apply
//! phases. Platforms run concurrently as independent tasks over a shared
//! registry; each task owns its adapter, its retry-wrapped operations,
//! and its own anti-detection governor, so a failure or block on one
//! platform never stalls the others.

use crate::governor::{AntiDetectionGovernor, GovernorAdvice, GovernorConfig};
use crate::report::{PlatformSummary, RunOutcome, RunReport};
use crate::retry::{RetryError, RetryPolicy};
use crate::storage::{RunStore, StoreError};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use jobsweep_core::{
    AppConfig, ApplicationAttempt, AttemptOutcome, Classify, FailureClass, JobStatus, PlatformConfig,
    PlatformId,
};
use jobsweep_platform::{
    ApplyOutcome, CandidateStream, DocumentSet, PlatformAdapter, PlatformError, SearchQuery,
};
use jobsweep_registry::{JobRegistry, RegistryError};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors that stop a run outright.
///
/// Per-platform failures are absorbed into the run report; only broken
/// engine invariants and storage failures surface here.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The registry rejected an engine-driven operation
    #[error("registry invariant violated: {0}")]
    Registry(#[from] RegistryError),

    /// The run store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates one sweep across a set of platform adapters.
pub struct OrchestrationEngine {
    config: AppConfig,
    registry: JobRegistry,
    retry: RetryPolicy,
    governor_config: GovernorConfig,
    store: Arc<dyn RunStore>,
    cancel: CancellationToken,
}

impl OrchestrationEngine {
    /// Create an engine over a registry and a run store.
    ///
    /// The governor's baseline delay window comes from the configured
    /// delay bounds.
    #[must_use]
    pub fn new(config: AppConfig, registry: JobRegistry, store: Arc<dyn RunStore>) -> Self {
        let governor_config = GovernorConfig::from_delays(&config.delays);
        Self {
            config,
            registry,
            retry: RetryPolicy::default(),
            governor_config,
            store,
            cancel: CancellationToken::new(),
        }
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the governor tuning.
    #[must_use]
    pub fn with_governor_config(mut self, governor_config: GovernorConfig) -> Self {
        self.governor_config = governor_config;
        self
    }

    /// Use an externally-owned cancellation token (the CLI ties this to
    /// Ctrl-C).
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The registry this engine writes to.
    #[must_use]
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Run the sweep across the given adapters.
    ///
    /// Seeds the registry from the persisted snapshot, runs every
    /// platform concurrently to completion, persists the final snapshot,
    /// and returns the per-platform report. A platform aborting is
    /// reported, not propagated; the run itself only fails on broken
    /// invariants or storage errors.
    pub async fn run(
        &self,
        adapters: Vec<Box<dyn PlatformAdapter>>,
    ) -> Result<RunReport, EngineError> {
        let prior = self.store.load_snapshot().await?;
        if !prior.is_empty() {
            info!(records = prior.len(), "seeding registry from prior snapshot");
            self.registry.seed(prior);
        }

        let documents = DocumentSet {
            resume: self.config.application.resume_path.clone(),
            cover_letter: self.config.application.cover_letter_path.clone(),
        };

        let mut tasks = FuturesUnordered::new();
        for adapter in adapters {
            tasks.push(self.run_platform(adapter, documents.clone()));
        }

        let mut summaries = Vec::new();
        while let Some(summary) = tasks.next().await {
            summaries.push(summary?);
        }
        summaries.sort_by(|a, b| a.platform.as_str().cmp(b.platform.as_str()));

        self.store.save_snapshot(&self.registry.snapshot()).await?;

        let report = RunReport {
            platforms: summaries,
        };
        match report.outcome() {
            RunOutcome::Success => {
                info!(applied = report.total_applied(), "run complete");
            }
            RunOutcome::TotalFailure => {
                error!("every platform aborted; nothing was accomplished");
            }
        }
        Ok(report)
    }

    /// Drive one platform through all three phases.
    async fn run_platform(
        &self,
        mut adapter: Box<dyn PlatformAdapter>,
        documents: DocumentSet,
    ) -> Result<PlatformSummary, EngineError> {
        let platform = adapter.platform().clone();
        let mut governor = AntiDetectionGovernor::new(self.governor_config.clone());
        let mut aborted = false;
        let mut fatal_error: Option<String> = None;

        match self
            .retry
            .run("authenticate", &mut adapter, |a| a.authenticate(), |_, _| {})
            .await
        {
            Ok(()) => info!(platform = %platform, "authenticated"),
            Err(err) => {
                error!(platform = %platform, error = %err, "authentication failed, aborting platform");
                fatal_error = Some(err.to_string());
                aborted = true;
            }
        }

        if !aborted && !self.cancel.is_cancelled() {
            tokio::time::sleep(governor.next_delay()).await;
            let query = SearchQuery::from_config(&self.config.search, self.search_limit(&platform));
            match self
                .retry
                .run(
                    "search_jobs",
                    &mut adapter,
                    |a| {
                        let query = query.clone();
                        async move { a.search_jobs(&query).await }.boxed()
                    },
                    |_, _| {},
                )
                .await
            {
                Ok(stream) => {
                    self.ingest(&platform, &mut adapter, &mut governor, stream)
                        .await?;
                }
                Err(err @ RetryError::Fatal { .. }) => {
                    error!(platform = %platform, error = %err, "search failed fatally, aborting platform");
                    fatal_error = Some(err.to_string());
                    aborted = true;
                }
                Err(err) => {
                    // previously discovered jobs can still be applied to
                    warn!(platform = %platform, error = %err, "search failed, continuing with known jobs");
                }
            }
        }

        if !aborted && self.config.application.apply_active {
            let (apply_aborted, apply_error) = self
                .apply_phase(&platform, &mut adapter, &mut governor, &documents)
                .await?;
            if apply_aborted {
                aborted = true;
                fatal_error = apply_error;
            }
        }

        Ok(self.summarize(&platform, aborted, fatal_error))
    }

    /// Consume one search stream into the registry.
    ///
    /// Malformed listings are dropped and logged, never fatal. A
    /// detection signal mid-stream escalates the governor and ends the
    /// stream early.
    async fn ingest(
        &self,
        platform: &PlatformId,
        adapter: &mut Box<dyn PlatformAdapter>,
        governor: &mut AntiDetectionGovernor,
        mut stream: CandidateStream,
    ) -> Result<(), EngineError> {
        let mut new = 0usize;
        let mut duplicates = 0usize;
        let mut dropped = 0usize;

        while let Some(item) = stream.next().await {
            match item {
                Ok(candidate) => match self.registry.upsert(&candidate) {
                    Ok((_, true)) => new += 1,
                    Ok((_, false)) => duplicates += 1,
                    Err(RegistryError::InvalidCandidate { reason }) => {
                        dropped += 1;
                        debug!(platform = %platform, reason, "dropped invalid candidate");
                    }
                    Err(err) => return Err(err.into()),
                },
                Err(err) if err.class() == FailureClass::Detection => {
                    warn!(platform = %platform, error = %err, "detection signal during search, ending stream");
                    if let GovernorAdvice::Cooldown { pause, rotate } = governor.record_detection()
                    {
                        adapter.hint_rotation(rotate);
                        tokio::time::sleep(pause).await;
                    }
                    break;
                }
                Err(err) => {
                    dropped += 1;
                    debug!(platform = %platform, error = %err, "dropped malformed listing");
                }
            }
        }

        info!(platform = %platform, new, duplicates, dropped, "search ingested");
        Ok(())
    }

    /// Queue discovered jobs up to the remaining daily quota and apply to
    /// them sequentially.
    ///
    /// Returns `(aborted, fatal_error)` for the platform summary.
    async fn apply_phase(
        &self,
        platform: &PlatformId,
        adapter: &mut Box<dyn PlatformAdapter>,
        governor: &mut AntiDetectionGovernor,
        documents: &DocumentSet,
    ) -> Result<(bool, Option<String>), EngineError> {
        let discovered = self
            .registry
            .jobs_with_status(platform, JobStatus::Discovered);
        if discovered.is_empty() {
            return Ok((false, None));
        }

        if !adapter.supports_apply() {
            info!(platform = %platform, "platform only lists postings, skipping apply phase");
            for job in &discovered {
                self.registry.transition(job.id, JobStatus::Skipped)?;
            }
            return Ok((false, None));
        }

        if !documents.has_resume() {
            warn!(platform = %platform, "no resume document on disk, skipping apply phase");
            for job in &discovered {
                self.registry.transition(job.id, JobStatus::Skipped)?;
            }
            return Ok((false, None));
        }

        let today = Utc::now().date_naive();
        let already = self.store.applied_count(platform, today).await?;
        let budget = self
            .config
            .application
            .max_applications_per_day
            .saturating_sub(already) as usize;
        if budget == 0 {
            info!(platform = %platform, already, "daily quota already exhausted");
        }

        let mut queued = Vec::new();
        for (index, job) in discovered.iter().enumerate() {
            if index < budget {
                queued.push(self.registry.transition(job.id, JobStatus::Queued)?);
            } else {
                debug!(platform = %platform, job = %job.id, "over daily quota, skipping");
                self.registry.transition(job.id, JobStatus::Skipped)?;
            }
        }

        let mut remaining = queued.into_iter();
        while let Some(job) = remaining.next() {
            if self.cancel.is_cancelled() {
                info!(platform = %platform, "cancelled, draining queued jobs");
                self.registry.transition(job.id, JobStatus::Skipped)?;
                for job in remaining.by_ref() {
                    self.registry.transition(job.id, JobStatus::Skipped)?;
                }
                break;
            }

            tokio::time::sleep(governor.next_delay()).await;
            self.registry.transition(job.id, JobStatus::Applying)?;

            let mut observations: Vec<(u32, Option<(FailureClass, String)>)> = Vec::new();
            let outcome = self
                .retry
                .run(
                    "apply_to_job",
                    adapter,
                    |a| {
                        let job = job.clone();
                        let documents = documents.clone();
                        async move { a.apply_to_job(&job, &documents).await }.boxed()
                    },
                    |attempt, result| {
                        observations
                            .push((attempt, result.err().map(|e| (e.class(), e.to_string()))));
                    },
                )
                .await;

            // A NotEligible outcome resolves the attempt without an
            // error, but it is not a submission.
            let not_eligible_reason = match &outcome {
                Ok(ApplyOutcome::NotEligible { reason }) => Some(reason.clone()),
                _ => None,
            };

            let mut cooldown = None;
            for (number, failure) in &observations {
                let (kind, detail) = match failure {
                    None => match &not_eligible_reason {
                        Some(reason) => (AttemptOutcome::FatalFailure, Some(reason.clone())),
                        None => (AttemptOutcome::Success, None),
                    },
                    Some((FailureClass::Fatal, msg)) => {
                        (AttemptOutcome::FatalFailure, Some(msg.clone()))
                    }
                    Some((_, msg)) => (AttemptOutcome::TransientFailure, Some(msg.clone())),
                };
                self.registry.record_attempt(ApplicationAttempt {
                    job_id: job.id,
                    attempt_number: *number,
                    timestamp: Utc::now(),
                    outcome: kind,
                    error_detail: detail,
                })?;

                if matches!(failure, Some((FailureClass::Detection, _))) {
                    if let GovernorAdvice::Cooldown { pause, rotate } =
                        governor.record_detection()
                    {
                        adapter.hint_rotation(rotate);
                        cooldown = Some(pause);
                    }
                }
            }

            match outcome {
                Ok(ApplyOutcome::Submitted) => {
                    self.registry.transition(job.id, JobStatus::Applied)?;
                    self.store.record_application(platform, today).await?;
                    governor.record_success();
                    info!(platform = %platform, job = %job.id, title = %job.title, "application submitted");
                }
                Ok(ApplyOutcome::NotEligible { reason }) => {
                    self.registry.transition(job.id, JobStatus::Failed)?;
                    info!(platform = %platform, job = %job.id, reason, "listing not eligible for automated apply");
                }
                Err(err) => {
                    self.registry.transition(job.id, JobStatus::Failed)?;
                    warn!(platform = %platform, job = %job.id, error = %err, "application failed");
                    if session_lost(&err) {
                        // every remaining job would fail the same way
                        error!(platform = %platform, "session lost mid-run, aborting platform");
                        for job in remaining.by_ref() {
                            self.registry.transition(job.id, JobStatus::Skipped)?;
                        }
                        return Ok((true, Some(err.to_string())));
                    }
                }
            }

            if let Some(pause) = cooldown {
                warn!(
                    platform = %platform,
                    pause_secs = pause.as_secs(),
                    "cooling down after repeated detection signals"
                );
                tokio::time::sleep(pause).await;
            }
        }

        Ok((false, None))
    }

    fn summarize(
        &self,
        platform: &PlatformId,
        aborted: bool,
        fatal_error: Option<String>,
    ) -> PlatformSummary {
        let count = |status| self.registry.count_by_status(platform, status);
        PlatformSummary {
            platform: platform.clone(),
            tracked: count(JobStatus::Discovered)
                + count(JobStatus::Queued)
                + count(JobStatus::Applying)
                + count(JobStatus::Applied)
                + count(JobStatus::Failed)
                + count(JobStatus::Skipped),
            applied: count(JobStatus::Applied),
            failed: count(JobStatus::Failed),
            skipped: count(JobStatus::Skipped),
            aborted,
            fatal_error,
        }
    }

    fn search_limit(&self, platform: &PlatformId) -> usize {
        self.config
            .platforms
            .get(platform.as_str())
            .map_or_else(|| PlatformConfig::default().search_limit, |p| p.search_limit)
    }
}

/// Whether a terminal apply failure means the platform session itself is
/// gone rather than one listing being broken.
fn session_lost(err: &RetryError<PlatformError>) -> bool {
    matches!(
        err,
        RetryError::Fatal {
            error: PlatformError::AuthFailed { .. },
            ..
        }
    )
}
