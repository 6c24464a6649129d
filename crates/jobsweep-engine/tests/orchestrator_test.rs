//! End-to-end orchestration tests over scripted platform adapters.

use async_trait::async_trait;
use chrono::Utc;
use jobsweep_core::{
    AppConfig, AttemptOutcome, Job, JobCandidate, JobId, JobStatus, PlatformConfig, PlatformId,
};
use jobsweep_engine::{
    GovernorConfig, MemoryStore, OrchestrationEngine, RetryPolicy, RunOutcome, RunStore,
};
use jobsweep_platform::{
    ApplyOutcome, CandidateStream, DocumentSet, PlatformAdapter, PlatformError, RotationHint,
    SearchQuery,
};
use jobsweep_registry::{JobRecord, JobRegistry};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Adapter that replays scripted results.
///
/// `auth` and `applies` are popped per call and default to success once
/// exhausted; `searches` defaults to an empty stream.
struct ScriptedAdapter {
    platform: PlatformId,
    supports_apply: bool,
    auth: VecDeque<jobsweep_platform::Result<()>>,
    searches: VecDeque<Vec<jobsweep_platform::Result<JobCandidate>>>,
    applies: VecDeque<jobsweep_platform::Result<ApplyOutcome>>,
    rotations: Arc<Mutex<Vec<RotationHint>>>,
    apply_calls: Arc<AtomicUsize>,
    cancel_after_first_apply: Option<CancellationToken>,
}

impl ScriptedAdapter {
    fn new(platform: &str) -> Self {
        Self {
            platform: PlatformId::new(platform).expect("valid platform id"),
            supports_apply: true,
            auth: VecDeque::new(),
            searches: VecDeque::new(),
            applies: VecDeque::new(),
            rotations: Arc::new(Mutex::new(Vec::new())),
            apply_calls: Arc::new(AtomicUsize::new(0)),
            cancel_after_first_apply: None,
        }
    }

    fn listing_only(mut self) -> Self {
        self.supports_apply = false;
        self
    }

    fn with_search(mut self, results: Vec<jobsweep_platform::Result<JobCandidate>>) -> Self {
        self.searches.push_back(results);
        self
    }

    fn with_auth(mut self, result: jobsweep_platform::Result<()>) -> Self {
        self.auth.push_back(result);
        self
    }

    fn with_apply(mut self, result: jobsweep_platform::Result<ApplyOutcome>) -> Self {
        self.applies.push_back(result);
        self
    }

    fn rotations(&self) -> Arc<Mutex<Vec<RotationHint>>> {
        Arc::clone(&self.rotations)
    }

    fn apply_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.apply_calls)
    }
}

#[async_trait]
impl PlatformAdapter for ScriptedAdapter {
    fn platform(&self) -> &PlatformId {
        &self.platform
    }

    fn supports_apply(&self) -> bool {
        self.supports_apply
    }

    async fn authenticate(&mut self) -> jobsweep_platform::Result<()> {
        self.auth.pop_front().unwrap_or(Ok(()))
    }

    async fn search_jobs(
        &mut self,
        _query: &SearchQuery,
    ) -> jobsweep_platform::Result<CandidateStream> {
        let items = self.searches.pop_front().unwrap_or_default();
        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn apply_to_job(
        &mut self,
        _job: &Job,
        _documents: &DocumentSet,
    ) -> jobsweep_platform::Result<ApplyOutcome> {
        let calls = self.apply_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if calls == 1 {
            if let Some(token) = &self.cancel_after_first_apply {
                token.cancel();
            }
        }
        self.applies.pop_front().unwrap_or(Ok(ApplyOutcome::Submitted))
    }

    fn hint_rotation(&mut self, hint: RotationHint) {
        self.rotations.lock().expect("rotation lock").push(hint);
    }
}

fn candidate(platform: &str, title: &str, link: &str) -> JobCandidate {
    JobCandidate {
        title: title.to_string(),
        company: "Acme".to_string(),
        location: "Remote".to_string(),
        link: link.to_string(),
        platform: PlatformId::new(platform).expect("valid platform id"),
    }
}

fn job_id(title: &str, link: &str) -> JobId {
    JobId::fingerprint(title, "Acme", link)
}

fn pid(platform: &str) -> PlatformId {
    PlatformId::new(platform).expect("valid platform id")
}

fn test_config(platforms: &[&str], quota: u32, resume: Option<PathBuf>) -> AppConfig {
    let mut config = AppConfig::default();
    config.search.keywords = "rust developer".to_string();
    config.application.apply_active = true;
    config.application.max_applications_per_day = quota;
    config.application.resume_path = resume;
    config.delays.min_delay = 0.0;
    config.delays.max_delay = 0.0;
    for platform in platforms {
        config.platforms.insert(
            (*platform).to_string(),
            PlatformConfig {
                enabled: true,
                search_limit: 25,
            },
        );
    }
    config
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        multiplier: 2.0,
        max_delay: Duration::from_millis(4),
        jitter: false,
        detection_weight: 2,
    }
}

fn fast_governor() -> GovernorConfig {
    GovernorConfig {
        min_delay: Duration::ZERO,
        max_delay: Duration::from_millis(1),
        escalation_ceiling: Duration::from_millis(20),
        cooldown: Duration::from_millis(5),
        signals_before_cooldown: 2,
        decay_after_successes: 3,
    }
}

fn build_engine(config: AppConfig, store: &Arc<MemoryStore>) -> OrchestrationEngine {
    OrchestrationEngine::new(
        config,
        JobRegistry::new(),
        Arc::clone(store) as Arc<dyn RunStore>,
    )
    .with_retry_policy(fast_retry())
    .with_governor_config(fast_governor())
}

/// A real resume file, so the apply-phase eligibility check passes.
fn resume_on_disk() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("resume.pdf");
    std::fs::write(&path, b"resume").expect("write resume");
    (dir, path)
}

#[tokio::test]
async fn test_clean_run_applies_on_every_platform() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(test_config(&["linkedin", "indeed"], 10, Some(resume)), &store);

    let linkedin = ScriptedAdapter::new("linkedin").with_search(vec![
        Ok(candidate("linkedin", "Rust Engineer", "https://li/1")),
        Ok(candidate("linkedin", "Backend Developer", "https://li/2")),
    ]);
    let indeed = ScriptedAdapter::new("indeed")
        .with_search(vec![Ok(candidate("indeed", "Systems Programmer", "https://in/1"))]);

    let report = engine
        .run(vec![Box::new(linkedin), Box::new(indeed)])
        .await
        .expect("run succeeds");

    assert_eq!(report.outcome(), RunOutcome::Success);
    assert_eq!(report.total_applied(), 3);

    let li = report.summary_for(&pid("linkedin")).expect("linkedin summary");
    assert_eq!(li.applied, 2);
    assert!(!li.aborted);

    let job = engine
        .registry()
        .get(job_id("Rust Engineer", "https://li/1"))
        .expect("job tracked");
    assert_eq!(job.status, JobStatus::Applied);
    assert!(job.applied_at.is_some());

    let today = Utc::now().date_naive();
    assert_eq!(store.applied_count(&pid("linkedin"), today).await.expect("count"), 2);
    assert_eq!(store.applied_count(&pid("indeed"), today).await.expect("count"), 1);

    // final snapshot was persisted
    let snapshot = store.load_snapshot().await.expect("snapshot");
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.iter().all(|r| r.status == JobStatus::Applied));
}

#[tokio::test]
async fn test_identical_listings_collapse_across_platforms() {
    let store = Arc::new(MemoryStore::new());
    let mut config = test_config(&["linkedin", "indeed"], 10, None);
    config.application.apply_active = false;
    let engine = build_engine(config, &store);

    let linkedin = ScriptedAdapter::new("linkedin")
        .with_search(vec![Ok(candidate("linkedin", "Rust Engineer", "https://jobs/1"))]);
    let indeed = ScriptedAdapter::new("indeed")
        .with_search(vec![Ok(candidate("indeed", "Rust  engineer", "HTTPS://jobs/1"))]);

    let report = engine
        .run(vec![Box::new(linkedin), Box::new(indeed)])
        .await
        .expect("run succeeds");

    assert_eq!(engine.registry().len(), 1);
    let tracked: usize = report.platforms.iter().map(|p| p.tracked).sum();
    assert_eq!(tracked, 1, "exactly one platform owns the deduplicated job");
}

#[tokio::test]
async fn test_invalid_candidates_are_dropped_not_fatal() {
    let store = Arc::new(MemoryStore::new());
    let mut config = test_config(&["linkedin"], 10, None);
    config.application.apply_active = false;
    let engine = build_engine(config, &store);

    let adapter = ScriptedAdapter::new("linkedin").with_search(vec![
        Ok(candidate("linkedin", "", "https://li/1")),
        Err(PlatformError::InvalidListing {
            reason: "card missing link".to_string(),
        }),
        Ok(candidate("linkedin", "Rust Engineer", "https://li/2")),
    ]);

    let report = engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    assert_eq!(report.outcome(), RunOutcome::Success);
    assert_eq!(engine.registry().len(), 1);
    assert!(engine
        .registry()
        .get(job_id("Rust Engineer", "https://li/2"))
        .is_some());
}

#[tokio::test]
async fn test_daily_quota_bounds_applications() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(test_config(&["linkedin"], 2, Some(resume)), &store);

    let adapter = ScriptedAdapter::new("linkedin").with_search(vec![
        Ok(candidate("linkedin", "Job One", "https://li/1")),
        Ok(candidate("linkedin", "Job Two", "https://li/2")),
        Ok(candidate("linkedin", "Job Three", "https://li/3")),
    ]);
    let apply_calls = adapter.apply_calls();

    let report = engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    let summary = report.summary_for(&pid("linkedin")).expect("summary");
    assert_eq!(summary.applied, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(apply_calls.load(Ordering::SeqCst), 2);

    // the job over quota never left a pre-apply state
    assert_eq!(
        engine
            .registry()
            .get(job_id("Job Three", "https://li/3"))
            .expect("tracked")
            .status,
        JobStatus::Skipped
    );
}

#[tokio::test]
async fn test_quota_counts_applications_from_earlier_runs_today() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    store.set_applied_count(&pid("linkedin"), Utc::now().date_naive(), 1);
    let engine = build_engine(test_config(&["linkedin"], 2, Some(resume)), &store);

    let adapter = ScriptedAdapter::new("linkedin").with_search(vec![
        Ok(candidate("linkedin", "Job One", "https://li/1")),
        Ok(candidate("linkedin", "Job Two", "https://li/2")),
    ]);

    let report = engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    let summary = report.summary_for(&pid("linkedin")).expect("summary");
    assert_eq!(summary.applied, 1, "only the remaining quota is spent");
    assert_eq!(summary.skipped, 1);
    assert_eq!(
        store
            .applied_count(&pid("linkedin"), Utc::now().date_naive())
            .await
            .expect("count"),
        2
    );
}

#[tokio::test]
async fn test_transient_apply_failures_retry_and_log_attempts() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(test_config(&["linkedin"], 10, Some(resume)), &store);

    let adapter = ScriptedAdapter::new("linkedin")
        .with_search(vec![Ok(candidate("linkedin", "Rust Engineer", "https://li/1"))])
        .with_apply(Err(PlatformError::Timeout {
            what: "apply modal".to_string(),
        }))
        .with_apply(Ok(ApplyOutcome::Submitted));

    engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    let id = job_id("Rust Engineer", "https://li/1");
    assert_eq!(engine.registry().get(id).expect("tracked").status, JobStatus::Applied);

    let attempts = engine.registry().attempts_for(id);
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].attempt_number, 1);
    assert_eq!(attempts[0].outcome, AttemptOutcome::TransientFailure);
    assert!(attempts[0].error_detail.as_deref().is_some_and(|d| d.contains("apply modal")));
    assert_eq!(attempts[1].attempt_number, 2);
    assert_eq!(attempts[1].outcome, AttemptOutcome::Success);
}

#[tokio::test]
async fn test_exhausted_retries_fail_the_job_not_the_run() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(test_config(&["linkedin"], 10, Some(resume)), &store);

    let timeout = || PlatformError::Timeout {
        what: "apply modal".to_string(),
    };
    let adapter = ScriptedAdapter::new("linkedin")
        .with_search(vec![
            Ok(candidate("linkedin", "Flaky Job", "https://li/1")),
            Ok(candidate("linkedin", "Good Job", "https://li/2")),
        ])
        .with_apply(Err(timeout()))
        .with_apply(Err(timeout()))
        .with_apply(Err(timeout()))
        .with_apply(Ok(ApplyOutcome::Submitted));

    let report = engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    assert_eq!(report.outcome(), RunOutcome::Success);
    let flaky = job_id("Flaky Job", "https://li/1");
    assert_eq!(engine.registry().get(flaky).expect("tracked").status, JobStatus::Failed);
    assert_eq!(engine.registry().attempts_for(flaky).len(), 3);
    assert_eq!(
        engine
            .registry()
            .get(job_id("Good Job", "https://li/2"))
            .expect("tracked")
            .status,
        JobStatus::Applied
    );
}

#[tokio::test]
async fn test_repeated_detection_signals_trigger_rotation() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(test_config(&["linkedin"], 10, Some(resume)), &store);

    let blocked = || PlatformError::Blocked {
        platform: "linkedin".to_string(),
    };
    let adapter = ScriptedAdapter::new("linkedin")
        .with_search(vec![Ok(candidate("linkedin", "Rust Engineer", "https://li/1"))])
        .with_apply(Err(blocked()))
        .with_apply(Err(blocked()))
        .with_apply(Ok(ApplyOutcome::Submitted));
    let rotations = adapter.rotations();

    engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    // two consecutive detection signals cross the cooldown threshold
    let rotations = rotations.lock().expect("rotation lock");
    assert_eq!(rotations.len(), 1);
    assert_eq!(rotations[0].consecutive_signals, 2);

    let id = job_id("Rust Engineer", "https://li/1");
    assert_eq!(engine.registry().get(id).expect("tracked").status, JobStatus::Applied);

    let attempts = engine.registry().attempts_for(id);
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[0].outcome, AttemptOutcome::TransientFailure);
    assert_eq!(attempts[1].outcome, AttemptOutcome::TransientFailure);
    assert_eq!(attempts[2].outcome, AttemptOutcome::Success);
}

#[tokio::test]
async fn test_auth_failure_aborts_only_that_platform() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(test_config(&["linkedin", "indeed"], 10, Some(resume)), &store);

    let linkedin = ScriptedAdapter::new("linkedin").with_auth(Err(PlatformError::AuthFailed {
        platform: "linkedin".to_string(),
        reason: "bad credentials".to_string(),
    }));
    let indeed = ScriptedAdapter::new("indeed")
        .with_search(vec![Ok(candidate("indeed", "Rust Engineer", "https://in/1"))]);

    let report = engine
        .run(vec![Box::new(linkedin), Box::new(indeed)])
        .await
        .expect("run succeeds");

    assert_eq!(report.outcome(), RunOutcome::Success);

    let li = report.summary_for(&pid("linkedin")).expect("linkedin summary");
    assert!(li.aborted);
    assert!(li.fatal_error.as_deref().is_some_and(|e| e.contains("authentication failed")));
    assert_eq!(li.tracked, 0, "no search after a failed login");

    let indeed = report.summary_for(&pid("indeed")).expect("indeed summary");
    assert!(!indeed.aborted);
    assert_eq!(indeed.applied, 1);
}

#[tokio::test]
async fn test_every_platform_aborting_is_total_failure() {
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(test_config(&["linkedin", "indeed"], 10, None), &store);

    let auth_failed = |platform: &str| PlatformError::AuthFailed {
        platform: platform.to_string(),
        reason: "bad credentials".to_string(),
    };
    let linkedin = ScriptedAdapter::new("linkedin").with_auth(Err(auth_failed("linkedin")));
    let indeed = ScriptedAdapter::new("indeed").with_auth(Err(auth_failed("indeed")));

    let report = engine
        .run(vec![Box::new(linkedin), Box::new(indeed)])
        .await
        .expect("run still returns a report");

    assert_eq!(report.outcome(), RunOutcome::TotalFailure);
}

#[tokio::test]
async fn test_not_eligible_listing_resolves_to_failed() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(test_config(&["linkedin"], 10, Some(resume)), &store);

    let adapter = ScriptedAdapter::new("linkedin")
        .with_search(vec![Ok(candidate("linkedin", "External Job", "https://li/1"))])
        .with_apply(Ok(ApplyOutcome::NotEligible {
            reason: "application hosted off-platform".to_string(),
        }));

    engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    let id = job_id("External Job", "https://li/1");
    assert_eq!(engine.registry().get(id).expect("tracked").status, JobStatus::Failed);

    let attempts = engine.registry().attempts_for(id);
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].outcome, AttemptOutcome::FatalFailure);
    assert!(attempts[0]
        .error_detail
        .as_deref()
        .is_some_and(|d| d.contains("off-platform")));

    // nothing was submitted, so nothing counts against the quota
    assert_eq!(
        store
            .applied_count(&pid("linkedin"), Utc::now().date_naive())
            .await
            .expect("count"),
        0
    );
}

#[tokio::test]
async fn test_seeded_jobs_are_not_reapplied() {
    let (_dir, resume) = resume_on_disk();
    let applied_id = job_id("Rust Engineer", "https://li/1");
    let snapshot = vec![
        JobRecord {
            id: applied_id,
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            link: "https://li/1".to_string(),
            platform: pid("linkedin"),
            status: JobStatus::Applied,
            applied_at: Some(Utc::now()),
        },
        JobRecord {
            id: job_id("Interrupted Job", "https://li/2"),
            title: "Interrupted Job".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            link: "https://li/2".to_string(),
            platform: pid("linkedin"),
            status: JobStatus::Applying,
            applied_at: None,
        },
    ];
    let store = Arc::new(MemoryStore::with_snapshot(snapshot));
    let engine = build_engine(test_config(&["linkedin"], 10, Some(resume)), &store);

    // the same listing shows up again in today's search
    let adapter = ScriptedAdapter::new("linkedin")
        .with_search(vec![Ok(candidate("linkedin", "Rust Engineer", "https://li/1"))]);
    let apply_calls = adapter.apply_calls();

    engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    assert_eq!(engine.registry().len(), 2);
    assert_eq!(apply_calls.load(Ordering::SeqCst), 0, "terminal jobs are never re-applied");
    assert_eq!(
        engine.registry().get(applied_id).expect("tracked").status,
        JobStatus::Applied
    );
    // a job persisted mid-application is restored as failed
    assert_eq!(
        engine
            .registry()
            .get(job_id("Interrupted Job", "https://li/2"))
            .expect("tracked")
            .status,
        JobStatus::Failed
    );
}

#[tokio::test]
async fn test_cancellation_drains_queued_jobs() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    let cancel = CancellationToken::new();
    let engine = build_engine(test_config(&["linkedin"], 10, Some(resume)), &store)
        .with_cancellation(cancel.clone());

    let mut adapter = ScriptedAdapter::new("linkedin").with_search(vec![
        Ok(candidate("linkedin", "Job One", "https://li/1")),
        Ok(candidate("linkedin", "Job Two", "https://li/2")),
        Ok(candidate("linkedin", "Job Three", "https://li/3")),
    ]);
    adapter.cancel_after_first_apply = Some(cancel);

    let report = engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    let summary = report.summary_for(&pid("linkedin")).expect("summary");
    assert_eq!(summary.applied, 1, "the in-flight application finishes");
    assert_eq!(summary.skipped, 2, "queued jobs are drained, not applied");
    assert_eq!(report.outcome(), RunOutcome::Success);
}

#[tokio::test]
async fn test_session_loss_mid_apply_aborts_platform() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(test_config(&["linkedin"], 10, Some(resume)), &store);

    let adapter = ScriptedAdapter::new("linkedin")
        .with_search(vec![
            Ok(candidate("linkedin", "Job One", "https://li/1")),
            Ok(candidate("linkedin", "Job Two", "https://li/2")),
            Ok(candidate("linkedin", "Job Three", "https://li/3")),
        ])
        .with_apply(Ok(ApplyOutcome::Submitted))
        .with_apply(Err(PlatformError::AuthFailed {
            platform: "linkedin".to_string(),
            reason: "session expired".to_string(),
        }));

    let report = engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    let summary = report.summary_for(&pid("linkedin")).expect("summary");
    assert!(summary.aborted);
    assert_eq!(summary.applied, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1, "jobs after the session loss are skipped");
}

#[tokio::test]
async fn test_listing_only_platform_skips_apply_phase() {
    let (_dir, resume) = resume_on_disk();
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(test_config(&["indeed"], 10, Some(resume)), &store);

    let adapter = ScriptedAdapter::new("indeed")
        .listing_only()
        .with_search(vec![
            Ok(candidate("indeed", "Job One", "https://in/1")),
            Ok(candidate("indeed", "Job Two", "https://in/2")),
            Ok(candidate("indeed", "Job Three", "https://in/3")),
        ]);
    let apply_calls = adapter.apply_calls();

    let report = engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    let summary = report.summary_for(&pid("indeed")).expect("summary");
    assert_eq!(summary.skipped, 3, "discovered jobs drain straight to skipped");
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.applied, 0);
    assert!(!summary.aborted);
    assert_eq!(apply_calls.load(Ordering::SeqCst), 0);
    for id in [
        job_id("Job One", "https://in/1"),
        job_id("Job Two", "https://in/2"),
        job_id("Job Three", "https://in/3"),
    ] {
        assert!(engine.registry().attempts_for(id).is_empty());
    }
}

#[tokio::test]
async fn test_missing_resume_skips_apply_phase() {
    let store = Arc::new(MemoryStore::new());
    // apply_active but no resume on disk
    let engine = build_engine(test_config(&["linkedin"], 10, None), &store);

    let adapter = ScriptedAdapter::new("linkedin")
        .with_search(vec![Ok(candidate("linkedin", "Rust Engineer", "https://li/1"))]);
    let apply_calls = adapter.apply_calls();

    let report = engine.run(vec![Box::new(adapter)]).await.expect("run succeeds");

    let summary = report.summary_for(&pid("linkedin")).expect("summary");
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.applied, 0);
    assert_eq!(apply_calls.load(Ordering::SeqCst), 0);
}
