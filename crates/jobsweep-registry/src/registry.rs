//! The job registry: content-addressed store of discovered jobs.
//!
//! The registry is the only mutable state shared between platform tasks.
//! `upsert` is atomic per call (one map-wide write lock) and idempotent:
//! two candidates with identical normalized identity fields collapse to
//! one entry, first reporting platform wins.

use crate::error::{RegistryError, Result};
use crate::record::JobRecord;
use chrono::Utc;
use jobsweep_core::{
    ApplicationAttempt, AttemptOutcome, Job, JobCandidate, JobId, JobStatus, PlatformId,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, Job>,
    /// Discovery order, for deterministic iteration and stable snapshots.
    order: Vec<JobId>,
    attempts: HashMap<JobId, Vec<ApplicationAttempt>>,
}

/// Thread-safe aggregate owning all jobs and attempts for a run.
///
/// Cloning the registry is cheap and shares the underlying store.
#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl JobRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate if its fingerprint is unknown, otherwise return
    /// the existing record unchanged.
    ///
    /// Idempotent: upserting the same normalized identity twice has the
    /// same observable effect as once. Search results never overwrite an
    /// already-tracked job's status.
    ///
    /// # Errors
    /// Returns `InvalidCandidate` if the candidate is missing a title or
    /// link; such candidates are dropped before a fingerprint is computed.
    pub fn upsert(&self, candidate: &JobCandidate) -> Result<(Job, bool)> {
        if candidate.title.trim().is_empty() {
            return Err(RegistryError::InvalidCandidate {
                reason: "missing title".to_string(),
            });
        }
        if candidate.link.trim().is_empty() {
            return Err(RegistryError::InvalidCandidate {
                reason: "missing link".to_string(),
            });
        }

        let id = JobId::fingerprint(&candidate.title, &candidate.company, &candidate.link);

        let mut inner = self.inner.write().expect("acquire registry write lock");
        if let Some(existing) = inner.jobs.get(&id) {
            debug!(job = %id, platform = %candidate.platform, "duplicate candidate ignored");
            return Ok((existing.clone(), false));
        }

        let job = Job {
            id,
            title: candidate.title.clone(),
            company: candidate.company.clone(),
            location: candidate.location.clone(),
            link: candidate.link.clone(),
            platform: candidate.platform.clone(),
            status: JobStatus::Discovered,
            discovered_at: Utc::now(),
            applied_at: None,
        };
        inner.jobs.insert(id, job.clone());
        inner.order.push(id);
        Ok((job, true))
    }

    /// Move a job to a new lifecycle state, enforcing the state machine.
    ///
    /// On rejection the prior status is left unchanged. Entering `Applied`
    /// stamps `applied_at`.
    pub fn transition(&self, job_id: JobId, new_status: JobStatus) -> Result<Job> {
        let mut inner = self.inner.write().expect("acquire registry write lock");
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or(RegistryError::UnknownJob(job_id))?;

        if !job.status.can_transition_to(new_status) {
            return Err(RegistryError::InvalidTransition {
                job_id,
                from: job.status,
                to: new_status,
            });
        }

        job.status = new_status;
        if new_status == JobStatus::Applied {
            job.applied_at = Some(Utc::now());
        }
        debug!(job = %job_id, status = %new_status, "job transitioned");
        Ok(job.clone())
    }

    /// Get a job by id.
    #[must_use]
    pub fn get(&self, job_id: JobId) -> Option<Job> {
        self.inner
            .read()
            .expect("acquire registry read lock")
            .jobs
            .get(&job_id)
            .cloned()
    }

    /// Count jobs on a platform in a given state.
    #[must_use]
    pub fn count_by_status(&self, platform: &PlatformId, status: JobStatus) -> usize {
        self.inner
            .read()
            .expect("acquire registry read lock")
            .jobs
            .values()
            .filter(|j| &j.platform == platform && j.status == status)
            .count()
    }

    /// Jobs on a platform in a given state, in discovery order.
    #[must_use]
    pub fn jobs_with_status(&self, platform: &PlatformId, status: JobStatus) -> Vec<Job> {
        let inner = self.inner.read().expect("acquire registry read lock");
        inner
            .order
            .iter()
            .filter_map(|id| inner.jobs.get(id))
            .filter(|j| &j.platform == platform && j.status == status)
            .cloned()
            .collect()
    }

    /// Record one application attempt.
    ///
    /// `attempt_number` must be exactly one past the last recorded attempt
    /// for the job, and no attempt may follow a recorded success.
    pub fn record_attempt(&self, attempt: ApplicationAttempt) -> Result<()> {
        let mut inner = self.inner.write().expect("acquire registry write lock");
        if !inner.jobs.contains_key(&attempt.job_id) {
            return Err(RegistryError::UnknownJob(attempt.job_id));
        }

        let log = inner.attempts.entry(attempt.job_id).or_default();

        if log
            .last()
            .is_some_and(|prev| prev.outcome == AttemptOutcome::Success)
        {
            return Err(RegistryError::AttemptAfterSuccess {
                job_id: attempt.job_id,
            });
        }

        let expected = log.last().map_or(1, |prev| prev.attempt_number + 1);
        if attempt.attempt_number != expected {
            return Err(RegistryError::AttemptOutOfOrder {
                job_id: attempt.job_id,
                expected,
                got: attempt.attempt_number,
            });
        }

        log.push(attempt);
        Ok(())
    }

    /// All recorded attempts for a job, in order.
    #[must_use]
    pub fn attempts_for(&self, job_id: JobId) -> Vec<ApplicationAttempt> {
        self.inner
            .read()
            .expect("acquire registry read lock")
            .attempts
            .get(&job_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Export all jobs as records, in discovery order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<JobRecord> {
        let inner = self.inner.read().expect("acquire registry read lock");
        inner
            .order
            .iter()
            .filter_map(|id| inner.jobs.get(id))
            .map(JobRecord::from)
            .collect()
    }

    /// Restore jobs from a prior run's snapshot.
    ///
    /// Duplicate ids collapse to the first record seen. A job persisted as
    /// `Applying` was in flight when the process died; it is restored as
    /// `Failed` so a crashed application can never be re-applied.
    pub fn seed(&self, records: Vec<JobRecord>) {
        let mut inner = self.inner.write().expect("acquire registry write lock");
        for record in records {
            if inner.jobs.contains_key(&record.id) {
                continue;
            }

            let status = if record.status == JobStatus::Applying {
                warn!(job = %record.id, "restoring in-flight application as failed");
                JobStatus::Failed
            } else {
                record.status
            };

            let id = record.id;
            inner.jobs.insert(
                id,
                Job {
                    id,
                    title: record.title,
                    company: record.company,
                    location: record.location,
                    link: record.link,
                    platform: record.platform,
                    status,
                    discovered_at: Utc::now(),
                    applied_at: record.applied_at,
                },
            );
            inner.order.push(id);
        }
    }

    /// Number of tracked jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("acquire registry read lock")
            .jobs
            .len()
    }

    /// Whether the registry tracks no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
