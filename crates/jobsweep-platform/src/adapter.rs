//! The platform adapter capability set.
//!
//! Every listing platform is driven through the same three capabilities:
//! authenticate, search, apply. The orchestration engine is agnostic to
//! whether an adapter runs a full browser session or a plain HTTP client.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use jobsweep_core::{Job, JobCandidate, PlatformId, SearchConfig};
use std::path::PathBuf;

/// A finite, consumed-once stream of scraped job candidates.
///
/// Re-invoking `search_jobs` triggers a fresh fetch; a stream is never
/// restartable once consumed.
pub type CandidateStream = BoxStream<'static, Result<JobCandidate>>;

/// Search parameters passed to an adapter, resolved from configuration.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Search keywords
    pub keywords: String,
    /// Location filter
    pub location: String,
    /// Experience level filter
    pub experience_level: String,
    /// Job type filter
    pub job_type: String,
    /// Posting age filter in days
    pub date_posted: u32,
    /// Maximum number of results to yield
    pub limit: usize,
}

impl SearchQuery {
    /// Build a query from the configured search section and a per-platform
    /// result bound.
    #[must_use]
    pub fn from_config(search: &SearchConfig, limit: usize) -> Self {
        Self {
            keywords: search.keywords.clone(),
            location: search.location.clone(),
            experience_level: search.experience_level.clone(),
            job_type: search.job_type.clone(),
            date_posted: search.date_posted,
            limit,
        }
    }
}

/// Application documents supplied to the apply flow.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    /// Path to the resume file
    pub resume: Option<PathBuf>,
    /// Path to the cover letter file
    pub cover_letter: Option<PathBuf>,
}

impl DocumentSet {
    /// Whether the set carries the resume required for applications.
    #[must_use]
    pub fn has_resume(&self) -> bool {
        self.resume.as_deref().is_some_and(std::path::Path::exists)
    }
}

/// Definitive outcome of an application attempt that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The platform confirmed the application was submitted
    Submitted,
    /// The listing cannot be applied to through this platform
    NotEligible {
        /// Why automated application is not possible
        reason: String,
    },
}

impl ApplyOutcome {
    /// Whether the outcome is a confirmed submission.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self, Self::Submitted)
    }
}

/// Advice from the anti-detection layer to present a fresh outbound
/// identity. Consumed by the adapter on its next `authenticate` or
/// `search_jobs` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationHint {
    /// How many consecutive detection signals prompted the rotation
    pub consecutive_signals: u32,
}

/// Per-platform capability implementing search and apply against one
/// external site.
///
/// An adapter exclusively owns its platform session (browser page or HTTP
/// client); sessions are never shared across platforms or tasks.
#[async_trait]
pub trait PlatformAdapter: Send {
    /// The platform this adapter drives.
    fn platform(&self) -> &PlatformId;

    /// Whether this platform can drive applications at all.
    ///
    /// Platforms that only list postings and route applicants to employer
    /// sites return false; the engine skips their apply phase instead of
    /// queueing jobs that can never submit.
    fn supports_apply(&self) -> bool;

    /// Establish an authenticated session.
    ///
    /// Credentials are read from the process environment
    /// (`<PLATFORM>_USERNAME` / `<PLATFORM>_PASSWORD`) and never logged.
    /// A pending rotation hint is honored here.
    async fn authenticate(&mut self) -> Result<()>;

    /// Search for jobs, yielding partially-populated candidates.
    ///
    /// Read-only: no side effects beyond navigation. The registry computes
    /// ids at ingestion, not the adapter.
    async fn search_jobs(&mut self, query: &SearchQuery) -> Result<CandidateStream>;

    /// Drive the multi-step application flow for one job.
    ///
    /// Must return a definitive outcome; an ambiguous submission state is
    /// reported as a transient error, never silently dropped.
    async fn apply_to_job(&mut self, job: &Job, documents: &DocumentSet) -> Result<ApplyOutcome>;

    /// Accept advice to rotate the outbound identity. Default no-op.
    fn hint_rotation(&mut self, _hint: RotationHint) {}
}

/// Render a search URL template, percent-encoding substituted values.
///
/// Recognized placeholders: `{keywords}`, `{location}`,
/// `{experience_level}`, `{job_type}`, `{date_posted}`, `{limit}`.
#[must_use]
pub fn render_search_url(template: &str, query: &SearchQuery) -> String {
    let encode = |s: &str| {
        url::form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>()
    };

    template
        .replace("{keywords}", &encode(&query.keywords))
        .replace("{location}", &encode(&query.location))
        .replace("{experience_level}", &encode(&query.experience_level))
        .replace("{job_type}", &encode(&query.job_type))
        .replace("{date_posted}", &query.date_posted.to_string())
        .replace("{limit}", &query.limit.to_string())
}
