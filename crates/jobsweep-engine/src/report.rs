//! End-of-run reporting.

use jobsweep_core::PlatformId;
use serde::Serialize;

/// Per-platform outcome counts for one run.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformSummary {
    /// The platform these counts describe
    pub platform: PlatformId,
    /// Jobs tracked for this platform at end of run, any status
    pub tracked: usize,
    /// Jobs in `Applied` at end of run
    pub applied: usize,
    /// Jobs in `Failed` at end of run
    pub failed: usize,
    /// Jobs in `Skipped` at end of run
    pub skipped: usize,
    /// Whether the platform aborted before finishing its work
    pub aborted: bool,
    /// The error that aborted the platform, if one did
    pub fatal_error: Option<String>,
}

/// How the run as a whole went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// At least one platform completed its phases
    Success,
    /// Every platform aborted; nothing was accomplished
    TotalFailure,
}

/// Summary of a completed run, one entry per platform, sorted by
/// platform id.
///
/// A single platform failing never fails the run; only all platforms
/// aborting does.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Per-platform summaries
    pub platforms: Vec<PlatformSummary>,
}

impl RunReport {
    /// Overall run outcome.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        if !self.platforms.is_empty() && self.platforms.iter().all(|p| p.aborted) {
            RunOutcome::TotalFailure
        } else {
            RunOutcome::Success
        }
    }

    /// The summary for one platform, if it participated.
    #[must_use]
    pub fn summary_for(&self, platform: &PlatformId) -> Option<&PlatformSummary> {
        self.platforms.iter().find(|p| &p.platform == platform)
    }

    /// Total confirmed applications across all platforms.
    #[must_use]
    pub fn total_applied(&self) -> usize {
        self.platforms.iter().map(|p| p.applied).sum()
    }
}
