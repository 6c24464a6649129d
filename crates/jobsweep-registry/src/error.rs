//! Error types for registry operations.

use jobsweep_core::{JobId, JobStatus};
use thiserror::Error;

/// Errors that can occur in the job registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A candidate was missing required identity fields
    #[error("invalid candidate: {reason}")]
    InvalidCandidate {
        /// What was wrong with the candidate
        reason: String,
    },

    /// A status transition violated the lifecycle state machine.
    /// This is an invariant violation, not a runtime condition: the prior
    /// status is left unchanged.
    #[error("invalid transition for {job_id}: {from} -> {to}")]
    InvalidTransition {
        /// Job whose transition was rejected
        job_id: JobId,
        /// Status before the rejected transition
        from: JobStatus,
        /// Requested status
        to: JobStatus,
    },

    /// The job id is not tracked by this registry
    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    /// An attempt record broke the strictly-increasing numbering
    #[error("attempt {got} for {job_id} is out of order (expected {expected})")]
    AttemptOutOfOrder {
        /// Job the attempt was recorded against
        job_id: JobId,
        /// The next valid attempt number
        expected: u32,
        /// The attempt number that was supplied
        got: u32,
    },

    /// An attempt was recorded after a success was already logged
    #[error("attempt recorded for {job_id} after a successful attempt")]
    AttemptAfterSuccess {
        /// Job the attempt was recorded against
        job_id: JobId,
    },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
