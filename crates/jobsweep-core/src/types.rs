//! Shared types used across the Jobsweep application.
//!
//! This module defines the common newtypes and records that provide type
//! safety and clear domain modeling: platform identifiers, deterministic
//! job fingerprints, the job lifecycle state machine, and attempt records.

use crate::error::SweepError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

/// Namespace for deterministic job fingerprints (UUID v5).
///
/// Fixed so that identical normalized job identities hash to the same id
/// across runs, processes, and machines.
const JOB_ID_NAMESPACE: Uuid = Uuid::from_u128(0x9f2c_1b7a_4d3e_48c6_a510_7e82_d94b_06f3);

/// Newtype for platform identifiers with validation.
///
/// Platform IDs must be lowercase alphanumeric with hyphens, 2-50 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformId(String);

impl PlatformId {
    /// Create a new `PlatformId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the required format.
    pub fn new(id: impl Into<String>) -> Result<Self, SweepError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate platform ID format: lowercase alphanumeric with hyphens, 2-50 chars.
    fn validate(id: &str) -> Result<(), SweepError> {
        static PLATFORM_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = PLATFORM_REGEX
            .get_or_init(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,48}[a-z0-9])?$").expect("valid regex"));

        if id.len() < 2 || id.len() > 50 {
            return Err(SweepError::Validation(format!(
                "invalid platform ID: must be 2-50 characters, got {} characters",
                id.len()
            )));
        }

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(SweepError::Validation(format!(
                "invalid platform ID: must be lowercase alphanumeric with hyphens, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic job fingerprint.
///
/// Computed as a UUID v5 over the normalized `title`, `company`, and `link`
/// fields. Two jobs with identical normalized identity fields always collide
/// to the same id, regardless of discovery order or platform. The id is
/// never recomputed after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Compute the fingerprint for a job identity.
    #[must_use]
    pub fn fingerprint(title: &str, company: &str, link: &str) -> Self {
        let key = format!(
            "{}|{}|{}",
            normalize(title),
            normalize(company),
            normalize(link)
        );
        Self(Uuid::new_v5(&JOB_ID_NAMESPACE, key.as_bytes()))
    }

    /// Parse a job id from its string form.
    pub fn parse(s: &str) -> Result<Self, SweepError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| SweepError::Validation(format!("invalid job id '{s}': {e}")))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize an identity field: trim, lower-case, collapse inner whitespace.
fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Lifecycle state of a tracked job.
///
/// Transitions are monotonic; `Applied`, `Failed`, and `Skipped` are
/// terminal. No transition ever returns a job to `Discovered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Found by a platform search, not yet selected for the apply phase
    Discovered,
    /// Selected for the apply phase
    Queued,
    /// An application is in flight
    Applying,
    /// The platform confirmed a submitted application
    Applied,
    /// Retries exhausted or a fatal failure occurred while applying
    Failed,
    /// Dropped before applying (quota, disabled platform, ineligible)
    Skipped,
}

impl JobStatus {
    /// Whether this state admits no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Applied | Self::Failed | Self::Skipped)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Discovered, Self::Queued)
                | (Self::Queued, Self::Applying)
                | (Self::Applying, Self::Applied)
                | (Self::Applying, Self::Failed)
                | (Self::Discovered, Self::Skipped)
                | (Self::Queued, Self::Skipped)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Applying => "applying",
            Self::Applied => "applied",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

/// A job listing as reported by a platform adapter.
///
/// Candidates carry no id and no status; the registry computes the
/// fingerprint at ingestion. Candidates missing a title or link are
/// rejected there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCandidate {
    /// Job title as scraped
    pub title: String,
    /// Company name as scraped
    pub company: String,
    /// Location string as scraped
    pub location: String,
    /// Canonical listing URL
    pub link: String,
    /// Platform that reported the listing
    pub platform: PlatformId,
}

/// A tracked job: immutable identity, mutable status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Deterministic fingerprint of the normalized identity fields
    pub id: JobId,
    /// Job title
    pub title: String,
    /// Company name
    pub company: String,
    /// Location string
    pub location: String,
    /// Canonical listing URL
    pub link: String,
    /// First platform that reported the listing
    pub platform: PlatformId,
    /// Current lifecycle state
    pub status: JobStatus,
    /// When the job was first ingested
    pub discovered_at: DateTime<Utc>,
    /// When the application was confirmed, if it was
    pub applied_at: Option<DateTime<Utc>>,
}

/// Outcome of one application attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The platform confirmed submission
    Success,
    /// A retryable failure (timeout, missing element, detection signal)
    TransientFailure,
    /// A non-retryable failure
    FatalFailure,
}

/// One record per apply try.
///
/// `attempt_number` is 1-based and strictly increasing per job; the
/// registry rejects anything else, and rejects attempts recorded after a
/// `Success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationAttempt {
    /// Fingerprint of the job being applied to
    pub job_id: JobId,
    /// 1-based attempt counter
    pub attempt_number: u32,
    /// When the attempt resolved
    pub timestamp: DateTime<Utc>,
    /// How the attempt resolved
    pub outcome: AttemptOutcome,
    /// Error text for failed attempts
    pub error_detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_id_valid() {
        let valid_ids = vec!["linkedin", "indeed", "glassdoor", "hacker-news", "x9"];

        for id in valid_ids {
            assert!(PlatformId::new(id).is_ok(), "Failed for: {id}");
        }
    }

    #[test]
    fn test_platform_id_invalid() {
        let too_long = "a".repeat(51);
        let invalid_ids = vec![
            "L",               // Too short
            "LinkedIn",        // Uppercase
            "my_platform",     // Underscore
            "my platform",     // Space
            "-linkedin",       // Starts with hyphen
            "linkedin-",       // Ends with hyphen
            too_long.as_str(), // Too long
        ];

        for id in invalid_ids {
            assert!(PlatformId::new(id).is_err(), "Should fail for: {id}");
        }
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = JobId::fingerprint("Python Developer", "Acme", "https://x/1");
        let b = JobId::fingerprint("Python Developer", "Acme", "https://x/1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_normalizes_case_and_whitespace() {
        let a = JobId::fingerprint("Python Developer", "Acme", "https://x/1");
        let b = JobId::fingerprint("  python   developer ", " ACME ", " HTTPS://X/1 ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_distinguishes_identities() {
        let a = JobId::fingerprint("Python Developer", "Acme", "https://x/1");
        let b = JobId::fingerprint("Python Developer", "Acme", "https://x/2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_job_id_parse_roundtrip() {
        let id = JobId::fingerprint("Rust Engineer", "Initech", "https://x/3");
        let parsed = JobId::parse(&id.to_string()).expect("parse job id");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_status_transition_graph() {
        use JobStatus::*;

        let legal = [
            (Discovered, Queued),
            (Queued, Applying),
            (Applying, Applied),
            (Applying, Failed),
            (Discovered, Skipped),
            (Queued, Skipped),
        ];
        for (from, to) in legal {
            assert!(from.can_transition_to(to), "expected {from} -> {to}");
        }

        let illegal = [
            (Queued, Discovered),
            (Applying, Discovered),
            (Applying, Skipped),
            (Applied, Failed),
            (Failed, Queued),
            (Skipped, Queued),
            (Discovered, Applying),
            (Discovered, Applied),
        ];
        for (from, to) in illegal {
            assert!(!from.can_transition_to(to), "rejected {from} -> {to}");
        }
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        use JobStatus::*;

        for terminal in [Applied, Failed, Skipped] {
            assert!(terminal.is_terminal());
            for next in [Discovered, Queued, Applying, Applied, Failed, Skipped] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&JobStatus::Applied).expect("serialize status");
        assert_eq!(json, "\"applied\"");

        let back: JobStatus = serde_json::from_str(&json).expect("deserialize status");
        assert_eq!(back, JobStatus::Applied);
    }
}
