//! Export record for persisted registry snapshots.

use chrono::{DateTime, Utc};
use jobsweep_core::{Job, JobId, JobStatus, PlatformId};
use serde::{Deserialize, Serialize};

/// One exported row per job.
///
/// Field order is stable for downstream tooling; duplicate ids across runs
/// collapse to a single logical record on re-import (the seed path runs
/// through `upsert`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Deterministic job fingerprint
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
    /// Lifecycle state at export time
    pub status: JobStatus,
    /// When the application was confirmed, if it was
    pub applied_at: Option<DateTime<Utc>>,
}

impl From<&Job> for JobRecord {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            link: job.link.clone(),
            platform: job.platform.clone(),
            status: job.status,
            applied_at: job.applied_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serialization_field_order() {
        let record = JobRecord {
            id: JobId::fingerprint("Rust Engineer", "Acme", "https://x/1"),
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            link: "https://x/1".to_string(),
            platform: PlatformId::new("linkedin").expect("valid id"),
            status: JobStatus::Applied,
            applied_at: None,
        };

        let json = serde_json::to_string(&record).expect("serialize record");
        let id_pos = json.find("\"id\"").expect("id field");
        let title_pos = json.find("\"title\"").expect("title field");
        let status_pos = json.find("\"status\"").expect("status field");
        assert!(id_pos < title_pos && title_pos < status_pos);

        let back: JobRecord = serde_json::from_str(&json).expect("deserialize record");
        assert_eq!(back, record);
    }
}
