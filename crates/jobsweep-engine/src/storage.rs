//! Persistence seam for registry snapshots and daily quota counters.
//!
//! The engine never touches disk directly; it talks to a [`RunStore`].
//! The CLI supplies a file-backed store, tests use [`MemoryStore`].
//! Quota counters are keyed by platform and calendar day so the daily
//! application ceiling survives restarts. Nothing credential-shaped is
//! ever written here.

use async_trait::async_trait;
use chrono::NaiveDate;
use jobsweep_core::PlatformId;
use jobsweep_registry::JobRecord;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors from a run store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying I/O failure
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted record could not be decoded
    #[error("corrupt store data: {0}")]
    Corrupt(String),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Where run state lives between runs.
///
/// `load_snapshot` feeds the registry seed at startup; `save_snapshot`
/// exports it at shutdown. The applied counters back the per-day quota.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Job records persisted by previous runs, in their persisted order.
    async fn load_snapshot(&self) -> StoreResult<Vec<JobRecord>>;

    /// Replace the persisted snapshot with the given records.
    async fn save_snapshot(&self, records: &[JobRecord]) -> StoreResult<()>;

    /// Confirmed applications for `platform` on calendar day `day`.
    async fn applied_count(&self, platform: &PlatformId, day: NaiveDate) -> StoreResult<u32>;

    /// Record one confirmed application for `platform` on `day`.
    async fn record_application(&self, platform: &PlatformId, day: NaiveDate) -> StoreResult<()>;
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Vec<JobRecord>>,
    counters: Mutex<HashMap<(PlatformId, NaiveDate), u32>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a snapshot.
    #[must_use]
    pub fn with_snapshot(records: Vec<JobRecord>) -> Self {
        Self {
            snapshot: Mutex::new(records),
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Pre-set an applied counter, for quota tests.
    pub fn set_applied_count(&self, platform: &PlatformId, day: NaiveDate, count: u32) {
        self.counters
            .lock()
            .expect("counter lock poisoned")
            .insert((platform.clone(), day), count);
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn load_snapshot(&self) -> StoreResult<Vec<JobRecord>> {
        Ok(self.snapshot.lock().expect("snapshot lock poisoned").clone())
    }

    async fn save_snapshot(&self, records: &[JobRecord]) -> StoreResult<()> {
        *self.snapshot.lock().expect("snapshot lock poisoned") = records.to_vec();
        Ok(())
    }

    async fn applied_count(&self, platform: &PlatformId, day: NaiveDate) -> StoreResult<u32> {
        Ok(self
            .counters
            .lock()
            .expect("counter lock poisoned")
            .get(&(platform.clone(), day))
            .copied()
            .unwrap_or(0))
    }

    async fn record_application(&self, platform: &PlatformId, day: NaiveDate) -> StoreResult<()> {
        *self
            .counters
            .lock()
            .expect("counter lock poisoned")
            .entry((platform.clone(), day))
            .or_insert(0) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jobsweep_core::{JobId, JobStatus};

    fn record(title: &str) -> JobRecord {
        JobRecord {
            id: JobId::fingerprint(title, "Acme", "https://x/1"),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            link: "https://x/1".to_string(),
            platform: PlatformId::new("linkedin").expect("valid id"),
            status: JobStatus::Discovered,
            applied_at: None,
        }
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load_snapshot().await.expect("load").is_empty());

        let records = vec![record("Rust Engineer"), record("Backend Developer")];
        store.save_snapshot(&records).await.expect("save");
        assert_eq!(store.load_snapshot().await.expect("load"), records);
    }

    #[tokio::test]
    async fn test_applied_counters_keyed_by_platform_and_day() {
        let store = MemoryStore::new();
        let linkedin = PlatformId::new("linkedin").expect("valid id");
        let indeed = PlatformId::new("indeed").expect("valid id");
        let today = Utc::now().date_naive();
        let yesterday = today.pred_opt().expect("previous day");

        store.record_application(&linkedin, today).await.expect("record");
        store.record_application(&linkedin, today).await.expect("record");
        store.record_application(&indeed, today).await.expect("record");

        assert_eq!(store.applied_count(&linkedin, today).await.expect("count"), 2);
        assert_eq!(store.applied_count(&indeed, today).await.expect("count"), 1);
        assert_eq!(
            store.applied_count(&linkedin, yesterday).await.expect("count"),
            0
        );
    }
}
