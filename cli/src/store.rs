//! File-backed run store.
//!
//! Two files under the data directory: `jobs.jsonl` holds the registry
//! snapshot as one JSON record per line, `applied_counts.json` holds the
//! dated application counters keyed `<platform>:<YYYY-MM-DD>`. Nothing
//! credential-shaped is ever written here.

use async_trait::async_trait;
use chrono::NaiveDate;
use directories::ProjectDirs;
use jobsweep_core::PlatformId;
use jobsweep_engine::{RunStore, StoreError, StoreResult};
use jobsweep_registry::JobRecord;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// JSON-lines implementation of the engine's [`RunStore`] seam.
pub struct JsonlStore {
    jobs_path: PathBuf,
    counters_path: PathBuf,
}

impl JsonlStore {
    /// Open a store rooted at `data_dir`, creating the directory if
    /// needed.
    pub fn new(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            jobs_path: data_dir.join("jobs.jsonl"),
            counters_path: data_dir.join("applied_counts.json"),
        })
    }

    /// Open the store in the XDG data directory
    /// (`~/.local/share/jobsweep` or platform equivalent).
    pub fn open_default() -> StoreResult<Self> {
        let dirs = ProjectDirs::from("dev", "jobsweep", "jobsweep").ok_or_else(|| {
            StoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "could not determine data directory",
            ))
        })?;
        Self::new(dirs.data_dir())
    }

    fn counter_key(platform: &PlatformId, day: NaiveDate) -> String {
        format!("{platform}:{day}")
    }

    fn read_counters(&self) -> StoreResult<HashMap<String, u32>> {
        if !self.counters_path.exists() {
            return Ok(HashMap::new());
        }
        let contents = fs::read_to_string(&self.counters_path)?;
        serde_json::from_str(&contents)
            .map_err(|e| StoreError::Corrupt(format!("applied counters: {e}")))
    }

    fn write_counters(&self, counters: &HashMap<String, u32>) -> StoreResult<()> {
        let contents = serde_json::to_string_pretty(counters)
            .map_err(|e| StoreError::Corrupt(format!("applied counters: {e}")))?;
        fs::write(&self.counters_path, contents)?;
        Ok(())
    }
}

#[async_trait]
impl RunStore for JsonlStore {
    async fn load_snapshot(&self) -> StoreResult<Vec<JobRecord>> {
        if !self.jobs_path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.jobs_path)?;
        let mut records = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JobRecord>(line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    // one bad line never loses the rest of the snapshot
                    warn!(line = number + 1, error = %err, "skipping unreadable snapshot line");
                }
            }
        }
        debug!(records = records.len(), path = %self.jobs_path.display(), "loaded snapshot");
        Ok(records)
    }

    async fn save_snapshot(&self, records: &[JobRecord]) -> StoreResult<()> {
        let mut contents = String::new();
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| StoreError::Corrupt(format!("job record: {e}")))?;
            contents.push_str(&line);
            contents.push('\n');
        }

        // write-then-rename so a crash never truncates the snapshot
        let tmp = self.jobs_path.with_extension("jsonl.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.jobs_path)?;
        debug!(records = records.len(), path = %self.jobs_path.display(), "saved snapshot");
        Ok(())
    }

    async fn applied_count(&self, platform: &PlatformId, day: NaiveDate) -> StoreResult<u32> {
        Ok(self
            .read_counters()?
            .get(&Self::counter_key(platform, day))
            .copied()
            .unwrap_or(0))
    }

    async fn record_application(&self, platform: &PlatformId, day: NaiveDate) -> StoreResult<()> {
        let mut counters = self.read_counters()?;
        *counters.entry(Self::counter_key(platform, day)).or_insert(0) += 1;
        self.write_counters(&counters)
    }
}
