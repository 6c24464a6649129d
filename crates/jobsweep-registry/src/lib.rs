//! Content-addressed job store for the Jobsweep pipeline.
//!
//! The registry deduplicates discovered jobs by deterministic fingerprint,
//! enforces the job lifecycle state machine, and keeps the per-job
//! application attempt log. Persistence is an external collaborator; the
//! registry only exports and restores snapshots.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod record;
pub mod registry;

pub use error::{RegistryError, Result};
pub use record::JobRecord;
pub use registry::JobRegistry;
