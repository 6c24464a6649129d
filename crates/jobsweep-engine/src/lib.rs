//! Jobsweep orchestration engine.
//!
//! Coordinates a sweep across platform adapters:
//!
//! - [`retry`] - bounded, classified retry with exponential backoff
//! - [`governor`] - per-platform pacing and anti-detection escalation
//! - [`storage`] - the [`RunStore`] persistence seam and an in-memory store
//! - [`orchestrator`] - the per-platform authenticate/search/apply driver
//! - [`report`] - end-of-run summaries

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod governor;
pub mod orchestrator;
pub mod report;
pub mod retry;
pub mod storage;

pub use governor::{AntiDetectionGovernor, GovernorAdvice, GovernorConfig, RateLimitState};
pub use orchestrator::{EngineError, OrchestrationEngine};
pub use report::{PlatformSummary, RunOutcome, RunReport};
pub use retry::{RetryError, RetryPolicy};
pub use storage::{MemoryStore, RunStore, StoreError, StoreResult};
