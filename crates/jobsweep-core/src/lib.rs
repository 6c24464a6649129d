//! Jobsweep Core - Foundation crate for the Jobsweep application.
//!
//! This crate provides shared types, error handling, and configuration
//! management that all other Jobsweep crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types and retry classification using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and records (`PlatformId`, `JobId`,
//!   `JobStatus`, `Job`, `ApplicationAttempt`)
//!
//! # Example
//!
//! ```rust
//! use jobsweep_core::{AppConfig, JobId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert!(!config.application.apply_active);
//!
//! // Identical normalized identities collide to the same fingerprint.
//! let a = JobId::fingerprint("Rust Engineer", "Acme", "https://jobs/1");
//! let b = JobId::fingerprint("  rust engineer", "ACME", "https://jobs/1 ");
//! assert_eq!(a, b);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, ApplicationConfig, BrowserConfig, DelayConfig, PlatformConfig, SearchConfig,
};
pub use error::{Classify, ConfigError, ConfigResult, FailureClass, Result, SweepError};
pub use types::{
    ApplicationAttempt, AttemptOutcome, Job, JobCandidate, JobId, JobStatus, PlatformId,
};
