//! Core error types for the Jobsweep application.
//!
//! This module defines the central error type used across all subsystems
//! and the retry classification every subsystem error maps into.

use thiserror::Error;

/// Central error type for core operations.
#[derive(Error, Debug)]
pub enum SweepError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// How a failure should be treated by the retry machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retryable: timeouts, missing elements, flaky network
    Transient,
    /// Retryable, but a detection signal: escalates anti-detection state
    /// and is weighted toward longer backoff
    Detection,
    /// Not retryable: abort immediately
    Fatal,
}

/// Classification of an error for retry and escalation purposes.
///
/// Every subsystem error that can flow through the retry scheduler
/// implements this.
pub trait Classify {
    /// The retry class of this failure.
    fn class(&self) -> FailureClass;
}

/// Result type alias using `SweepError`.
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
