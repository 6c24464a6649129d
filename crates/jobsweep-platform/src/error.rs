//! Error types for platform adapter operations.

use jobsweep_core::{Classify, FailureClass};
use thiserror::Error;

/// Errors that can occur during platform interaction.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Authentication against the platform failed
    #[error("authentication failed for {platform}: {reason}")]
    AuthFailed {
        /// Platform the login was attempted against
        platform: String,
        /// Why the login failed
        reason: String,
    },

    /// An expected page element was not found in time
    #[error("element not found: {what}")]
    NotFound {
        /// Description of the missing element
        what: String,
    },

    /// The platform served a detection challenge (CAPTCHA, block page)
    #[error("blocked by {platform}: automation detected")]
    Blocked {
        /// Platform that served the challenge
        platform: String,
    },

    /// The platform rate-limited the request
    #[error("rate limited by {platform}")]
    RateLimited {
        /// Platform that refused the request
        platform: String,
    },

    /// An operation did not complete within its deadline
    #[error("timed out: {what}")]
    Timeout {
        /// Description of the operation that timed out
        what: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Browser automation failed
    #[error("browser error: {0}")]
    Browser(#[from] jobsweep_browser::BrowserError),

    /// A scraped record was missing required fields
    #[error("invalid listing: {reason}")]
    InvalidListing {
        /// What was wrong with the record
        reason: String,
    },

    /// The platform definition is unusable for this adapter
    #[error("invalid definition for {platform}: {reason}")]
    Definition {
        /// Platform whose definition was rejected
        platform: String,
        /// Why the definition was rejected
        reason: String,
    },

    /// The operation is not supported by this platform
    #[error("unsupported operation: {what}")]
    Unsupported {
        /// Description of the unsupported operation
        what: String,
    },
}

impl Classify for PlatformError {
    fn class(&self) -> FailureClass {
        match self {
            Self::AuthFailed { .. }
            | Self::InvalidListing { .. }
            | Self::Definition { .. }
            | Self::Unsupported { .. } => FailureClass::Fatal,
            Self::Blocked { .. } => FailureClass::Detection,
            Self::NotFound { .. }
            | Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::Http(_) => FailureClass::Transient,
            Self::Browser(_) => FailureClass::Transient,
        }
    }
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_classifies_as_detection() {
        let err = PlatformError::Blocked {
            platform: "linkedin".to_string(),
        };
        assert_eq!(err.class(), FailureClass::Detection);
    }

    #[test]
    fn test_auth_failure_is_fatal() {
        let err = PlatformError::AuthFailed {
            platform: "linkedin".to_string(),
            reason: "bad credentials".to_string(),
        };
        assert_eq!(err.class(), FailureClass::Fatal);
    }

    #[test]
    fn test_timeout_and_rate_limit_are_transient() {
        let timeout = PlatformError::Timeout {
            what: "results list".to_string(),
        };
        let limited = PlatformError::RateLimited {
            platform: "indeed".to_string(),
        };
        assert_eq!(timeout.class(), FailureClass::Transient);
        assert_eq!(limited.class(), FailureClass::Transient);
    }

    #[test]
    fn test_browser_errors_are_transient() {
        let err = PlatformError::Browser(jobsweep_browser::BrowserError::Timeout(
            "selector '.jobs' not found within 10s".to_string(),
        ));
        assert_eq!(err.class(), FailureClass::Transient);
    }
}
