//! Browser automation engine for JavaScript-heavy listing platforms.
//!
//! Provides headless browser control with fingerprint randomization for
//! platform interaction. Each engine owns exactly one browser session.

pub mod engine;
pub mod error;
pub mod fingerprint;

pub use chromiumoxide::element::Element;
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use fingerprint::FingerprintConfig;
