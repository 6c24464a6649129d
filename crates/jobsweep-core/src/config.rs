//! Configuration management for Jobsweep.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Credentials are never part of this
//! file; they come only from the process environment.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/jobsweep/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Job search parameters
    pub search: SearchConfig,
    /// Apply-phase behavior
    pub application: ApplicationConfig,
    /// Per-platform toggles, keyed by platform id
    pub platforms: HashMap<String, PlatformConfig>,
    /// Inter-action delay bounds and timeouts
    pub delays: DelayConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
}

/// Job search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search keywords (e.g. "rust developer")
    pub keywords: String,
    /// Location filter (e.g. "Remote")
    pub location: String,
    /// Experience level filter (platform-interpreted)
    pub experience_level: String,
    /// Job type filter (e.g. "fulltime")
    pub job_type: String,
    /// Posting age filter in days
    pub date_posted: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keywords: String::new(),
            location: "Remote".to_string(),
            experience_level: "mid".to_string(),
            job_type: "fulltime".to_string(),
            date_posted: 7,
        }
    }
}

/// Apply-phase behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Whether the apply phase runs at all (search-only when false)
    pub apply_active: bool,
    /// Per-platform ceiling on applications per calendar day
    pub max_applications_per_day: u32,
    /// Path to the resume document (required for the apply phase)
    pub resume_path: Option<PathBuf>,
    /// Path to the cover letter document
    pub cover_letter_path: Option<PathBuf>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            apply_active: false,
            max_applications_per_day: 10,
            resume_path: None,
            cover_letter_path: None,
        }
    }
}

/// Per-platform toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Whether this platform participates in the run
    pub enabled: bool,
    /// Maximum number of search results ingested per run
    pub search_limit: usize,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            search_limit: 25,
        }
    }
}

/// Inter-action delay bounds and timeouts, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Minimum randomized delay before a platform action
    pub min_delay: f64,
    /// Maximum randomized delay before a platform action
    pub max_delay: f64,
    /// How long to wait for a page or element before timing out
    pub page_load_timeout: f64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            min_delay: 2.0,
            max_delay: 5.0,
            page_load_timeout: 10.0,
        }
    }
}

impl DelayConfig {
    /// Minimum delay as a `Duration`.
    #[must_use]
    pub fn min_delay(&self) -> Duration {
        Duration::from_secs_f64(self.min_delay)
    }

    /// Maximum delay as a `Duration`.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_delay)
    }

    /// Page load timeout as a `Duration`.
    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.page_load_timeout)
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run the browser headless
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self { headless: true }
    }
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults
    /// if the file doesn't exist.
    pub fn load_from(path: &std::path::Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `JOBSWEEP_APPLY_ACTIVE`: Override the apply-phase toggle (true/false)
    /// - `JOBSWEEP_MAX_APPLICATIONS_PER_DAY`: Override the daily quota
    /// - `JOBSWEEP_HEADLESS`: Override browser headless mode (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("JOBSWEEP_APPLY_ACTIVE") {
            if let Ok(active) = val.parse() {
                config.application.apply_active = active;
                tracing::debug!("Override application.apply_active from env: {}", active);
            }
        }

        if let Ok(val) = std::env::var("JOBSWEEP_MAX_APPLICATIONS_PER_DAY") {
            if let Ok(max) = val.parse() {
                config.application.max_applications_per_day = max;
                tracing::debug!("Override max_applications_per_day from env: {}", max);
            }
        }

        if let Ok(val) = std::env::var("JOBSWEEP_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/jobsweep/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("dev", "jobsweep", "jobsweep").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Check value-level constraints the type system can't express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.application.max_applications_per_day == 0 {
            return Err(ConfigError::InvalidValue {
                field: "application.max_applications_per_day".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.delays.min_delay < 0.0 || self.delays.max_delay < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "delays".to_string(),
                reason: "delays must be non-negative".to_string(),
            });
        }

        if self.delays.min_delay > self.delays.max_delay {
            return Err(ConfigError::InvalidValue {
                field: "delays.min_delay".to_string(),
                reason: format!(
                    "min_delay ({}) exceeds max_delay ({})",
                    self.delays.min_delay, self.delays.max_delay
                ),
            });
        }

        if self.delays.page_load_timeout <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "delays.page_load_timeout".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        for (name, platform) in &self.platforms {
            if platform.enabled && platform.search_limit == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("platforms.{name}.search_limit"),
                    reason: "enabled platforms need a search_limit of at least 1".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Names of platforms enabled in this configuration, sorted for
    /// deterministic iteration.
    #[must_use]
    pub fn enabled_platforms(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .platforms
            .iter()
            .filter(|(_, p)| p.enabled)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.application.apply_active);
        assert_eq!(config.application.max_applications_per_day, 10);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [search]
            keywords = "rust developer"
            location = "Remote"
            experience_level = "senior"
            job_type = "fulltime"
            date_posted = 3

            [application]
            apply_active = true
            max_applications_per_day = 5
            resume_path = "/home/me/resume.pdf"

            [platforms.linkedin]
            enabled = true
            search_limit = 20

            [platforms.indeed]
            enabled = false

            [delays]
            min_delay = 1.5
            max_delay = 4.0
            page_load_timeout = 15.0
        "#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse config");
        config.validate().expect("valid config");

        assert_eq!(config.search.keywords, "rust developer");
        assert!(config.application.apply_active);
        assert_eq!(config.application.max_applications_per_day, 5);
        assert_eq!(config.enabled_platforms(), vec!["linkedin"]);
        assert_eq!(config.delays.min_delay(), Duration::from_secs_f64(1.5));
    }

    #[test]
    fn test_validate_rejects_zero_quota() {
        let mut config = AppConfig::default();
        config.application.max_applications_per_day = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let mut config = AppConfig::default();
        config.delays.min_delay = 10.0;
        config.delays.max_delay = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_search_limit_on_enabled_platform() {
        let mut config = AppConfig::default();
        config.platforms.insert(
            "linkedin".to_string(),
            PlatformConfig {
                enabled: true,
                search_limit: 0,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load_from(&dir.path().join("missing.toml")).expect("load");
        assert_eq!(
            config.application.max_applications_per_day,
            AppConfig::default().application.max_applications_per_day
        );
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "not [valid toml").expect("write");
        assert!(AppConfig::load_from(&path).is_err());
    }
}
