//! Platform definition loading from TOML files.
//!
//! This module handles loading platform definitions from the
//! `platform-definitions/` directory.

use crate::definition::PlatformDefinition;
use crate::error::{PlatformError, Result};
use jobsweep_core::PlatformId;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Loader for platform definitions from TOML files.
pub struct DefinitionLoader {
    /// Base directory containing platform definitions
    definitions_dir: PathBuf,
}

impl DefinitionLoader {
    /// Create a new loader with the given definitions directory.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist.
    pub fn new(definitions_dir: impl Into<PathBuf>) -> Result<Self> {
        let definitions_dir = definitions_dir.into();

        if !definitions_dir.is_dir() {
            return Err(PlatformError::Definition {
                platform: "-".to_string(),
                reason: format!(
                    "definitions directory not found: {}",
                    definitions_dir.display()
                ),
            });
        }

        Ok(Self { definitions_dir })
    }

    /// Create a loader using the default definitions directory.
    ///
    /// Looks for `platform-definitions/` relative to the workspace root.
    pub fn with_default_dir() -> Result<Self> {
        let mut current_dir = std::env::current_dir().map_err(|e| PlatformError::Definition {
            platform: "-".to_string(),
            reason: format!("cannot resolve current directory: {e}"),
        })?;

        loop {
            let cargo_toml = current_dir.join("Cargo.toml");
            if cargo_toml.exists() {
                if let Ok(contents) = std::fs::read_to_string(&cargo_toml) {
                    if contents.contains("[workspace]") {
                        return Self::new(current_dir.join("platform-definitions"));
                    }
                }
            }

            if let Some(parent) = current_dir.parent() {
                current_dir = parent.to_path_buf();
            } else {
                break;
            }
        }

        Self::new(PathBuf::from("platform-definitions"))
    }

    /// Load a single platform definition by ID.
    ///
    /// # Errors
    /// Returns error if the definition file doesn't exist, can't be read,
    /// or is invalid.
    pub fn load(&self, platform_id: &PlatformId) -> Result<PlatformDefinition> {
        let path = self
            .definitions_dir
            .join(format!("{}.toml", platform_id.as_str()));

        if !path.exists() {
            return Err(PlatformError::Definition {
                platform: platform_id.to_string(),
                reason: "no definition file found".to_string(),
            });
        }

        let definition = Self::load_from_path(&path)?;
        definition.validate()?;

        debug!(
            platform = %platform_id,
            name = %definition.name(),
            "loaded platform definition"
        );

        Ok(definition)
    }

    /// Load all platform definitions from the definitions directory.
    ///
    /// Invalid definitions are logged as warnings and skipped.
    pub fn load_all(&self) -> Result<Vec<PlatformDefinition>> {
        let mut definitions = Vec::new();

        let entries =
            std::fs::read_dir(&self.definitions_dir).map_err(|e| PlatformError::Definition {
                platform: "-".to_string(),
                reason: format!("cannot read definitions directory: {e}"),
            })?;

        for entry in entries {
            let entry = entry.map_err(|e| PlatformError::Definition {
                platform: "-".to_string(),
                reason: format!("cannot read directory entry: {e}"),
            })?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                continue;
            }

            match Self::load_from_path(&path) {
                Ok(definition) => {
                    if let Err(e) = definition.validate() {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "skipping invalid platform definition"
                        );
                        continue;
                    }
                    definitions.push(definition);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load platform definition"
                    );
                }
            }
        }

        info!(
            count = definitions.len(),
            dir = %self.definitions_dir.display(),
            "loaded platform definitions"
        );

        Ok(definitions)
    }

    /// Load a platform definition from a specific file path.
    fn load_from_path(path: &Path) -> Result<PlatformDefinition> {
        let contents = std::fs::read_to_string(path).map_err(|e| PlatformError::Definition {
            platform: "-".to_string(),
            reason: format!("cannot read {}: {e}", path.display()),
        })?;

        toml::from_str(&contents).map_err(|e| PlatformError::Definition {
            platform: "-".to_string(),
            reason: format!("cannot parse {}: {e}", path.display()),
        })
    }
}
