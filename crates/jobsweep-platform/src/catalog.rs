//! In-memory platform definition catalog.

use crate::definition::PlatformDefinition;
use crate::error::{PlatformError, Result};
use crate::loader::DefinitionLoader;
use jobsweep_core::PlatformId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// In-memory cache of platform definitions.
///
/// The catalog loads definitions from disk once and serves lookups for the
/// rest of the run. Cloning the catalog is cheap and shares the cache.
#[derive(Clone, Default)]
pub struct PlatformCatalog {
    definitions: Arc<RwLock<HashMap<PlatformId, PlatformDefinition>>>,
}

impl PlatformCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog and load all definitions from the given loader.
    pub fn load_from(loader: &DefinitionLoader) -> Result<Self> {
        let catalog = Self::new();
        catalog.reload(loader)?;
        Ok(catalog)
    }

    /// Reload all platform definitions, replacing the current cache.
    pub fn reload(&self, loader: &DefinitionLoader) -> Result<()> {
        let definitions = loader.load_all()?;

        let mut cache = self
            .definitions
            .write()
            .expect("acquire write lock on definitions");

        cache.clear();
        for definition in definitions {
            cache.insert(definition.id().clone(), definition);
        }

        info!(count = cache.len(), "reloaded platform definitions");
        Ok(())
    }

    /// Get a platform definition by ID.
    pub fn get(&self, platform_id: &PlatformId) -> Result<PlatformDefinition> {
        let cache = self
            .definitions
            .read()
            .expect("acquire read lock on definitions");

        cache
            .get(platform_id)
            .cloned()
            .ok_or_else(|| PlatformError::Definition {
                platform: platform_id.to_string(),
                reason: "platform not in catalog".to_string(),
            })
    }

    /// IDs of all cataloged platforms, sorted for deterministic iteration.
    #[must_use]
    pub fn ids(&self) -> Vec<PlatformId> {
        let cache = self
            .definitions
            .read()
            .expect("acquire read lock on definitions");

        let mut ids: Vec<PlatformId> = cache.keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    /// Number of cataloged platforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions
            .read()
            .expect("acquire read lock on definitions")
            .len()
    }

    /// Whether the catalog holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
