//! Per-index settings of the search engine

use crate::error::{ThawError, ThawResult};
use frostline_model::{validate_index, ArchiveConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Source of per-index thaw directories
pub trait IndexSettings: Send + Sync {
    /// Thaw directory of `index`; [`ThawError::IllegalIndex`] if unknown
    fn thaw_location(&self, index: &str) -> ThawResult<PathBuf>;
}

/// Index settings from the `[indexes]` table of the configuration
#[derive(Debug, Clone, Default)]
pub struct ConfiguredIndexSettings {
    thaw_locations: BTreeMap<String, PathBuf>,
}

impl ConfiguredIndexSettings {
    /// Settings for the configured indexes
    pub fn from_config(config: &ArchiveConfig) -> Self {
        ConfiguredIndexSettings {
            thaw_locations: config
                .indexes
                .iter()
                .map(|(index, settings)| (index.clone(), settings.thaw_path.clone()))
                .collect(),
        }
    }

    /// Add or replace an index
    pub fn with_index(mut self, index: impl Into<String>, thaw_path: impl Into<PathBuf>) -> Self {
        self.thaw_locations.insert(index.into(), thaw_path.into());
        self
    }

    /// Known index names
    pub fn indexes(&self) -> impl Iterator<Item = &str> {
        self.thaw_locations.keys().map(String::as_str)
    }
}

impl IndexSettings for ConfiguredIndexSettings {
    fn thaw_location(&self, index: &str) -> ThawResult<PathBuf> {
        if validate_index(index).is_err() {
            return Err(ThawError::IllegalIndex(index.to_string()));
        }
        self.thaw_locations
            .get(index)
            .cloned()
            .ok_or_else(|| ThawError::IllegalIndex(index.to_string()))
    }
}
