//! Assembling thaw and flush from configuration

use crate::error::ThawResult;
use crate::flusher::Flusher;
use crate::location::ThawLocationProvider;
use crate::settings::ConfiguredIndexSettings;
use crate::thawer::BucketThawer;
use frostline_archive::{ArchiveFileSystem, ArchivedBucketLister, PathResolver};
use frostline_model::{ArchiveConfig, LocalPaths};
use std::sync::Arc;

/// Thaw-side components sharing one archive
pub struct ThawServices {
    /// Restores archived buckets
    pub thawer: BucketThawer,
    /// Evicts thawed buckets
    pub flusher: Flusher,
    /// Thaw directories per index
    pub locations: ThawLocationProvider,
}

/// Builds [`ThawServices`] from an [`ArchiveConfig`]
pub struct ThawerFactory;

impl ThawerFactory {
    /// Wire thaw and flush over an opened archive
    pub fn build_with_fs(
        config: &ArchiveConfig,
        fs: Arc<dyn ArchiveFileSystem>,
    ) -> ThawResult<ThawServices> {
        config.validate()?;
        let paths = LocalPaths::from_root(&config.local.working_dir);
        let resolver = PathResolver::from_config(config)?;
        let lister = ArchivedBucketLister::new(Arc::clone(&fs), resolver);
        let locations =
            ThawLocationProvider::new(Arc::new(ConfiguredIndexSettings::from_config(config)));

        Ok(ThawServices {
            thawer: BucketThawer::new(
                fs,
                lister.clone(),
                locations.clone(),
                paths.thaw_staging_dir(),
            ),
            flusher: Flusher::new(lister, locations.clone()),
            locations,
        })
    }
}
