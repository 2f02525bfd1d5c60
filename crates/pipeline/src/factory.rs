//! Assembling the archive pipeline from configuration
//!
//! Configuration is read here and nowhere else in the pipeline.

use crate::archiver::BucketArchiver;
use crate::deleter::BucketDeleter;
use crate::error::ArchiveError;
use crate::export::{BucketExporter, CompressedExporter, CsvExporter};
use crate::freezer::BucketFreezer;
use crate::recovery::{FailedBucketRestorer, RecoveryLoop, RecoveryPolicy};
use crate::registry::{FailedBucketStore, FileFailedBucketStore};
use crate::transfer::ArchiveBucketTransferer;
use crate::trigger::{ArchiveTrigger, LocalArchiveTrigger};
use frostline_archive::{open_archive_fs, ArchiveFileSystem, ArchivedBucketLister, PathResolver};
use frostline_model::{ArchiveConfig, LocalPaths};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Every archive-side component, wired together
pub struct ArchiveServices {
    /// Local working directories
    pub paths: LocalPaths,
    /// Archive storage
    pub fs: Arc<dyn ArchiveFileSystem>,
    /// Archive path layout
    pub resolver: PathResolver,
    /// Per-bucket orchestrator
    pub archiver: Arc<BucketArchiver>,
    /// Failed-bucket registry
    pub registry: Arc<dyn FailedBucketStore>,
    /// Archive entry point
    pub trigger: Arc<dyn ArchiveTrigger>,
    /// Recovery pass
    pub restorer: Arc<FailedBucketRestorer>,
    /// Frozen-bucket entry point
    pub freezer: BucketFreezer,
    recovery_interval: Duration,
}

impl ArchiveServices {
    /// Lister over the same archive
    pub fn lister(&self) -> ArchivedBucketLister {
        ArchivedBucketLister::new(Arc::clone(&self.fs), self.resolver.clone())
    }

    /// Start periodic recovery at the configured interval
    pub fn spawn_recovery_loop(&self) -> io::Result<RecoveryLoop> {
        RecoveryLoop::spawn(
            Arc::clone(&self.restorer),
            Arc::clone(&self.trigger),
            self.recovery_interval,
        )
    }
}

/// Builds [`ArchiveServices`] from an [`ArchiveConfig`]
pub struct ArchiverFactory;

impl ArchiverFactory {
    /// Exporter with every converter the configuration needs
    pub fn exporter(config: &ArchiveConfig, paths: &LocalPaths) -> BucketExporter {
        BucketExporter::new()
            .with_converter(CsvExporter::from_config(&config.export, paths))
            .with_converter(CompressedExporter::from_paths(
                paths,
                config.export.compression_level,
            ))
    }

    /// Validate the configuration, open the configured archive and wire everything up
    pub fn build(config: &ArchiveConfig) -> Result<ArchiveServices, ArchiveError> {
        config.validate()?;
        let fs = open_archive_fs(config)?;
        Self::build_with_fs(config, fs)
    }

    /// Like [`ArchiverFactory::build`], over an already opened archive
    pub fn build_with_fs(
        config: &ArchiveConfig,
        fs: Arc<dyn ArchiveFileSystem>,
    ) -> Result<ArchiveServices, ArchiveError> {
        config.validate()?;
        let paths = LocalPaths::from_root(&config.local.working_dir);
        paths.create_directories()?;
        let resolver = PathResolver::from_config(config)?;

        let transferer = ArchiveBucketTransferer::new(Arc::clone(&fs), resolver.clone());
        let archiver = Arc::new(BucketArchiver::new(
            config.formats.clone(),
            Self::exporter(config, &paths),
            transferer,
            BucketDeleter::new(),
        ));

        let registry: Arc<dyn FailedBucketStore> =
            Arc::new(FileFailedBucketStore::open(paths.failed_registry())?);
        let trigger: Arc<dyn ArchiveTrigger> = Arc::new(LocalArchiveTrigger::new(
            Arc::clone(&archiver),
            Arc::clone(&registry),
        ));
        let restorer = Arc::new(FailedBucketRestorer::new(
            Arc::clone(&registry),
            RecoveryPolicy::from_config(&config.recovery),
        ));
        let freezer = BucketFreezer::new(paths.clone(), Arc::clone(&trigger), Arc::clone(&restorer));

        info!(
            target: "frostline::archive",
            backend = fs.backend_name(),
            base = %resolver.base(),
            formats = ?config.formats,
            working_dir = %paths.root().display(),
            "Archive pipeline ready"
        );

        Ok(ArchiveServices {
            paths,
            fs,
            resolver,
            archiver,
            registry,
            trigger,
            restorer,
            freezer,
            recovery_interval: Duration::from_secs(config.recovery.interval_secs),
        })
    }
}
