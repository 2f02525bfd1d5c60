//! Frostline - archive, thaw and flush search buckets against remote storage
//!
//! Frostline takes buckets that a search indexer rolls to frozen, exports them
//! to every configured format, publishes them to archive storage and deletes
//! the local copy once every format is safely archived. Archived buckets can
//! later be thawed back into an index's thaw directory by time range, and
//! flushed out again when they are no longer needed.
//!
//! # Quick Start
//!
//! ```ignore
//! use frostline::{ArchiveConfig, ArchiverFactory};
//!
//! let config = ArchiveConfig::from_file("frostline.toml".as_ref())?;
//! let services = ArchiverFactory::build(&config)?;
//! let report = services.freezer.freeze_bucket("main", "/data/db_20_10_0".as_ref())?;
//! assert!(report.all_archived());
//! ```
//!
//! # Crates
//!
//! - [`model`]: buckets, formats, time ranges and configuration
//! - [`archive`]: archive storage backends and the archive path layout
//! - [`pipeline`]: export, transfer, the failed-bucket registry and recovery
//! - [`thaw`]: thaw and flush

pub use frostline_archive as archive;
pub use frostline_model as model;
pub use frostline_pipeline as pipeline;
pub use frostline_thaw as thaw;

pub use frostline_archive::{open_archive_fs, ArchiveFileSystem, ArchivedBucketLister, PathResolver};
pub use frostline_model::{ArchiveConfig, Bucket, BucketFormat, BucketKey, TimeRange};
pub use frostline_pipeline::{
    ArchiveReport, ArchiveServices, ArchiveTrigger, ArchiverFactory, BucketArchiver,
    FailedBucketRestorer, RecoveryLoop,
};
pub use frostline_thaw::{BucketThawer, Flusher, ThawReport, ThawServices, ThawerFactory};
