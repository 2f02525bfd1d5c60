//! Bucket model for Frostline
//!
//! This crate defines the data shared by every stage of the archive pipeline:
//!
//! - [`Bucket`]: a time-bounded directory of indexed data for one index
//! - [`BucketFormat`]: the on-disk encoding of a bucket
//! - [`TimeRange`]: closed `[earliest, latest]` interval with the overlap
//!   predicate used by both thaw and flush
//! - [`ArchiveConfig`]: process-wide configuration loaded from `frostline.toml`
//! - [`LocalPaths`]: local staging directories derived from the working dir

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bucket;
pub mod config;
pub mod error;
pub mod format;
pub mod fs_util;
pub mod paths;
pub mod time;

pub use bucket::{validate_bucket_name, validate_index, Bucket, BucketKey};
pub use config::{
    ArchiveBackendConfig, ArchiveConfig, ConfigError, ExportConfig, IndexConfig, LocalConfig,
    RecoveryConfig, CONFIG_FILE_NAME,
};
pub use error::{BucketError, BucketResult};
pub use format::BucketFormat;
pub use paths::LocalPaths;
pub use time::TimeRange;
