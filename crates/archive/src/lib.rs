//! Archive storage for Frostline
//!
//! Everything that touches the remote archive goes through this crate:
//!
//! - [`ArchiveFileSystem`]: put/get/list/exists over a backend, where `put`
//!   publishes atomically (a partially written bucket is never visible)
//! - [`LocalArchiveFileSystem`]: stage under `.staging/` then `rename(2)`
//! - [`ObjectStoreArchiveFileSystem`]: S3-compatible or in-memory stores,
//!   pending/committed markers around server-side renames
//! - [`PathResolver`]: bucket identity <-> canonical archive path
//! - [`BucketSizeTracker`]: size sidecar stored next to each bucket
//! - [`ArchivedBucketLister`]: enumerate archived buckets per index/format

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod factory;
pub mod fs;
pub mod lister;
pub mod path;
pub mod resolver;
pub mod size;

pub use error::{ArchiveFsError, ArchiveFsResult};
pub use factory::open_archive_fs;
pub use fs::{ArchiveFileSystem, LocalArchiveFileSystem, ObjectStoreArchiveFileSystem};
pub use lister::{ArchivedBucket, ArchivedBucketLister};
pub use path::ArchivePath;
pub use resolver::PathResolver;
pub use size::BucketSizeTracker;
