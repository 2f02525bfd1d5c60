//! Bucket size sidecars
//!
//! The size of an archived bucket is stored next to it so thaw can report
//! and budget space without walking remote trees.

use crate::error::{ArchiveFsError, ArchiveFsResult};
use crate::fs::ArchiveFileSystem;
use crate::path::ArchivePath;
use crate::resolver::PathResolver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
struct SizeRecord {
    size_bytes: u64,
}

/// Persists and retrieves archived bucket sizes
#[derive(Clone)]
pub struct BucketSizeTracker {
    fs: Arc<dyn ArchiveFileSystem>,
    resolver: PathResolver,
}

impl BucketSizeTracker {
    /// Create a tracker over an archive
    pub fn new(fs: Arc<dyn ArchiveFileSystem>, resolver: PathResolver) -> Self {
        BucketSizeTracker { fs, resolver }
    }

    /// Record the size of the bucket published at `bucket_path`
    pub fn persist_size(&self, bucket_path: &ArchivePath, size_bytes: u64) -> ArchiveFsResult<()> {
        let data = serde_json::to_vec(&SizeRecord { size_bytes }).map_err(|e| {
            ArchiveFsError::Corrupt {
                path: bucket_path.clone(),
                reason: e.to_string(),
            }
        })?;
        self.fs.write_bytes(&data, &self.resolver.size_path(bucket_path)?)
    }

    /// Size recorded for `bucket_path`, `None` if no sidecar exists
    pub fn read_size(&self, bucket_path: &ArchivePath) -> ArchiveFsResult<Option<u64>> {
        let size_path = self.resolver.size_path(bucket_path)?;
        let data = match self.fs.read_bytes(&size_path) {
            Ok(data) => data,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let record: SizeRecord =
            serde_json::from_slice(&data).map_err(|e| ArchiveFsError::Corrupt {
                path: size_path,
                reason: e.to_string(),
            })?;
        Ok(Some(record.size_bytes))
    }
}
