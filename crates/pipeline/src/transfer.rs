//! Publishing buckets into archive storage

use crate::error::TransferError;
use frostline_archive::{ArchiveFileSystem, ArchivePath, BucketSizeTracker, PathResolver};
use frostline_model::{Bucket, BucketFormat};
use std::sync::Arc;
use tracing::{debug, info};

/// Checks for and publishes archived copies of buckets
#[derive(Clone)]
pub struct ArchiveBucketTransferer {
    fs: Arc<dyn ArchiveFileSystem>,
    resolver: PathResolver,
    sizes: BucketSizeTracker,
}

impl ArchiveBucketTransferer {
    /// Create a transferer over an archive
    pub fn new(fs: Arc<dyn ArchiveFileSystem>, resolver: PathResolver) -> Self {
        let sizes = BucketSizeTracker::new(Arc::clone(&fs), resolver.clone());
        ArchiveBucketTransferer {
            fs,
            resolver,
            sizes,
        }
    }

    /// True if `bucket` is already published in `format`
    pub fn is_archived(
        &self,
        bucket: &Bucket,
        format: BucketFormat,
    ) -> Result<bool, TransferError> {
        let key = bucket.key_for_format(format);
        let lookup = |source| TransferError::Lookup {
            key: key.clone(),
            source,
        };
        let path = self.resolver.path_for_key(&key).map_err(lookup)?;
        let exists = self.fs.exists(&path).map_err(lookup)?;
        debug!(target: "frostline::archive", bucket = %key, exists, "Checked archive");
        Ok(exists)
    }

    /// Record the size of `bucket`, then publish it at its archive path.
    ///
    /// The size sidecar is written first so that a published bucket always
    /// has one; a sidecar left behind by a failed publish is rewritten on
    /// the next attempt. Nothing is deleted locally whatever the outcome.
    pub fn transfer_bucket_to_archive(
        &self,
        bucket: &Bucket,
    ) -> Result<ArchivePath, TransferError> {
        let key = bucket.key();
        let size = bucket
            .compute_size()
            .map_err(|source| TransferError::LocalRead {
                key: key.clone(),
                source,
            })?;
        let path = self
            .resolver
            .bucket_path(bucket)
            .map_err(|source| TransferError::Publish {
                key: key.clone(),
                source,
            })?;

        self.sizes
            .persist_size(&path, size)
            .map_err(|source| TransferError::SizeWrite {
                key: key.clone(),
                source,
            })?;
        self.fs
            .put(bucket.directory(), &path)
            .map_err(|source| TransferError::Publish {
                key: key.clone(),
                source,
            })?;

        info!(target: "frostline::archive", bucket = %key, %path, size, backend = self.fs.backend_name(), "Published bucket");
        Ok(path)
    }

    /// Size sidecar tracker sharing this transferer's archive
    pub fn size_tracker(&self) -> &BucketSizeTracker {
        &self.sizes
    }
}
