//! Local bucket removal

use frostline_model::fs_util::remove_path;
use frostline_model::Bucket;
use std::io;
use tracing::{info, warn};

/// Removes local bucket directories once they are no longer needed
pub trait BucketRemover: Send + Sync {
    /// Delete the bucket's directory; an already missing directory is fine
    fn delete_bucket(&self, bucket: &Bucket) -> io::Result<()>;
}

/// Removes local bucket directories from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketDeleter;

impl BucketDeleter {
    /// Create a deleter
    pub fn new() -> Self {
        BucketDeleter
    }
}

impl BucketRemover for BucketDeleter {
    fn delete_bucket(&self, bucket: &Bucket) -> io::Result<()> {
        match remove_path(bucket.directory()) {
            Ok(()) => {
                info!(target: "frostline::archive", bucket = %bucket.key(), dir = %bucket.directory().display(), "Deleted local bucket");
                Ok(())
            }
            Err(e) => {
                warn!(target: "frostline::archive", bucket = %bucket.key(), error = %e, "Failed to delete local bucket");
                Err(e)
            }
        }
    }
}
