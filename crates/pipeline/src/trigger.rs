//! The "archive this bucket directory" entry point
//!
//! Everything that wants a bucket archived goes through an
//! [`ArchiveTrigger`]: the freezer, the recovery pass and the CLI. The
//! trigger keeps the failed-bucket registry in step with the outcome.

use crate::archiver::{ArchiveReport, BucketArchiver};
use crate::error::ArchiveError;
use crate::registry::FailedBucketStore;
use chrono::Utc;
use frostline_model::{Bucket, BucketKey};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Archives a local bucket directory of an index
pub trait ArchiveTrigger: Send + Sync {
    /// Archive the native bucket in `directory`.
    ///
    /// Idempotent per bucket identity. Partial failure is reported in the
    /// returned [`ArchiveReport`].
    fn archive_bucket_directory(
        &self,
        index: &str,
        directory: &Path,
    ) -> Result<ArchiveReport, ArchiveError>;
}

/// In-process trigger backed by a [`BucketArchiver`]
pub struct LocalArchiveTrigger {
    archiver: Arc<BucketArchiver>,
    registry: Arc<dyn FailedBucketStore>,
}

impl LocalArchiveTrigger {
    /// Create a trigger recording failures in `registry`
    pub fn new(archiver: Arc<BucketArchiver>, registry: Arc<dyn FailedBucketStore>) -> Self {
        LocalArchiveTrigger { archiver, registry }
    }

    fn record_failure(
        &self,
        key: &BucketKey,
        directory: &Path,
        reason: &str,
    ) -> Result<(), ArchiveError> {
        let record = self
            .registry
            .record_failure(key, directory, reason, Utc::now())?;
        warn!(
            target: "frostline::recovery",
            bucket = %key,
            attempts = record.attempts,
            %reason,
            "Bucket archival failed, queued for recovery"
        );
        Ok(())
    }
}

impl ArchiveTrigger for LocalArchiveTrigger {
    fn archive_bucket_directory(
        &self,
        index: &str,
        directory: &Path,
    ) -> Result<ArchiveReport, ArchiveError> {
        let bucket = Bucket::from_native_directory(index, directory)?;
        let key = bucket.key();

        match self.archiver.archive_bucket(&bucket) {
            Ok(report) if report.is_complete() => {
                if let Err(e) = self.registry.remove(&key) {
                    warn!(target: "frostline::recovery", bucket = %key, error = %e, "Could not clear failed-bucket record");
                }
                Ok(report)
            }
            Ok(report) => {
                self.record_failure(&key, directory, &report.failure_summary())?;
                Ok(report)
            }
            Err(e) => {
                self.record_failure(&key, directory, &e.to_string())?;
                Err(e)
            }
        }
    }
}
