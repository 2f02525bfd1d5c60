//! Entry point for buckets leaving the search engine
//!
//! The engine hands over a bucket directory when it rolls to frozen. The
//! freezer moves it out of the engine's reach into the safe location,
//! archives it, and then drains the failed-bucket backlog.

use crate::archiver::ArchiveReport;
use crate::error::ArchiveError;
use crate::recovery::FailedBucketRestorer;
use crate::trigger::ArchiveTrigger;
use frostline_model::fs_util::move_path;
use frostline_model::{Bucket, LocalPaths};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Moves frozen buckets to the safe location and archives them
pub struct BucketFreezer {
    paths: LocalPaths,
    trigger: Arc<dyn ArchiveTrigger>,
    restorer: Arc<FailedBucketRestorer>,
}

impl BucketFreezer {
    /// Create a freezer
    pub fn new(
        paths: LocalPaths,
        trigger: Arc<dyn ArchiveTrigger>,
        restorer: Arc<FailedBucketRestorer>,
    ) -> Self {
        BucketFreezer {
            paths,
            trigger,
            restorer,
        }
    }

    /// Take over the bucket in `directory` and archive it
    pub fn freeze_bucket(
        &self,
        index: &str,
        directory: &Path,
    ) -> Result<ArchiveReport, ArchiveError> {
        // Reject anything that is not a bucket before moving it
        let bucket = Bucket::from_native_directory(index, directory)?;
        let safe = self.paths.safe_bucket_dir(index, bucket.name());

        if safe != directory {
            if safe.exists() {
                return Err(ArchiveError::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} is already awaiting archival", safe.display()),
                )));
            }
            move_path(directory, &safe)?;
            info!(target: "frostline::archive", bucket = %bucket.key(), safe = %safe.display(), "Moved bucket to safe location");
        }

        let result = self.trigger.archive_bucket_directory(index, &safe);
        self.drain_backlog();
        result
    }

    fn drain_backlog(&self) {
        match self.restorer.recover_failed_buckets(self.trigger.as_ref()) {
            Ok(report) => {
                debug!(target: "frostline::recovery", attempted = report.attempted(), "Drained failed-bucket backlog")
            }
            Err(e) => {
                warn!(target: "frostline::recovery", error = %e, "Could not drain failed-bucket backlog")
            }
        }
    }
}
