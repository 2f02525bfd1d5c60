//! Restoring archived buckets into thaw directories
//!
//! A bucket archived in several formats is thawed once, in the most
//! searchable format available (native, then compressed, then csv).
//! Each bucket is downloaded into the staging directory and renamed into
//! its thaw location only when complete; an existing copy is replaced.

use crate::error::{ThawError, ThawResult};
use crate::location::ThawLocationProvider;
use frostline_archive::{ArchiveFileSystem, ArchivedBucket, ArchivedBucketLister};
use frostline_model::fs_util::{dir_size, move_path, remove_path};
use frostline_model::{Bucket, BucketFormat, BucketKey, TimeRange};
use frostline_pipeline::export::unpack_bucket;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A bucket that could not be thawed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThawFailure {
    /// Archived identity
    pub key: BucketKey,
    /// What went wrong
    pub reason: String,
}

/// What [`BucketThawer::thaw_buckets`] did
#[derive(Debug, Default)]
pub struct ThawReport {
    /// Buckets now present under the thaw root, in time order
    pub thawed: Vec<Bucket>,
    /// Buckets that matched but could not be thawed
    pub failed: Vec<ThawFailure>,
}

/// Copies archived buckets into thaw locations
pub struct BucketThawer {
    fs: Arc<dyn ArchiveFileSystem>,
    lister: ArchivedBucketLister,
    locations: ThawLocationProvider,
    staging_dir: PathBuf,
}

impl BucketThawer {
    /// Create a thawer staging downloads under `staging_dir`
    pub fn new(
        fs: Arc<dyn ArchiveFileSystem>,
        lister: ArchivedBucketLister,
        locations: ThawLocationProvider,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        BucketThawer {
            fs,
            lister,
            locations,
            staging_dir: staging_dir.into(),
        }
    }

    /// Thaw every archived bucket of `index` overlapping `range`.
    ///
    /// Unknown indexes fail before anything is listed. Failures of
    /// individual buckets are reported and do not stop the others.
    pub fn thaw_buckets(&self, index: &str, range: TimeRange) -> ThawResult<ThawReport> {
        let thaw_root = self.locations.thaw_root(index)?;
        let selected = select_preferred(self.lister.list_buckets_in_range(index, range)?);

        info!(target: "frostline::thaw", index, %range, buckets = selected.len(), thaw_root = %thaw_root.display(), "Thawing buckets");
        fs::create_dir_all(&thaw_root)?;
        fs::create_dir_all(&self.staging_dir)?;

        let results: Vec<Result<Bucket, ThawFailure>> = selected
            .par_iter()
            .map(|archived| {
                self.thaw_bucket(archived).map_err(|e| {
                    warn!(target: "frostline::thaw", bucket = %archived.key, error = %e, "Failed to thaw bucket");
                    ThawFailure {
                        key: archived.key.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect();

        let mut report = ThawReport::default();
        for result in results {
            match result {
                Ok(bucket) => report.thawed.push(bucket),
                Err(failure) => report.failed.push(failure),
            }
        }
        info!(target: "frostline::thaw", index, thawed = report.thawed.len(), failed = report.failed.len(), "Thaw finished");
        Ok(report)
    }

    /// Thaw one archived bucket into its thaw location
    pub fn thaw_bucket(&self, archived: &ArchivedBucket) -> ThawResult<Bucket> {
        let key = &archived.key;
        let dest = self.locations.location_for(&key.index, &key.name)?;
        let staging = self.staging_dir.join(Uuid::new_v4().to_string());

        let result = self.stage(archived, &staging).and_then(|(ready, format)| {
            remove_path(&dest)?;
            move_path(&ready, &dest)?;
            let size = dir_size(&dest)?;
            let bucket = Bucket::new(&key.index, &key.name, format, key.time_range, &dest)?;
            Ok(bucket.with_size(size))
        });

        if let Err(e) = remove_path(&staging) {
            warn!(target: "frostline::thaw", staging = %staging.display(), error = %e, "Could not clean thaw staging");
        }
        if result.is_ok() {
            info!(target: "frostline::thaw", bucket = %key, dest = %dest.display(), "Thawed bucket");
        }
        result
    }

    /// Download into `staging` and return the complete bucket directory
    /// together with the format it ends up in
    fn stage(
        &self,
        archived: &ArchivedBucket,
        staging: &Path,
    ) -> ThawResult<(PathBuf, BucketFormat)> {
        let name = &archived.key.name;
        match archived.key.format {
            BucketFormat::SplunkBucketTzst => {
                let packed = staging.join("packed");
                self.fs.get(&archived.path, &packed)?;
                let unpacked = unpack_bucket(&packed, name, &staging.join("unpacked"))?;
                Ok((unpacked, BucketFormat::SplunkBucket))
            }
            format => {
                let ready = staging.join(name);
                self.fs.get(&archived.path, &ready)?;
                Ok((ready, format))
            }
        }
    }
}

/// One entry per bucket, in the format thawed first
fn select_preferred(archived: Vec<ArchivedBucket>) -> Vec<ArchivedBucket> {
    let mut best: BTreeMap<(TimeRange, String), ArchivedBucket> = BTreeMap::new();
    for bucket in archived {
        let id = (bucket.key.time_range, bucket.key.name.clone());
        match best.get(&id) {
            Some(current) if current.key.format.thaw_rank() <= bucket.key.format.thaw_rank() => {}
            _ => {
                best.insert(id, bucket);
            }
        }
    }
    best.into_values().collect()
}
