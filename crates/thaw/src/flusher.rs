//! Evicting thawed buckets outside a retained time range
//!
//! Only thaw directories are touched; archive storage is read to learn
//! which buckets of the index exist and what time ranges they cover.

use crate::error::ThawResult;
use crate::location::ThawLocationProvider;
use frostline_archive::ArchivedBucketLister;
use frostline_model::fs_util::remove_path;
use frostline_model::{Bucket, TimeRange};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Removes thawed buckets that do not overlap a retained range
pub struct Flusher {
    lister: ArchivedBucketLister,
    locations: ThawLocationProvider,
    flushed: Mutex<Vec<Bucket>>,
}

impl Flusher {
    /// Create a flusher
    pub fn new(lister: ArchivedBucketLister, locations: ThawLocationProvider) -> Self {
        Flusher {
            lister,
            locations,
            flushed: Mutex::new(Vec::new()),
        }
    }

    /// Delete every thawed bucket of `index` whose range does not overlap
    /// `retained`, returning the buckets removed by this call
    pub fn flush(&self, index: &str, retained: TimeRange) -> ThawResult<Vec<Bucket>> {
        let thaw_root = self.locations.thaw_root(index)?;
        let archived = self.lister.list_buckets_in_index(index)?;

        // A thaw directory is named after its bucket alone, so any retained
        // bucket protects every other bucket sharing its name
        let retained_names: BTreeSet<&str> = archived
            .iter()
            .filter(|b| b.key.time_range.overlaps(&retained))
            .map(|b| b.key.name.as_str())
            .collect();

        let mut seen = BTreeSet::new();
        let mut removed = Vec::new();

        for archived in &archived {
            let key = &archived.key;
            if key.time_range.overlaps(&retained)
                || retained_names.contains(key.name.as_str())
                || !seen.insert((key.name.clone(), key.time_range))
            {
                continue;
            }
            let thawed = thaw_root.join(&key.name);
            if !thawed.exists() {
                continue;
            }

            match remove_path(&thawed) {
                Ok(()) => {
                    info!(target: "frostline::flush", bucket = %key, dir = %thawed.display(), "Flushed thawed bucket");
                    removed.push(archived.to_bucket(&thawed)?);
                }
                Err(e) => {
                    warn!(target: "frostline::flush", bucket = %key, error = %e, "Failed to flush thawed bucket");
                }
            }
        }

        info!(target: "frostline::flush", index, %retained, flushed = removed.len(), "Flush finished");
        self.flushed.lock().extend(removed.iter().cloned());
        Ok(removed)
    }

    /// Every bucket removed by this flusher so far
    pub fn flushed_buckets(&self) -> Vec<Bucket> {
        self.flushed.lock().clone()
    }
}
