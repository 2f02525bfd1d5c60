//! Closed time ranges and the overlap predicate

use crate::error::{BucketError, BucketResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed interval `[earliest, latest]` in epoch seconds
///
/// Both thaw selection and flush eviction use [`TimeRange::overlaps`], so a
/// bucket kept by one is exactly a bucket ignored by the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeRange {
    /// Earliest event time (inclusive)
    pub earliest: i64,
    /// Latest event time (inclusive)
    pub latest: i64,
}

impl TimeRange {
    /// Create a range, rejecting negative or inverted bounds
    pub fn new(earliest: i64, latest: i64) -> BucketResult<Self> {
        if earliest < 0 || earliest > latest {
            return Err(BucketError::InvalidTimeRange { earliest, latest });
        }
        Ok(TimeRange { earliest, latest })
    }

    /// `a.earliest <= b.latest && b.earliest <= a.latest`
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.earliest <= other.latest && other.earliest <= self.latest
    }

    /// True if `t` lies inside the range
    pub fn contains(&self, t: i64) -> bool {
        self.earliest <= t && t <= self.latest
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.earliest, self.latest)
    }
}
