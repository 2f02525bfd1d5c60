//! Bucket identity and local bucket directories
//!
//! A native bucket directory is named `db_<latest>_<earliest>_<id>` (or
//! `rb_<latest>_<earliest>_<id>_<guid>` for replicated copies). When a bucket
//! arrives with only an index and a directory, its time range is decoded from
//! that name.

use crate::error::{BucketError, BucketResult};
use crate::format::BucketFormat;
use crate::fs_util;
use crate::time::TimeRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of an archived object: `(index, format, time range, name)`
///
/// Two buckets with the same key are the same archived object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    /// Index the bucket belongs to
    pub index: String,
    /// Storage format
    pub format: BucketFormat,
    /// Event time range covered by the bucket
    pub time_range: TimeRange,
    /// Bucket name, unique within index + format + time range
    pub name: String,
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.index, self.format, self.name, self.time_range
        )
    }
}

/// A time-bounded directory of indexed data belonging to one index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    index: String,
    name: String,
    format: BucketFormat,
    time_range: TimeRange,
    directory: PathBuf,
    size_on_disk: Option<u64>,
}

impl Bucket {
    /// Create a bucket after validating the index and name alphabets
    pub fn new(
        index: impl Into<String>,
        name: impl Into<String>,
        format: BucketFormat,
        time_range: TimeRange,
        directory: impl Into<PathBuf>,
    ) -> BucketResult<Self> {
        let index = index.into();
        let name = name.into();
        validate_index(&index)?;
        validate_bucket_name(&name)?;

        Ok(Bucket {
            index,
            name,
            format,
            time_range,
            directory: directory.into(),
            size_on_disk: None,
        })
    }

    /// Build a native-format bucket from an existing directory, decoding the
    /// time range from the directory name.
    pub fn from_native_directory(index: &str, directory: &Path) -> BucketResult<Self> {
        if !directory.is_dir() {
            return Err(BucketError::DirectoryNotFound(directory.to_path_buf()));
        }

        let name = directory
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BucketError::InvalidName(directory.display().to_string()))?;
        let time_range = parse_native_name(name)?;

        Bucket::new(
            index,
            name,
            BucketFormat::SplunkBucket,
            time_range,
            directory,
        )
    }

    /// Same identity except for format, living in a different directory.
    /// Used by converters to describe their output.
    pub fn derive(&self, format: BucketFormat, directory: impl Into<PathBuf>) -> Bucket {
        Bucket {
            index: self.index.clone(),
            name: self.name.clone(),
            format,
            time_range: self.time_range,
            directory: directory.into(),
            size_on_disk: None,
        }
    }

    /// Same bucket relocated to `directory`
    pub fn relocated(&self, directory: impl Into<PathBuf>) -> Bucket {
        Bucket {
            directory: directory.into(),
            ..self.clone()
        }
    }

    /// Attach a known on-disk size
    pub fn with_size(mut self, size: u64) -> Self {
        self.size_on_disk = Some(size);
        self
    }

    /// Index name
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Bucket name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage format
    pub fn format(&self) -> BucketFormat {
        self.format
    }

    /// Event time range
    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Earliest event time
    pub fn earliest(&self) -> i64 {
        self.time_range.earliest
    }

    /// Latest event time
    pub fn latest(&self) -> i64 {
        self.time_range.latest
    }

    /// Local directory holding the bucket data
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Size recorded with [`Bucket::with_size`], if any
    pub fn size_on_disk(&self) -> Option<u64> {
        self.size_on_disk
    }

    /// Recorded size, or the size of the directory tree if none was recorded
    pub fn compute_size(&self) -> std::io::Result<u64> {
        match self.size_on_disk {
            Some(size) => Ok(size),
            None => fs_util::dir_size(&self.directory),
        }
    }

    /// True if the bucket directory is present on local disk
    pub fn exists(&self) -> bool {
        self.directory.exists()
    }

    /// Archive identity of this bucket
    pub fn key(&self) -> BucketKey {
        self.key_for_format(self.format)
    }

    /// Archive identity of this bucket in another format
    pub fn key_for_format(&self, format: BucketFormat) -> BucketKey {
        BucketKey {
            index: self.index.clone(),
            format,
            time_range: self.time_range,
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key(), self.directory.display())
    }
}

/// Index names: lowercase letters, digits, `_` and `-`; may not start with `-`
pub fn validate_index(index: &str) -> BucketResult<()> {
    let valid = !index.is_empty()
        && !index.starts_with('-')
        && index
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(BucketError::InvalidIndex(index.to_string()))
    }
}

/// Bucket names: ASCII letters, digits, `_` and `-`
///
/// `.` is excluded so archive sidecar keys (`<bucket>.size`) never collide
/// with a bucket name.
pub fn validate_bucket_name(name: &str) -> BucketResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(BucketError::InvalidName(name.to_string()))
    }
}

fn parse_native_name(name: &str) -> BucketResult<TimeRange> {
    let undecodable = || BucketError::UndecodableName(name.to_string());

    let mut parts = name.split('_');
    match parts.next() {
        Some("db") | Some("rb") => {}
        _ => return Err(undecodable()),
    }
    let latest: i64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(undecodable)?;
    let earliest: i64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(undecodable)?;
    if parts.next().is_none() {
        return Err(undecodable());
    }

    TimeRange::new(earliest, latest)
}
