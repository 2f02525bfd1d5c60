//! Canonical archive paths for buckets
//!
//! ```text
//! <cluster>/<server>/<index>/<FORMAT>/<earliest:020>_<latest:020>_<name>
//! <cluster>/<server>/<index>/<FORMAT>/<earliest:020>_<latest:020>_<name>.size
//! ```
//!
//! Times are zero-padded so listing a format directory returns buckets in
//! time order, and so a listing can be range-filtered without reading any
//! bucket content.

use crate::error::{ArchiveFsError, ArchiveFsResult};
use crate::path::ArchivePath;
use frostline_model::{
    validate_bucket_name, validate_index, ArchiveConfig, Bucket, BucketFormat, BucketKey,
    TimeRange,
};

const SIZE_SUFFIX: &str = ".size";

/// Deterministic mapping between bucket identity and archive path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    base: ArchivePath,
}

impl PathResolver {
    /// Resolver for one cluster/server pair
    pub fn new(cluster_name: &str, server_name: &str) -> ArchiveFsResult<Self> {
        let base = ArchivePath::root()
            .child(cluster_name)?
            .child(server_name)?;
        Ok(PathResolver { base })
    }

    /// Resolver for the configured cluster/server
    pub fn from_config(config: &ArchiveConfig) -> ArchiveFsResult<Self> {
        Self::new(&config.cluster_name, &config.server_name)
    }

    /// `<cluster>/<server>`
    pub fn base(&self) -> &ArchivePath {
        &self.base
    }

    /// Directory holding every format of one index
    pub fn index_path(&self, index: &str) -> ArchiveFsResult<ArchivePath> {
        validate_index(index).map_err(|e| ArchiveFsError::invalid_path(e.to_string()))?;
        self.base.child(index)
    }

    /// Directory holding every bucket of one index in one format
    pub fn format_path(&self, index: &str, format: BucketFormat) -> ArchiveFsResult<ArchivePath> {
        self.index_path(index)?.child(format.as_str())
    }

    /// Archive path of a bucket in its own format
    pub fn bucket_path(&self, bucket: &Bucket) -> ArchiveFsResult<ArchivePath> {
        self.path_for_key(&bucket.key())
    }

    /// Archive path of a bucket identity
    pub fn path_for_key(&self, key: &BucketKey) -> ArchiveFsResult<ArchivePath> {
        if !key.format.is_known() {
            return Err(ArchiveFsError::invalid_path(format!(
                "bucket {} has unknown format",
                key.name
            )));
        }
        self.format_path(&key.index, key.format)?
            .child(&encode_bucket_segment(key.time_range, &key.name))
    }

    /// Size sidecar for a bucket path
    pub fn size_path(&self, bucket_path: &ArchivePath) -> ArchiveFsResult<ArchivePath> {
        bucket_path.with_suffix(SIZE_SUFFIX)
    }

    /// Decode `<base>/<index>/<FORMAT>/<segment>` back into a bucket identity.
    ///
    /// Returns `None` for anything else, including size sidecars.
    pub fn decode(&self, path: &ArchivePath) -> Option<BucketKey> {
        let rest = path.strip_prefix(&self.base)?;
        let [index, format, segment] = rest.as_slice() else {
            return None;
        };
        validate_index(index).ok()?;
        let format: BucketFormat = format.parse().ok()?;
        if !format.is_known() {
            return None;
        }
        let (time_range, name) = decode_bucket_segment(segment)?;

        Some(BucketKey {
            index: index.to_string(),
            format,
            time_range,
            name,
        })
    }
}

fn encode_bucket_segment(range: TimeRange, name: &str) -> String {
    format!("{:020}_{:020}_{}", range.earliest, range.latest, name)
}

fn decode_bucket_segment(segment: &str) -> Option<(TimeRange, String)> {
    let mut parts = segment.splitn(3, '_');
    let earliest = parse_padded(parts.next()?)?;
    let latest = parse_padded(parts.next()?)?;
    let name = parts.next()?;
    validate_bucket_name(name).ok()?;
    let range = TimeRange::new(earliest, latest).ok()?;
    Some((range, name.to_string()))
}

fn parse_padded(s: &str) -> Option<i64> {
    if s.len() != 20 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
