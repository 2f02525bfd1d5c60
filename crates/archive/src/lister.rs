//! Enumerating archived buckets

use crate::error::ArchiveFsResult;
use crate::fs::ArchiveFileSystem;
use crate::path::ArchivePath;
use crate::resolver::PathResolver;
use frostline_model::{validate_index, Bucket, BucketFormat, BucketKey, BucketResult, TimeRange};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A bucket published in archive storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedBucket {
    /// Identity decoded from the path
    pub key: BucketKey,
    /// Where it is published
    pub path: ArchivePath,
}

impl ArchivedBucket {
    /// Describe this bucket as living in a local directory
    pub fn to_bucket(&self, directory: &Path) -> BucketResult<Bucket> {
        Bucket::new(
            self.key.index.clone(),
            self.key.name.clone(),
            self.key.format,
            self.key.time_range,
            directory,
        )
    }
}

/// Lists archived indexes and buckets through a [`PathResolver`]
#[derive(Clone)]
pub struct ArchivedBucketLister {
    fs: Arc<dyn ArchiveFileSystem>,
    resolver: PathResolver,
}

impl ArchivedBucketLister {
    /// Create a lister over an archive
    pub fn new(fs: Arc<dyn ArchiveFileSystem>, resolver: PathResolver) -> Self {
        ArchivedBucketLister { fs, resolver }
    }

    /// Indexes with at least one archived entry
    pub fn list_indexes(&self) -> ArchiveFsResult<Vec<String>> {
        Ok(self
            .fs
            .list(self.resolver.base())?
            .iter()
            .filter_map(|p| p.file_name())
            .filter(|name| validate_index(name).is_ok())
            .map(str::to_string)
            .collect())
    }

    /// Buckets of one index in one format, in time order
    pub fn list_buckets(
        &self,
        index: &str,
        format: BucketFormat,
    ) -> ArchiveFsResult<Vec<ArchivedBucket>> {
        let prefix = self.resolver.format_path(index, format)?;
        let mut buckets: Vec<ArchivedBucket> = self
            .fs
            .list(&prefix)?
            .into_iter()
            .filter_map(|path| {
                self.resolver
                    .decode(&path)
                    .map(|key| ArchivedBucket { key, path })
            })
            .collect();
        buckets.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(buckets)
    }

    /// Buckets of one index across every format present in the archive
    pub fn list_buckets_in_index(&self, index: &str) -> ArchiveFsResult<Vec<ArchivedBucket>> {
        let index_path = self.resolver.index_path(index)?;
        let mut buckets = Vec::new();

        for format_dir in self.fs.list(&index_path)? {
            let format: BucketFormat = match format_dir.file_name() {
                Some(name) => name.parse().unwrap_or(BucketFormat::Unknown),
                None => continue,
            };
            if !format.is_known() {
                debug!(target: "frostline::fs", path = %format_dir, "Skipping unrecognized format directory");
                continue;
            }
            buckets.extend(self.list_buckets(index, format)?);
        }
        Ok(buckets)
    }

    /// Buckets of one index, any format, whose range overlaps `range`
    pub fn list_buckets_in_range(
        &self,
        index: &str,
        range: TimeRange,
    ) -> ArchiveFsResult<Vec<ArchivedBucket>> {
        Ok(self
            .list_buckets_in_index(index)?
            .into_iter()
            .filter(|b| b.key.time_range.overlaps(&range))
            .collect())
    }
}
