//! Where thawed buckets live

use crate::error::ThawResult;
use crate::settings::IndexSettings;
use frostline_model::Bucket;
use std::path::PathBuf;
use std::sync::Arc;

/// Maps buckets to directories under their index's thaw root
#[derive(Clone)]
pub struct ThawLocationProvider {
    settings: Arc<dyn IndexSettings>,
}

impl ThawLocationProvider {
    /// Create a provider over index settings
    pub fn new(settings: Arc<dyn IndexSettings>) -> Self {
        ThawLocationProvider { settings }
    }

    /// Thaw root of `index`
    pub fn thaw_root(&self, index: &str) -> ThawResult<PathBuf> {
        self.settings.thaw_location(index)
    }

    /// `<thaw root of index>/<name>`
    pub fn location_for(&self, index: &str, name: &str) -> ThawResult<PathBuf> {
        Ok(self.thaw_root(index)?.join(name))
    }

    /// Directory `bucket` occupies once thawed
    pub fn location_in_thaw_for_bucket(&self, bucket: &Bucket) -> ThawResult<PathBuf> {
        self.location_for(bucket.index(), bucket.name())
    }
}
