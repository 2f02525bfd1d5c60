//! Backend construction from configuration

use crate::error::ArchiveFsResult;
use crate::fs::{ArchiveFileSystem, LocalArchiveFileSystem, ObjectStoreArchiveFileSystem};
use frostline_model::{ArchiveBackendConfig, ArchiveConfig};
use object_store::aws::AmazonS3Builder;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Open the archive backend named by the configuration
///
/// S3 credentials are taken from the standard `AWS_*` environment.
pub fn open_archive_fs(config: &ArchiveConfig) -> ArchiveFsResult<Arc<dyn ArchiveFileSystem>> {
    let fs: Arc<dyn ArchiveFileSystem> = match &config.archive {
        ArchiveBackendConfig::Local { root } => {
            info!(target: "frostline::fs", root = %root.display(), "Opening local archive");
            Arc::new(LocalArchiveFileSystem::new(root)?)
        }
        ArchiveBackendConfig::Memory => {
            info!(target: "frostline::fs", "Opening in-memory archive");
            Arc::new(ObjectStoreArchiveFileSystem::in_memory()?)
        }
        ArchiveBackendConfig::S3 {
            bucket,
            region,
            prefix,
            endpoint,
            timeout_secs,
        } => {
            info!(target: "frostline::fs", bucket = %bucket, region = %region, "Opening S3 archive");
            let mut builder = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .with_region(region);
            if let Some(endpoint) = endpoint {
                builder = builder
                    .with_endpoint(endpoint)
                    .with_allow_http(endpoint.starts_with("http://"));
            }
            let store = builder.build()?;
            Arc::new(ObjectStoreArchiveFileSystem::new(
                Arc::new(store),
                prefix.clone(),
                Duration::from_secs(*timeout_secs),
            )?)
        }
    };
    Ok(fs)
}
