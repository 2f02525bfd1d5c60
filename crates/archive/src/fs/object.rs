//! Archive on an object store (S3-compatible, or in-memory for tests)
//!
//! Object stores have no directory rename, so a directory publish is a
//! three-phase commit driven by sibling marker objects:
//!
//! 1. write `<dest>.pending`
//! 2. upload every file under `.staging/<uuid>/`, then server-side rename
//!    each object to `<dest>/<relative path>`
//! 3. write `<dest>.committed`, then drop `<dest>.pending`
//!
//! A prefix with a pending marker and no committed marker is invisible to
//! `exists`, `list` and `get`. Single files are published with one PUT,
//! which is atomic on every store.

use super::ArchiveFileSystem;
use crate::error::{ArchiveFsError, ArchiveFsResult};
use crate::path::ArchivePath;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ListResult, ObjectMeta, ObjectStore};
use std::collections::BTreeSet;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, warn};
use uuid::Uuid;

const PENDING_SUFFIX: &str = ".pending";
const COMMITTED_SUFFIX: &str = ".committed";
const STAGING_PREFIX: &str = ".staging";

/// Archive stored in an [`ObjectStore`]
///
/// Calls block on a private runtime; do not call from inside an async context.
pub struct ObjectStoreArchiveFileSystem {
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
    runtime: Runtime,
    timeout: Duration,
}

impl ObjectStoreArchiveFileSystem {
    /// Wrap a store; every key is placed under `prefix` when given
    pub fn new(
        store: Arc<dyn ObjectStore>,
        prefix: Option<String>,
        timeout: Duration,
    ) -> ArchiveFsResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("frostline-objstore")
            .enable_all()
            .build()?;
        let prefix = prefix
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());

        Ok(ObjectStoreArchiveFileSystem {
            store,
            prefix,
            runtime,
            timeout,
        })
    }

    /// Process-local in-memory archive
    pub fn in_memory() -> ArchiveFsResult<Self> {
        Self::new(Arc::new(InMemory::new()), None, Duration::from_secs(60))
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    fn key(&self, path: &ArchivePath) -> ObjectPath {
        match &self.prefix {
            Some(prefix) if path.is_root() => ObjectPath::from(prefix.as_str()),
            Some(prefix) => ObjectPath::from(format!("{}/{}", prefix, path.as_str())),
            None => ObjectPath::from(path.as_str()),
        }
    }

    fn marker(&self, path: &ArchivePath, suffix: &str) -> ArchiveFsResult<ObjectPath> {
        Ok(self.key(&path.with_suffix(suffix)?))
    }

    fn staging_root(&self) -> ObjectPath {
        let id = Uuid::new_v4().simple().to_string();
        match &self.prefix {
            Some(prefix) => ObjectPath::from(format!("{}/{}/{}", prefix, STAGING_PREFIX, id)),
            None => ObjectPath::from(format!("{}/{}", STAGING_PREFIX, id)),
        }
    }

    fn block_on<T, F>(&self, op: &'static str, fut: F) -> ArchiveFsResult<T>
    where
        F: Future<Output = object_store::Result<T>>,
    {
        let timeout = self.timeout;
        match self
            .runtime
            .block_on(async move { tokio::time::timeout(timeout, fut).await })
        {
            Ok(result) => result.map_err(ArchiveFsError::from),
            Err(_) => Err(ArchiveFsError::Timeout {
                op,
                secs: timeout.as_secs(),
            }),
        }
    }

    fn head_exists(&self, key: &ObjectPath) -> ArchiveFsResult<bool> {
        match self.block_on("head", self.store.head(key)) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn list_level(&self, prefix: &ArchivePath) -> ArchiveFsResult<ListResult> {
        let key = self.key(prefix);
        let listing_prefix = if key.as_ref().is_empty() {
            None
        } else {
            Some(&key)
        };
        self.block_on("list", self.store.list_with_delimiter(listing_prefix))
    }

    fn list_recursive(&self, prefix: &ArchivePath) -> ArchiveFsResult<Vec<ObjectMeta>> {
        let key = self.key(prefix);
        self.block_on(
            "list",
            self.store.list(Some(&key)).try_collect::<Vec<ObjectMeta>>(),
        )
    }

    /// Children visible at one level: files, committed trees and plain
    /// intermediate prefixes, minus anything still pending.
    fn visible_children(&self, prefix: &ArchivePath, listing: ListResult) -> Vec<ArchivePath> {
        let mut committed = BTreeSet::new();
        let mut pending = BTreeSet::new();
        let mut names = BTreeSet::new();

        for meta in &listing.objects {
            let Some(name) = meta.location.filename() else {
                continue;
            };
            if let Some(dir) = name.strip_suffix(COMMITTED_SUFFIX) {
                committed.insert(dir.to_string());
            } else if let Some(dir) = name.strip_suffix(PENDING_SUFFIX) {
                pending.insert(dir.to_string());
            } else {
                names.insert(name.to_string());
            }
        }

        for common in &listing.common_prefixes {
            let Some(name) = common.filename() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if pending.contains(name) && !committed.contains(name) {
                continue;
            }
            names.insert(name.to_string());
        }
        names.extend(committed);

        names
            .iter()
            .filter_map(|name| prefix.child(name).ok())
            .collect()
    }

    fn delete_quietly(&self, key: &ObjectPath) {
        if let Err(e) = self.block_on("delete", self.store.delete(key)) {
            if !e.is_not_found() {
                warn!(target: "frostline::fs", key = %key, error = %e, "Failed to delete object during cleanup");
            }
        }
    }

    fn put_tree(&self, files: &[(String, PathBuf)], dest: &ArchivePath) -> ArchiveFsResult<()> {
        let staging = self.staging_root();
        let dest_key = self.key(dest);
        let staged_key = |rel: &str| ObjectPath::from(format!("{}/{}", staging.as_ref(), rel));
        let final_key = |rel: &str| ObjectPath::from(format!("{}/{}", dest_key.as_ref(), rel));

        let result = (|| -> ArchiveFsResult<()> {
            for (rel, file) in files {
                let data = fs::read(file)?;
                self.block_on("put", self.store.put(&staged_key(rel), Bytes::from(data)))?;
            }
            for (rel, _) in files {
                self.block_on("rename", self.store.rename(&staged_key(rel), &final_key(rel)))?;
            }
            let committed = self.marker(dest, COMMITTED_SUFFIX)?;
            self.block_on("put", self.store.put(&committed, Bytes::new()))?;
            Ok(())
        })();

        if result.is_err() {
            for (rel, _) in files {
                self.delete_quietly(&staged_key(rel));
                self.delete_quietly(&final_key(rel));
            }
        }
        result
    }
}

impl ArchiveFileSystem for ObjectStoreArchiveFileSystem {
    fn backend_name(&self) -> &'static str {
        "object-store"
    }

    fn put(&self, local: &Path, dest: &ArchivePath) -> ArchiveFsResult<()> {
        if !local.exists() {
            return Err(ArchiveFsError::MissingSource(local.display().to_string()));
        }
        if dest.is_root() {
            return Err(ArchiveFsError::invalid_path("cannot publish at the archive root"));
        }
        if self.exists(dest)? {
            return Err(ArchiveFsError::AlreadyExists(dest.clone()));
        }

        if local.is_file() {
            let data = fs::read(local)?;
            self.block_on("put", self.store.put(&self.key(dest), Bytes::from(data)))?;
            return Ok(());
        }

        let mut files = Vec::new();
        collect_files(local, "", &mut files)?;

        let pending = self.marker(dest, PENDING_SUFFIX)?;
        self.block_on("put", self.store.put(&pending, Bytes::new()))?;

        let result = self.put_tree(&files, dest);
        self.delete_quietly(&pending);
        result?;

        debug!(target: "frostline::fs", src = %local.display(), dest = %dest, files = files.len(), "Published to object store");
        Ok(())
    }

    fn get(&self, src: &ArchivePath, local: &Path) -> ArchiveFsResult<()> {
        let key = self.key(src);
        if self.head_exists(&key)? {
            let data = self.block_on("get", async { self.store.get(&key).await?.bytes().await })?;
            if let Some(parent) = local.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(local, &data)?;
            return Ok(());
        }

        if !self.exists(src)? {
            return Err(ArchiveFsError::NotFound(src.clone()));
        }

        fs::create_dir_all(local)?;
        let base = format!("{}/", key.as_ref());
        for meta in self.list_recursive(src)? {
            let Some(rel) = meta.location.as_ref().strip_prefix(base.as_str()) else {
                continue;
            };
            let target = rel
                .split('/')
                .fold(local.to_path_buf(), |acc, part| acc.join(part));
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let data = self.block_on("get", async {
                self.store.get(&meta.location).await?.bytes().await
            })?;
            fs::write(&target, &data)?;
        }
        Ok(())
    }

    fn list(&self, prefix: &ArchivePath) -> ArchiveFsResult<Vec<ArchivePath>> {
        let listing = self.list_level(prefix)?;
        Ok(self.visible_children(prefix, listing))
    }

    fn exists(&self, path: &ArchivePath) -> ArchiveFsResult<bool> {
        if path.is_root() {
            return Ok(true);
        }
        if self.head_exists(&self.key(path))? {
            return Ok(true);
        }
        if self.head_exists(&self.marker(path, COMMITTED_SUFFIX)?)? {
            return Ok(true);
        }
        if self.head_exists(&self.marker(path, PENDING_SUFFIX)?)? {
            return Ok(false);
        }
        // Plain intermediate prefix
        let listing = self.list_level(path)?;
        Ok(!self.visible_children(path, listing).is_empty())
    }

    fn write_bytes(&self, data: &[u8], dest: &ArchivePath) -> ArchiveFsResult<()> {
        self.block_on(
            "put",
            self.store.put(&self.key(dest), Bytes::copy_from_slice(data)),
        )?;
        Ok(())
    }

    fn read_bytes(&self, src: &ArchivePath) -> ArchiveFsResult<Vec<u8>> {
        let key = self.key(src);
        match self.block_on("get", async { self.store.get(&key).await?.bytes().await }) {
            Ok(data) => Ok(data.to_vec()),
            Err(e) if e.is_not_found() => Err(ArchiveFsError::NotFound(src.clone())),
            Err(e) => Err(e),
        }
    }
}

fn collect_files(dir: &Path, rel: &str, out: &mut Vec<(String, PathBuf)>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let child_rel = if rel.is_empty() {
            name
        } else {
            format!("{}/{}", rel, name)
        };

        if entry.file_type()?.is_dir() {
            collect_files(&entry.path(), &child_rel, out)?;
        } else {
            out.push((child_rel, entry.path()));
        }
    }
    Ok(())
}
