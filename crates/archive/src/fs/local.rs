//! Archive on a locally mounted filesystem (local disk, NFS, FUSE-mounted HDFS)
//!
//! Publish copies the source into `<root>/.staging/<uuid>` and renames it into
//! place. Staging lives under the archive root so the rename never crosses a
//! device boundary.

use super::ArchiveFileSystem;
use crate::error::{ArchiveFsError, ArchiveFsResult};
use crate::path::ArchivePath;
use frostline_model::fs_util;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

const STAGING_DIR: &str = ".staging";

/// Archive rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalArchiveFileSystem {
    root: PathBuf,
}

impl LocalArchiveFileSystem {
    /// Open (and create) an archive rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> ArchiveFsResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(STAGING_DIR))?;
        Ok(LocalArchiveFileSystem { root })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path backing an archive key
    pub fn resolve(&self, path: &ArchivePath) -> PathBuf {
        let mut resolved = self.root.clone();
        for segment in path.segments() {
            resolved.push(segment);
        }
        resolved
    }

    fn staging_path(&self) -> PathBuf {
        self.root
            .join(STAGING_DIR)
            .join(Uuid::new_v4().simple().to_string())
    }

    fn publish(&self, staged: &Path, target: &Path) -> io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(staged, target)
    }
}

impl ArchiveFileSystem for LocalArchiveFileSystem {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    fn put(&self, local: &Path, dest: &ArchivePath) -> ArchiveFsResult<()> {
        if !local.exists() {
            return Err(ArchiveFsError::MissingSource(local.display().to_string()));
        }
        let target = self.resolve(dest);
        if target.exists() {
            return Err(ArchiveFsError::AlreadyExists(dest.clone()));
        }

        let staged = self.staging_path();
        let result = fs_util::copy_recursive(local, &staged)
            .and_then(|()| self.publish(&staged, &target));

        if let Err(e) = result {
            if let Err(cleanup) = fs_util::remove_path(&staged) {
                warn!(target: "frostline::fs", staged = %staged.display(), error = %cleanup, "Failed to remove staged copy");
            }
            // A concurrent publisher won the rename
            if target.exists() {
                return Err(ArchiveFsError::AlreadyExists(dest.clone()));
            }
            return Err(e.into());
        }

        debug!(target: "frostline::fs", src = %local.display(), dest = %dest, "Published to local archive");
        Ok(())
    }

    fn get(&self, src: &ArchivePath, local: &Path) -> ArchiveFsResult<()> {
        let source = self.resolve(src);
        if !source.exists() {
            return Err(ArchiveFsError::NotFound(src.clone()));
        }
        fs_util::copy_recursive(&source, local)?;
        Ok(())
    }

    fn list(&self, prefix: &ArchivePath) -> ArchiveFsResult<Vec<ArchivePath>> {
        let dir = self.resolve(prefix);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if let Ok(child) = prefix.child(name) {
                children.push(child);
            }
        }
        children.sort();
        Ok(children)
    }

    fn exists(&self, path: &ArchivePath) -> ArchiveFsResult<bool> {
        Ok(self.resolve(path).exists())
    }

    fn write_bytes(&self, data: &[u8], dest: &ArchivePath) -> ArchiveFsResult<()> {
        let staged = self.staging_path();
        let target = self.resolve(dest);

        let result = (|| -> io::Result<()> {
            let mut file = File::create(&staged)?;
            file.write_all(data)?;
            file.sync_all()?;
            self.publish(&staged, &target)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&staged);
            return Err(e.into());
        }
        Ok(())
    }

    fn read_bytes(&self, src: &ArchivePath) -> ArchiveFsResult<Vec<u8>> {
        match fs::read(self.resolve(src)) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ArchiveFsError::NotFound(src.clone())),
            Err(e) => Err(e.into()),
        }
    }
}
