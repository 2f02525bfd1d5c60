//! Archive filesystem abstraction
//!
//! Every backend offers the same primitives. `put` is the publish operation:
//! whatever the backend's native commit mechanism, a reader calling `exists`,
//! `list` or `get` either sees the complete tree at the destination or
//! nothing at all.

mod local;
mod object;

pub use local::LocalArchiveFileSystem;
pub use object::ObjectStoreArchiveFileSystem;

use crate::error::ArchiveFsResult;
use crate::path::ArchivePath;
use std::path::Path;

/// Blocking put/get/list/exists over a remote archive backend
pub trait ArchiveFileSystem: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Atomically publish a local file or directory tree at `dest`
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if something is already published at `dest`
    /// - `MissingSource` if `local` does not exist
    fn put(&self, local: &Path, dest: &ArchivePath) -> ArchiveFsResult<()>;

    /// Copy a published file or tree into `local`, which must not exist yet
    fn get(&self, src: &ArchivePath, local: &Path) -> ArchiveFsResult<()>;

    /// Immediate published children of `prefix`; an absent prefix lists as empty
    fn list(&self, prefix: &ArchivePath) -> ArchiveFsResult<Vec<ArchivePath>>;

    /// True if something is published at `path`
    fn exists(&self, path: &ArchivePath) -> ArchiveFsResult<bool>;

    /// Atomically write a small object, replacing any previous content
    fn write_bytes(&self, data: &[u8], dest: &ArchivePath) -> ArchiveFsResult<()>;

    /// Read a small object written with `write_bytes`
    fn read_bytes(&self, src: &ArchivePath) -> ArchiveFsResult<Vec<u8>>;
}
