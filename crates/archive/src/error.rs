//! Archive filesystem error types

use crate::path::ArchivePath;
use std::io;
use thiserror::Error;

/// Errors raised by archive storage backends
#[derive(Debug, Error)]
pub enum ArchiveFsError {
    /// Nothing is published at the path
    #[error("Archive path not found: {0}")]
    NotFound(ArchivePath),

    /// Publish target is already taken
    #[error("Archive path already exists: {0}")]
    AlreadyExists(ArchivePath),

    /// Path or path segment is not valid
    #[error("Invalid archive path: {0}")]
    InvalidPath(String),

    /// Local source for a publish does not exist
    #[error("Local source not found: {0}")]
    MissingSource(String),

    /// Stored metadata could not be decoded
    #[error("Corrupt archive metadata at {path}: {reason}")]
    Corrupt {
        /// Path of the metadata object
        path: ArchivePath,
        /// What was wrong
        reason: String,
    },

    /// Backend call did not finish in time
    #[error("Archive operation '{op}' timed out after {secs}s")]
    Timeout {
        /// Operation name
        op: &'static str,
        /// Timeout in seconds
        secs: u64,
    },

    /// Object store error
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveFsError {
    /// Create an invalid path error
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// True if the error means "nothing there"
    pub fn is_not_found(&self) -> bool {
        match self {
            ArchiveFsError::NotFound(_) => true,
            ArchiveFsError::ObjectStore(object_store::Error::NotFound { .. }) => true,
            ArchiveFsError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type for archive storage operations
pub type ArchiveFsResult<T> = Result<T, ArchiveFsError>;
