//! Error types for the archive pipeline

use frostline_archive::ArchiveFsError;
use frostline_model::{BucketError, BucketFormat, BucketKey, ConfigError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors converting a bucket into another format
#[derive(Debug, Error)]
pub enum ExportError {
    /// Target format is not recognized
    #[error("Unknown bucket format: {0}")]
    UnknownFormat(BucketFormat),

    /// No converter between the two formats
    #[error("No conversion from {from} to {to}")]
    UnsupportedConversion {
        /// Current format of the bucket
        from: BucketFormat,
        /// Requested format
        to: BucketFormat,
    },

    /// Export tool failed or produced no output
    #[error("Export of bucket {bucket} failed: {reason}")]
    Failed {
        /// Bucket name
        bucket: String,
        /// What went wrong
        reason: String,
    },

    /// Export tool did not finish in time
    #[error("Export of bucket {bucket} timed out after {secs}s")]
    Timeout {
        /// Bucket name
        bucket: String,
        /// Timeout in seconds
        secs: u64,
    },

    /// Compressed bucket does not match its checksum
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Compressed bucket file
        path: PathBuf,
        /// Recorded checksum
        expected: String,
        /// Computed checksum
        actual: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ExportError {
    /// Create an export failure
    pub fn failed(bucket: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            bucket: bucket.into(),
            reason: reason.into(),
        }
    }

    /// True for [`ExportError::UnknownFormat`]
    pub fn is_unknown_format(&self) -> bool {
        matches!(self, ExportError::UnknownFormat(_))
    }
}

/// Publishing a bucket to archive storage failed
#[derive(Debug, Error)]
pub enum TransferError {
    /// Checking for an existing archived copy failed
    #[error("Could not check archive for {key}: {source}")]
    Lookup {
        /// Bucket identity
        key: BucketKey,
        /// Backend error
        #[source]
        source: ArchiveFsError,
    },

    /// Publishing the bucket contents failed
    #[error("Could not publish {key} to archive: {source}")]
    Publish {
        /// Bucket identity
        key: BucketKey,
        /// Backend error
        #[source]
        source: ArchiveFsError,
    },

    /// Bucket was published but its size could not be recorded
    #[error("Could not record size of {key}: {source}")]
    SizeWrite {
        /// Bucket identity
        key: BucketKey,
        /// Backend error
        #[source]
        source: ArchiveFsError,
    },

    /// Local bucket could not be measured
    #[error("Could not read local bucket {key}: {source}")]
    LocalRead {
        /// Bucket identity
        key: BucketKey,
        /// IO error
        #[source]
        source: io::Error,
    },
}

/// Errors that stop archival of a bucket as a whole
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An empty format list would authorize deleting the source unarchived
    #[error("No archive formats configured")]
    NoFormatsConfigured,

    /// Every configured format was unrecognized
    #[error("None of the configured formats is recognized: {0:?}")]
    UnknownFormat(Vec<BucketFormat>),

    /// Bucket directory or identity is invalid
    #[error("Invalid bucket: {0}")]
    Bucket(#[from] BucketError),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Archive backend could not be set up
    #[error("Archive storage error: {0}")]
    Storage(#[from] ArchiveFsError),

    /// Failed-bucket registry error
    #[error("Failed-bucket registry error: {0}")]
    Registry(#[from] RegistryError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors from the failed-bucket registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registry file contains an undecodable record
    #[error("Corrupt registry record at {path}:{line}: {reason}")]
    Corrupt {
        /// Registry file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Decode error
        reason: String,
    },

    /// Record could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
