//! Bucket model error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while constructing or inspecting a [`crate::Bucket`]
#[derive(Debug, Error)]
pub enum BucketError {
    /// Index name is empty or uses characters outside the index alphabet
    #[error("Invalid index name '{0}': expected lowercase letters, digits, '_' or '-', not starting with '-'")]
    InvalidIndex(String),

    /// Bucket name is empty or uses characters outside the bucket-name alphabet
    #[error("Invalid bucket name '{0}': expected letters, digits, '_' or '-'")]
    InvalidName(String),

    /// Native bucket directory name could not be decoded into a time range
    #[error("Cannot decode time range from bucket directory name '{0}' (expected db_<latest>_<earliest>_<id>)")]
    UndecodableName(String),

    /// Time range is negative or inverted
    #[error("Invalid time range [{earliest}, {latest}]")]
    InvalidTimeRange {
        /// Earliest time in the range
        earliest: i64,
        /// Latest time in the range
        latest: i64,
    },

    /// Bucket directory does not exist
    #[error("Bucket directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for bucket model operations
pub type BucketResult<T> = Result<T, BucketError>;
