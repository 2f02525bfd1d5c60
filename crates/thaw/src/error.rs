//! Thaw and flush error types

use frostline_archive::ArchiveFsError;
use frostline_model::{BucketError, ConfigError};
use frostline_pipeline::ExportError;
use std::io;
use thiserror::Error;

/// Errors raised while thawing or flushing
#[derive(Debug, Error)]
pub enum ThawError {
    /// Index has no thaw location
    #[error("Illegal index: {0}")]
    IllegalIndex(String),

    /// Archive storage error
    #[error("Archive storage error: {0}")]
    Storage(#[from] ArchiveFsError),

    /// Compressed bucket could not be unpacked
    #[error("Could not unpack bucket: {0}")]
    Unpack(#[from] ExportError),

    /// Archived bucket identity is invalid
    #[error("Invalid bucket: {0}")]
    Bucket(#[from] BucketError),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for thaw operations
pub type ThawResult<T> = Result<T, ThawError>;
