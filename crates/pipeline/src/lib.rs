//! Archive pipeline for Frostline
//!
//! Moves a bucket from local disk into archive storage in every configured
//! format, and deletes the local copy only once all of them are published.
//!
//! # Flow
//!
//! ```text
//! BucketFreezer ──► ArchiveTrigger ──► BucketArchiver
//!                        │                 ├─ BucketExporter (csv, tar.zst)
//!                        │                 ├─ ArchiveBucketTransferer
//!                        │                 └─ BucketDeleter
//!                        ▼
//!              FailedBucketStore ◄── FailedBucketRestorer ◄── RecoveryLoop
//! ```
//!
//! Per-format failures never abort the remaining formats. They are collected
//! into an [`ArchiveReport`], and the trigger records the bucket in the
//! failed-bucket registry for a later recovery pass.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archiver;
pub mod deleter;
pub mod error;
pub mod export;
pub mod factory;
pub mod freezer;
pub mod recovery;
pub mod registry;
pub mod transfer;
pub mod trigger;

pub use archiver::{ArchiveReport, BucketArchiver, FormatFailure, FormatOutcome};
pub use deleter::{BucketDeleter, BucketRemover};
pub use error::{ArchiveError, ExportError, RegistryError, RegistryResult, TransferError};
pub use export::{
    BucketExporter, CommandOutcome, CommandRunner, CommandSpec, CompressedExporter, CsvExporter,
    FormatConverter, ShellCommandRunner,
};
pub use factory::{ArchiveServices, ArchiverFactory};
pub use freezer::BucketFreezer;
pub use recovery::{FailedBucketRestorer, RecoveryLoop, RecoveryPolicy, RecoveryReport};
pub use registry::{
    FailedBucketRecord, FailedBucketStore, FileFailedBucketStore, InMemoryFailedBucketStore,
};
pub use transfer::ArchiveBucketTransferer;
pub use trigger::{ArchiveTrigger, LocalArchiveTrigger};
