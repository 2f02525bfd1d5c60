//! Per-bucket archive orchestration
//!
//! For each configured format, in order:
//!
//! 1. skip it if the archive already holds the bucket in that format
//! 2. export the bucket (a no-op for the native format)
//! 3. publish the export
//! 4. delete the export if it is a transient copy, whatever happened in 3
//!
//! The source is deleted only when every format ends up archived. Failures
//! are recorded per format in the [`ArchiveReport`] and never abort the
//! remaining formats.

use crate::deleter::{BucketDeleter, BucketRemover};
use crate::error::{ArchiveError, ExportError, TransferError};
use crate::export::BucketExporter;
use crate::transfer::ArchiveBucketTransferer;
use frostline_archive::ArchivePath;
use frostline_model::{Bucket, BucketFormat, BucketKey};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why one format could not be archived
#[derive(Debug)]
pub enum FormatFailure {
    /// Export to the format failed
    Export(ExportError),
    /// Publishing the export failed
    Transfer(TransferError),
}

impl std::fmt::Display for FormatFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatFailure::Export(e) => write!(f, "{}", e),
            FormatFailure::Transfer(e) => write!(f, "{}", e),
        }
    }
}

/// Result of archiving one bucket in one format
#[derive(Debug)]
pub enum FormatOutcome {
    /// The archive already held this format
    AlreadyArchived,
    /// Published during this call
    Archived(ArchivePath),
    /// Not archived
    Failed(FormatFailure),
}

impl FormatOutcome {
    /// True if the archive holds the format after the call
    pub fn is_archived(&self) -> bool {
        !matches!(self, FormatOutcome::Failed(_))
    }
}

/// What [`BucketArchiver::archive_bucket`] did
#[derive(Debug)]
pub struct ArchiveReport {
    /// Identity of the source bucket
    pub bucket: BucketKey,
    /// Outcome per configured format, in configuration order
    pub outcomes: Vec<(BucketFormat, FormatOutcome)>,
    /// True if the local source directory was deleted
    pub source_deleted: bool,
    /// Local directories that could not be removed
    pub cleanup_failures: Vec<PathBuf>,
}

impl ArchiveReport {
    /// True if every configured format is in the archive
    pub fn all_archived(&self) -> bool {
        self.outcomes.iter().all(|(_, outcome)| outcome.is_archived())
    }

    /// True if every format is archived and the source is gone
    pub fn is_complete(&self) -> bool {
        self.all_archived() && self.source_deleted
    }

    /// Formats that could not be archived
    pub fn failed_formats(&self) -> Vec<BucketFormat> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_archived())
            .map(|(format, _)| *format)
            .collect()
    }

    /// One line per failed format
    pub fn failure_summary(&self) -> String {
        let mut lines: Vec<String> = self
            .outcomes
            .iter()
            .filter_map(|(format, outcome)| match outcome {
                FormatOutcome::Failed(failure) => Some(format!("{}: {}", format, failure)),
                _ => None,
            })
            .collect();
        if self.all_archived() && !self.source_deleted {
            lines.push("archived, but the local bucket could not be deleted".to_string());
        }
        lines.join("; ")
    }
}

/// Archives one bucket into every configured format
pub struct BucketArchiver {
    formats: Vec<BucketFormat>,
    exporter: BucketExporter,
    transferer: ArchiveBucketTransferer,
    deleter: Arc<dyn BucketRemover>,
}

impl BucketArchiver {
    /// Create an archiver for `formats`, attempted in the given order
    pub fn new(
        formats: Vec<BucketFormat>,
        exporter: BucketExporter,
        transferer: ArchiveBucketTransferer,
        deleter: BucketDeleter,
    ) -> Self {
        BucketArchiver {
            formats,
            exporter,
            transferer,
            deleter: Arc::new(deleter),
        }
    }

    /// Replace how local buckets and transient exports are removed
    pub fn with_remover(mut self, remover: Arc<dyn BucketRemover>) -> Self {
        self.deleter = remover;
        self
    }

    /// Configured formats
    pub fn formats(&self) -> &[BucketFormat] {
        &self.formats
    }

    /// Archive `bucket` in every configured format.
    ///
    /// Per-format failures are reported, not returned. Errors are returned
    /// only when no format could possibly be archived.
    pub fn archive_bucket(&self, bucket: &Bucket) -> Result<ArchiveReport, ArchiveError> {
        if self.formats.is_empty() {
            return Err(ArchiveError::NoFormatsConfigured);
        }

        let mut report = ArchiveReport {
            bucket: bucket.key(),
            outcomes: Vec::with_capacity(self.formats.len()),
            source_deleted: false,
            cleanup_failures: Vec::new(),
        };

        for &format in &self.formats {
            let outcome = self.archive_format(bucket, format, &mut report.cleanup_failures);
            if let FormatOutcome::Failed(failure) = &outcome {
                warn!(target: "frostline::archive", bucket = %bucket.key(), %format, error = %failure, "Format not archived");
            }
            report.outcomes.push((format, outcome));
        }

        let all_unknown = report.outcomes.iter().all(|(_, outcome)| {
            matches!(outcome, FormatOutcome::Failed(FormatFailure::Export(e)) if e.is_unknown_format())
        });
        if all_unknown {
            return Err(ArchiveError::UnknownFormat(self.formats.clone()));
        }

        if report.all_archived() {
            match self.deleter.delete_bucket(bucket) {
                Ok(()) => report.source_deleted = true,
                Err(e) => {
                    warn!(target: "frostline::archive", bucket = %bucket.key(), dir = %bucket.directory().display(), error = %e, "Archived bucket kept on disk");
                    report.cleanup_failures.push(bucket.directory().to_path_buf());
                }
            }
        }

        info!(
            target: "frostline::archive",
            bucket = %bucket.key(),
            archived = report.all_archived(),
            source_deleted = report.source_deleted,
            "Archive pass finished"
        );
        Ok(report)
    }

    fn archive_format(
        &self,
        bucket: &Bucket,
        format: BucketFormat,
        cleanup_failures: &mut Vec<PathBuf>,
    ) -> FormatOutcome {
        if format.is_known() {
            match self.transferer.is_archived(bucket, format) {
                Ok(true) => {
                    debug!(target: "frostline::archive", bucket = %bucket.key(), %format, "Already archived");
                    return FormatOutcome::AlreadyArchived;
                }
                Ok(false) => {}
                Err(e) => return FormatOutcome::Failed(FormatFailure::Transfer(e)),
            }
        }

        let exported = match self.exporter.export_bucket(bucket, format) {
            Ok(exported) => exported,
            Err(e) => return FormatOutcome::Failed(FormatFailure::Export(e)),
        };

        let outcome = match self.transferer.transfer_bucket_to_archive(&exported) {
            Ok(path) => FormatOutcome::Archived(path),
            Err(e) => FormatOutcome::Failed(FormatFailure::Transfer(e)),
        };

        if let Cow::Owned(transient) = &exported {
            if let Err(e) = self.deleter.delete_bucket(transient) {
                warn!(target: "frostline::archive", bucket = %transient.key(), dir = %transient.directory().display(), error = %e, "Transient export kept on disk");
                cleanup_failures.push(transient.directory().to_path_buf());
            }
        }
        outcome
    }
}
