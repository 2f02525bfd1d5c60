//! Bucket format conversion
//!
//! The native format needs no conversion. Every other format is produced by
//! a [`FormatConverter`] that writes a transient bucket directory under the
//! export staging area; the archiver removes it once it has been published.

mod compressed;
mod csv;
mod runner;

pub use compressed::{unpack_bucket, CompressedExporter, ARCHIVE_EXTENSION, CHECKSUM_EXTENSION};
pub use csv::CsvExporter;
pub use runner::{CommandOutcome, CommandRunner, CommandSpec, ShellCommandRunner};

use crate::error::ExportError;
use frostline_model::{Bucket, BucketFormat};
use std::borrow::Cow;
use tracing::debug;

/// Converts a native bucket into one target format
pub trait FormatConverter: Send + Sync {
    /// Format this converter produces
    fn target_format(&self) -> BucketFormat;

    /// Write a converted copy of `bucket` and describe it.
    ///
    /// The returned bucket keeps the index, name and time range of the
    /// input and lives in a new directory.
    fn convert(&self, bucket: &Bucket) -> Result<Bucket, ExportError>;
}

/// Dispatches export requests to the registered converters
#[derive(Default)]
pub struct BucketExporter {
    converters: Vec<Box<dyn FormatConverter>>,
}

impl BucketExporter {
    /// Exporter with no converters; only same-format requests succeed
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a converter, replacing any earlier one for the same format
    pub fn with_converter(mut self, converter: impl FormatConverter + 'static) -> Self {
        let format = converter.target_format();
        self.converters.retain(|c| c.target_format() != format);
        self.converters.push(Box::new(converter));
        self
    }

    /// Formats that can be produced from a native bucket
    pub fn supported_formats(&self) -> Vec<BucketFormat> {
        let mut formats = vec![BucketFormat::SplunkBucket];
        formats.extend(self.converters.iter().map(|c| c.target_format()));
        formats
    }

    /// Export `bucket` to `format`.
    ///
    /// Returns the input unchanged when it already is in `format`, and a new
    /// transient bucket otherwise. An unknown `format` fails before any I/O.
    pub fn export_bucket<'a>(
        &self,
        bucket: &'a Bucket,
        format: BucketFormat,
    ) -> Result<Cow<'a, Bucket>, ExportError> {
        if !format.is_known() {
            return Err(ExportError::UnknownFormat(format));
        }
        if bucket.format() == format {
            return Ok(Cow::Borrowed(bucket));
        }

        let unsupported = || ExportError::UnsupportedConversion {
            from: bucket.format(),
            to: format,
        };
        if bucket.format() != BucketFormat::SplunkBucket {
            return Err(unsupported());
        }
        let converter = self
            .converters
            .iter()
            .find(|c| c.target_format() == format)
            .ok_or_else(unsupported)?;

        debug!(target: "frostline::export", bucket = %bucket.key(), %format, "Exporting bucket");
        converter.convert(bucket).map(Cow::Owned)
    }
}
