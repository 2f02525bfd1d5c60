//! Compressed native buckets (`SPLUNK_BUCKET_TZST`)
//!
//! The bucket directory is packed into `<name>.tar.zst`, with the xxh3
//! checksum of the archive in `<name>.tar.zst.xxh3` next to it:
//!
//! ```text
//! <export>/<index>/SPLUNK_BUCKET_TZST/<name>/
//! ├── <name>.tar.zst        # tar of <name>/..., zstd compressed
//! └── <name>.tar.zst.xxh3   # 16 hex digits
//! ```

use super::FormatConverter;
use crate::error::ExportError;
use frostline_model::fs_util::remove_path;
use frostline_model::{Bucket, BucketFormat, LocalPaths};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder};
use tracing::info;
use xxhash_rust::xxh3::Xxh3;

/// Extension of the packed bucket
pub const ARCHIVE_EXTENSION: &str = "tar.zst";

/// Extension of the checksum sidecar
pub const CHECKSUM_EXTENSION: &str = "tar.zst.xxh3";

/// Packs native buckets into tar + zstd archives
pub struct CompressedExporter {
    export_dir: PathBuf,
    compression_level: i32,
}

impl CompressedExporter {
    /// Exporter writing into `export_dir`
    pub fn new(export_dir: impl Into<PathBuf>, compression_level: i32) -> Self {
        CompressedExporter {
            export_dir: export_dir.into(),
            compression_level,
        }
    }

    /// Exporter writing into the configured export staging area
    pub fn from_paths(paths: &LocalPaths, compression_level: i32) -> Self {
        Self::new(paths.export_dir(), compression_level)
    }

    /// Pack `source` into `dest`; `dest` appears complete or not at all
    fn pack(&self, source: &Path, root_name: &str, dest: &Path) -> Result<(), ExportError> {
        let temp = dest.with_extension("tmp");
        match self.pack_inner(source, root_name, &temp) {
            Ok(()) => {
                fs::rename(&temp, dest)?;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&temp);
                Err(e)
            }
        }
    }

    fn pack_inner(&self, source: &Path, root_name: &str, path: &Path) -> Result<(), ExportError> {
        let file = File::create(path)?;
        let encoder = zstd::Encoder::new(BufWriter::new(file), self.compression_level)?;

        let mut builder = Builder::new(encoder);
        builder.follow_symlinks(false);
        builder.append_dir_all(root_name, source)?;

        let encoder = builder.into_inner()?;
        let mut writer = encoder.finish()?;
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}

impl FormatConverter for CompressedExporter {
    fn target_format(&self) -> BucketFormat {
        BucketFormat::SplunkBucketTzst
    }

    fn convert(&self, bucket: &Bucket) -> Result<Bucket, ExportError> {
        let dir = self
            .export_dir
            .join(bucket.index())
            .join(BucketFormat::SplunkBucketTzst.as_str())
            .join(bucket.name());
        remove_path(&dir)?;
        fs::create_dir_all(&dir)?;

        let archive = dir.join(format!("{}.{}", bucket.name(), ARCHIVE_EXTENSION));
        self.pack(bucket.directory(), bucket.name(), &archive)?;

        let checksum = file_checksum(&archive)?;
        fs::write(
            dir.join(format!("{}.{}", bucket.name(), CHECKSUM_EXTENSION)),
            &checksum,
        )?;

        info!(
            target: "frostline::export",
            bucket = %bucket.name(),
            size = fs::metadata(&archive)?.len(),
            %checksum,
            "Compressed bucket"
        );
        Ok(bucket.derive(BucketFormat::SplunkBucketTzst, dir))
    }
}

/// Unpack a compressed bucket directory into `dest_parent/<name>`.
///
/// The checksum sidecar is verified when present.
pub fn unpack_bucket(
    compressed_dir: &Path,
    name: &str,
    dest_parent: &Path,
) -> Result<PathBuf, ExportError> {
    let archive = compressed_dir.join(format!("{}.{}", name, ARCHIVE_EXTENSION));
    let sidecar = compressed_dir.join(format!("{}.{}", name, CHECKSUM_EXTENSION));

    if sidecar.is_file() {
        let expected = fs::read_to_string(&sidecar)?.trim().to_string();
        let actual = file_checksum(&archive)?;
        if expected != actual {
            return Err(ExportError::ChecksumMismatch {
                path: archive,
                expected,
                actual,
            });
        }
    }

    fs::create_dir_all(dest_parent)?;
    let decoder = zstd::Decoder::new(File::open(&archive)?)?;
    Archive::new(decoder).unpack(dest_parent)?;

    let dest = dest_parent.join(name);
    if !dest.is_dir() {
        return Err(ExportError::failed(
            name,
            format!("{} does not contain {}/", archive.display(), name),
        ));
    }
    Ok(dest)
}

fn file_checksum(path: &Path) -> Result<String, ExportError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Xxh3::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:016x}", hasher.digest()))
}
