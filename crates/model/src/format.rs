//! Bucket storage formats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// On-disk encoding of a bucket
///
/// Serialized names match the archive path segments
/// (`SPLUNK_BUCKET`, `CSV`, `SPLUNK_BUCKET_TZST`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BucketFormat {
    /// The search engine's native bucket directory
    SplunkBucket,
    /// Portable row format produced by the export tool
    Csv,
    /// Native bucket packed as a zstd-compressed tar archive
    SplunkBucketTzst,
    /// Anything not recognized
    Unknown,
}

impl BucketFormat {
    /// Every recognized format, in thaw preference order
    pub const KNOWN: [BucketFormat; 3] = [
        BucketFormat::SplunkBucket,
        BucketFormat::SplunkBucketTzst,
        BucketFormat::Csv,
    ];

    /// Path segment / config name for this format
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketFormat::SplunkBucket => "SPLUNK_BUCKET",
            BucketFormat::Csv => "CSV",
            BucketFormat::SplunkBucketTzst => "SPLUNK_BUCKET_TZST",
            BucketFormat::Unknown => "UNKNOWN",
        }
    }

    /// True for every variant except [`BucketFormat::Unknown`]
    pub fn is_known(&self) -> bool {
        !matches!(self, BucketFormat::Unknown)
    }

    /// Rank used to pick one copy when a bucket is archived in several formats.
    /// Lower is preferred; the native format is always first.
    pub fn thaw_rank(&self) -> u8 {
        match self {
            BucketFormat::SplunkBucket => 0,
            BucketFormat::SplunkBucketTzst => 1,
            BucketFormat::Csv => 2,
            BucketFormat::Unknown => u8::MAX,
        }
    }
}

impl fmt::Display for BucketFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketFormat {
    type Err = std::convert::Infallible;

    /// Case-insensitive; unrecognized names map to [`BucketFormat::Unknown`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "SPLUNK_BUCKET" => BucketFormat::SplunkBucket,
            "CSV" => BucketFormat::Csv,
            "SPLUNK_BUCKET_TZST" => BucketFormat::SplunkBucketTzst,
            _ => BucketFormat::Unknown,
        })
    }
}

impl From<String> for BucketFormat {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(format) => format,
            Err(never) => match never {},
        }
    }
}

impl From<BucketFormat> for String {
    fn from(format: BucketFormat) -> Self {
        format.as_str().to_string()
    }
}
