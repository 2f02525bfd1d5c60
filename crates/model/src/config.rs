//! Archiver configuration via `frostline.toml`
//!
//! The configuration is read once at startup and shared read-only. Core
//! components never read it directly; the factories in the pipeline and
//! thaw crates assemble collaborators from it.

use crate::bucket::validate_index;
use crate::format::BucketFormat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Config file name looked up in the working directory by the CLI.
pub const CONFIG_FILE_NAME: &str = "frostline.toml";

/// Archive storage backend selection, tagged by `backend = "..."`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ArchiveBackendConfig {
    /// A directory on a locally mounted filesystem
    Local {
        /// Root directory of the archive
        root: PathBuf,
    },
    /// Process-local object store, contents vanish on exit
    Memory,
    /// S3-compatible object storage
    S3 {
        /// Bucket name
        bucket: String,
        /// Region
        region: String,
        /// Key prefix under which the archive lives
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
        /// Custom endpoint (MinIO, Ceph, ...)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        /// Per-request timeout in seconds
        #[serde(default = "default_request_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for ArchiveBackendConfig {
    fn default() -> Self {
        ArchiveBackendConfig::Local {
            root: PathBuf::from("frostline-archive"),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    300
}

/// Local working directories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Root for staging areas and the failed-bucket registry
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        LocalConfig {
            working_dir: default_working_dir(),
        }
    }
}

fn default_working_dir() -> PathBuf {
    PathBuf::from("frostline-work")
}

/// External export tool used for csv conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Executable invoked as `<tool> <bucket dir> <dest csv> -csv`
    #[serde(default = "default_export_tool")]
    pub tool: PathBuf,
    /// Complete environment passed to the tool (nothing is inherited)
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Kill the tool after this many seconds
    #[serde(default = "default_export_timeout_secs")]
    pub timeout_secs: u64,
    /// zstd level for the compressed bucket format
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            tool: default_export_tool(),
            env: BTreeMap::new(),
            timeout_secs: default_export_timeout_secs(),
            compression_level: default_compression_level(),
        }
    }
}

fn default_export_tool() -> PathBuf {
    PathBuf::from("exporttool")
}

fn default_export_timeout_secs() -> u64 {
    3600
}

fn default_compression_level() -> i32 {
    3
}

/// Failed-bucket recovery bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Attempts after which a failed bucket is no longer retried
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff after the first failure, doubled per attempt
    #[serde(default = "default_base_backoff_secs")]
    pub base_backoff_secs: u64,
    /// Upper bound on the backoff
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Interval of the periodic recovery loop
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig {
            max_attempts: default_max_attempts(),
            base_backoff_secs: default_base_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_base_backoff_secs() -> u64 {
    60
}

fn default_max_backoff_secs() -> u64 {
    3600
}

fn default_interval_secs() -> u64 {
    300
}

/// Per-index settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory thawed buckets of this index are restored into
    pub thaw_path: PathBuf,
}

/// Process-wide archiver configuration loaded from `frostline.toml`.
///
/// # Example
///
/// ```toml
/// formats = ["SPLUNK_BUCKET", "CSV"]
/// cluster_name = "prod"
/// server_name = "idx01"
///
/// [archive]
/// backend = "local"
/// root = "/mnt/archive"
///
/// [indexes.main]
/// thaw_path = "/opt/splunk/var/lib/splunk/defaultdb/thaweddb"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Target formats, archived in this order
    #[serde(default = "default_formats")]
    pub formats: Vec<BucketFormat>,
    /// Cluster segment of every archive path
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,
    /// Server segment of every archive path
    #[serde(default = "default_server_name")]
    pub server_name: String,
    /// Archive storage backend
    #[serde(default)]
    pub archive: ArchiveBackendConfig,
    /// Local working directories
    #[serde(default)]
    pub local: LocalConfig,
    /// Export tool settings
    #[serde(default)]
    pub export: ExportConfig,
    /// Recovery bounds
    #[serde(default)]
    pub recovery: RecoveryConfig,
    /// Known indexes and their thaw locations
    #[serde(default)]
    pub indexes: BTreeMap<String, IndexConfig>,
}

fn default_formats() -> Vec<BucketFormat> {
    vec![BucketFormat::SplunkBucket]
}

fn default_cluster_name() -> String {
    "default".to_string()
}

fn default_server_name() -> String {
    "localhost".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            formats: default_formats(),
            cluster_name: default_cluster_name(),
            server_name: default_server_name(),
            archive: ArchiveBackendConfig::default(),
            local: LocalConfig::default(),
            export: ExportConfig::default(),
            recovery: RecoveryConfig::default(),
            indexes: BTreeMap::new(),
        }
    }
}

impl ArchiveConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Frostline archiver configuration
#
# Formats every bucket is archived in, attempted in this order.
# "SPLUNK_BUCKET" (native), "CSV" (requires the export tool),
# "SPLUNK_BUCKET_TZST" (native bucket as tar.zst)
formats = ["SPLUNK_BUCKET"]

# Path segments identifying this deployment inside the archive
cluster_name = "default"
server_name = "localhost"

[archive]
# "local" (root = directory), "memory", or "s3"
backend = "local"
root = "frostline-archive"
# backend = "s3"
# bucket = "my-archive"
# region = "us-east-1"
# prefix = "frozen"             # optional
# endpoint = "http://minio:9000" # optional
# timeout_secs = 300             # optional

[local]
# Staging areas, safe location and failed-bucket registry live here
working_dir = "frostline-work"

[export]
tool = "exporttool"
timeout_secs = 3600
compression_level = 3
# [export.env]
# SPLUNK_HOME = "/opt/splunk"

[recovery]
max_attempts = 10
base_backoff_secs = 60
max_backoff_secs = 3600
interval_secs = 300

# [indexes.main]
# thaw_path = "/opt/splunk/var/lib/splunk/defaultdb/thaweddb"
"#
    }

    /// Read, parse and validate config from a file path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ArchiveConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.formats.is_empty() {
            return Err(ConfigError::invalid("at least one archive format is required"));
        }
        let mut seen = BTreeSet::new();
        for format in &self.formats {
            if !format.is_known() {
                return Err(ConfigError::invalid("formats contains an unknown format"));
            }
            if !seen.insert(*format) {
                return Err(ConfigError::invalid(format!(
                    "format {} listed more than once",
                    format
                )));
            }
        }

        for (field, value) in [
            ("cluster_name", &self.cluster_name),
            ("server_name", &self.server_name),
        ] {
            let safe = !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !safe {
                return Err(ConfigError::invalid(format!(
                    "{} '{}' must be letters, digits, '_' or '-'",
                    field, value
                )));
            }
        }

        if let ArchiveBackendConfig::S3 { bucket, region, .. } = &self.archive {
            if bucket.is_empty() || region.is_empty() {
                return Err(ConfigError::invalid("s3 backend requires bucket and region"));
            }
        }

        for index in self.indexes.keys() {
            validate_index(index).map_err(|e| ConfigError::invalid(e.to_string()))?;
        }

        let recovery = &self.recovery;
        if recovery.max_attempts == 0 {
            return Err(ConfigError::invalid("recovery.max_attempts must be at least 1"));
        }
        if recovery.base_backoff_secs > recovery.max_backoff_secs {
            return Err(ConfigError::invalid(
                "recovery.base_backoff_secs exceeds recovery.max_backoff_secs",
            ));
        }

        Ok(())
    }
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config file '{}': {message}", .path.display())]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Config could not be written
    #[error("Failed to write config file '{}': {source}", .path.display())]
    Write {
        /// Config file path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// Config parsed but holds invalid values
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an invalid-config error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
