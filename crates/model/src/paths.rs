//! Local working directory structure
//!
//! ```text
//! frostline-work/
//! ├── safe/                  # Buckets handed over by the engine, awaiting archival
//! │   └── <index>/<bucket>/
//! ├── csv/                   # Raw export tool output
//! ├── export/                # Transient converted buckets
//! ├── thaw-staging/          # Buckets being restored, renamed into place when complete
//! └── failed-buckets.jsonl   # Durable failed-bucket registry
//! ```

use std::path::{Path, PathBuf};

/// Paths inside the local working directory
#[derive(Debug, Clone)]
pub struct LocalPaths {
    root: PathBuf,
}

impl LocalPaths {
    /// Create paths from the working directory
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        LocalPaths {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Working directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where buckets are moved before archival starts
    pub fn safe_dir(&self) -> PathBuf {
        self.root.join("safe")
    }

    /// Safe location of one bucket
    pub fn safe_bucket_dir(&self, index: &str, bucket_name: &str) -> PathBuf {
        self.safe_dir().join(index).join(bucket_name)
    }

    /// Export tool output directory
    pub fn csv_dir(&self) -> PathBuf {
        self.root.join("csv")
    }

    /// Converted bucket directory
    pub fn export_dir(&self) -> PathBuf {
        self.root.join("export")
    }

    /// Thaw staging directory
    pub fn thaw_staging_dir(&self) -> PathBuf {
        self.root.join("thaw-staging")
    }

    /// Failed-bucket registry file
    pub fn failed_registry(&self) -> PathBuf {
        self.root.join("failed-buckets.jsonl")
    }

    /// Create every directory
    pub fn create_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.safe_dir())?;
        std::fs::create_dir_all(self.csv_dir())?;
        std::fs::create_dir_all(self.export_dir())?;
        std::fs::create_dir_all(self.thaw_staging_dir())?;
        Ok(())
    }
}
