//! Csv export through the external export tool
//!
//! The tool is invoked as `<tool> <bucket dir> <dest csv> -csv`. Success
//! requires exit status 0 and the csv file existing afterwards.

use super::runner::{CommandOutcome, CommandRunner, CommandSpec, ShellCommandRunner};
use super::FormatConverter;
use crate::error::ExportError;
use frostline_model::fs_util::{move_path, remove_path};
use frostline_model::{Bucket, BucketFormat, ExportConfig, LocalPaths};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Exports native buckets to csv with the export tool
pub struct CsvExporter {
    tool: PathBuf,
    env: BTreeMap<String, String>,
    timeout: Duration,
    csv_dir: PathBuf,
    export_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl CsvExporter {
    /// Exporter writing raw csv files into `csv_dir` and csv buckets into `export_dir`
    pub fn new(
        tool: impl Into<PathBuf>,
        csv_dir: impl Into<PathBuf>,
        export_dir: impl Into<PathBuf>,
    ) -> Self {
        let defaults = ExportConfig::default();
        CsvExporter {
            tool: tool.into(),
            env: defaults.env,
            timeout: Duration::from_secs(defaults.timeout_secs),
            csv_dir: csv_dir.into(),
            export_dir: export_dir.into(),
            runner: Arc::new(ShellCommandRunner::new()),
        }
    }

    /// Exporter built from configuration
    pub fn from_config(config: &ExportConfig, paths: &LocalPaths) -> Self {
        Self::new(config.tool.clone(), paths.csv_dir(), paths.export_dir())
            .with_env(config.env.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    /// Replace the environment passed to the tool
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Replace the tool timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the command runner
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Where the tool writes the csv for `bucket`
    pub fn csv_file(&self, bucket: &Bucket) -> PathBuf {
        self.csv_dir
            .join(bucket.index())
            .join(format!("{}.csv", bucket.name()))
    }

    /// Run the export tool and return the csv file it produced
    pub fn export_bucket_to_csv(&self, bucket: &Bucket) -> Result<PathBuf, ExportError> {
        let csv_file = absolute(&self.csv_file(bucket))?;
        if let Some(parent) = csv_file.parent() {
            fs::create_dir_all(parent)?;
        }
        // A stale file from an earlier run would pass the existence check
        remove_path(&csv_file)?;

        let command = CommandSpec {
            program: self.tool.clone(),
            args: vec![
                absolute(bucket.directory())?.into_os_string(),
                csv_file.clone().into_os_string(),
                "-csv".into(),
            ],
            env: self.env.clone(),
            timeout: self.timeout,
        };

        debug!(target: "frostline::export", bucket = %bucket.name(), argv = ?command.argv(), "Running export tool");
        let outcome = self.runner.run(&command).map_err(|e| {
            ExportError::failed(
                bucket.name(),
                format!("could not run {}: {}", self.tool.display(), e),
            )
        })?;

        match outcome {
            CommandOutcome::Exited(0) => {}
            CommandOutcome::Exited(code) => {
                return Err(ExportError::failed(
                    bucket.name(),
                    format!("export tool exited with status {}: {:?}", code, command.argv()),
                ));
            }
            CommandOutcome::Terminated => {
                return Err(ExportError::failed(
                    bucket.name(),
                    "export tool was terminated by a signal",
                ));
            }
            CommandOutcome::TimedOut => {
                return Err(ExportError::Timeout {
                    bucket: bucket.name().to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        }

        if !csv_file.is_file() {
            return Err(ExportError::failed(
                bucket.name(),
                format!(
                    "export tool exited successfully but {} does not exist",
                    csv_file.display()
                ),
            ));
        }
        Ok(csv_file)
    }

    fn bucket_dir(&self, bucket: &Bucket) -> PathBuf {
        self.export_dir
            .join(bucket.index())
            .join(BucketFormat::Csv.as_str())
            .join(bucket.name())
    }
}

impl FormatConverter for CsvExporter {
    fn target_format(&self) -> BucketFormat {
        BucketFormat::Csv
    }

    fn convert(&self, bucket: &Bucket) -> Result<Bucket, ExportError> {
        let csv_file = self.export_bucket_to_csv(bucket)?;

        let dir = self.bucket_dir(bucket);
        remove_path(&dir)?;
        fs::create_dir_all(&dir)?;
        move_path(&csv_file, &dir.join(format!("{}.csv", bucket.name())))?;

        info!(target: "frostline::export", bucket = %bucket.name(), dir = %dir.display(), "Exported bucket to csv");
        Ok(bucket.derive(BucketFormat::Csv, dir))
    }
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
