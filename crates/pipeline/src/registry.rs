//! Durable registry of buckets whose archival failed
//!
//! Written by the archive trigger on failure, read and pruned by the
//! recovery pass. Recording a failure for a bucket already in the registry
//! bumps its attempt count instead of adding a second record.

use crate::error::{RegistryError, RegistryResult};
use chrono::{DateTime, Utc};
use frostline_model::BucketKey;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A bucket whose archival did not complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedBucketRecord {
    /// Identity of the local bucket
    pub key: BucketKey,
    /// Local directory holding the bucket
    pub directory: PathBuf,
    /// Last failure, human readable
    pub reason: String,
    /// Failed attempts so far
    pub attempts: u32,
    /// When the first attempt failed
    pub first_failed_at: DateTime<Utc>,
    /// When the last attempt failed
    pub last_attempt_at: DateTime<Utc>,
}

/// Append/enumerate/remove store for failed buckets
pub trait FailedBucketStore: Send + Sync {
    /// Record a failed attempt, creating or updating the bucket's record
    fn record_failure(
        &self,
        key: &BucketKey,
        directory: &Path,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RegistryResult<FailedBucketRecord>;

    /// Every record, ordered by bucket identity
    fn list(&self) -> RegistryResult<Vec<FailedBucketRecord>>;

    /// Forget a bucket; returns false if it was not recorded
    fn remove(&self, key: &BucketKey) -> RegistryResult<bool>;
}

fn upsert(
    records: &mut BTreeMap<BucketKey, FailedBucketRecord>,
    key: &BucketKey,
    directory: &Path,
    reason: &str,
    at: DateTime<Utc>,
) -> FailedBucketRecord {
    let record = records
        .entry(key.clone())
        .and_modify(|r| {
            r.directory = directory.to_path_buf();
            r.reason = reason.to_string();
            r.attempts = r.attempts.saturating_add(1);
            r.last_attempt_at = at;
        })
        .or_insert_with(|| FailedBucketRecord {
            key: key.clone(),
            directory: directory.to_path_buf(),
            reason: reason.to_string(),
            attempts: 1,
            first_failed_at: at,
            last_attempt_at: at,
        });
    record.clone()
}

/// Registry held in memory, lost on exit
#[derive(Debug, Default)]
pub struct InMemoryFailedBucketStore {
    records: Mutex<BTreeMap<BucketKey, FailedBucketRecord>>,
}

impl InMemoryFailedBucketStore {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }
}

impl FailedBucketStore for InMemoryFailedBucketStore {
    fn record_failure(
        &self,
        key: &BucketKey,
        directory: &Path,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RegistryResult<FailedBucketRecord> {
        Ok(upsert(&mut self.records.lock(), key, directory, reason, at))
    }

    fn list(&self) -> RegistryResult<Vec<FailedBucketRecord>> {
        Ok(self.records.lock().values().cloned().collect())
    }

    fn remove(&self, key: &BucketKey) -> RegistryResult<bool> {
        Ok(self.records.lock().remove(key).is_some())
    }
}

/// Registry in a JSON-lines file
///
/// Every change rewrites the file through a temp file and rename, so a
/// crash leaves either the old or the new registry. The mutex serializes
/// writers within the process.
#[derive(Debug)]
pub struct FileFailedBucketStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileFailedBucketStore {
    /// Registry at `path`; the file is created on the first failure
    pub fn open(path: impl Into<PathBuf>) -> RegistryResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let store = FileFailedBucketStore {
            path,
            lock: Mutex::new(()),
        };
        // Surface corruption at startup rather than on the first failure
        store.load()?;
        Ok(store)
    }

    /// Registry file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> RegistryResult<BTreeMap<BucketKey, FailedBucketRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = BTreeMap::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: FailedBucketRecord =
                serde_json::from_str(&line).map_err(|e| RegistryError::Corrupt {
                    path: self.path.clone(),
                    line: i + 1,
                    reason: e.to_string(),
                })?;
            records.insert(record.key.clone(), record);
        }
        Ok(records)
    }

    fn store(&self, records: &BTreeMap<BucketKey, FailedBucketRecord>) -> RegistryResult<()> {
        let temp = self.path.with_extension("tmp");
        match Self::write_records(&temp, records) {
            Ok(()) => {
                fs::rename(&temp, &self.path)?;
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&temp);
                Err(e)
            }
        }
    }

    fn write_records(
        path: &Path,
        records: &BTreeMap<BucketKey, FailedBucketRecord>,
    ) -> RegistryResult<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);
        for record in records.values() {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }
}

impl FailedBucketStore for FileFailedBucketStore {
    fn record_failure(
        &self,
        key: &BucketKey,
        directory: &Path,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RegistryResult<FailedBucketRecord> {
        let _guard = self.lock.lock();
        let mut records = self.load()?;
        let record = upsert(&mut records, key, directory, reason, at);
        self.store(&records)?;
        debug!(target: "frostline::recovery", bucket = %key, attempts = record.attempts, "Recorded failed bucket");
        Ok(record)
    }

    fn list(&self) -> RegistryResult<Vec<FailedBucketRecord>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.into_values().collect())
    }

    fn remove(&self, key: &BucketKey) -> RegistryResult<bool> {
        let _guard = self.lock.lock();
        let mut records = self.load()?;
        if records.remove(key).is_none() {
            return Ok(false);
        }
        self.store(&records)?;
        debug!(target: "frostline::recovery", bucket = %key, "Removed failed bucket");
        Ok(true)
    }
}
