//! Failed-bucket recovery
//!
//! A recovery pass walks the registry and re-invokes the archive trigger
//! for every record that is due:
//!
//! - directory gone: the record is dropped
//! - attempts exhausted: the record is kept and skipped
//! - last attempt too recent: deferred, backoff doubles per attempt
//! - otherwise: retried; the trigger clears or updates the record
//!
//! [`RecoveryLoop`] runs passes periodically on a background thread.

use crate::error::{ArchiveError, RegistryResult};
use crate::registry::FailedBucketStore;
use crate::trigger::ArchiveTrigger;
use chrono::{DateTime, Utc};
use frostline_model::{BucketKey, RecoveryConfig};
use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry bounds for failed buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Attempts after which a record is no longer retried
    pub max_attempts: u32,
    /// Delay after the first failure
    pub base_backoff: Duration,
    /// Upper bound on the delay
    pub max_backoff: Duration,
}

impl RecoveryPolicy {
    /// Policy from configuration
    pub fn from_config(config: &RecoveryConfig) -> Self {
        RecoveryPolicy {
            max_attempts: config.max_attempts,
            base_backoff: Duration::from_secs(config.base_backoff_secs),
            max_backoff: Duration::from_secs(config.max_backoff_secs),
        }
    }

    /// Retry every record on every pass, without limit
    pub fn immediate() -> Self {
        RecoveryPolicy {
            max_attempts: u32::MAX,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retrying a record that has failed `attempts` times
    pub fn backoff(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempts - 1).min(31);
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    fn is_due(&self, attempts: u32, last_attempt_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(self.backoff(attempts)) {
            Ok(backoff) => now >= last_attempt_at + backoff,
            Err(_) => false,
        }
    }
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::from_config(&RecoveryConfig::default())
    }
}

/// What a recovery pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Archived in every format and removed from the registry
    pub recovered: Vec<BucketKey>,
    /// Retried and failed again
    pub still_failing: Vec<BucketKey>,
    /// Not retried yet because of backoff
    pub deferred: Vec<BucketKey>,
    /// Not retried because the attempt limit is reached
    pub exhausted: Vec<BucketKey>,
    /// Removed because the local directory no longer exists
    pub dropped: Vec<BucketKey>,
}

impl RecoveryReport {
    /// Number of records retried during the pass
    pub fn attempted(&self) -> usize {
        self.recovered.len() + self.still_failing.len()
    }
}

/// Re-archives buckets recorded in the failed-bucket registry
pub struct FailedBucketRestorer {
    registry: Arc<dyn FailedBucketStore>,
    policy: RecoveryPolicy,
}

impl FailedBucketRestorer {
    /// Create a restorer over `registry`
    pub fn new(registry: Arc<dyn FailedBucketStore>, policy: RecoveryPolicy) -> Self {
        FailedBucketRestorer { registry, policy }
    }

    /// Retry policy
    pub fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    /// Run one recovery pass through `trigger`
    pub fn recover_failed_buckets(
        &self,
        trigger: &dyn ArchiveTrigger,
    ) -> RegistryResult<RecoveryReport> {
        self.recover_failed_buckets_at(trigger, Utc::now())
    }

    /// Run one recovery pass as if the current time were `now`
    pub fn recover_failed_buckets_at(
        &self,
        trigger: &dyn ArchiveTrigger,
        now: DateTime<Utc>,
    ) -> RegistryResult<RecoveryReport> {
        let mut report = RecoveryReport::default();

        for record in self.registry.list()? {
            let key = record.key.clone();

            if !record.directory.is_dir() {
                info!(target: "frostline::recovery", bucket = %key, dir = %record.directory.display(), "Dropping failed bucket, directory is gone");
                self.registry.remove(&key)?;
                report.dropped.push(key);
                continue;
            }
            if record.attempts >= self.policy.max_attempts {
                debug!(target: "frostline::recovery", bucket = %key, attempts = record.attempts, "Retry limit reached");
                report.exhausted.push(key);
                continue;
            }
            if !self
                .policy
                .is_due(record.attempts, record.last_attempt_at, now)
            {
                report.deferred.push(key);
                continue;
            }

            match trigger.archive_bucket_directory(&key.index, &record.directory) {
                Ok(outcome) if outcome.is_complete() => {
                    info!(target: "frostline::recovery", bucket = %key, attempts = record.attempts, "Recovered failed bucket");
                    report.recovered.push(key);
                }
                Ok(_) => report.still_failing.push(key),
                Err(ArchiveError::Registry(e)) => return Err(e),
                Err(e) => {
                    warn!(target: "frostline::recovery", bucket = %key, error = %e, "Recovery attempt failed");
                    report.still_failing.push(key);
                }
            }
        }

        if report != RecoveryReport::default() {
            info!(
                target: "frostline::recovery",
                recovered = report.recovered.len(),
                still_failing = report.still_failing.len(),
                deferred = report.deferred.len(),
                exhausted = report.exhausted.len(),
                dropped = report.dropped.len(),
                "Recovery pass finished"
            );
        }
        Ok(report)
    }
}

/// Periodic recovery passes on a background thread
///
/// Stopped by [`RecoveryLoop::stop`] or on drop; a pass in progress is
/// finished first.
pub struct RecoveryLoop {
    shutdown: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl RecoveryLoop {
    /// Start running a pass every `interval`, the first one after `interval`
    pub fn spawn(
        restorer: Arc<FailedBucketRestorer>,
        trigger: Arc<dyn ArchiveTrigger>,
        interval: Duration,
    ) -> io::Result<Self> {
        let shutdown = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("frostline-recovery".to_string())
            .spawn(move || loop {
                {
                    let (lock, cvar) = &*signal;
                    let mut stopped = lock.lock();
                    if !*stopped {
                        cvar.wait_for(&mut stopped, interval);
                    }
                    if *stopped {
                        break;
                    }
                }

                if let Err(e) = restorer.recover_failed_buckets(trigger.as_ref()) {
                    warn!(target: "frostline::recovery", error = %e, "Recovery pass failed");
                }
            })?;

        Ok(RecoveryLoop {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Stop the loop and wait for the thread to exit
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        {
            let (lock, cvar) = &*self.shutdown;
            *lock.lock() = true;
            cvar.notify_all();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(target: "frostline::recovery", "Recovery thread panicked");
            }
        }
    }
}

impl Drop for RecoveryLoop {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
