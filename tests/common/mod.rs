//! Shared fixtures for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;

pub use frostline::archive::{
    ArchiveFileSystem, ArchiveFsError, ArchiveFsResult, ArchivePath, ArchivedBucketLister,
    BucketSizeTracker, LocalArchiveFileSystem, ObjectStoreArchiveFileSystem, PathResolver,
};
pub use frostline::model::{
    ArchiveBackendConfig, ArchiveConfig, Bucket, BucketFormat, IndexConfig, LocalConfig,
    LocalPaths, TimeRange,
};
pub use frostline::pipeline::{
    ArchiveBucketTransferer, BucketArchiver, BucketDeleter, BucketExporter, BucketRemover,
    CommandOutcome, CommandRunner, CommandSpec, CompressedExporter, CsvExporter,
};

// ============================================================================
// Export tool stand-in
// ============================================================================

/// Stands in for the csv export tool.
///
/// Exits with `exit`; when `write_output` is set it also writes the csv file
/// named by the second argument, like the real tool does.
pub struct ScriptedRunner {
    exit: Mutex<CommandOutcome>,
    write_output: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedRunner {
    /// Tool that exports successfully
    pub fn succeeding() -> Arc<Self> {
        Self::new(CommandOutcome::Exited(0), true)
    }

    /// Tool that exits 0 without producing a file
    pub fn silent() -> Arc<Self> {
        Self::new(CommandOutcome::Exited(0), false)
    }

    pub fn new(exit: CommandOutcome, write_output: bool) -> Arc<Self> {
        Arc::new(ScriptedRunner {
            exit: Mutex::new(exit),
            write_output: AtomicBool::new(write_output),
            calls: AtomicUsize::new(0),
        })
    }

    /// Start (or stop) producing output on later runs
    pub fn set_write_output(&self, write_output: bool) {
        self.write_output.store(write_output, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandSpec) -> io::Result<CommandOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.write_output.load(Ordering::SeqCst) {
            let dest = PathBuf::from(&command.args[1]);
            fs::write(dest, b"_time,_raw\n15,event\n")?;
        }
        Ok(*self.exit.lock())
    }
}

// ============================================================================
// Fault injection
// ============================================================================

/// Local archive whose publishes or small-object writes can be made to fail
pub struct FaultyArchiveFs {
    inner: LocalArchiveFileSystem,
    fail_put: AtomicBool,
    fail_write_bytes: AtomicBool,
}

impl FaultyArchiveFs {
    pub fn new(root: &Path) -> Arc<Self> {
        Arc::new(FaultyArchiveFs {
            inner: LocalArchiveFileSystem::new(root).unwrap(),
            fail_put: AtomicBool::new(false),
            fail_write_bytes: AtomicBool::new(false),
        })
    }

    pub fn set_fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_write_bytes(&self, fail: bool) {
        self.fail_write_bytes.store(fail, Ordering::SeqCst);
    }

    fn refused(op: &str) -> ArchiveFsError {
        ArchiveFsError::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("{} refused by storage", op),
        ))
    }
}

impl ArchiveFileSystem for FaultyArchiveFs {
    fn backend_name(&self) -> &'static str {
        "faulty"
    }

    fn put(&self, local: &Path, dest: &ArchivePath) -> ArchiveFsResult<()> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(Self::refused("put"));
        }
        self.inner.put(local, dest)
    }

    fn get(&self, src: &ArchivePath, local: &Path) -> ArchiveFsResult<()> {
        self.inner.get(src, local)
    }

    fn list(&self, prefix: &ArchivePath) -> ArchiveFsResult<Vec<ArchivePath>> {
        self.inner.list(prefix)
    }

    fn exists(&self, path: &ArchivePath) -> ArchiveFsResult<bool> {
        self.inner.exists(path)
    }

    fn write_bytes(&self, data: &[u8], dest: &ArchivePath) -> ArchiveFsResult<()> {
        if self.fail_write_bytes.load(Ordering::SeqCst) {
            return Err(Self::refused("write"));
        }
        self.inner.write_bytes(data, dest)
    }

    fn read_bytes(&self, src: &ArchivePath) -> ArchiveFsResult<Vec<u8>> {
        self.inner.read_bytes(src)
    }
}

/// Deletes like [`BucketDeleter`] unless it is stuck
pub struct StickyRemover {
    stuck: AtomicBool,
}

impl StickyRemover {
    pub fn stuck() -> Arc<Self> {
        Arc::new(StickyRemover {
            stuck: AtomicBool::new(true),
        })
    }

    pub fn unstick(&self) {
        self.stuck.store(false, Ordering::SeqCst);
    }
}

impl BucketRemover for StickyRemover {
    fn delete_bucket(&self, bucket: &Bucket) -> io::Result<()> {
        if self.stuck.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "device or resource busy"));
        }
        BucketDeleter::new().delete_bucket(bucket)
    }
}

// ============================================================================
// Environment
// ============================================================================

/// A temp directory holding local archive storage, a working directory, a
/// thaw directory for index `main` and a place to create source buckets.
pub struct TestEnv {
    pub dir: TempDir,
    pub config: ArchiveConfig,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ArchiveConfig {
            formats: vec![
                BucketFormat::SplunkBucket,
                BucketFormat::SplunkBucketTzst,
                BucketFormat::Csv,
            ],
            archive: ArchiveBackendConfig::Local {
                root: dir.path().join("archive"),
            },
            local: LocalConfig {
                working_dir: dir.path().join("work"),
            },
            ..ArchiveConfig::default()
        };
        config.indexes.insert(
            "main".to_string(),
            IndexConfig {
                thaw_path: dir.path().join("thaw/main"),
            },
        );
        TestEnv { dir, config }
    }

    /// Archive storage rooted at the configured local directory
    pub fn local_fs(&self) -> Arc<dyn ArchiveFileSystem> {
        Arc::new(LocalArchiveFileSystem::new(self.dir.path().join("archive")).unwrap())
    }

    pub fn paths(&self) -> LocalPaths {
        let paths = LocalPaths::from_root(&self.config.local.working_dir);
        paths.create_directories().unwrap();
        paths
    }

    pub fn resolver(&self) -> PathResolver {
        PathResolver::from_config(&self.config).unwrap()
    }

    pub fn thaw_dir(&self) -> PathBuf {
        self.dir.path().join("thaw/main")
    }

    /// Create a native bucket `db_<latest>_<earliest>_<id>` under `source/`
    pub fn make_bucket(&self, index: &str, earliest: i64, latest: i64, id: u32) -> Bucket {
        let dir = self
            .dir
            .path()
            .join("source")
            .join(format!("db_{}_{}_{}", latest, earliest, id));
        write_bucket_files(&dir, earliest);
        Bucket::from_native_directory(index, &dir).unwrap()
    }

    /// Archiver over `fs` with the compressed and csv converters,
    /// the csv one driven by `runner`
    pub fn archiver(
        &self,
        fs: Arc<dyn ArchiveFileSystem>,
        formats: Vec<BucketFormat>,
        runner: Arc<ScriptedRunner>,
    ) -> BucketArchiver {
        let paths = self.paths();
        let exporter = BucketExporter::new()
            .with_converter(
                CsvExporter::new("/opt/splunk/bin/exporttool", paths.csv_dir(), paths.export_dir())
                    .with_runner(runner),
            )
            .with_converter(CompressedExporter::new(paths.export_dir(), 3));
        BucketArchiver::new(
            formats,
            exporter,
            ArchiveBucketTransferer::new(fs, self.resolver()),
            BucketDeleter::new(),
        )
    }

    pub fn lister(&self, fs: Arc<dyn ArchiveFileSystem>) -> ArchivedBucketLister {
        ArchivedBucketLister::new(fs, self.resolver())
    }
}

/// Write a small bucket tree: raw journal plus an index file
pub fn write_bucket_files(dir: &Path, marker: i64) {
    fs::create_dir_all(dir.join("rawdata")).unwrap();
    fs::write(dir.join("rawdata/journal.gz"), format!("journal-{}", marker)).unwrap();
    fs::write(dir.join("Hosts.data"), b"host=web01\n").unwrap();
}

/// Every file below `dir`, relative and sorted
pub fn files_under(dir: &Path) -> Vec<String> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                out.push(path.strip_prefix(base).unwrap().display().to_string());
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}
