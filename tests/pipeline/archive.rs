//! Archive pipeline tests
//!
//! Source deletion, idempotence and transient cleanup across every format.

use crate::common::*;
use frostline::pipeline::{ExportError, FormatFailure, FormatOutcome};
use std::fs;

fn all_formats() -> Vec<BucketFormat> {
    vec![
        BucketFormat::SplunkBucket,
        BucketFormat::SplunkBucketTzst,
        BucketFormat::Csv,
    ]
}

// ============================================================================
// Full success
// ============================================================================

#[test]
fn all_formats_archived_deletes_source() {
    let env = TestEnv::new();
    let fs = env.local_fs();
    let archiver = env.archiver(fs.clone(), all_formats(), ScriptedRunner::succeeding());
    let bucket = env.make_bucket("main", 10, 20, 0);

    let report = archiver.archive_bucket(&bucket).unwrap();

    assert!(report.all_archived());
    assert!(report.source_deleted);
    assert!(report.cleanup_failures.is_empty());
    assert!(!bucket.directory().exists());

    let archived = env.lister(fs).list_buckets_in_index("main").unwrap();
    let mut formats: Vec<_> = archived.iter().map(|b| b.key.format).collect();
    formats.sort();
    let mut expected = all_formats();
    expected.sort();
    assert_eq!(formats, expected);
    assert!(archived.iter().all(|b| b.key.name == "db_20_10_0"));
}

#[test]
fn archived_native_bucket_keeps_its_files() {
    let env = TestEnv::new();
    let fs = env.local_fs();
    let archiver = env.archiver(
        fs.clone(),
        vec![BucketFormat::SplunkBucket],
        ScriptedRunner::succeeding(),
    );
    let bucket = env.make_bucket("main", 10, 20, 0);
    let before = files_under(bucket.directory());

    let report = archiver.archive_bucket(&bucket).unwrap();
    let FormatOutcome::Archived(path) = &report.outcomes[0].1 else {
        panic!("expected archived, got {:?}", report.outcomes[0].1);
    };

    let local = env.dir.path().join("archive").join(path.as_str());
    assert_eq!(files_under(&local), before);
    assert_eq!(
        fs::read_to_string(local.join("rawdata/journal.gz")).unwrap(),
        "journal-10"
    );
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn archiving_twice_is_idempotent() {
    let env = TestEnv::new();
    let fs = env.local_fs();
    let runner = ScriptedRunner::succeeding();
    let archiver = env.archiver(fs.clone(), all_formats(), runner.clone());
    let bucket = env.make_bucket("main", 10, 20, 0);

    archiver.archive_bucket(&bucket).unwrap();
    let listed_once = env.lister(fs.clone()).list_buckets_in_index("main").unwrap();
    assert_eq!(runner.calls(), 1);

    // The indexer hands over the same bucket again
    let bucket = env.make_bucket("main", 10, 20, 0);
    let report = archiver.archive_bucket(&bucket).unwrap();

    assert!(report
        .outcomes
        .iter()
        .all(|(_, outcome)| matches!(outcome, FormatOutcome::AlreadyArchived)));
    assert!(report.source_deleted);
    assert_eq!(runner.calls(), 1, "no export for already archived formats");
    assert_eq!(
        env.lister(fs).list_buckets_in_index("main").unwrap(),
        listed_once
    );
}

// ============================================================================
// Partial failure
// ============================================================================

#[test]
fn partial_failure_keeps_source() {
    let env = TestEnv::new();
    let fs = env.local_fs();
    let archiver = env.archiver(fs.clone(), all_formats(), ScriptedRunner::silent());
    let bucket = env.make_bucket("main", 10, 20, 0);

    let report = archiver.archive_bucket(&bucket).unwrap();

    assert!(!report.all_archived());
    assert!(!report.source_deleted);
    assert!(bucket.directory().is_dir());
    assert_eq!(report.failed_formats(), vec![BucketFormat::Csv]);

    let mut archived: Vec<_> = env
        .lister(fs)
        .list_buckets_in_index("main")
        .unwrap()
        .into_iter()
        .map(|b| b.key.format)
        .collect();
    archived.sort();
    let mut expected = vec![BucketFormat::SplunkBucket, BucketFormat::SplunkBucketTzst];
    expected.sort();
    assert_eq!(archived, expected);
}

#[test]
fn export_exit_zero_without_output_is_a_failure() {
    let env = TestEnv::new();
    let archiver = env.archiver(
        env.local_fs(),
        vec![BucketFormat::Csv],
        ScriptedRunner::silent(),
    );
    let bucket = env.make_bucket("main", 10, 20, 0);

    let report = archiver.archive_bucket(&bucket).unwrap();
    match &report.outcomes[0].1 {
        FormatOutcome::Failed(FormatFailure::Export(ExportError::Failed { bucket, .. })) => {
            assert_eq!(bucket, "db_20_10_0");
        }
        other => panic!("expected export failure, got {:?}", other),
    }
}

#[test]
fn failed_formats_archive_on_retry() {
    let env = TestEnv::new();
    let fs = env.local_fs();
    let runner = ScriptedRunner::silent();
    let archiver = env.archiver(fs.clone(), all_formats(), runner.clone());
    let bucket = env.make_bucket("main", 10, 20, 0);

    assert!(!archiver.archive_bucket(&bucket).unwrap().all_archived());

    runner.set_write_output(true);
    let report = archiver.archive_bucket(&bucket).unwrap();

    assert!(report.all_archived());
    assert!(report.source_deleted);
    assert!(matches!(
        report.outcomes[0].1,
        FormatOutcome::AlreadyArchived
    ));
    assert!(matches!(report.outcomes[2].1, FormatOutcome::Archived(_)));
}

// ============================================================================
// Transient exports
// ============================================================================

#[test]
fn transient_exports_are_removed() {
    let env = TestEnv::new();
    let archiver = env.archiver(env.local_fs(), all_formats(), ScriptedRunner::succeeding());
    let bucket = env.make_bucket("main", 10, 20, 0);

    archiver.archive_bucket(&bucket).unwrap();

    let paths = env.paths();
    assert!(files_under(&paths.export_dir()).is_empty());
    assert!(files_under(&paths.csv_dir()).is_empty());
}

#[test]
fn transient_exports_are_removed_when_transfer_is_skipped() {
    let env = TestEnv::new();
    let archiver = env.archiver(env.local_fs(), all_formats(), ScriptedRunner::silent());
    let bucket = env.make_bucket("main", 10, 20, 0);

    let report = archiver.archive_bucket(&bucket).unwrap();

    assert!(!report.all_archived());
    assert!(report.cleanup_failures.is_empty());
    assert!(files_under(&env.paths().export_dir()).is_empty());
}
