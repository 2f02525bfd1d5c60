//! Failed-bucket recovery through the file registry

use crate::common::*;
use frostline::pipeline::{
    ArchiveTrigger, FailedBucketRestorer, FailedBucketStore, FileFailedBucketStore,
    LocalArchiveTrigger, RecoveryPolicy,
};
use std::sync::Arc;

struct Harness {
    runner: Arc<ScriptedRunner>,
    registry: Arc<dyn FailedBucketStore>,
    trigger: LocalArchiveTrigger,
}

fn harness(env: &TestEnv) -> Harness {
    let runner = ScriptedRunner::silent();
    let archiver = Arc::new(env.archiver(
        env.local_fs(),
        vec![BucketFormat::SplunkBucket, BucketFormat::Csv],
        runner.clone(),
    ));
    let registry: Arc<dyn FailedBucketStore> =
        Arc::new(FileFailedBucketStore::open(env.paths().failed_registry()).unwrap());
    let trigger = LocalArchiveTrigger::new(archiver, registry.clone());
    Harness {
        runner,
        registry,
        trigger,
    }
}

#[test]
fn partial_failure_is_recorded() {
    let env = TestEnv::new();
    let h = harness(&env);
    let bucket = env.make_bucket("main", 10, 20, 0);

    let report = h
        .trigger
        .archive_bucket_directory("main", bucket.directory())
        .unwrap();
    assert!(!report.all_archived());

    let records = h.registry.list().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, bucket.key());
    assert_eq!(records[0].directory, bucket.directory());
    assert_eq!(records[0].attempts, 1);
}

#[test]
fn registry_survives_reopen() {
    let env = TestEnv::new();
    let h = harness(&env);
    let bucket = env.make_bucket("main", 10, 20, 0);
    h.trigger
        .archive_bucket_directory("main", bucket.directory())
        .unwrap();
    drop(h);

    let reopened = FileFailedBucketStore::open(env.paths().failed_registry()).unwrap();
    let records = reopened.list().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key.name, "db_20_10_0");
}

#[test]
fn recovery_archives_once_export_works() {
    let env = TestEnv::new();
    let h = harness(&env);
    let bucket = env.make_bucket("main", 10, 20, 0);
    h.trigger
        .archive_bucket_directory("main", bucket.directory())
        .unwrap();

    let restorer = FailedBucketRestorer::new(h.registry.clone(), RecoveryPolicy::immediate());

    let report = restorer.recover_failed_buckets(&h.trigger).unwrap();
    assert_eq!(report.still_failing, vec![bucket.key()]);
    assert_eq!(h.registry.list().unwrap()[0].attempts, 2);

    h.runner.set_write_output(true);
    let report = restorer.recover_failed_buckets(&h.trigger).unwrap();

    assert_eq!(report.recovered, vec![bucket.key()]);
    assert!(h.registry.list().unwrap().is_empty());
    assert!(!bucket.directory().exists());
}

#[test]
fn recovery_drops_buckets_whose_directory_is_gone() {
    let env = TestEnv::new();
    let h = harness(&env);
    let bucket = env.make_bucket("main", 10, 20, 0);
    h.trigger
        .archive_bucket_directory("main", bucket.directory())
        .unwrap();
    std::fs::remove_dir_all(bucket.directory()).unwrap();

    let restorer = FailedBucketRestorer::new(h.registry.clone(), RecoveryPolicy::immediate());
    let report = restorer.recover_failed_buckets(&h.trigger).unwrap();

    assert_eq!(report.dropped, vec![bucket.key()]);
    assert!(h.registry.list().unwrap().is_empty());
    assert_eq!(h.runner.calls(), 1);
}

#[test]
fn recovery_respects_backoff() {
    let env = TestEnv::new();
    let h = harness(&env);
    let bucket = env.make_bucket("main", 10, 20, 0);
    h.trigger
        .archive_bucket_directory("main", bucket.directory())
        .unwrap();

    let restorer = FailedBucketRestorer::new(h.registry.clone(), RecoveryPolicy::default());
    let report = restorer.recover_failed_buckets(&h.trigger).unwrap();

    assert_eq!(report.deferred, vec![bucket.key()]);
    assert_eq!(report.attempted(), 0);
    assert_eq!(h.runner.calls(), 1);
}
