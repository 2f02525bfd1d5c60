//! Failures after export: publish, size sidecar and source deletion

use crate::common::*;
use frostline::pipeline::{
    ArchiveTrigger, FailedBucketRestorer, FailedBucketStore, FileFailedBucketStore,
    FormatFailure, FormatOutcome, LocalArchiveTrigger, RecoveryPolicy, TransferError,
};
use std::sync::Arc;

fn formats() -> Vec<BucketFormat> {
    vec![BucketFormat::SplunkBucket, BucketFormat::SplunkBucketTzst]
}

fn file_registry(env: &TestEnv) -> Arc<dyn FailedBucketStore> {
    Arc::new(FileFailedBucketStore::open(env.paths().failed_registry()).unwrap())
}

// ============================================================================
// Publish failures
// ============================================================================

#[test]
fn failed_publish_keeps_source_and_queues_bucket() {
    let env = TestEnv::new();
    let storage = FaultyArchiveFs::new(&env.dir.path().join("archive"));
    storage.set_fail_put(true);
    let archiver = env.archiver(storage.clone(), formats(), ScriptedRunner::succeeding());
    let registry = file_registry(&env);
    let trigger = LocalArchiveTrigger::new(Arc::new(archiver), registry.clone());
    let bucket = env.make_bucket("main", 10, 20, 0);

    let report = trigger
        .archive_bucket_directory("main", bucket.directory())
        .unwrap();

    for (_, outcome) in &report.outcomes {
        assert!(matches!(
            outcome,
            FormatOutcome::Failed(FormatFailure::Transfer(TransferError::Publish { .. }))
        ));
    }
    assert!(!report.source_deleted);
    assert!(bucket.directory().is_dir());
    assert!(env.lister(storage.clone()).list_buckets_in_index("main").unwrap().is_empty());
    assert!(files_under(&env.paths().export_dir()).is_empty());
    assert_eq!(registry.list().unwrap().len(), 1);

    storage.set_fail_put(false);
    let restorer = FailedBucketRestorer::new(registry.clone(), RecoveryPolicy::immediate());
    let recovered = restorer.recover_failed_buckets(&trigger).unwrap();

    assert_eq!(recovered.recovered, vec![bucket.key()]);
    assert!(registry.list().unwrap().is_empty());
    assert!(!bucket.directory().exists());
    assert_eq!(env.lister(storage).list_buckets_in_index("main").unwrap().len(), 2);
}

// ============================================================================
// Size sidecar failures
// ============================================================================

#[test]
fn failed_size_write_leaves_format_unarchived() {
    let env = TestEnv::new();
    let storage = FaultyArchiveFs::new(&env.dir.path().join("archive"));
    storage.set_fail_write_bytes(true);
    let archiver = env.archiver(
        storage.clone(),
        vec![BucketFormat::SplunkBucket],
        ScriptedRunner::succeeding(),
    );
    let bucket = env.make_bucket("main", 10, 20, 0);

    let report = archiver.archive_bucket(&bucket).unwrap();

    assert!(matches!(
        report.outcomes[0].1,
        FormatOutcome::Failed(FormatFailure::Transfer(TransferError::SizeWrite { .. }))
    ));
    assert!(!report.source_deleted);
    assert!(bucket.directory().is_dir());
    assert!(env.lister(storage.clone()).list_buckets_in_index("main").unwrap().is_empty());

    storage.set_fail_write_bytes(false);
    let report = archiver.archive_bucket(&bucket).unwrap();

    let FormatOutcome::Archived(path) = &report.outcomes[0].1 else {
        panic!("expected a fresh publish, got {:?}", report.outcomes[0].1);
    };
    assert!(report.source_deleted);
    let sizes = BucketSizeTracker::new(storage, env.resolver());
    assert!(sizes.read_size(path).unwrap().is_some());
}

// ============================================================================
// Source deletion failures
// ============================================================================

#[test]
fn undeleted_source_survives_in_registry_until_removed() {
    let env = TestEnv::new();
    let remover = StickyRemover::stuck();
    let archiver = env
        .archiver(
            env.local_fs(),
            vec![BucketFormat::SplunkBucket],
            ScriptedRunner::succeeding(),
        )
        .with_remover(remover.clone());
    let registry = file_registry(&env);
    let trigger = LocalArchiveTrigger::new(Arc::new(archiver), registry.clone());
    let bucket = env.make_bucket("main", 10, 20, 0);

    let report = trigger
        .archive_bucket_directory("main", bucket.directory())
        .unwrap();

    assert!(report.all_archived());
    assert!(!report.source_deleted);
    assert!(!report.is_complete());
    assert_eq!(report.cleanup_failures, vec![bucket.directory().to_path_buf()]);
    assert!(bucket.directory().is_dir());

    let reopened = FileFailedBucketStore::open(env.paths().failed_registry()).unwrap();
    assert_eq!(reopened.list().unwrap().len(), 1);

    remover.unstick();
    let restorer = FailedBucketRestorer::new(registry.clone(), RecoveryPolicy::immediate());
    let recovered = restorer.recover_failed_buckets(&trigger).unwrap();

    assert_eq!(recovered.recovered, vec![bucket.key()]);
    assert!(registry.list().unwrap().is_empty());
    assert!(!bucket.directory().exists());
}
