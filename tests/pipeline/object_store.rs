//! The pipeline over an object-store backed archive

use crate::common::*;
use frostline::pipeline::FormatOutcome;
use frostline::thaw::ThawerFactory;
use std::fs;
use std::sync::Arc;

#[test]
fn archive_list_and_thaw_in_memory() {
    let env = TestEnv::new();
    let fs: Arc<dyn ArchiveFileSystem> =
        Arc::new(ObjectStoreArchiveFileSystem::in_memory().unwrap());
    let archiver = env.archiver(
        fs.clone(),
        vec![BucketFormat::SplunkBucket, BucketFormat::SplunkBucketTzst],
        ScriptedRunner::succeeding(),
    );
    let bucket = env.make_bucket("main", 10, 20, 0);
    let files = files_under(bucket.directory());

    let report = archiver.archive_bucket(&bucket).unwrap();
    assert!(report.all_archived());
    assert!(!bucket.directory().exists());

    let lister = env.lister(fs.clone());
    assert_eq!(lister.list_indexes().unwrap(), vec!["main".to_string()]);
    assert_eq!(lister.list_buckets_in_index("main").unwrap().len(), 2);

    let thaw = ThawerFactory::build_with_fs(&env.config, fs).unwrap();
    let thawed = thaw
        .thawer
        .thaw_buckets("main", TimeRange::new(0, 100).unwrap())
        .unwrap();

    assert!(thawed.failed.is_empty());
    assert_eq!(thawed.thawed.len(), 1);
    let restored = env.thaw_dir().join("db_20_10_0");
    assert_eq!(files_under(&restored), files);
    assert_eq!(
        fs::read_to_string(restored.join("rawdata/journal.gz")).unwrap(),
        "journal-10"
    );
}

#[test]
fn second_archive_in_memory_is_already_archived() {
    let env = TestEnv::new();
    let fs: Arc<dyn ArchiveFileSystem> =
        Arc::new(ObjectStoreArchiveFileSystem::in_memory().unwrap());
    let archiver = env.archiver(
        fs,
        vec![BucketFormat::SplunkBucket],
        ScriptedRunner::succeeding(),
    );

    archiver
        .archive_bucket(&env.make_bucket("main", 10, 20, 0))
        .unwrap();
    let report = archiver
        .archive_bucket(&env.make_bucket("main", 10, 20, 0))
        .unwrap();

    assert!(matches!(report.outcomes[0].1, FormatOutcome::AlreadyArchived));
    assert!(report.source_deleted);
}
