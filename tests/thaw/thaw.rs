//! Thawing archived buckets by time range

use crate::common::*;
use frostline::thaw::{ThawError, ThawerFactory};
use std::collections::BTreeSet;
use std::fs;

/// Archive `[0,10]`, `[20,30]` and `[40,50]` of `main` in `formats`
fn archive_three(env: &TestEnv, formats: Vec<BucketFormat>) {
    let archiver = env.archiver(env.local_fs(), formats, ScriptedRunner::succeeding());
    for (earliest, latest, id) in [(0, 10, 1), (20, 30, 2), (40, 50, 3)] {
        let report = archiver
            .archive_bucket(&env.make_bucket("main", earliest, latest, id))
            .unwrap();
        assert!(report.all_archived());
    }
}

fn names(buckets: &[Bucket]) -> BTreeSet<String> {
    buckets.iter().map(|b| b.name().to_string()).collect()
}

#[test]
fn thaw_selects_overlapping_buckets() {
    let env = TestEnv::new();
    archive_three(&env, vec![BucketFormat::SplunkBucket]);
    let services = ThawerFactory::build_with_fs(&env.config, env.local_fs()).unwrap();

    let report = services
        .thawer
        .thaw_buckets("main", TimeRange::new(15, 45).unwrap())
        .unwrap();

    assert!(report.failed.is_empty());
    assert_eq!(
        names(&report.thawed),
        BTreeSet::from(["db_30_20_2".to_string(), "db_50_40_3".to_string()])
    );
    assert!(!env.thaw_dir().join("db_10_0_1").exists());
    for bucket in &report.thawed {
        assert_eq!(bucket.directory(), env.thaw_dir().join(bucket.name()));
        assert_eq!(bucket.format(), BucketFormat::SplunkBucket);
        assert!(bucket.directory().join("rawdata/journal.gz").is_file());
    }
}

#[test]
fn thaw_range_boundaries_are_inclusive() {
    let env = TestEnv::new();
    archive_three(&env, vec![BucketFormat::SplunkBucket]);
    let services = ThawerFactory::build_with_fs(&env.config, env.local_fs()).unwrap();

    let report = services
        .thawer
        .thaw_buckets("main", TimeRange::new(10, 20).unwrap())
        .unwrap();

    assert_eq!(
        names(&report.thawed),
        BTreeSet::from(["db_10_0_1".to_string(), "db_30_20_2".to_string()])
    );
}

#[test]
fn compressed_buckets_thaw_as_native_buckets() {
    let env = TestEnv::new();
    archive_three(&env, vec![BucketFormat::SplunkBucketTzst]);
    let services = ThawerFactory::build_with_fs(&env.config, env.local_fs()).unwrap();

    let report = services
        .thawer
        .thaw_buckets("main", TimeRange::new(20, 30).unwrap())
        .unwrap();

    assert_eq!(report.thawed.len(), 1);
    let thawed = &report.thawed[0];
    assert_eq!(thawed.format(), BucketFormat::SplunkBucket);
    assert_eq!(
        files_under(thawed.directory()),
        vec!["Hosts.data".to_string(), "rawdata/journal.gz".to_string()]
    );
    assert_eq!(
        fs::read_to_string(thawed.directory().join("rawdata/journal.gz")).unwrap(),
        "journal-20"
    );
}

#[test]
fn one_copy_per_bucket_when_several_formats_are_archived() {
    let env = TestEnv::new();
    archive_three(
        &env,
        vec![
            BucketFormat::Csv,
            BucketFormat::SplunkBucketTzst,
            BucketFormat::SplunkBucket,
        ],
    );
    let services = ThawerFactory::build_with_fs(&env.config, env.local_fs()).unwrap();

    let report = services
        .thawer
        .thaw_buckets("main", TimeRange::new(0, 50).unwrap())
        .unwrap();

    assert_eq!(report.thawed.len(), 3);
    assert!(report
        .thawed
        .iter()
        .all(|b| b.format() == BucketFormat::SplunkBucket));
}

#[test]
fn thawing_again_replaces_the_thawed_copy() {
    let env = TestEnv::new();
    archive_three(&env, vec![BucketFormat::SplunkBucket]);
    let services = ThawerFactory::build_with_fs(&env.config, env.local_fs()).unwrap();
    let range = TimeRange::new(20, 30).unwrap();

    services.thawer.thaw_buckets("main", range).unwrap();
    let stray = env.thaw_dir().join("db_30_20_2/stray");
    fs::write(&stray, b"x").unwrap();

    let report = services.thawer.thaw_buckets("main", range).unwrap();
    assert_eq!(report.thawed.len(), 1);
    assert!(!stray.exists());
}

#[test]
fn unknown_index_is_rejected() {
    let env = TestEnv::new();
    archive_three(&env, vec![BucketFormat::SplunkBucket]);
    let services = ThawerFactory::build_with_fs(&env.config, env.local_fs()).unwrap();

    let result = services
        .thawer
        .thaw_buckets("other", TimeRange::new(0, 50).unwrap());

    assert!(matches!(result, Err(ThawError::IllegalIndex(index)) if index == "other"));
    assert!(!env.thaw_dir().exists());
}

#[test]
fn empty_range_thaws_nothing() {
    let env = TestEnv::new();
    archive_three(&env, vec![BucketFormat::SplunkBucket]);
    let services = ThawerFactory::build_with_fs(&env.config, env.local_fs()).unwrap();

    let report = services
        .thawer
        .thaw_buckets("main", TimeRange::new(100, 200).unwrap())
        .unwrap();

    assert!(report.thawed.is_empty());
    assert!(report.failed.is_empty());
}
