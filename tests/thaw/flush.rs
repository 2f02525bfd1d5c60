//! Flushing thawed buckets outside a retained range

use crate::common::*;
use frostline::thaw::ThawerFactory;

fn archive_three(env: &TestEnv) {
    let archiver = env.archiver(
        env.local_fs(),
        vec![BucketFormat::SplunkBucket, BucketFormat::SplunkBucketTzst],
        ScriptedRunner::succeeding(),
    );
    for (earliest, latest, id) in [(0, 10, 1), (20, 30, 2), (40, 50, 3)] {
        archiver
            .archive_bucket(&env.make_bucket("main", earliest, latest, id))
            .unwrap();
    }
}

#[test]
fn flush_removes_buckets_outside_retained_range() {
    let env = TestEnv::new();
    archive_three(&env);
    let services = ThawerFactory::build_with_fs(&env.config, env.local_fs()).unwrap();
    services
        .thawer
        .thaw_buckets("main", TimeRange::new(0, 30).unwrap())
        .unwrap();

    let flushed = services
        .flusher
        .flush("main", TimeRange::new(25, 35).unwrap())
        .unwrap();

    assert_eq!(flushed.len(), 1);
    assert_eq!(flushed[0].name(), "db_10_0_1");
    assert_eq!(flushed[0].time_range(), TimeRange::new(0, 10).unwrap());
    assert!(!env.thaw_dir().join("db_10_0_1").exists());
    assert!(env.thaw_dir().join("db_30_20_2").is_dir());
    assert_eq!(services.flusher.flushed_buckets().len(), 1);
}

#[test]
fn flush_leaves_archive_storage_alone() {
    let env = TestEnv::new();
    archive_three(&env);
    let fs = env.local_fs();
    let before = env.lister(fs.clone()).list_buckets_in_index("main").unwrap();
    let services = ThawerFactory::build_with_fs(&env.config, fs.clone()).unwrap();
    services
        .thawer
        .thaw_buckets("main", TimeRange::new(0, 50).unwrap())
        .unwrap();

    services
        .flusher
        .flush("main", TimeRange::new(100, 200).unwrap())
        .unwrap();

    assert!(files_under(&env.thaw_dir()).is_empty());
    assert_eq!(env.lister(fs).list_buckets_in_index("main").unwrap(), before);
}

#[test]
fn flushing_twice_removes_nothing_more() {
    let env = TestEnv::new();
    archive_three(&env);
    let services = ThawerFactory::build_with_fs(&env.config, env.local_fs()).unwrap();
    services
        .thawer
        .thaw_buckets("main", TimeRange::new(0, 50).unwrap())
        .unwrap();
    let retained = TimeRange::new(45, 45).unwrap();

    assert_eq!(services.flusher.flush("main", retained).unwrap().len(), 2);
    assert!(services.flusher.flush("main", retained).unwrap().is_empty());
    assert_eq!(services.flusher.flushed_buckets().len(), 2);
    assert!(env.thaw_dir().join("db_50_40_3").is_dir());
}
