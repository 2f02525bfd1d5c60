//! Export stage tests

use crate::common::*;
use frostline::pipeline::{ArchiveError, ExportError};
use std::borrow::Cow;

#[test]
fn unknown_format_runs_no_subprocess() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::succeeding();
    let paths = env.paths();
    let exporter = BucketExporter::new().with_converter(
        CsvExporter::new("/opt/splunk/bin/exporttool", paths.csv_dir(), paths.export_dir())
            .with_runner(runner.clone()),
    );
    let bucket = env.make_bucket("main", 10, 20, 0);

    let err = exporter
        .export_bucket(&bucket, BucketFormat::Unknown)
        .unwrap_err();

    assert!(matches!(err, ExportError::UnknownFormat(BucketFormat::Unknown)));
    assert_eq!(runner.calls(), 0);
}

#[test]
fn archiving_only_unknown_formats_is_an_error() {
    let env = TestEnv::new();
    let runner = ScriptedRunner::succeeding();
    let archiver = env.archiver(env.local_fs(), vec![BucketFormat::Unknown], runner.clone());
    let bucket = env.make_bucket("main", 10, 20, 0);

    let result = archiver.archive_bucket(&bucket);

    assert!(matches!(result, Err(ArchiveError::UnknownFormat(_))));
    assert_eq!(runner.calls(), 0);
    assert!(bucket.directory().is_dir());
}

#[test]
fn same_format_export_is_the_bucket_itself() {
    let env = TestEnv::new();
    let bucket = env.make_bucket("main", 10, 20, 0);

    let exported = BucketExporter::new()
        .export_bucket(&bucket, BucketFormat::SplunkBucket)
        .unwrap();

    assert!(matches!(exported, Cow::Borrowed(_)));
    assert_eq!(exported.directory(), bucket.directory());
}

#[test]
fn csv_export_passes_bucket_and_destination() {
    let env = TestEnv::new();
    let paths = env.paths();
    let runner = ScriptedRunner::succeeding();
    let exporter = BucketExporter::new().with_converter(
        CsvExporter::new("/opt/splunk/bin/exporttool", paths.csv_dir(), paths.export_dir())
            .with_runner(runner.clone()),
    );
    let bucket = env.make_bucket("main", 10, 20, 0);

    let exported = exporter.export_bucket(&bucket, BucketFormat::Csv).unwrap();

    assert_eq!(runner.calls(), 1);
    assert_eq!(exported.format(), BucketFormat::Csv);
    assert_eq!(exported.name(), bucket.name());
    assert_eq!(exported.time_range(), bucket.time_range());
    assert!(exported.directory().join("db_20_10_0.csv").is_file());
    assert!(bucket.directory().is_dir());
}
