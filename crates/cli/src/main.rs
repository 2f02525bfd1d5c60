//! Frostline CLI
//!
//! `frostline [--config FILE] [--json] [-v] COMMAND`
//!
//! Exit status is 0 on success, 1 on error and 2 when a bucket could not be
//! archived in every format (it stays on disk and is queued for recovery).

mod commands;
mod format;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use frostline_archive::{
    open_archive_fs, ArchivedBucketLister, BucketSizeTracker, PathResolver,
};
use frostline_model::{ArchiveConfig, TimeRange, CONFIG_FILE_NAME};
use frostline_pipeline::{ArchiveReport, ArchiverFactory};
use frostline_thaw::ThawerFactory;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{
    format_archive_report, format_archived, format_buckets, format_indexes,
    format_recovery_report, format_thaw_report, OutputMode,
};

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match run(&matches, mode) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("frostline=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("frostline=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config_path(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

fn load_config(matches: &ArgMatches) -> Result<ArchiveConfig> {
    let path = config_path(matches);
    if !path.exists() {
        bail!(
            "config file {} not found (run `frostline init` to create one)",
            path.display()
        );
    }
    let config = ArchiveConfig::from_file(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn time_range(matches: &ArgMatches) -> Result<TimeRange> {
    let earliest = *matches
        .get_one::<i64>("earliest")
        .context("missing --earliest")?;
    let latest = *matches
        .get_one::<i64>("latest")
        .context("missing --latest")?;
    Ok(TimeRange::new(earliest, latest)?)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .with_context(|| format!("missing <{}>", name))
}

/// Read-only view of the archive; nothing local is created
fn open_listing(config: &ArchiveConfig) -> Result<(ArchivedBucketLister, BucketSizeTracker)> {
    let fs = open_archive_fs(config)?;
    let resolver = PathResolver::from_config(config)?;
    Ok((
        ArchivedBucketLister::new(Arc::clone(&fs), resolver.clone()),
        BucketSizeTracker::new(fs, resolver),
    ))
}

fn archive_exit_code(report: &ArchiveReport) -> i32 {
    if report.is_complete() {
        0
    } else {
        2
    }
}

fn run(matches: &ArgMatches, mode: OutputMode) -> Result<i32> {
    let Some((command, sub)) = matches.subcommand() else {
        bail!("no command given");
    };

    if command == "init" {
        let path = config_path(matches);
        ArchiveConfig::write_default_if_missing(&path)?;
        println!("{}", path.display());
        return Ok(0);
    }

    let config = load_config(matches)?;
    debug!(target: "frostline::cli", command, config = %config_path(matches).display(), "Running command");

    match command {
        "freeze" | "archive" => {
            let services = ArchiverFactory::build(&config)?;
            let index = required(sub, "index")?;
            let bucket = PathBuf::from(required(sub, "bucket")?);
            let result = if command == "freeze" {
                services.freezer.freeze_bucket(index, &bucket)
            } else {
                services.trigger.archive_bucket_directory(index, &bucket)
            };
            let report = result.with_context(|| format!("archiving {}", bucket.display()))?;

            println!("{}", format_archive_report(&report, mode));
            Ok(archive_exit_code(&report))
        }
        "recover" => {
            let services = ArchiverFactory::build(&config)?;
            let report = services
                .restorer
                .recover_failed_buckets(services.trigger.as_ref())?;
            println!("{}", format_recovery_report(&report, mode));
            Ok(if report.still_failing.is_empty() { 0 } else { 2 })
        }
        "thaw" => {
            let fs = open_archive_fs(&config)?;
            let services = ThawerFactory::build_with_fs(&config, fs)?;
            let report = services
                .thawer
                .thaw_buckets(required(sub, "index")?, time_range(sub)?)?;
            println!("{}", format_thaw_report(&report, mode));
            Ok(if report.failed.is_empty() { 0 } else { 2 })
        }
        "flush" => {
            let fs = open_archive_fs(&config)?;
            let services = ThawerFactory::build_with_fs(&config, fs)?;
            let flushed = services
                .flusher
                .flush(required(sub, "index")?, time_range(sub)?)?;
            println!("{}", format_buckets(&flushed, mode));
            Ok(0)
        }
        "list" => {
            let (lister, sizes) = open_listing(&config)?;
            match sub.get_one::<String>("index") {
                None => println!("{}", format_indexes(&lister.list_indexes()?, mode)),
                Some(index) => {
                    let mut entries = Vec::new();
                    for archived in lister.list_buckets_in_index(index)? {
                        let size = sizes.read_size(&archived.path)?;
                        entries.push((archived, size));
                    }
                    println!("{}", format_archived(&entries, mode));
                }
            }
            Ok(0)
        }
        other => bail!("unknown command {}", other),
    }
}
