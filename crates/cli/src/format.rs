//! Output formatting for reports

use frostline_archive::ArchivedBucket;
use frostline_model::Bucket;
use frostline_pipeline::{ArchiveReport, FormatOutcome, RecoveryReport};
use frostline_thaw::ThawReport;
use serde_json::{json, Value};

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Aligned text
    Human,
    /// One JSON document
    Json,
}

pub fn format_archive_report(report: &ArchiveReport, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => {
            let formats: Vec<Value> = report
                .outcomes
                .iter()
                .map(|(format, outcome)| match outcome {
                    FormatOutcome::AlreadyArchived => {
                        json!({ "format": format.as_str(), "status": "already_archived" })
                    }
                    FormatOutcome::Archived(path) => {
                        json!({ "format": format.as_str(), "status": "archived", "path": path.as_str() })
                    }
                    FormatOutcome::Failed(failure) => {
                        json!({ "format": format.as_str(), "status": "failed", "error": failure.to_string() })
                    }
                })
                .collect();
            json!({
                "bucket": report.bucket.to_string(),
                "formats": formats,
                "source_deleted": report.source_deleted,
                "cleanup_failures": report
                    .cleanup_failures
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
            })
            .to_string()
        }
        OutputMode::Human => {
            let mut lines = vec![format!("bucket {}", report.bucket)];
            for (format, outcome) in &report.outcomes {
                let status = match outcome {
                    FormatOutcome::AlreadyArchived => "already archived".to_string(),
                    FormatOutcome::Archived(path) => format!("archived at {}", path),
                    FormatOutcome::Failed(failure) => format!("FAILED: {}", failure),
                };
                lines.push(format!("  {:<20} {}", format.as_str(), status));
            }
            lines.push(format!(
                "  source {}",
                if report.source_deleted { "deleted" } else { "kept" }
            ));
            for path in &report.cleanup_failures {
                lines.push(format!("  could not remove {}", path.display()));
            }
            lines.join("\n")
        }
    }
}

pub fn format_recovery_report(report: &RecoveryReport, mode: OutputMode) -> String {
    let names = |keys: &[frostline_model::BucketKey]| -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    };
    match mode {
        OutputMode::Json => json!({
            "recovered": names(&report.recovered),
            "still_failing": names(&report.still_failing),
            "deferred": names(&report.deferred),
            "exhausted": names(&report.exhausted),
            "dropped": names(&report.dropped),
        })
        .to_string(),
        OutputMode::Human => format!(
            "recovered {}, still failing {}, deferred {}, exhausted {}, dropped {}",
            report.recovered.len(),
            report.still_failing.len(),
            report.deferred.len(),
            report.exhausted.len(),
            report.dropped.len()
        ),
    }
}

pub fn format_thaw_report(report: &ThawReport, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({
            "thawed": report.thawed.iter().map(bucket_json).collect::<Vec<_>>(),
            "failed": report
                .failed
                .iter()
                .map(|f| json!({ "bucket": f.key.to_string(), "error": f.reason }))
                .collect::<Vec<_>>(),
        })
        .to_string(),
        OutputMode::Human => {
            let mut lines: Vec<String> = report.thawed.iter().map(bucket_line).collect();
            for failure in &report.failed {
                lines.push(format!("FAILED {}: {}", failure.key, failure.reason));
            }
            lines.push(format!(
                "{} thawed, {} failed",
                report.thawed.len(),
                report.failed.len()
            ));
            lines.join("\n")
        }
    }
}

pub fn format_buckets(buckets: &[Bucket], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => Value::Array(buckets.iter().map(bucket_json).collect()).to_string(),
        OutputMode::Human if buckets.is_empty() => "(empty)".to_string(),
        OutputMode::Human => buckets.iter().map(bucket_line).collect::<Vec<_>>().join("\n"),
    }
}

pub fn format_indexes(indexes: &[String], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!(indexes).to_string(),
        OutputMode::Human if indexes.is_empty() => "(empty)".to_string(),
        OutputMode::Human => indexes.join("\n"),
    }
}

pub fn format_archived(entries: &[(ArchivedBucket, Option<u64>)], mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => Value::Array(
            entries
                .iter()
                .map(|(b, size)| {
                    json!({
                        "name": b.key.name,
                        "format": b.key.format.as_str(),
                        "earliest": b.key.time_range.earliest,
                        "latest": b.key.time_range.latest,
                        "size_bytes": size,
                        "path": b.path.as_str(),
                    })
                })
                .collect(),
        )
        .to_string(),
        OutputMode::Human if entries.is_empty() => "(empty)".to_string(),
        OutputMode::Human => entries
            .iter()
            .map(|(b, size)| {
                format!(
                    "{:<20} {:<40} {} {}",
                    b.key.format.as_str(),
                    b.key.name,
                    b.key.time_range,
                    size.map(|s| format!("{}B", s))
                        .unwrap_or_else(|| "-".to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn bucket_json(bucket: &Bucket) -> Value {
    json!({
        "index": bucket.index(),
        "name": bucket.name(),
        "format": bucket.format().as_str(),
        "earliest": bucket.earliest(),
        "latest": bucket.latest(),
        "directory": bucket.directory().display().to_string(),
        "size_bytes": bucket.size_on_disk(),
    })
}

fn bucket_line(bucket: &Bucket) -> String {
    format!(
        "{:<40} {} {}",
        bucket.name(),
        bucket.time_range(),
        bucket.directory().display()
    )
}
