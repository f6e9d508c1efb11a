use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use isel_reconcile::{OutcomeRecord, RunSummary};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const REPORT_SCHEMA_VERSION: i32 = 1;

/// Operator summary, identical on the console and in the `.log` file.
pub fn render_summary_text(summary: &RunSummary) -> String {
    let mut lines = vec![
        "========== SUMMARY ==========".to_string(),
        format!(" Pushed (or dry-run simulated): {}", summary.pushed_count),
        format!(" Skipped (already exists): {}", summary.skipped_count),
    ];
    if !summary.skipped_identifiers.is_empty() {
        lines.push(format!(
            "   Skipped selectors: {}",
            summary.skipped_identifiers.join(", ")
        ));
    }
    lines.push(format!(" Failed: {}", summary.failed_count));
    lines.push("=============================".to_string());
    lines.push(String::new());
    lines.push("Per-row details:".to_string());
    lines.extend(summary.outcomes.iter().map(|o| format!(" {o}")));
    lines.join("\n")
}

/// Machine-readable companion of the `.log` summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    pub schema_version: i32,
    pub run_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
    pub host: &'a str,
    pub dry_run: bool,
    pub config_hash: &'a str,
    pub state_fetch_policy: &'a str,
    /// Fetch error text when the run reconciled against an empty index.
    pub degraded_snapshot: Option<&'a str>,
    pub counts: Counts,
    pub skipped_selectors: &'a [String],
    pub outcomes: &'a [OutcomeRecord],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub pushed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
}

impl From<&RunSummary> for Counts {
    fn from(s: &RunSummary) -> Self {
        Self {
            pushed: s.pushed_count,
            skipped: s.skipped_count,
            failed: s.failed_count,
            total: s.total(),
        }
    }
}

pub struct WriteRunReportArgs<'a> {
    pub report_dir: &'a Path,
    pub run_id: Uuid,
    pub created_at_utc: DateTime<Utc>,
    pub host: &'a str,
    pub dry_run: bool,
    pub config_hash: &'a str,
    pub state_fetch_policy: &'a str,
    pub degraded_snapshot: Option<&'a str>,
    pub summary: &'a RunSummary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRunReportResult {
    pub log_path: PathBuf,
    pub json_path: PathBuf,
}

/// Writes `summary_<YYYYmmdd_HHMMSS>.log` and `.json` into `report_dir`
/// (created if missing). The timestamp is local time. An existing report
/// from the same second is never overwritten; the run id prefix is appended
/// instead.
pub fn write_run_report(args: WriteRunReportArgs<'_>) -> Result<WriteRunReportResult> {
    fs::create_dir_all(args.report_dir).with_context(|| {
        format!("create report dir failed: {}", args.report_dir.display())
    })?;

    let stamp = args
        .created_at_utc
        .with_timezone(&Local)
        .format("%Y%m%d_%H%M%S")
        .to_string();
    let text = format!("{}\n", render_summary_text(args.summary));

    let mut stem = format!("summary_{stamp}");
    let log_path = match create_new(&args.report_dir.join(format!("{stem}.log")), &text)? {
        Some(p) => p,
        None => {
            let short = args.run_id.simple().to_string();
            stem = format!("summary_{stamp}_{}", &short[..8]);
            let p = args.report_dir.join(format!("{stem}.log"));
            fs::write(&p, &text)
                .with_context(|| format!("write summary failed: {}", p.display()))?;
            p
        }
    };

    let report = RunReport {
        schema_version: REPORT_SCHEMA_VERSION,
        run_id: args.run_id,
        created_at_utc: args.created_at_utc,
        host: args.host,
        dry_run: args.dry_run,
        config_hash: args.config_hash,
        state_fetch_policy: args.state_fetch_policy,
        degraded_snapshot: args.degraded_snapshot,
        counts: Counts::from(args.summary),
        skipped_selectors: &args.summary.skipped_identifiers,
        outcomes: &args.summary.outcomes,
    };
    let json_path = args.report_dir.join(format!("{stem}.json"));
    let json = serde_json::to_string_pretty(&report).context("serialize run report failed")?;
    fs::write(&json_path, format!("{json}\n"))
        .with_context(|| format!("write run report failed: {}", json_path.display()))?;

    Ok(WriteRunReportResult {
        log_path,
        json_path,
    })
}

/// `Ok(None)` when the file already exists.
fn create_new(path: &Path, contents: &str) -> Result<Option<PathBuf>> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut f) => {
            f.write_all(contents.as_bytes())
                .with_context(|| format!("write summary failed: {}", path.display()))?;
            Ok(Some(path.to_path_buf()))
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(e) => {
            Err(e).with_context(|| format!("create summary failed: {}", path.display()))
        }
    }
}
