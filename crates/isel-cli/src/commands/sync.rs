//! `isel sync`: load, login, snapshot, reconcile, report.
//!
//! Exit codes: 0 when no row failed, 2 when the batch completed with at
//! least one failed row, 1 for anything fatal before the first row.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use isel_apic::{ApicApplier, ApicClient, ClientOptions, StateReader, XmlSelectorEncoder};
use isel_artifacts::{render_summary_text, write_run_report, WriteRunReportArgs};
use isel_config::{
    load_layered_yaml, report_unused_keys, resolve_credentials, LoadedConfig, UnusedKeyPolicy,
};
use isel_reconcile::{resolve_snapshot, Reconciler, StateFetchPolicy};
use tracing::{info, warn};
use uuid::Uuid;

use super::{complete_credentials, value_or_prompt};

pub const EXIT_ROW_FAILURES: u8 = 2;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// APIC hostname, IP or base URL (prompted when absent)
    #[arg(long)]
    pub apic: Option<String>,

    /// Input file with interface_profile, selector_name, fromPort, toPort, description
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Report what would be pushed without sending anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Continue with an empty snapshot if existing selectors cannot be read.
    /// Every row will then attempt to push.
    #[arg(long, default_value_t = false)]
    pub allow_empty_state: bool,

    /// Require a valid TLS certificate on the APIC
    #[arg(long, default_value_t = false)]
    pub verify_tls: bool,

    /// Directory for summary_<timestamp>.log / .json
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    pub config_paths: Vec<PathBuf>,
}

pub fn run(args: SyncArgs) -> Result<ExitCode> {
    let loaded = if args.config_paths.is_empty() {
        LoadedConfig::empty()?
    } else {
        load_layered_yaml(&args.config_paths)?
    };
    let unused = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for key in &unused.unused_leaf_pointers {
        warn!(key = %key, "config key is not used");
    }
    let cfg = loaded.typed()?;

    let policy = if args.allow_empty_state {
        StateFetchPolicy::DegradeToEmpty
    } else {
        cfg.state_fetch_policy()?
    };

    let host = value_or_prompt(args.apic, &cfg.apic.host, "Enter APIC hostname or IP")?;
    let csv_path = match args.csv {
        Some(p) => p,
        None => PathBuf::from(value_or_prompt(None, "", "Enter CSV file path")?),
    };

    let desired = isel_desired::load_file(&csv_path)
        .with_context(|| format!("cannot load {}", csv_path.display()))?;
    info!(
        path = %csv_path.display(),
        delimiter = desired.delimiter.name(),
        rows = desired.rows.len(),
        malformed = desired.malformed_count(),
        "desired set loaded"
    );

    let creds = complete_credentials(resolve_credentials(&cfg))?;

    let opts = ClientOptions {
        timeout: cfg.apic.timeout(),
        accept_invalid_certs: cfg.apic.accept_invalid_certs && !args.verify_tls,
    };
    let client = ApicClient::new(&host, &opts)?;
    println!("Authenticating to APIC...");
    let session = client.login(&creds).context("Authentication failed")?;
    println!("Authentication successful. Proceeding with config");

    let fetched = StateReader::new(&session).fetch_existing();
    let snapshot = resolve_snapshot(fetched, policy)?;

    let encoder = XmlSelectorEncoder::new();
    let applier = ApicApplier::new(&session);
    let summary = Reconciler::new(&snapshot.index, &encoder, &applier)
        .dry_run(args.dry_run)
        .run_with(&desired.rows, |outcome| println!(" {outcome}"));

    println!();
    println!("{}", render_summary_text(&summary));

    let report_dir = args.report_dir.unwrap_or(cfg.report.dir);
    let written = write_run_report(WriteRunReportArgs {
        report_dir: &report_dir,
        run_id: Uuid::new_v4(),
        created_at_utc: Utc::now(),
        host: session.base_url(),
        dry_run: args.dry_run,
        config_hash: &loaded.config_hash,
        state_fetch_policy: policy.as_str(),
        degraded_snapshot: snapshot.degraded.as_deref(),
        summary: &summary,
    })?;
    println!();
    println!("Summary report saved to {}", absolute(&written.log_path).display());

    if summary.has_failures() {
        Ok(ExitCode::from(EXIT_ROW_FAILURES))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn absolute(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf())
}
