//! Batch GeoJSON validation.
//!
//! Finds GeoJSON files under a directory, validates each against the
//! boundary of the locality named in its file name, and writes a markdown
//! report plus an optional JSON summary.

mod markdown;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use walkdir::WalkDir;

use boundcheck::batch::run_batch;
use boundcheck::boundary::{AliasTable, BoundaryCache, BoundaryResolver};
use boundcheck::config::ValidatorConfig;
use boundcheck::models::FileReport;
use boundcheck::nominatim::NominatimClient;
use boundcheck::report::{aggregate, ValidationSummary};
use boundcheck::validation::ValidationEngine;
use boundcheck::CancelFlag;

#[derive(Parser, Debug)]
#[command(name = "validate")]
#[command(about = "Validate GeoJSON files against locality boundaries")]
struct Args {
    /// Directory searched recursively for *.geojson files
    data_dir: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown report output path
    #[arg(long, default_value = "validation_report.md")]
    report: PathBuf,

    /// Also write a JSON summary to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    /// Exit with an error when any file fails
    #[arg(long)]
    fail_on_error: bool,

    /// Skip the name discovery pre-query
    #[arg(long)]
    no_discovery: bool,

    /// Delay between files in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// CRS to assume for files that declare none (otherwise they fail)
    #[arg(long)]
    assume_crs: Option<String>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    cancelled: bool,
    summary: &'a ValidationSummary,
    files: &'a [FileReport],
}

fn find_geojson_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        let is_geojson = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("geojson"));
        if entry.file_type().is_file() && is_geojson {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn load_config(args: &Args) -> Result<ValidatorConfig> {
    let mut config = match &args.config {
        Some(path) => ValidatorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ValidatorConfig::default(),
    };
    if args.no_discovery {
        config.search.discover_names = false;
    }
    if let Some(delay) = args.delay_ms {
        config.batch_delay_ms = delay;
    }
    if let Some(crs) = &args.assume_crs {
        config.assume_crs_when_absent = Some(crs.clone());
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&args)?;

    info!("GeoJSON boundary validation");
    info!("Data directory: {}", args.data_dir.display());

    let files = find_geojson_files(&args.data_dir)?;
    if files.is_empty() {
        warn!("No GeoJSON files found in {}", args.data_dir.display());
        return Ok(());
    }
    info!("Found {} GeoJSON files to validate", files.len());

    let client = NominatimClient::new(&config.search).context("Failed to build geocoder client")?;
    let resolver = BoundaryResolver::new(
        client,
        AliasTable::new(config.aliases.clone()),
        config.search.discover_names,
    );
    let cache = BoundaryCache::new(resolver, config.cache_ttl()?);
    let engine = ValidationEngine::new(&config, &cache);

    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current check");
            on_signal.cancel();
        }
    });

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let reports = run_batch(&engine, &files, &cancel, |report| {
        pb.set_message(report.filename.clone());
        pb.inc(1);
    })
    .await;
    pb.finish_with_message("Validation complete");

    let cancelled = cancel.is_cancelled();
    if cancelled {
        warn!(
            "Run cancelled; reporting {} of {} files",
            reports.len(),
            files.len()
        );
    }

    let summary = aggregate(&reports);
    info!("Total files: {}", summary.total_files);
    info!("Passed validation: {}", summary.passed_files);
    info!("Failed validation: {}", summary.failed_files);
    info!("Success rate: {:.1}%", summary.success_rate * 100.0);
    info!("Boundaries cached: {}", cache.len());
    if !summary.majority_failures.is_empty() {
        warn!(
            "Files with majority failed tests: {}",
            summary.majority_failures.len()
        );
        for failure in &summary.majority_failures {
            warn!(
                "  - {}: {}/{} failed",
                failure.filename, failure.failed_tests, failure.total_tests
            );
        }
    }

    let generated_at = Utc::now();
    let markdown = markdown::render(&reports, &summary, generated_at)
        .context("Failed to render markdown report")?;
    fs::write(&args.report, markdown)
        .with_context(|| format!("Failed to write report {}", args.report.display()))?;
    info!("Validation report written to {}", args.report.display());

    if let Some(path) = &args.summary_json {
        let json = serde_json::to_string_pretty(&JsonReport {
            generated_at,
            cancelled,
            summary: &summary,
            files: &reports,
        })?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
        info!("JSON summary written to {}", path.display());
    }

    if args.fail_on_error && !summary.all_passed() {
        anyhow::bail!(
            "{} of {} files failed validation",
            summary.failed_files,
            summary.total_files
        );
    }

    Ok(())
}
