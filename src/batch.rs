//! Per-file driver and sequential batch runs.

use chrono::Utc;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::boundary::{Clock, ResolveBoundary};
use crate::cancel::CancelFlag;
use crate::geometry::read_feature_collection;
use crate::models::{CheckResult, FileReport, LocalityName, UNKNOWN_LOCALITY};
use crate::validation::ValidationEngine;

static PILOT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pilot(\d+)_(.+)\.geojson$").expect("valid pilot pattern"));
static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid digits pattern"));

pub const FILENAME_CONVENTION: &str = "filename_convention";

/// Checks the name against `pilot<N>_<locality>.geojson`
pub fn filename_convention(file_name: &str) -> CheckResult {
    if PILOT_PATTERN.is_match(&file_name.to_lowercase()) {
        CheckResult::pass(FILENAME_CONVENTION, "Filename follows convention")
    } else {
        CheckResult::fail(
            FILENAME_CONVENTION,
            format!(
                "Filename doesn't follow pilot[X]_[locality].geojson convention: {}",
                file_name
            ),
        )
    }
}

/// Locality and batch id encoded in a file name such as
/// `pilot3_goteborg.geojson`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentifier {
    pub locality: LocalityName,
    pub batch_id: String,
}

impl FileIdentifier {
    pub fn parse(file_name: &str) -> Self {
        let lower = file_name.to_lowercase();

        if let Some(caps) = PILOT_PATTERN.captures(&lower) {
            let locality: String = caps[2]
                .chars()
                .filter(|c| *c != '_' && !c.is_whitespace())
                .collect();
            return Self {
                locality: LocalityName::new(&locality),
                batch_id: caps[1].to_string(),
            };
        }

        let base = lower.strip_suffix(".geojson").unwrap_or(&lower);
        if let Some((batch_part, locality)) = base.split_once('_') {
            let batch_id = DIGITS
                .find(batch_part)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| UNKNOWN_LOCALITY.to_string());
            return Self {
                locality: LocalityName::new(locality),
                batch_id,
            };
        }

        Self {
            locality: LocalityName::unknown(),
            batch_id: UNKNOWN_LOCALITY.to_string(),
        }
    }
}

/// Validate one file. Returns `None` only when cancelled mid-file.
///
/// A loaded file gets the naming convention check followed by the engine
/// checks. A file that cannot be read or parsed still produces a report,
/// holding a single failing result named after the stage that failed.
pub async fn validate_file<R: ResolveBoundary, C: Clock>(
    engine: &ValidationEngine<'_, R, C>,
    path: &Path,
    cancel: &CancelFlag,
) -> Option<FileReport> {
    let started = Instant::now();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let id = FileIdentifier::parse(&filename);
    info!(
        "Validating {} (locality: {}, batch: {})",
        filename, id.locality, id.batch_id
    );

    let config = engine.config();
    let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let results = match read_feature_collection(
        path,
        config.max_file_size_bytes(),
        config.assume_crs_when_absent.as_deref(),
    ) {
        Ok(collection) => {
            let mut results = vec![filename_convention(&filename)];
            results.extend(
                engine
                    .validate_with_cancel(&collection, &id.locality, cancel)
                    .await?,
            );
            results
        }
        Err(e) => {
            warn!("Could not load {}: {}", filename, e);
            vec![CheckResult::fail(e.test_name(), e.to_string())]
        }
    };

    let report = FileReport {
        filename,
        locality: id.locality,
        batch_id: id.batch_id,
        file_size,
        results,
        processing_time_secs: started.elapsed().as_secs_f64(),
        timestamp: Utc::now(),
    };
    info!(
        "Validation complete for {}: {} ({}/{} tests passed)",
        report.filename,
        report.overall_status(),
        report.passed_tests(),
        report.total_tests()
    );
    Some(report)
}

/// Validate `paths` one at a time, pausing `batch_delay_ms` between files.
///
/// Stops early when `cancel` is raised and returns the reports completed
/// so far. `on_report` sees each report as soon as it is finished.
pub async fn run_batch<R, C, F>(
    engine: &ValidationEngine<'_, R, C>,
    paths: &[PathBuf],
    cancel: &CancelFlag,
    mut on_report: F,
) -> Vec<FileReport>
where
    R: ResolveBoundary,
    C: Clock,
    F: FnMut(&FileReport),
{
    let delay = Duration::from_millis(engine.config().batch_delay_ms);
    let mut reports = Vec::with_capacity(paths.len());

    for (i, path) in paths.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(
                "Cancelled after {} of {} files",
                reports.len(),
                paths.len()
            );
            break;
        }
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match validate_file(engine, path, cancel).await {
            Some(report) => {
                on_report(&report);
                reports.push(report);
            }
            None => {
                warn!("Cancelled while validating {}", path.display());
                break;
            }
        }
    }

    reports
}
