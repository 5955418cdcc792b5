//! Pure reductions over completed file reports.

use hashbrown::HashMap;
use serde::Serialize;
use std::cmp::Ordering;

use crate::models::{FileReport, OverallStatus};

fn rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64
    }
}

/// Compare batch ids numerically where both parse, numbers first.
pub fn compare_batch_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Locality,
    Batch,
}

impl GroupBy {
    fn key<'r>(&self, report: &'r FileReport) -> &'r str {
        match self {
            GroupBy::Locality => report.locality.as_str(),
            GroupBy::Batch => &report.batch_id,
        }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            GroupBy::Locality => a.cmp(b),
            GroupBy::Batch => compare_batch_ids(a, b),
        }
    }
}

/// File totals for one locality or one batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub total_files: usize,
    pub passed_files: usize,
    pub failed_files: usize,
    pub success_rate: f64,
}

/// A file where more checks failed than passed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MajorityFailure {
    pub filename: String,
    pub failed_tests: usize,
    pub total_tests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub total_files: usize,
    pub passed_files: usize,
    pub failed_files: usize,
    /// Fraction of files that passed, 0 when there are none
    pub success_rate: f64,
    pub total_tests: usize,
    pub passed_tests: usize,
    /// Files that produced at least one critical result
    pub critical_files: Vec<String>,
    pub majority_failures: Vec<MajorityFailure>,
    pub by_locality: Vec<GroupSummary>,
    pub by_batch: Vec<GroupSummary>,
}

impl ValidationSummary {
    pub fn all_passed(&self) -> bool {
        self.failed_files == 0
    }
}

/// Per-group file totals, sorted by group key.
pub fn group(reports: &[FileReport], by: GroupBy) -> Vec<GroupSummary> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for report in reports {
        let entry = counts.entry(by.key(report)).or_insert((0, 0));
        entry.0 += 1;
        if report.overall_status() == OverallStatus::Pass {
            entry.1 += 1;
        }
    }

    let mut groups: Vec<GroupSummary> = counts
        .into_iter()
        .map(|(key, (total, passed))| GroupSummary {
            key: key.to_string(),
            total_files: total,
            passed_files: passed,
            failed_files: total - passed,
            success_rate: rate(passed, total),
        })
        .collect();
    groups.sort_by(|a, b| by.compare(&a.key, &b.key));
    groups
}

/// Reports ordered by batch, then locality, then file name
pub fn sorted_reports(reports: &[FileReport]) -> Vec<&FileReport> {
    let mut sorted: Vec<&FileReport> = reports.iter().collect();
    sorted.sort_by(|a, b| {
        compare_batch_ids(&a.batch_id, &b.batch_id)
            .then_with(|| a.locality.as_str().cmp(b.locality.as_str()))
            .then_with(|| a.filename.cmp(&b.filename))
    });
    sorted
}

pub fn aggregate(reports: &[FileReport]) -> ValidationSummary {
    let total_files = reports.len();
    let passed_files = reports
        .iter()
        .filter(|r| r.overall_status() == OverallStatus::Pass)
        .count();

    let critical_files = reports
        .iter()
        .filter(|r| r.results.iter().any(|c| c.is_critical()))
        .map(|r| r.filename.clone())
        .collect();

    let majority_failures = reports
        .iter()
        .filter(|r| r.failed_tests() > r.passed_tests())
        .map(|r| MajorityFailure {
            filename: r.filename.clone(),
            failed_tests: r.failed_tests(),
            total_tests: r.total_tests(),
        })
        .collect();

    ValidationSummary {
        total_files,
        passed_files,
        failed_files: total_files - passed_files,
        success_rate: rate(passed_files, total_files),
        total_tests: reports.iter().map(FileReport::total_tests).sum(),
        passed_tests: reports.iter().map(FileReport::passed_tests).sum(),
        critical_files,
        majority_failures,
        by_locality: group(reports, GroupBy::Locality),
        by_batch: group(reports, GroupBy::Batch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckResult, LocalityName};
    use chrono::Utc;

    fn report(filename: &str, locality: &str, batch: &str, results: Vec<CheckResult>) -> FileReport {
        FileReport {
            filename: filename.to_string(),
            locality: LocalityName::new(locality),
            batch_id: batch.to_string(),
            file_size: 0,
            results,
            processing_time_secs: 0.0,
            timestamp: Utc::now(),
        }
    }

    fn passing(filename: &str, locality: &str, batch: &str) -> FileReport {
        report(
            filename,
            locality,
            batch,
            vec![CheckResult::pass("a", "ok"), CheckResult::pass("b", "ok")],
        )
    }

    fn failing(filename: &str, locality: &str, batch: &str) -> FileReport {
        report(
            filename,
            locality,
            batch,
            vec![CheckResult::fail("a", "no"), CheckResult::fail("b", "no"), CheckResult::pass("c", "ok")],
        )
    }

    #[test]
    fn test_empty_input() {
        let summary = aggregate(&[]);
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert!(summary.by_batch.is_empty());
        assert!(summary.all_passed());
    }

    #[test]
    fn test_totals_and_groups() {
        let reports = vec![
            passing("pilot2_utrecht.geojson", "utrecht", "2"),
            failing("pilot10_budapest.geojson", "budapest", "10"),
            passing("pilot1_budapest.geojson", "budapest", "1"),
            passing("misc.geojson", "unknown", "unknown"),
        ];
        let summary = aggregate(&reports);

        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.passed_files, 3);
        assert_eq!(summary.failed_files, 1);
        assert_eq!(summary.success_rate, 0.75);
        assert_eq!(summary.total_tests, 9);
        assert_eq!(summary.passed_tests, 7);

        let batches: Vec<&str> = summary.by_batch.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(batches, vec!["1", "2", "10", "unknown"]);

        let budapest = &summary.by_locality[0];
        assert_eq!(budapest.key, "budapest");
        assert_eq!(budapest.total_files, 2);
        assert_eq!(budapest.failed_files, 1);
        assert_eq!(budapest.success_rate, 0.5);

        assert_eq!(summary.majority_failures.len(), 1);
        assert_eq!(summary.majority_failures[0].filename, "pilot10_budapest.geojson");
        assert_eq!(summary.majority_failures[0].failed_tests, 2);
    }

    #[test]
    fn test_critical_files_listed() {
        let reports = vec![
            report("a.geojson", "x", "1", vec![CheckResult::critical("region_bounds", "boom")]),
            passing("b.geojson", "x", "1"),
        ];
        assert_eq!(aggregate(&reports).critical_files, vec!["a.geojson"]);
    }

    #[test]
    fn test_sorted_reports_by_batch_then_locality() {
        let reports = vec![
            passing("c", "utrecht", "10"),
            passing("b", "utrecht", "2"),
            passing("a", "budapest", "2"),
        ];
        let order: Vec<&str> = sorted_reports(&reports)
            .iter()
            .map(|r| r.filename.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_summary_serializes() {
        let value = serde_json::to_value(aggregate(&[passing("a", "x", "1")])).unwrap();
        assert_eq!(value["total_files"], 1);
        assert_eq!(value["by_batch"][0]["key"], "1");
    }
}
