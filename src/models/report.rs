//! Per-check results and per-file reports.
//!
//! These are the structured outputs handed to report formatting, upload and
//! CLI layers. Serialized field names are stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::LocalityName;

/// Whether a failing result is an expected validation failure or an
/// internal fault caught at the check boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Validation,
    CriticalError,
}

/// Outcome of one check on one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub test_name: String,
    pub passed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, serde_json::Value>>,
    pub kind: ResultKind,
}

impl CheckResult {
    pub fn pass(test_name: &str, message: impl Into<String>) -> Self {
        Self {
            test_name: test_name.to_string(),
            passed: true,
            message: message.into(),
            details: None,
            kind: ResultKind::Validation,
        }
    }

    pub fn fail(test_name: &str, message: impl Into<String>) -> Self {
        Self {
            test_name: test_name.to_string(),
            passed: false,
            message: message.into(),
            details: None,
            kind: ResultKind::Validation,
        }
    }

    /// Failing result for a fault inside the check itself
    pub fn critical(test_name: &str, error: &str) -> Self {
        Self {
            test_name: test_name.to_string(),
            passed: false,
            message: format!("Critical error in {}: {}", test_name, error),
            details: None,
            kind: ResultKind::CriticalError,
        }
        .with_detail("error", error)
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }

    pub fn is_critical(&self) -> bool {
        self.kind == ResultKind::CriticalError
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallStatus::Pass => write!(f, "PASS"),
            OverallStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Complete validation report for a single file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub filename: String,
    pub locality: LocalityName,
    /// Pilot/batch number parsed from the file name
    pub batch_id: String,
    pub file_size: u64,
    pub results: Vec<CheckResult>,
    pub processing_time_secs: f64,
    pub timestamp: DateTime<Utc>,
}

impl FileReport {
    pub fn total_tests(&self) -> usize {
        self.results.len()
    }

    pub fn passed_tests(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed_tests(&self) -> usize {
        self.total_tests() - self.passed_tests()
    }

    pub fn overall_status(&self) -> OverallStatus {
        if self.results.iter().all(|r| r.passed) {
            OverallStatus::Pass
        } else {
            OverallStatus::Fail
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            self.passed_tests() as f64 / self.total_tests() as f64
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    pub fn result(&self, test_name: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.test_name == test_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(results: Vec<CheckResult>) -> FileReport {
        FileReport {
            filename: "pilot1_utrecht.geojson".to_string(),
            locality: LocalityName::new("utrecht"),
            batch_id: "1".to_string(),
            file_size: 1024,
            results,
            processing_time_secs: 0.1,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_overall_status() {
        let passing = report(vec![CheckResult::pass("a", "ok"), CheckResult::pass("b", "ok")]);
        assert_eq!(passing.overall_status(), OverallStatus::Pass);
        assert_eq!(passing.success_rate(), 1.0);

        let failing = report(vec![CheckResult::pass("a", "ok"), CheckResult::fail("b", "no")]);
        assert_eq!(failing.overall_status(), OverallStatus::Fail);
        assert_eq!(failing.success_rate(), 0.5);
        assert_eq!(failing.failed_tests(), 1);
    }

    #[test]
    fn test_empty_report_rate_is_zero() {
        assert_eq!(report(vec![]).success_rate(), 0.0);
    }

    #[test]
    fn test_critical_result() {
        let result = CheckResult::critical("geometry_validity", "boom");
        assert!(!result.passed);
        assert!(result.is_critical());
        assert_eq!(result.detail("error"), Some(&serde_json::json!("boom")));
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(CheckResult::fail("x", "bad").with_detail("count", 2)).unwrap();
        assert_eq!(value["test_name"], "x");
        assert_eq!(value["passed"], false);
        assert_eq!(value["message"], "bad");
        assert_eq!(value["details"]["count"], 2);
        assert_eq!(value["kind"], "validation");
    }
}
