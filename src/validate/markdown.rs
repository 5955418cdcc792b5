//! Markdown rendering of a validation run.

use chrono::{DateTime, Utc};
use std::fmt::{self, Write};

use boundcheck::models::{CheckResult, FileReport};
use boundcheck::report::{sorted_reports, ValidationSummary};

fn result_line(out: &mut String, result: &CheckResult) -> fmt::Result {
    let tag = if result.is_critical() { " (critical)" } else { "" };
    writeln!(out, "- `{}`{}: {}", result.test_name, tag, result.message)
}

pub fn render(
    reports: &[FileReport],
    summary: &ValidationSummary,
    generated_at: DateTime<Utc>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();

    writeln!(out, "# GeoJSON Validation Report\n")?;
    writeln!(out, "**Generated:** {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "**Total Files:** {}", summary.total_files)?;
    writeln!(out, "**Passed:** {}", summary.passed_files)?;
    writeln!(out, "**Failed:** {}", summary.failed_files)?;
    writeln!(out, "**Success Rate:** {:.1}%\n", summary.success_rate * 100.0)?;

    writeln!(out, "## Summary by Locality and Batch\n")?;
    writeln!(
        out,
        "| File | Locality | Batch | Status | Tests Passed | File Size | Processing Time |"
    )?;
    writeln!(
        out,
        "|------|----------|-------|--------|--------------|-----------|-----------------|"
    )?;
    for report in sorted_reports(reports) {
        writeln!(
            out,
            "| {} | {} | {} | {} | {}/{} | {:.1}KB | {:.2}s |",
            report.filename,
            report.locality,
            report.batch_id,
            report.overall_status(),
            report.passed_tests(),
            report.total_tests(),
            report.file_size as f64 / 1024.0,
            report.processing_time_secs
        )?;
    }
    out.push('\n');

    if !summary.by_batch.is_empty() {
        writeln!(out, "## Batches\n")?;
        writeln!(out, "| Batch | Files | Passed | Failed | Success Rate |")?;
        writeln!(out, "|-------|-------|--------|--------|--------------|")?;
        for group in &summary.by_batch {
            writeln!(
                out,
                "| {} | {} | {} | {} | {:.1}% |",
                group.key,
                group.total_files,
                group.passed_files,
                group.failed_files,
                group.success_rate * 100.0
            )?;
        }
        out.push('\n');
    }

    if !summary.majority_failures.is_empty() {
        writeln!(out, "## Files with Majority Failed Tests\n")?;
        for failure in &summary.majority_failures {
            writeln!(
                out,
                "- {}: {}/{} failed",
                failure.filename, failure.failed_tests, failure.total_tests
            )?;
        }
        out.push('\n');
    }

    writeln!(out, "## Detailed Results\n")?;
    for report in reports {
        writeln!(out, "### {}\n", report.filename)?;
        writeln!(out, "- **Locality:** {}", report.locality)?;
        writeln!(out, "- **Batch:** {}", report.batch_id)?;
        writeln!(out, "- **Status:** {}", report.overall_status())?;
        writeln!(out, "- **Success Rate:** {:.1}%\n", report.success_rate() * 100.0)?;

        let (passed, failed): (Vec<&CheckResult>, Vec<&CheckResult>) =
            report.results.iter().partition(|r| r.passed);

        if !failed.is_empty() {
            writeln!(out, "**Failed Tests:**")?;
            for result in failed {
                result_line(&mut out, result)?;
            }
            out.push('\n');
        }
        if !passed.is_empty() {
            writeln!(out, "**Passed Tests:**")?;
            for result in passed {
                result_line(&mut out, result)?;
            }
            out.push('\n');
        }
        writeln!(out, "---\n")?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundcheck::models::LocalityName;
    use boundcheck::report::aggregate;

    fn report(filename: &str, batch: &str, results: Vec<CheckResult>) -> FileReport {
        FileReport {
            filename: filename.to_string(),
            locality: LocalityName::new("utrecht"),
            batch_id: batch.to_string(),
            file_size: 2048,
            results,
            processing_time_secs: 0.25,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_render_sections() {
        let reports = vec![
            report("pilot2_utrecht.geojson", "2", vec![CheckResult::pass("feature_count", "ok")]),
            report(
                "pilot1_utrecht.geojson",
                "1",
                vec![CheckResult::critical("region_bounds", "boom")],
            ),
        ];
        let summary = aggregate(&reports);
        let md = render(&reports, &summary, Utc::now()).unwrap();

        assert!(md.starts_with("# GeoJSON Validation Report"));
        assert!(md.contains("**Success Rate:** 50.0%"));
        assert!(md.contains("| pilot1_utrecht.geojson | utrecht | 1 | FAIL | 0/1 | 2.0KB | 0.25s |"));
        assert!(md.contains("## Files with Majority Failed Tests"));
        assert!(md.contains("- `region_bounds` (critical): Critical error in region_bounds: boom"));

        let first = md.find("| pilot1_utrecht").unwrap();
        let second = md.find("| pilot2_utrecht").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_render_empty_run_skips_optional_sections() {
        let summary = aggregate(&[]);
        let md = render(&[], &summary, Utc::now()).expect("render should not fail");

        assert!(md.contains("**Total Files:** 0"));
        assert!(md.contains("## Detailed Results"));
        assert!(!md.contains("## Batches"));
        assert!(!md.contains("## Files with Majority Failed Tests"));
    }
}
