//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of status results and advisory matches
//! - A summary block with per-status counts

use crate::domain::{DependencyResult, Ecosystem, PackageVulnerabilities};
use crate::output::{AnalysisReport, OutputFormatter, ReportSummary, Verbosity};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full report
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    /// Path to the manifest file
    manifest: String,
    ecosystem: Ecosystem,
    summary: JsonSummary,
    /// Omitted in quiet mode
    #[serde(skip_serializing_if = "Option::is_none")]
    dependencies: Option<&'a [DependencyResult]>,
    /// Present only when advisories were checked
    #[serde(skip_serializing_if = "Option::is_none")]
    vulnerabilities: Option<Vec<&'a PackageVulnerabilities>>,
}

/// JSON representation of summary statistics
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    total: usize,
    major: usize,
    outdated: usize,
    current: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    vulnerable: Option<usize>,
}

impl JsonSummary {
    fn new(summary: ReportSummary, vulns_checked: bool) -> Self {
        Self {
            total: summary.total,
            major: summary.major,
            outdated: summary.outdated,
            current: summary.current,
            vulnerable: vulns_checked.then_some(summary.vulnerable),
        }
    }
}

impl JsonFormatter {
    fn build<'a>(&self, report: &'a AnalysisReport) -> JsonOutput<'a> {
        let quiet = self.verbosity == Verbosity::Quiet;
        let vulnerabilities = match (&report.vulnerabilities, self.verbosity) {
            (None, _) | (_, Verbosity::Quiet) => None,
            // Clean packages are listed only on request
            (Some(all), Verbosity::Verbose) => Some(all.iter().collect()),
            (Some(_), Verbosity::Normal) => Some(report.vulnerable().collect()),
        };

        JsonOutput {
            manifest: report.path.display().to_string(),
            ecosystem: report.ecosystem,
            summary: JsonSummary::new(report.summary(), report.vulnerabilities.is_some()),
            dependencies: (!quiet).then_some(report.dependencies.as_slice()),
            vulnerabilities,
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = self.build(report);
        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)?;
        Ok(())
    }

    fn format_summary(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let summary = JsonSummary::new(report.summary(), report.vulnerabilities.is_some());
        serde_json::to_writer_pretty(&mut *writer, &summary)?;
        writeln!(writer)?;
        Ok(())
    }
}
