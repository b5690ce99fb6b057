//! Output formatting for analysis reports
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::domain::{DependencyResult, DependencyStatus, Ecosystem, PackageVulnerabilities};
use std::io::Write;
use std::path::PathBuf;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Summary only
    Quiet,
    /// Outdated and vulnerable packages
    #[default]
    Normal,
    /// Everything, including up-to-date packages and metadata
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// Whether to use colors (when supported)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            color: true,
        }
    }
}

impl OutputConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(json: bool, verbose: bool, quiet: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self {
            format,
            verbosity,
            color: true,
        }
    }
}

/// Everything one run produced for a single manifest
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub path: PathBuf,
    pub ecosystem: Ecosystem,
    /// Sorted status results
    pub dependencies: Vec<DependencyResult>,
    /// Present when advisories were checked
    pub vulnerabilities: Option<Vec<PackageVulnerabilities>>,
}

/// Counts shown in the summary line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub major: usize,
    pub outdated: usize,
    pub current: usize,
    /// Packages with at least one matching advisory
    pub vulnerable: usize,
    /// Matching advisories across all packages
    pub advisories: usize,
}

impl AnalysisReport {
    pub fn summary(&self) -> ReportSummary {
        let count = |status: DependencyStatus| {
            self.dependencies
                .iter()
                .filter(|d| d.status == status)
                .count()
        };
        let vulnerable = self.vulnerable().count();
        let advisories = self.vulnerable().map(|p| p.vulnerabilities.len()).sum();

        ReportSummary {
            total: self.dependencies.len(),
            major: count(DependencyStatus::Major),
            outdated: count(DependencyStatus::Outdated),
            current: count(DependencyStatus::Current),
            vulnerable,
            advisories,
        }
    }

    /// Packages with at least one matching advisory
    pub fn vulnerable(&self) -> impl Iterator<Item = &PackageVulnerabilities> {
        self.vulnerabilities
            .iter()
            .flatten()
            .filter(|p| p.is_vulnerable)
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format and write the whole report
    fn format(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Format and write just the summary
    fn format_summary(&self, report: &AnalysisReport, writer: &mut dyn Write)
        -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(config.verbosity)),
    }
}
