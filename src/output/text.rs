//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Dependency status display grouped by status, with colors
//! - Vulnerability listing ordered by severity
//! - Summary with per-status counts

use crate::domain::{DependencyResult, DependencyStatus, PackageVulnerabilities, Severity};
use crate::output::{AnalysisReport, OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn status_heading(&self, status: DependencyStatus) -> String {
        let label = match status {
            DependencyStatus::Major => "Major updates available",
            DependencyStatus::Outdated => "Outdated",
            DependencyStatus::Current => "Up to date",
        };
        if !self.color {
            return label.to_string();
        }
        match status {
            DependencyStatus::Major => label.red().bold().to_string(),
            DependencyStatus::Outdated => label.yellow().bold().to_string(),
            DependencyStatus::Current => label.green().bold().to_string(),
        }
    }

    fn severity_label(&self, severity: Severity) -> String {
        let label = severity.as_str();
        if !self.color {
            return label.to_string();
        }
        match severity {
            Severity::Critical => label.red().bold().to_string(),
            Severity::High => label.red().to_string(),
            Severity::Moderate => label.yellow().to_string(),
            Severity::Low => label.dimmed().to_string(),
        }
    }

    fn format_dependency(
        &self,
        dep: &DependencyResult,
        width: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let name = format!("{:width$}", dep.name);

        if dep.status == DependencyStatus::Current {
            writeln!(writer, "  {}  {}", name, dep.current_version)?;
        } else {
            let target = dep.latest_stable.as_deref().unwrap_or(&dep.latest_version);
            if self.color {
                writeln!(
                    writer,
                    "  {}  {} {} {}",
                    name,
                    dep.current_version.dimmed(),
                    "→".dimmed(),
                    target.green()
                )?;
            } else {
                writeln!(writer, "  {}  {} -> {}", name, dep.current_version, target)?;
            }
        }

        if self.verbosity == Verbosity::Verbose {
            self.format_metadata(dep, writer)?;
        }
        Ok(())
    }

    fn format_metadata(&self, dep: &DependencyResult, writer: &mut dyn Write) -> std::io::Result<()> {
        let mut parts = Vec::new();
        if dep.is_prerelease {
            parts.push(format!("latest {} is a pre-release", dep.latest_version));
        }
        if let Some(license) = &dep.license {
            parts.push(format!("license {}", license));
        }
        if let Some(last_update) = &dep.last_update {
            parts.push(format!("published {}", last_update));
        }
        if let Some(count) = dep.maintainers_count {
            parts.push(format!("{} maintainer(s)", count));
        }
        if parts.is_empty() {
            return Ok(());
        }

        let line = parts.join(", ");
        if self.color {
            writeln!(writer, "      {}", line.dimmed())
        } else {
            writeln!(writer, "      {}", line)
        }
    }

    fn format_dependencies(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let width = report
            .dependencies
            .iter()
            .map(|d| d.name.len())
            .max()
            .unwrap_or(0);

        for status in [
            DependencyStatus::Major,
            DependencyStatus::Outdated,
            DependencyStatus::Current,
        ] {
            // Up-to-date packages are noise unless asked for
            if status == DependencyStatus::Current && self.verbosity != Verbosity::Verbose {
                continue;
            }
            let group: Vec<_> = report
                .dependencies
                .iter()
                .filter(|d| d.status == status)
                .collect();
            if group.is_empty() {
                continue;
            }

            writeln!(writer, "{} ({}):", self.status_heading(status), group.len())?;
            for dep in group {
                self.format_dependency(dep, width, writer)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    fn format_package_vulnerabilities(
        &self,
        package: &PackageVulnerabilities,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.color {
            writeln!(writer, "  {} {}", package.package.bold(), package.installed_version.dimmed())?;
        } else {
            writeln!(writer, "  {} {}", package.package, package.installed_version)?;
        }

        for vuln in &package.vulnerabilities {
            let id = match &vuln.cve {
                Some(cve) if cve != &vuln.advisory_id => format!("{} / {}", vuln.advisory_id, cve),
                _ => vuln.advisory_id.clone(),
            };
            writeln!(
                writer,
                "    [{}] {}: {}",
                self.severity_label(vuln.severity),
                id,
                vuln.title
            )?;
            if !vuln.affected_versions_description.is_empty() {
                writeln!(writer, "      affected: {}", vuln.affected_versions_description)?;
            }
            if self.verbosity == Verbosity::Verbose {
                writeln!(writer, "      {}", vuln.reference)?;
            }
        }
        Ok(())
    }

    fn format_vulnerabilities(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if report.vulnerabilities.is_none() {
            return Ok(());
        }

        let mut vulnerable: Vec<_> = report.vulnerable().collect();
        if vulnerable.is_empty() {
            if self.color {
                writeln!(writer, "{}", "No known vulnerabilities".green())?;
            } else {
                writeln!(writer, "No known vulnerabilities")?;
            }
            writeln!(writer)?;
            return Ok(());
        }

        // Worst packages first; ties keep name order
        vulnerable.sort_by(|a, b| b.max_severity().cmp(&a.max_severity()));

        if self.color {
            writeln!(writer, "{} ({}):", "Vulnerabilities".red().bold(), vulnerable.len())?;
        } else {
            writeln!(writer, "Vulnerabilities ({}):", vulnerable.len())?;
        }
        for package in vulnerable {
            self.format_package_vulnerabilities(package, writer)?;
        }
        writeln!(writer)
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        // In quiet mode, only show summary
        if self.verbosity == Verbosity::Quiet {
            return self.format_summary(report, writer);
        }

        if self.verbosity == Verbosity::Verbose {
            writeln!(
                writer,
                "{} ({})",
                report.path.display(),
                report.ecosystem.display_name()
            )?;
            writeln!(writer)?;
        }

        self.format_dependencies(report, writer)?;
        self.format_vulnerabilities(report, writer)?;
        self.format_summary(report, writer)
    }

    fn format_summary(&self, report: &AnalysisReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let summary = report.summary();

        if self.verbosity == Verbosity::Quiet {
            let mut line = format!(
                "{} major, {} outdated, {} current",
                summary.major, summary.outdated, summary.current
            );
            if report.vulnerabilities.is_some() {
                line.push_str(&format!(", {} vulnerable", summary.vulnerable));
            }
            return writeln!(writer, "{}", line);
        }

        if self.color {
            writeln!(writer, "{}:", "Summary".bold())?;
            writeln!(
                writer,
                "  {} package(s) checked: {} major, {} outdated, {} current",
                summary.total,
                summary.major.to_string().red(),
                summary.outdated.to_string().yellow(),
                summary.current.to_string().green()
            )?;
        } else {
            writeln!(writer, "Summary:")?;
            writeln!(
                writer,
                "  {} package(s) checked: {} major, {} outdated, {} current",
                summary.total, summary.major, summary.outdated, summary.current
            )?;
        }

        if report.vulnerabilities.is_some() {
            let line = format!(
                "  {} vulnerable package(s), {} advisory match(es)",
                summary.vulnerable, summary.advisories
            );
            if self.color && summary.vulnerable > 0 {
                writeln!(writer, "{}", line.red())?;
            } else {
                writeln!(writer, "{}", line)?;
            }
        }
        Ok(())
    }
}
