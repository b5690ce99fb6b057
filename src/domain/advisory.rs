//! Vulnerability match types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity ranking of an advisory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    /// Bands a CVSS base score: `>=9` critical, `>=7` high, `>=4` moderate, `>0` low
    pub fn from_cvss(score: f64) -> Option<Self> {
        if score >= 9.0 {
            Some(Severity::Critical)
        } else if score >= 7.0 {
            Some(Severity::High)
        } else if score >= 4.0 {
            Some(Severity::Moderate)
        } else if score > 0.0 {
            Some(Severity::Low)
        } else {
            None
        }
    }

    /// Parses a machine severity label as used by GitHub, OSV and NuGet feeds
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" | "important" => Some(Severity::High),
            "moderate" | "medium" => Some(Severity::Moderate),
            "low" | "minor" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An advisory that applies to an installed version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityMatch {
    pub advisory_id: String,
    pub package_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,
    /// Human-readable description of the affected range(s)
    pub affected_versions_description: String,
    pub severity: Severity,
    pub reference: String,
}

/// All advisories matching one installed package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageVulnerabilities {
    pub package: String,
    pub installed_version: String,
    pub is_vulnerable: bool,
    pub vulnerabilities: Vec<VulnerabilityMatch>,
}

impl PackageVulnerabilities {
    pub fn new(
        package: impl Into<String>,
        installed_version: impl Into<String>,
        mut vulnerabilities: Vec<VulnerabilityMatch>,
    ) -> Self {
        vulnerabilities.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.advisory_id.cmp(&b.advisory_id))
        });
        Self {
            package: package.into(),
            installed_version: installed_version.into(),
            is_vulnerable: !vulnerabilities.is_empty(),
            vulnerabilities,
        }
    }

    /// Highest severity among the matches
    pub fn max_severity(&self) -> Option<Severity> {
        self.vulnerabilities.iter().map(|v| v.severity).max()
    }
}
