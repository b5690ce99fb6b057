//! Dependency entry and result structures

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A declared dependency as extracted from a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEntry {
    /// Package name
    pub name: String,
    /// Raw version specifier as written in the manifest
    pub raw_specifier: String,
}

impl DependencyEntry {
    /// Creates a new dependency entry
    pub fn new(name: impl Into<String>, raw_specifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_specifier: raw_specifier.into(),
        }
    }
}

impl fmt::Display for DependencyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.raw_specifier)
    }
}

/// How far a dependency lags behind its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStatus {
    /// Behind by a breaking (major) increment
    Major,
    /// Behind by a non-breaking increment
    Outdated,
    /// Up to date, or the declared range already admits the newest release
    Current,
}

impl DependencyStatus {
    /// Sort rank: major first, then outdated, then current
    pub fn rank(&self) -> u8 {
        match self {
            DependencyStatus::Major => 0,
            DependencyStatus::Outdated => 1,
            DependencyStatus::Current => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyStatus::Major => "major",
            DependencyStatus::Outdated => "outdated",
            DependencyStatus::Current => "current",
        }
    }
}

impl fmt::Display for DependencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status record for one resolved dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyResult {
    pub name: String,
    /// The raw specifier from the manifest
    pub current_version: String,
    pub latest_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_stable: Option<String>,
    pub status: DependencyStatus,
    /// Whether the newest published version is a pre-release
    pub is_prerelease: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainers_count: Option<usize>,
}

impl DependencyResult {
    /// Ordering used for result lists: status rank, then case-sensitive name
    pub fn sort_order(&self, other: &Self) -> Ordering {
        self.status
            .rank()
            .cmp(&other.status.rank())
            .then_with(|| self.name.cmp(&other.name))
    }
}
