//! Package filter configuration
//!
//! This module provides the PackageFilter struct that narrows a parsed
//! manifest down to the packages the caller asked about.

use crate::domain::DependencyEntry;

/// Filter configuration applied after manifest parsing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageFilter {
    /// Packages to leave out
    pub exclude: Vec<String>,
    /// If non-empty, only these packages are checked
    pub only: Vec<String>,
}

impl PackageFilter {
    /// Create a new PackageFilter that keeps everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Set packages to exclude
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set packages to include (only list)
    pub fn with_only(mut self, only: Vec<String>) -> Self {
        self.only = only;
        self
    }

    /// Check if a package should be processed based on filters
    pub fn should_process_package(&self, name: &str) -> bool {
        // --only takes precedence over --exclude
        if !self.only.is_empty() {
            return self.only.iter().any(|p| p == name);
        }
        !self.exclude.iter().any(|p| p == name)
    }

    /// Keeps only the entries that pass the filter
    pub fn apply(&self, entries: Vec<DependencyEntry>) -> Vec<DependencyEntry> {
        entries
            .into_iter()
            .filter(|entry| self.should_process_package(&entry.name))
            .collect()
    }
}
