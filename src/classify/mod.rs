//! Status classification for resolved dependencies
//!
//! This module provides:
//! - Package filter configuration from CLI args
//! - The status classifier: range shortcut, direct comparison, then major
//!   version divergence
//! - Result ordering: major first, then outdated, then current

mod filter;

pub use filter::PackageFilter;

use crate::domain::{DependencyEntry, DependencyResult, DependencyStatus, Ecosystem, ParsedVersion};
use crate::registry::VersionSet;
use crate::version::{compare_versions, is_prerelease_version, major_version, Requirement};
use std::cmp::Ordering;

/// Classifies dependencies of one ecosystem against registry data
#[derive(Debug, Clone, Copy)]
pub struct StatusClassifier {
    ecosystem: Ecosystem,
}

impl StatusClassifier {
    pub fn new(ecosystem: Ecosystem) -> Self {
        Self { ecosystem }
    }

    /// The version the dependency is measured against: the stable release
    /// when the registry's latest is something else, otherwise latest
    pub fn target<'a>(latest: &'a str, latest_stable: Option<&'a str>) -> &'a str {
        match latest_stable {
            Some(stable) if stable != latest => stable,
            _ => latest,
        }
    }

    /// Assigns a status from the parsed specifier and the registry's versions
    pub fn classify(
        &self,
        parsed: &ParsedVersion,
        latest: &str,
        latest_stable: Option<&str>,
    ) -> DependencyStatus {
        let target = Self::target(latest, latest_stable);

        if self.range_admits(parsed, target) {
            return DependencyStatus::Current;
        }

        if compare_versions(&parsed.cleaned, target) != Ordering::Less {
            return DependencyStatus::Current;
        }

        match (major_version(&parsed.cleaned), major_version(target)) {
            (Some(current), Some(target)) if current < target => DependencyStatus::Major,
            _ => DependencyStatus::Outdated,
        }
    }

    fn range_admits(&self, parsed: &ParsedVersion, target: &str) -> bool {
        self.ecosystem.supports_ranges()
            && parsed.is_range()
            && Requirement::parse(self.ecosystem, &parsed.original)
                .is_some_and(|requirement| requirement.admits(target))
    }

    /// Builds the result record, or `None` if the registry has no usable version
    pub fn resolve(
        &self,
        entry: &DependencyEntry,
        parsed: &ParsedVersion,
        versions: &VersionSet,
    ) -> Option<DependencyResult> {
        let latest = versions.latest()?;
        let latest_stable = versions.latest_stable();

        Some(DependencyResult {
            name: entry.name.clone(),
            current_version: entry.raw_specifier.clone(),
            latest_version: latest.to_string(),
            latest_stable: latest_stable.map(str::to_string),
            status: self.classify(parsed, latest, latest_stable),
            is_prerelease: is_prerelease_version(latest),
            license: versions.metadata.license.clone(),
            last_update: versions.metadata.last_update.clone(),
            maintainers_count: versions.metadata.maintainers_count,
        })
    }
}

/// Sorts results by status rank, then by name
pub fn sort_results(results: &mut [DependencyResult]) {
    results.sort_by(DependencyResult::sort_order);
}
