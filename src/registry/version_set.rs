//! Published versions of one package, as reported by its registry
//!
//! Fetched per request and never persisted.

use crate::version::{compare_versions, is_prerelease_version};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// One published version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedVersion {
    pub version: String,
    /// Withdrawn by the publisher (yanked, unlisted)
    pub yanked: bool,
    pub prerelease: bool,
    pub deprecated: bool,
    pub published_at: Option<DateTime<Utc>>,
}

impl PublishedVersion {
    /// Creates a version entry; the prerelease flag is derived from the string
    pub fn new(version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            prerelease: is_prerelease_version(&version),
            version,
            yanked: false,
            deprecated: false,
            published_at: None,
        }
    }

    pub fn yanked(mut self, yanked: bool) -> Self {
        self.yanked = yanked;
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    pub fn published_at(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.published_at = published_at;
        self
    }
}

impl Ord for PublishedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.version, &other.version)
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for PublishedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Package-level metadata, where the registry exposes it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    pub license: Option<String>,
    /// RFC 3339 timestamp of the most recent publish
    pub last_update: Option<String>,
    pub maintainers_count: Option<usize>,
}

/// Everything the classifier needs from a registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionSet {
    /// Ascending by version
    pub versions: Vec<PublishedVersion>,
    /// Version the registry itself marks as latest (npm dist-tag, PyPI info.version, ...)
    pub latest_tag: Option<String>,
    /// Latest stable version as reported by the registry, when it reports one
    pub stable_tag: Option<String>,
    pub metadata: PackageMetadata,
}

impl VersionSet {
    /// Builds a set from unsorted versions
    pub fn new(mut versions: Vec<PublishedVersion>) -> Self {
        versions.sort();
        versions.dedup_by(|a, b| a.version == b.version);
        Self {
            versions,
            ..Default::default()
        }
    }

    pub fn with_latest_tag(mut self, tag: Option<String>) -> Self {
        self.latest_tag = tag.filter(|t| !t.is_empty());
        self
    }

    pub fn with_stable_tag(mut self, tag: Option<String>) -> Self {
        self.stable_tag = tag.filter(|t| !t.is_empty());
        self
    }

    pub fn with_metadata(mut self, metadata: PackageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty() && self.latest_tag.is_none()
    }

    fn installable(&self) -> impl DoubleEndedIterator<Item = &PublishedVersion> {
        self.versions.iter().filter(|v| !v.yanked)
    }

    /// The registry's latest tag, else the highest non-yanked version
    pub fn latest(&self) -> Option<&str> {
        self.latest_tag
            .as_deref()
            .or_else(|| self.installable().next_back().map(|v| v.version.as_str()))
    }

    /// Highest non-yanked, non-prerelease version
    pub fn latest_stable(&self) -> Option<&str> {
        self.stable_tag.as_deref().or_else(|| {
            self.installable()
                .filter(|v| !v.prerelease)
                .next_back()
                .map(|v| v.version.as_str())
        })
    }

    /// Looks up one published version
    pub fn get(&self, version: &str) -> Option<&PublishedVersion> {
        self.versions.iter().find(|v| v.version == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn set(versions: &[&str]) -> VersionSet {
        VersionSet::new(versions.iter().map(|v| PublishedVersion::new(*v)).collect())
    }

    #[test]
    fn test_published_version_new() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let info = PublishedVersion::new("1.2.3").published_at(Some(date));
        assert_eq!(info.version, "1.2.3");
        assert_eq!(info.published_at, Some(date));
        assert!(!info.prerelease);
        assert!(PublishedVersion::new("2.0.0-rc.1").prerelease);
    }

    #[test]
    fn test_sorted_ascending() {
        let set = set(&["2.0.0", "1.0.0", "1.10.0", "1.9.0"]);
        let order: Vec<_> = set.versions.iter().map(|v| v.version.as_str()).collect();
        assert_eq!(order, ["1.0.0", "1.9.0", "1.10.0", "2.0.0"]);
    }

    #[test]
    fn test_latest_prefers_tag() {
        let set = set(&["1.0.0", "2.0.0"]).with_latest_tag(Some("1.0.0".to_string()));
        assert_eq!(set.latest(), Some("1.0.0"));
    }

    #[test]
    fn test_latest_falls_back_to_highest() {
        let set = set(&["1.0.0", "3.0.0-beta.1", "2.0.0"]);
        assert_eq!(set.latest(), Some("3.0.0-beta.1"));
        assert_eq!(set.latest_stable(), Some("2.0.0"));
    }

    #[test]
    fn test_yanked_versions_skipped() {
        let set = VersionSet::new(vec![
            PublishedVersion::new("1.0.0"),
            PublishedVersion::new("1.1.0").yanked(true),
        ]);
        assert_eq!(set.latest(), Some("1.0.0"));
        assert_eq!(set.latest_stable(), Some("1.0.0"));
        assert!(set.get("1.1.0").unwrap().yanked);
    }

    #[test]
    fn test_empty() {
        assert!(VersionSet::default().is_empty());
        assert_eq!(VersionSet::default().latest(), None);
        assert!(!VersionSet::default()
            .with_latest_tag(Some("1.0".to_string()))
            .is_empty());
    }

    #[test]
    fn test_empty_tag_ignored() {
        let set = set(&["1.0.0"]).with_latest_tag(Some(String::new()));
        assert_eq!(set.latest_tag, None);
    }

    #[test]
    fn test_duplicate_versions_removed() {
        let set = set(&["1.0.0", "1.0.0", "0.9.0"]);
        assert_eq!(set.versions.len(), 2);
    }
}
