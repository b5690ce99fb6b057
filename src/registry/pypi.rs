//! PyPI JSON API adapter
//!
//! Fetches package version information from PyPI.
//! API endpoint: {base}/pypi/{package}/json

use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::registry::{HttpClient, PackageMetadata, PublishedVersion, RegistryAdapter, VersionSet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// PyPI adapter
pub struct PyPIAdapter {
    client: HttpClient,
    base_url: String,
}

/// PyPI package metadata response
#[derive(Debug, Deserialize)]
struct PyPIResponse {
    info: PyPIInfo,
    /// Release files keyed by version
    #[serde(default)]
    releases: HashMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Deserialize)]
struct PyPIInfo {
    version: String,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    classifiers: Vec<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    maintainer: Option<String>,
}

/// Release file information
#[derive(Debug, Deserialize)]
struct ReleaseFile {
    upload_time_iso_8601: Option<String>,
    #[serde(default)]
    yanked: bool,
}

impl PyPIAdapter {
    /// Create a new PyPI adapter
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/pypi/{}/json", self.base_url.trim_end_matches('/'), package)
    }
}

impl PyPIInfo {
    /// The `license` field, or the last segment of a `License ::` classifier
    fn license(&self) -> Option<String> {
        let declared = self
            .license
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty() && l.len() <= 64 && !l.contains('\n'));
        if let Some(license) = declared {
            return Some(license.to_string());
        }
        self.classifiers
            .iter()
            .filter(|c| c.starts_with("License ::"))
            .filter_map(|c| c.rsplit("::").next())
            .map(str::trim)
            .find(|l| !l.is_empty() && *l != "OSI Approved")
            .map(str::to_string)
    }

    /// Distinct non-empty author/maintainer fields
    fn maintainers_count(&self) -> Option<usize> {
        let mut names: Vec<&str> = [self.author.as_deref(), self.maintainer.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();
        names.dedup();
        (!names.is_empty()).then_some(names.len())
    }
}

#[async_trait]
impl RegistryAdapter for PyPIAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn registry_name(&self) -> &'static str {
        "PyPI"
    }

    async fn fetch_versions(&self, package: &str) -> Result<VersionSet, RegistryError> {
        let url = self.build_url(package);
        let response: PyPIResponse = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;

        let mut versions = Vec::with_capacity(response.releases.len());
        let mut last_update: Option<DateTime<Utc>> = None;

        for (version, files) in response.releases {
            // Earliest file upload is the release time
            let published_at = files
                .iter()
                .filter_map(|f| f.upload_time_iso_8601.as_deref())
                .filter_map(|t| t.parse::<DateTime<Utc>>().ok())
                .min();
            // A release is withdrawn only when every file is yanked
            let yanked = !files.is_empty() && files.iter().all(|f| f.yanked);

            last_update = last_update.max(published_at);
            versions.push(
                PublishedVersion::new(version)
                    .yanked(yanked)
                    .published_at(published_at),
            );
        }

        let metadata = PackageMetadata {
            license: response.info.license(),
            last_update: last_update.map(|t| t.to_rfc3339()),
            maintainers_count: response.info.maintainers_count(),
        };

        Ok(VersionSet::new(versions)
            .with_latest_tag(Some(response.info.version))
            .with_metadata(metadata))
    }
}
