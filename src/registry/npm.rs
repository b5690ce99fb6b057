//! npm Registry adapter
//!
//! Fetches package version information from the npm registry.
//! API endpoint: {base}/{package} (scoped names are sent as `@scope%2Fname`)

use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::registry::{HttpClient, PackageMetadata, PublishedVersion, RegistryAdapter, VersionSet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// npm Registry adapter
pub struct NpmAdapter {
    client: HttpClient,
    base_url: String,
}

/// npm package document (full, not abbreviated, so `time` and `license` are present)
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    time: HashMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, NpmVersion>,
    #[serde(default)]
    license: Option<NpmLicense>,
    #[serde(default)]
    maintainers: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct NpmVersion {
    /// Deprecation message; any value marks the version deprecated
    #[serde(default)]
    deprecated: Option<serde_json::Value>,
    #[serde(default)]
    license: Option<NpmLicense>,
}

/// `"MIT"` or the legacy `{ "type": "MIT", "url": ... }` form
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NpmLicense {
    Spdx(String),
    Legacy {
        #[serde(rename = "type")]
        kind: String,
    },
}

impl NpmLicense {
    fn into_string(self) -> String {
        match self {
            NpmLicense::Spdx(s) => s,
            NpmLicense::Legacy { kind } => kind,
        }
    }
}

impl NpmAdapter {
    /// Create a new npm adapter
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            encode_package_name(package)
        )
    }
}

/// `@scope/name` → `@scope%2Fname`
fn encode_package_name(package: &str) -> String {
    if package.starts_with('@') {
        package.replacen('/', "%2F", 1)
    } else {
        package.to_string()
    }
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>().ok()
}

#[async_trait]
impl RegistryAdapter for NpmAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Node
    }

    fn registry_name(&self) -> &'static str {
        "npm"
    }

    async fn fetch_versions(&self, package: &str) -> Result<VersionSet, RegistryError> {
        let url = self.build_url(package);
        let response: NpmPackageResponse = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;

        let latest_tag = response.dist_tags.get("latest").cloned();
        let mut latest_license = None;

        let mut versions = Vec::with_capacity(response.versions.len());
        for (version, meta) in response.versions {
            if latest_tag.as_deref() == Some(version.as_str()) {
                latest_license = meta.license.map(NpmLicense::into_string);
            }
            let published_at = response.time.get(&version).and_then(|t| parse_time(t));
            versions.push(
                PublishedVersion::new(version)
                    .deprecated(meta.deprecated.is_some_and(|d| !d.is_null()))
                    .published_at(published_at),
            );
        }

        let last_update = response
            .time
            .get("modified")
            .or_else(|| latest_tag.as_ref().and_then(|tag| response.time.get(tag)))
            .cloned();

        let metadata = PackageMetadata {
            license: response
                .license
                .map(NpmLicense::into_string)
                .or(latest_license),
            last_update,
            maintainers_count: response.maintainers.map(|m| m.len()),
        };

        Ok(VersionSet::new(versions)
            .with_latest_tag(latest_tag)
            .with_metadata(metadata))
    }
}
