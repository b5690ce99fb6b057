//! Packagist Registry adapter
//!
//! Fetches package version information from the Composer v2 metadata API.
//! API endpoint: {base}/p2/{vendor}/{package}.json
//!
//! The v2 payload is "minified": the first entry of the version list is
//! complete and every following entry lists only the fields that changed,
//! with the string `"__unset"` marking a removed field.

use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::registry::{HttpClient, PackageMetadata, PublishedVersion, RegistryAdapter, VersionSet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Packagist Registry adapter
pub struct PackagistAdapter {
    client: HttpClient,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PackagistResponse {
    #[serde(default)]
    packages: HashMap<String, Vec<Map<String, Value>>>,
    #[serde(default)]
    minified: Option<String>,
}

/// One version entry after minification has been undone
#[derive(Debug, Default, Deserialize)]
struct PackagistVersion {
    version: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    license: Vec<String>,
    #[serde(default)]
    authors: Vec<Value>,
    #[serde(default)]
    abandoned: Option<Value>,
}

impl PackagistAdapter {
    /// Create a new Packagist adapter
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build the URL for a package
    /// Package names are in the format vendor/package
    fn build_url(&self, package: &str) -> String {
        format!(
            "{}/p2/{}.json",
            self.base_url.trim_end_matches('/'),
            package.to_ascii_lowercase()
        )
    }
}

/// Branch aliases such as `dev-main` or `2.x-dev` are not releases
fn is_dev_version(version: &str) -> bool {
    version.starts_with("dev-") || version.ends_with("-dev")
}

/// Rebuilds full entries from a minified version list
fn expand_minified(entries: Vec<Map<String, Value>>) -> Vec<Map<String, Value>> {
    let mut expanded = Vec::with_capacity(entries.len());
    let mut previous: Map<String, Value> = Map::new();

    for entry in entries {
        for (key, value) in entry {
            if value.as_str() == Some("__unset") {
                previous.remove(&key);
            } else {
                previous.insert(key, value);
            }
        }
        expanded.push(previous.clone());
    }

    expanded
}

#[async_trait]
impl RegistryAdapter for PackagistAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Php
    }

    fn registry_name(&self) -> &'static str {
        "Packagist"
    }

    async fn fetch_versions(&self, package: &str) -> Result<VersionSet, RegistryError> {
        let url = self.build_url(package);
        let mut response: PackagistResponse = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;

        let entries = response
            .packages
            .remove(&package.to_ascii_lowercase())
            .or_else(|| response.packages.into_values().next())
            .ok_or_else(|| RegistryError::package_not_found(package, self.registry_name()))?;

        let entries = if response.minified.is_some() {
            expand_minified(entries)
        } else {
            entries
        };

        let mut releases = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<PackagistVersion>(Value::Object(entry)) {
                Ok(release) if !is_dev_version(&release.version) => releases.push(release),
                Ok(_) => {}
                Err(e) => {
                    return Err(RegistryError::invalid_response(
                        package,
                        self.registry_name(),
                        e.to_string(),
                    ))
                }
            }
        }

        let mut versions = Vec::with_capacity(releases.len());
        for release in &releases {
            let published_at = release
                .time
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc));
            versions.push(
                PublishedVersion::new(release.version.clone())
                    .deprecated(release.abandoned.as_ref().is_some_and(|a| a != &Value::Bool(false)))
                    .published_at(published_at),
            );
        }

        let set = VersionSet::new(versions);
        let newest = set
            .latest_stable()
            .or_else(|| set.latest())
            .and_then(|latest| releases.iter().find(|r| r.version == latest));

        let metadata = PackageMetadata {
            license: newest
                .filter(|r| !r.license.is_empty())
                .map(|r| r.license.join(" OR ")),
            last_update: set
                .versions
                .iter()
                .filter_map(|v| v.published_at)
                .max()
                .map(|t| t.to_rfc3339()),
            maintainers_count: newest.map(|r| r.authors.len()).filter(|n| *n > 0),
        };

        Ok(set.with_metadata(metadata))
    }
}
