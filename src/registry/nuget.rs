//! NuGet v3 adapter
//!
//! NuGet resolution is a chain: the service index names the resource URLs,
//! the flat container lists versions, and the registration feed carries
//! per-version metadata. The service index is shared with the advisory
//! source and cached with a TTL.

use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::registry::{
    HttpClient, PackageMetadata, PublishedVersion, RegistryAdapter, TtlCache, VersionSet,
};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const REGISTRY_NAME: &str = "NuGet";

/// Flat container resource types, most preferred first
const PACKAGE_BASE_TYPES: &[&str] = &["PackageBaseAddress/3.0.0"];

/// Registration resource types, most preferred first
const REGISTRATION_TYPES: &[&str] = &[
    "RegistrationsBaseUrl/3.6.0",
    "RegistrationsBaseUrl/3.4.0",
    "RegistrationsBaseUrl/3.0.0-beta",
    "RegistrationsBaseUrl",
];

#[derive(Debug, Clone, Deserialize)]
struct ServiceIndex {
    #[serde(default)]
    resources: Vec<ServiceResource>,
}

#[derive(Debug, Clone, Deserialize)]
struct ServiceResource {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    kind: String,
}

/// Resolves resource URLs from a NuGet v3 service index
#[derive(Clone)]
pub struct NugetServiceIndex {
    client: HttpClient,
    index_url: String,
    cache: Arc<TtlCache<Arc<Vec<ServiceResource>>>>,
}

impl NugetServiceIndex {
    pub fn new(client: HttpClient, index_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            client,
            index_url: index_url.into(),
            cache: Arc::new(TtlCache::new(ttl)),
        }
    }

    async fn resources(&self, package: &str) -> Result<Arc<Vec<ServiceResource>>, RegistryError> {
        if let Some(resources) = self.cache.get(&self.index_url) {
            return Ok(resources);
        }
        let index: ServiceIndex = self
            .client
            .get_json(&self.index_url, package, REGISTRY_NAME)
            .await?;
        let resources = Arc::new(index.resources);
        self.cache.insert(self.index_url.clone(), resources.clone());
        Ok(resources)
    }

    /// URL of the first resource matching one of `types`, in preference order
    pub async fn resource(&self, types: &[&str], package: &str) -> Result<String, RegistryError> {
        let resources = self.resources(package).await?;
        types
            .iter()
            .find_map(|kind| resources.iter().find(|r| r.kind == *kind))
            .map(|r| r.id.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                RegistryError::invalid_response(
                    package,
                    REGISTRY_NAME,
                    format!("service index has no {} resource", types.join(" / ")),
                )
            })
    }
}

#[derive(Debug, Deserialize)]
struct FlatContainerIndex {
    #[serde(default)]
    versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegistrationIndex {
    #[serde(default)]
    items: Vec<RegistrationPage>,
}

#[derive(Debug, Deserialize)]
struct RegistrationPage {
    #[serde(rename = "@id")]
    id: String,
    /// Inlined leaves; absent for large packages, whose pages are fetched separately
    #[serde(default)]
    items: Option<Vec<RegistrationLeaf>>,
}

#[derive(Debug, Deserialize)]
struct RegistrationLeaf {
    #[serde(rename = "catalogEntry")]
    catalog_entry: CatalogEntry,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogEntry {
    version: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default = "default_listed")]
    listed: bool,
    #[serde(rename = "licenseExpression", default)]
    license_expression: Option<String>,
    #[serde(default)]
    authors: Option<String>,
    #[serde(default)]
    deprecation: Option<serde_json::Value>,
}

fn default_listed() -> bool {
    true
}

impl CatalogEntry {
    /// NuGet reports unlisted versions with a 1900 publish date
    fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published
            .as_deref()
            .and_then(|p| p.parse::<DateTime<Utc>>().ok())
            .filter(|p| p.year() > 1900)
    }

    fn is_listed(&self) -> bool {
        self.listed && !self.published.as_deref().is_some_and(|p| p.starts_with("1900-"))
    }
}

/// NuGet adapter
pub struct NugetAdapter {
    client: HttpClient,
    index: NugetServiceIndex,
}

impl NugetAdapter {
    pub fn new(client: HttpClient, index: NugetServiceIndex) -> Self {
        Self { client, index }
    }

    /// Catalog entries of the last registration page, the newest versions
    async fn fetch_catalog(&self, package: &str, id: &str) -> Result<Vec<CatalogEntry>, RegistryError> {
        let base = self.index.resource(REGISTRATION_TYPES, package).await?;
        let url = format!("{}/{}/index.json", base, id);
        let registration: RegistrationIndex =
            self.client.get_json(&url, package, REGISTRY_NAME).await?;

        let mut entries = Vec::new();
        for page in registration.items {
            let leaves = match page.items {
                Some(leaves) => leaves,
                None => {
                    let page: RegistrationPage =
                        self.client.get_json(&page.id, package, REGISTRY_NAME).await?;
                    page.items.unwrap_or_default()
                }
            };
            entries.extend(leaves.into_iter().map(|leaf| leaf.catalog_entry));
        }
        Ok(entries)
    }
}

#[async_trait]
impl RegistryAdapter for NugetAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::DotNet
    }

    fn registry_name(&self) -> &'static str {
        REGISTRY_NAME
    }

    async fn fetch_versions(&self, package: &str) -> Result<VersionSet, RegistryError> {
        let id = package.to_ascii_lowercase();
        let base = self.index.resource(PACKAGE_BASE_TYPES, package).await?;
        let url = format!("{}/{}/index.json", base, id);
        let flat: FlatContainerIndex = self.client.get_json(&url, package, REGISTRY_NAME).await?;

        // Registration metadata is optional; versions alone are enough to classify
        let catalog = match self.fetch_catalog(package, &id).await {
            Ok(catalog) => catalog,
            Err(e) => {
                debug!(package, error = %e, "NuGet registration metadata unavailable");
                Vec::new()
            }
        };

        let versions = flat
            .versions
            .into_iter()
            .map(|version| {
                let entry = catalog
                    .iter()
                    .find(|c| c.version.eq_ignore_ascii_case(&version));
                PublishedVersion::new(version)
                    .yanked(entry.is_some_and(|c| !c.is_listed()))
                    .deprecated(entry.is_some_and(|c| c.deprecation.is_some()))
                    .published_at(entry.and_then(CatalogEntry::published_at))
            })
            .collect();
        let set = VersionSet::new(versions);

        let newest = set
            .latest_stable()
            .or_else(|| set.latest())
            .and_then(|v| catalog.iter().find(|c| c.version.eq_ignore_ascii_case(v)));

        let metadata = PackageMetadata {
            license: newest
                .and_then(|c| c.license_expression.clone())
                .filter(|l| !l.is_empty()),
            last_update: catalog
                .iter()
                .filter_map(CatalogEntry::published_at)
                .max()
                .map(|t| t.to_rfc3339()),
            maintainers_count: newest
                .and_then(|c| c.authors.as_deref())
                .map(|a| a.split(',').filter(|s| !s.trim().is_empty()).count())
                .filter(|n| *n > 0),
        };

        Ok(set.with_metadata(metadata))
    }
}
