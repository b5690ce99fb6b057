//! Go Module Proxy adapter
//!
//! Fetches module version information from the Go Module Proxy.
//! API endpoints:
//! - List versions: {base}/{module}/@v/list
//! - Latest version: {base}/{module}/@latest (when the list is empty)
//! - Version info: {base}/{module}/@v/{version}.info

use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::parser::is_pseudo_version;
use crate::registry::{HttpClient, PackageMetadata, PublishedVersion, RegistryAdapter, VersionSet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

/// Go Module Proxy adapter
pub struct GoProxyAdapter {
    client: HttpClient,
    base_url: String,
}

/// Version info response
#[derive(Debug, Deserialize)]
struct VersionInfoResponse {
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "Time", default)]
    time: Option<String>,
}

impl GoProxyAdapter {
    /// Create a new Go Proxy adapter
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn module_url(&self, module: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            encode_module_path(module)
        )
    }

    /// Build the URL for listing versions
    fn build_list_url(&self, module: &str) -> String {
        format!("{}/@v/list", self.module_url(module))
    }

    fn build_latest_url(&self, module: &str) -> String {
        format!("{}/@latest", self.module_url(module))
    }

    /// Build the URL for version info
    fn build_info_url(&self, module: &str, version: &str) -> String {
        format!("{}/@v/{}.info", self.module_url(module), version)
    }

    async fn fetch_info(&self, url: &str, module: &str) -> Result<VersionInfoResponse, RegistryError> {
        self.client
            .get_json::<VersionInfoResponse>(url, module, self.registry_name())
            .await
    }
}

/// Go Proxy uses case-encoded paths where uppercase letters become !lowercase
fn encode_module_path(module: &str) -> String {
    let mut encoded = String::with_capacity(module.len() + 4);
    for ch in module.chars() {
        if ch.is_uppercase() {
            encoded.push('!');
            encoded.extend(ch.to_lowercase());
        } else {
            encoded.push(ch);
        }
    }
    encoded
}

fn parse_time(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|t| t.parse::<DateTime<Utc>>().ok())
}

#[async_trait]
impl RegistryAdapter for GoProxyAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn registry_name(&self) -> &'static str {
        "Go Proxy"
    }

    async fn fetch_versions(&self, module: &str) -> Result<VersionSet, RegistryError> {
        let list_url = self.build_list_url(module);
        let version_list = self
            .client
            .get_text(&list_url, module, self.registry_name())
            .await?;

        let mut versions: Vec<PublishedVersion> = version_list
            .lines()
            .map(str::trim)
            .filter(|v| !v.is_empty() && !is_pseudo_version(v))
            .map(PublishedVersion::new)
            .collect();

        if versions.is_empty() {
            // Modules without tagged releases only answer @latest
            let latest = self.fetch_info(&self.build_latest_url(module), module).await?;
            let published_at = parse_time(latest.time.as_deref());
            let set = VersionSet::new(vec![
                PublishedVersion::new(latest.version).published_at(published_at)
            ]);
            return Ok(set.with_metadata(PackageMetadata {
                last_update: published_at.map(|t| t.to_rfc3339()),
                ..Default::default()
            }));
        }

        versions.sort();
        let mut metadata = PackageMetadata::default();

        // Only the newest release's timestamp is fetched; one request per
        // version would multiply proxy traffic for long histories
        if let Some(newest) = versions.last_mut() {
            let info_url = self.build_info_url(module, &newest.version);
            match self.fetch_info(&info_url, module).await {
                Ok(info) => {
                    newest.published_at = parse_time(info.time.as_deref());
                    metadata.last_update = newest.published_at.map(|t| t.to_rfc3339());
                }
                Err(e) => debug!(module, error = %e, "no release time for newest version"),
            }
        }

        Ok(VersionSet::new(versions).with_metadata(metadata))
    }
}
