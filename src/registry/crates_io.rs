//! crates.io API adapter
//!
//! Fetches crate version information from crates.io.
//! API endpoint: {base}/api/v1/crates/{crate}
//!
//! Note: crates.io requires a User-Agent header (handled by HttpClient)
//! and asks crawlers to stay at 1 request/second.

use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::registry::{HttpClient, PackageMetadata, PublishedVersion, RegistryAdapter, VersionSet};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Minimum spacing between two requests
const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(1);

/// crates.io adapter with request pacing
pub struct CratesIoAdapter {
    client: HttpClient,
    base_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

/// crates.io crate response
#[derive(Debug, Deserialize)]
struct CratesIoResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
    #[serde(default)]
    versions: Vec<CrateVersion>,
}

#[derive(Debug, Deserialize)]
struct CrateInfo {
    #[serde(default)]
    max_version: Option<String>,
    #[serde(default)]
    max_stable_version: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// Crate version information
#[derive(Debug, Deserialize)]
struct CrateVersion {
    num: String,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    yanked: bool,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    published_by: Option<serde_json::Value>,
}

impl CratesIoAdapter {
    /// Create a new crates.io adapter
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            min_interval: RATE_LIMIT_INTERVAL,
            last_request: Mutex::new(None),
        }
    }

    /// Override the spacing between requests
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Build the URL for a crate
    fn build_url(&self, crate_name: &str) -> String {
        format!(
            "{}/api/v1/crates/{}",
            self.base_url.trim_end_matches('/'),
            crate_name
        )
    }

    /// Waits until `min_interval` has passed since the previous request
    ///
    /// The lock is held across the sleep, so concurrent callers queue up.
    async fn apply_rate_limit(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

#[async_trait]
impl RegistryAdapter for CratesIoAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }

    fn registry_name(&self) -> &'static str {
        "crates.io"
    }

    async fn fetch_versions(&self, crate_name: &str) -> Result<VersionSet, RegistryError> {
        self.apply_rate_limit().await;

        let url = self.build_url(crate_name);
        let response: CratesIoResponse = self
            .client
            .get_json(&url, crate_name, self.registry_name())
            .await?;

        let newest_num = response
            .krate
            .max_stable_version
            .as_deref()
            .or(response.krate.max_version.as_deref());
        let newest = response
            .versions
            .iter()
            .find(|v| Some(v.num.as_str()) == newest_num);

        // Distinct publishers over the whole history
        let mut publishers: Vec<String> = response
            .versions
            .iter()
            .filter_map(|v| v.published_by.as_ref())
            .filter_map(|p| p.get("login").and_then(|l| l.as_str()))
            .map(str::to_string)
            .collect();
        publishers.sort();
        publishers.dedup();

        let metadata = PackageMetadata {
            license: newest.and_then(|v| v.license.clone()),
            last_update: response.krate.updated_at.clone(),
            maintainers_count: (!publishers.is_empty()).then_some(publishers.len()),
        };

        let versions = response
            .versions
            .iter()
            .map(|v| {
                PublishedVersion::new(v.num.clone())
                    .yanked(v.yanked)
                    .published_at(
                        v.created_at
                            .as_deref()
                            .and_then(|t| t.parse::<DateTime<Utc>>().ok()),
                    )
            })
            .collect();

        Ok(VersionSet::new(versions)
            .with_latest_tag(response.krate.max_version)
            .with_stable_tag(response.krate.max_stable_version)
            .with_metadata(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn adapter(base_url: &str) -> CratesIoAdapter {
        CratesIoAdapter::new(HttpClient::new().unwrap(), base_url)
            .with_min_interval(Duration::ZERO)
    }

    #[test]
    fn test_crates_io_adapter_ecosystem() {
        let adapter = adapter("https://crates.io");
        assert_eq!(adapter.ecosystem(), Ecosystem::Rust);
        assert_eq!(adapter.registry_name(), "crates.io");
    }

    #[test]
    fn test_build_url() {
        let adapter = adapter("https://crates.io");
        assert_eq!(
            adapter.build_url("serde"),
            "https://crates.io/api/v1/crates/serde"
        );
    }

    #[tokio::test]
    async fn test_fetch_versions() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/crates/serde")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "crate": {
                        "max_version": "2.0.0-alpha.1",
                        "max_stable_version": "1.0.200",
                        "updated_at": "2024-05-01T10:00:00.000000+00:00"
                    },
                    "versions": [
                        {"num": "2.0.0-alpha.1", "yanked": false, "license": "MIT OR Apache-2.0",
                         "created_at": "2024-05-01T10:00:00.000000+00:00", "published_by": {"login": "dtolnay"}},
                        {"num": "1.0.200", "yanked": false, "license": "MIT OR Apache-2.0",
                         "created_at": "2024-04-20T10:00:00.000000+00:00", "published_by": {"login": "dtolnay"}},
                        {"num": "1.0.199", "yanked": true, "license": "MIT OR Apache-2.0",
                         "created_at": "2024-04-19T10:00:00.000000+00:00", "published_by": null}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let set = adapter(&server.url()).fetch_versions("serde").await.unwrap();

        mock.assert_async().await;
        assert_eq!(set.latest(), Some("2.0.0-alpha.1"));
        assert_eq!(set.latest_stable(), Some("1.0.200"));
        assert!(set.get("1.0.199").unwrap().yanked);
        assert_eq!(set.metadata.license.as_deref(), Some("MIT OR Apache-2.0"));
        assert_eq!(set.metadata.maintainers_count, Some(1));
    }

    #[tokio::test]
    async fn test_rate_limit_spacing() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/crates/a")
            .with_status(200)
            .with_body(r#"{"crate": {"max_version": "1.0.0"}, "versions": []}"#)
            .expect(2)
            .create_async()
            .await;

        let adapter = CratesIoAdapter::new(HttpClient::new().unwrap(), server.url())
            .with_min_interval(Duration::from_millis(50));
        let start = Instant::now();
        adapter.fetch_versions("a").await.unwrap();
        adapter.fetch_versions("a").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/v1/crates/nope")
            .with_status(404)
            .create_async()
            .await;

        let result = adapter(&server.url()).fetch_versions("nope").await;
        assert!(matches!(result, Err(RegistryError::PackageNotFound { .. })));
    }
}
