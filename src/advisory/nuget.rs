//! NuGet vulnerability resource
//!
//! The service index names a `VulnerabilityInfo` resource: a small JSON list
//! of pages (a large base page and an incremental update page). Each page maps
//! lowercase package ids to `{severity, url, versions}` entries, where
//! `versions` uses NuGet interval notation. Pages are cached with a TTL since
//! every package in a batch reads the same files.

use super::{Advisory, AdvisorySource, AffectedRange, UnparseablePolicy};
use crate::domain::Severity;
use crate::error::RegistryError;
use crate::registry::{HttpClient, NugetServiceIndex, TtlCache};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const SOURCE_NAME: &str = "NuGet";

const VULNERABILITY_TYPES: &[&str] = &["VulnerabilityInfo/6.7.0"];

#[derive(Debug, Deserialize)]
struct VulnerabilityPageRef {
    #[serde(rename = "@id")]
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct VulnerabilityEntry {
    #[serde(default)]
    severity: Option<i64>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    versions: String,
}

type VulnerabilityPage = HashMap<String, Vec<VulnerabilityEntry>>;

/// Advisory source backed by the NuGet feed's vulnerability pages
pub struct NugetAdvisorySource {
    client: HttpClient,
    index: NugetServiceIndex,
    pages: TtlCache<Arc<VulnerabilityPage>>,
}

impl NugetAdvisorySource {
    pub fn new(client: HttpClient, index: NugetServiceIndex, ttl: Duration) -> Self {
        Self {
            client,
            index,
            pages: TtlCache::new(ttl),
        }
    }

    async fn page(&self, url: &str, package: &str) -> Result<Arc<VulnerabilityPage>, RegistryError> {
        if let Some(page) = self.pages.get(url) {
            return Ok(page);
        }
        let page: VulnerabilityPage = self.client.get_json(url, package, SOURCE_NAME).await?;
        let page = Arc::new(page);
        self.pages.insert(url.to_string(), page.clone());
        Ok(page)
    }
}

/// 0 low, 1 moderate, 2 high, 3 critical
fn severity_from_level(level: Option<i64>) -> Severity {
    match level {
        Some(0) => Severity::Low,
        Some(2) => Severity::High,
        Some(3) => Severity::Critical,
        _ => Severity::Moderate,
    }
}

/// `https://github.com/advisories/GHSA-xxxx` → `GHSA-xxxx`
fn advisory_id(url: &str) -> String {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(url)
        .to_string()
}

fn to_advisory(package: &str, entry: &VulnerabilityEntry) -> Advisory {
    let id = advisory_id(&entry.url);
    Advisory {
        title: format!("Known vulnerability in {}", package),
        cve: id.starts_with("CVE-").then(|| id.clone()),
        reference: entry.url.clone(),
        severity: severity_from_level(entry.severity),
        ranges: vec![AffectedRange::Interval(entry.versions.clone())],
        id,
    }
}

#[async_trait]
impl AdvisorySource for NugetAdvisorySource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn unparseable_policy(&self) -> UnparseablePolicy {
        UnparseablePolicy::Affected
    }

    async fn advisories(&self, package: &str) -> Result<Vec<Advisory>, RegistryError> {
        let index_url = self.index.resource(VULNERABILITY_TYPES, package).await?;
        let refs: Vec<VulnerabilityPageRef> =
            self.client.get_json(&index_url, package, SOURCE_NAME).await?;

        let key = package.to_ascii_lowercase();
        let mut advisories: Vec<Advisory> = Vec::new();
        for page_ref in refs {
            let page = self.page(&page_ref.id, package).await?;
            for entry in page.get(&key).into_iter().flatten() {
                // The update page can repeat an entry from the base page
                let advisory = to_advisory(package, entry);
                if !advisories
                    .iter()
                    .any(|a| a.id == advisory.id && a.ranges == advisory.ranges)
                {
                    advisories.push(advisory);
                }
            }
        }
        Ok(advisories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Server, ServerGuard};

    async fn mock_feed(server: &mut ServerGuard, hits: usize) -> mockito::Mock {
        let base = server.url();
        server
            .mock("GET", "/v3/index.json")
            .with_status(200)
            .with_body(format!(
                r#"{{"resources": [{{"@id": "{base}/vulns/index.json", "@type": "VulnerabilityInfo/6.7.0"}}]}}"#
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/vulns/index.json")
            .with_status(200)
            .with_body(format!(
                r#"[{{"@name": "base", "@id": "{base}/vulns/base.json", "@updated": "2024-01-01T00:00:00Z"}},
                    {{"@name": "update", "@id": "{base}/vulns/update.json", "@updated": "2024-02-01T00:00:00Z"}}]"#
            ))
            .expect_at_least(1)
            .create_async()
            .await;
        server
            .mock("GET", "/vulns/update.json")
            .with_status(200)
            .with_body(r#"{}"#)
            .expect(1)
            .create_async()
            .await;
        server
            .mock("GET", "/vulns/base.json")
            .with_status(200)
            .with_body(
                r#"{
                    "newtonsoft.json": [
                        {"severity": 2, "url": "https://github.com/advisories/GHSA-5crp-9r3c-p9vr", "versions": "(, 13.0.1)"}
                    ],
                    "system.text.encodings.web": [
                        {"severity": 3, "url": "https://github.com/advisories/GHSA-ghhp-997w-qr28", "versions": "[4.0.0, 4.5.1)"},
                        {"severity": 0, "url": "https://example.com/advisories/CVE-2020-0001", "versions": "not an interval"}
                    ]
                }"#,
            )
            .expect(hits)
            .create_async()
            .await
    }

    fn source(server: &ServerGuard) -> NugetAdvisorySource {
        let client = HttpClient::new().unwrap();
        let ttl = Duration::from_secs(600);
        let index = NugetServiceIndex::new(
            client.clone(),
            format!("{}/v3/index.json", server.url()),
            ttl,
        );
        NugetAdvisorySource::new(client, index, ttl)
    }

    #[tokio::test]
    async fn test_vulnerable_version_matched() {
        let mut server = Server::new_async().await;
        mock_feed(&mut server, 1).await;

        let matches = source(&server)
            .check("Newtonsoft.Json", "12.0.3")
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].advisory_id, "GHSA-5crp-9r3c-p9vr");
        assert_eq!(matches[0].severity, Severity::High);
        assert_eq!(matches[0].affected_versions_description, "(, 13.0.1)");
    }

    #[tokio::test]
    async fn test_fixed_version_clean() {
        let mut server = Server::new_async().await;
        mock_feed(&mut server, 1).await;

        let matches = source(&server)
            .check("Newtonsoft.Json", "13.0.1")
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_pages_cached_across_packages() {
        let mut server = Server::new_async().await;
        let base_page = mock_feed(&mut server, 1).await;

        let source = source(&server);
        source.check("Newtonsoft.Json", "12.0.0").await.unwrap();
        let matches = source
            .check("System.Text.Encodings.Web", "4.5.0")
            .await
            .unwrap();

        base_page.assert_async().await;
        // One interval matches, the unparseable one is reported as well
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].severity, Severity::Critical);
        assert_eq!(matches[1].severity, Severity::Low);
        assert_eq!(matches[1].cve.as_deref(), Some("CVE-2020-0001"));
    }

    #[tokio::test]
    async fn test_unlisted_package_has_no_advisories() {
        let mut server = Server::new_async().await;
        mock_feed(&mut server, 1).await;

        let advisories = source(&server).advisories("Serilog").await.unwrap();
        assert!(advisories.is_empty());
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(severity_from_level(Some(0)), Severity::Low);
        assert_eq!(severity_from_level(Some(1)), Severity::Moderate);
        assert_eq!(severity_from_level(Some(3)), Severity::Critical);
        assert_eq!(severity_from_level(None), Severity::Moderate);
    }

    #[test]
    fn test_advisory_id_from_url() {
        assert_eq!(
            advisory_id("https://github.com/advisories/GHSA-5crp-9r3c-p9vr"),
            "GHSA-5crp-9r3c-p9vr"
        );
        assert_eq!(advisory_id("https://x/CVE-1/"), "CVE-1");
    }
}
