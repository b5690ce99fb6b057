//! Packagist security advisories
//!
//! API endpoint: GET {base}/api/security-advisories/?packages[]={vendor/name}
//! Response: `{"advisories": {"vendor/name": [{advisoryId, title, link, cve,
//! affectedVersions, severity}]}}` where `affectedVersions` is a Composer
//! constraint list.

use super::{derive_severity, Advisory, AdvisorySource, AffectedRange, SeverityInput};
use crate::advisory::UnparseablePolicy;
use crate::error::RegistryError;
use crate::registry::HttpClient;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

const SOURCE_NAME: &str = "Packagist";

#[derive(Debug, Deserialize)]
struct AdvisoriesResponse {
    #[serde(default)]
    advisories: AdvisoryMap,
}

/// PHP encodes an empty map as `[]`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AdvisoryMap {
    ByPackage(HashMap<String, Vec<PackagistAdvisory>>),
    Empty(Vec<serde_json::Value>),
}

impl Default for AdvisoryMap {
    fn default() -> Self {
        AdvisoryMap::Empty(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackagistAdvisory {
    advisory_id: String,
    #[serde(default)]
    remote_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    cve: Option<String>,
    #[serde(default)]
    affected_versions: String,
    #[serde(default)]
    severity: Option<String>,
}

impl PackagistAdvisory {
    fn into_advisory(self) -> Advisory {
        let severity = derive_severity(&SeverityInput {
            label: self.severity.as_deref(),
            cvss: Vec::new(),
            text: self.title.as_deref().into_iter().collect(),
        });
        // Prefer the upstream id (GHSA/CVE) over Packagist's internal one
        let id = self
            .remote_id
            .filter(|r| !r.is_empty())
            .unwrap_or(self.advisory_id);
        Advisory {
            title: self.title.filter(|t| !t.is_empty()).unwrap_or_else(|| id.clone()),
            cve: self.cve.filter(|c| !c.is_empty()),
            reference: self.link.unwrap_or_default(),
            severity,
            ranges: vec![AffectedRange::Constraint(self.affected_versions)],
            id,
        }
    }
}

/// Advisory source for Composer packages
pub struct PackagistAdvisorySource {
    client: HttpClient,
    base_url: String,
}

impl PackagistAdvisorySource {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn query_url(&self, package: &str) -> String {
        format!(
            "{}/api/security-advisories/?packages%5B%5D={}",
            self.base_url.trim_end_matches('/'),
            package
        )
    }
}

#[async_trait]
impl AdvisorySource for PackagistAdvisorySource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn unparseable_policy(&self) -> UnparseablePolicy {
        UnparseablePolicy::NotAffected
    }

    async fn advisories(&self, package: &str) -> Result<Vec<Advisory>, RegistryError> {
        let url = self.query_url(package);
        let response: AdvisoriesResponse = self.client.get_json(&url, package, SOURCE_NAME).await?;

        let mut by_package = match response.advisories {
            AdvisoryMap::ByPackage(map) => map,
            AdvisoryMap::Empty(_) => return Ok(Vec::new()),
        };
        let listed = by_package
            .remove(&package.to_ascii_lowercase())
            .or_else(|| by_package.remove(package))
            .unwrap_or_default();
        Ok(listed
            .into_iter()
            .map(PackagistAdvisory::into_advisory)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use mockito::{Matcher, Server};

    const GUZZLE_RESPONSE: &str = r#"{"advisories": {"guzzlehttp/guzzle": [
        {
            "advisoryId": "PKSA-yhcn-xrg3-68b1",
            "remoteId": "GHSA-w248-ffj2-4v5q",
            "packageName": "guzzlehttp/guzzle",
            "title": "Cross-domain cookie leakage",
            "link": "https://github.com/guzzle/guzzle/security/advisories/GHSA-w248-ffj2-4v5q",
            "cve": "CVE-2022-29248",
            "affectedVersions": ">=4,<6.5.6|>=7,<7.4.3",
            "severity": "high"
        },
        {
            "advisoryId": "PKSA-0000-0000-0000",
            "title": "Weird constraint",
            "cve": null,
            "affectedVersions": "dev-main@abc",
            "severity": null
        }
    ]}}"#;

    async fn source_with_body(body: &str) -> (mockito::ServerGuard, PackagistAdvisorySource) {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/security-advisories/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;
        let source = PackagistAdvisorySource::new(HttpClient::new().unwrap(), server.url());
        (server, source)
    }

    #[tokio::test]
    async fn test_vulnerable_version_matched() {
        let (_server, source) = source_with_body(GUZZLE_RESPONSE).await;

        let matches = source.check("guzzlehttp/guzzle", "7.4.2").await.unwrap();

        // The unparseable constraint is skipped
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.advisory_id, "GHSA-w248-ffj2-4v5q");
        assert_eq!(m.cve.as_deref(), Some("CVE-2022-29248"));
        assert_eq!(m.severity, Severity::High);
        assert_eq!(m.affected_versions_description, ">=4,<6.5.6|>=7,<7.4.3");
    }

    #[tokio::test]
    async fn test_fixed_version_clean() {
        let (_server, source) = source_with_body(GUZZLE_RESPONSE).await;
        let matches = source.check("guzzlehttp/guzzle", "7.4.3").await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_advisory_fields_without_remote_id() {
        let (_server, source) = source_with_body(GUZZLE_RESPONSE).await;
        let advisories = source.advisories("guzzlehttp/guzzle").await.unwrap();

        assert_eq!(advisories.len(), 2);
        assert_eq!(advisories[1].id, "PKSA-0000-0000-0000");
        assert_eq!(advisories[1].cve, None);
        assert_eq!(advisories[1].severity, Severity::Moderate);
    }

    #[tokio::test]
    async fn test_package_without_advisories() {
        let (_server, source) = source_with_body(r#"{"advisories": []}"#).await;
        let advisories = source.advisories("monolog/monolog").await.unwrap();
        assert!(advisories.is_empty());
    }

    #[test]
    fn test_query_url() {
        let source = PackagistAdvisorySource::new(HttpClient::new().unwrap(), "https://packagist.org/");
        assert_eq!(
            source.query_url("monolog/monolog"),
            "https://packagist.org/api/security-advisories/?packages%5B%5D=monolog/monolog"
        );
    }
}
