//! OSV.dev advisory source
//!
//! API endpoint: POST {base}/v1/query with `{"package": {"name", "ecosystem"}}`.
//! The version is deliberately left out of the query so every advisory for
//! the package comes back and membership is decided locally.

use super::{derive_severity, Advisory, AdvisorySource, AffectedRange, RangeEvent, SeverityInput};
use crate::advisory::UnparseablePolicy;
use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::registry::HttpClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SOURCE_NAME: &str = "OSV";

/// Upper bound on followed `next_page_token`s for one package
const MAX_PAGES: usize = 10;

#[derive(Debug, Serialize)]
struct OsvQuery<'a> {
    package: OsvPackageRef<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OsvPackageRef<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

#[derive(Debug, Deserialize)]
struct OsvResponse {
    #[serde(default)]
    vulns: Vec<OsvVulnerability>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
    #[serde(default)]
    references: Vec<OsvReference>,
    #[serde(default)]
    database_specific: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    score: String,
}

#[derive(Debug, Deserialize)]
struct OsvAffected {
    #[serde(default)]
    package: Option<OsvAffectedPackage>,
    #[serde(default)]
    ranges: Vec<OsvRange>,
    #[serde(default)]
    versions: Vec<String>,
    #[serde(default)]
    ecosystem_specific: Option<Value>,
    #[serde(default)]
    database_specific: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OsvAffectedPackage {
    name: String,
    #[serde(default)]
    ecosystem: String,
}

#[derive(Debug, Deserialize)]
struct OsvRange {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct OsvReference {
    #[serde(rename = "type", default)]
    kind: String,
    url: String,
}

/// OSV advisory source for one ecosystem
pub struct OsvSource {
    client: HttpClient,
    base_url: String,
    ecosystem: Ecosystem,
}

impl OsvSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>, ecosystem: Ecosystem) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            ecosystem,
        }
    }

    fn query_url(&self) -> String {
        format!("{}/v1/query", self.base_url.trim_end_matches('/'))
    }

    /// PyPI names are case-insensitive and treat `-`, `_` and `.` alike
    fn same_package(&self, a: &str, b: &str) -> bool {
        match self.ecosystem {
            Ecosystem::Python => normalize_pypi(a) == normalize_pypi(b),
            Ecosystem::DotNet => a.eq_ignore_ascii_case(b),
            _ => a == b,
        }
    }

    fn to_advisory(&self, package: &str, vuln: OsvVulnerability) -> Advisory {
        let affected: Vec<&OsvAffected> = vuln
            .affected
            .iter()
            .filter(|a| match &a.package {
                Some(p) => {
                    self.same_package(&p.name, package)
                        && (p.ecosystem.is_empty()
                            || p.ecosystem.starts_with(self.ecosystem.osv_name()))
                }
                None => true,
            })
            .collect();

        let mut ranges = Vec::new();
        for entry in &affected {
            for range in &entry.ranges {
                // GIT ranges are commit hashes; the SEMVER/ECOSYSTEM ranges
                // that accompany them carry the same information
                if range.kind == "GIT" {
                    continue;
                }
                ranges.push(AffectedRange::Events(
                    range.events.iter().filter_map(parse_event).collect(),
                ));
            }
            if !entry.versions.is_empty() {
                ranges.push(AffectedRange::Versions(entry.versions.clone()));
            }
        }

        let label = affected
            .iter()
            .flat_map(|a| [&a.ecosystem_specific, &a.database_specific])
            .chain(std::iter::once(&vuln.database_specific))
            .filter_map(|v| v.as_ref()?.get("severity")?.as_str())
            .next();
        let severity = derive_severity(&SeverityInput {
            label,
            cvss: vuln.severity.iter().map(|s| s.score.as_str()).collect(),
            text: [vuln.summary.as_deref(), vuln.details.as_deref()]
                .into_iter()
                .flatten()
                .collect(),
        });

        let title = vuln
            .summary
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                vuln.details
                    .as_deref()
                    .and_then(|d| d.lines().find(|l| !l.trim().is_empty()))
                    .map(|l| l.trim().to_string())
            })
            .unwrap_or_else(|| vuln.id.clone());

        let reference = vuln
            .references
            .iter()
            .find(|r| r.kind == "ADVISORY")
            .or_else(|| vuln.references.first())
            .map(|r| r.url.clone())
            .unwrap_or_else(|| format!("https://osv.dev/vulnerability/{}", vuln.id));

        Advisory {
            cve: vuln.aliases.iter().find(|a| a.starts_with("CVE-")).cloned(),
            id: vuln.id,
            title,
            reference,
            severity,
            ranges,
        }
    }
}

fn normalize_pypi(name: &str) -> String {
    name.to_ascii_lowercase().replace(['_', '.'], "-")
}

/// `{"introduced": "1.0.0"}` and friends
fn parse_event(event: &Value) -> Option<RangeEvent> {
    let (kind, version) = event.as_object()?.iter().next()?;
    let version = version.as_str()?.to_string();
    match kind.as_str() {
        "introduced" => Some(RangeEvent::Introduced(version)),
        "fixed" => Some(RangeEvent::Fixed(version)),
        "last_affected" => Some(RangeEvent::LastAffected(version)),
        "limit" => Some(RangeEvent::Limit(version)),
        _ => None,
    }
}

#[async_trait]
impl AdvisorySource for OsvSource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn unparseable_policy(&self) -> UnparseablePolicy {
        UnparseablePolicy::Affected
    }

    async fn advisories(&self, package: &str) -> Result<Vec<Advisory>, RegistryError> {
        let url = self.query_url();
        let mut advisories = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let query = OsvQuery {
                package: OsvPackageRef {
                    name: package,
                    ecosystem: self.ecosystem.osv_name(),
                },
                page_token: page_token.as_deref(),
            };
            let response: OsvResponse = self
                .client
                .post_json(&url, &query, package, SOURCE_NAME)
                .await?;

            advisories.extend(
                response
                    .vulns
                    .into_iter()
                    .map(|vuln| self.to_advisory(package, vuln)),
            );
            match response.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(advisories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use mockito::{Matcher, Server};

    fn source(base_url: &str, ecosystem: Ecosystem) -> OsvSource {
        OsvSource::new(HttpClient::new().unwrap(), base_url, ecosystem)
    }

    const LODASH_RESPONSE: &str = r#"{
        "vulns": [
            {
                "id": "GHSA-aaaa-bbbb-cccc",
                "summary": "Command injection in template",
                "aliases": ["CVE-2021-23337"],
                "severity": [{"type": "CVSS_V3", "score": "CVSS:3.1/AV:N/AC:L/PR:H/UI:N/S:U/C:H/I:H/A:H"}],
                "affected": [{
                    "package": {"name": "lodash", "ecosystem": "npm"},
                    "ranges": [{"type": "SEMVER", "events": [{"introduced": "1.0.0"}, {"fixed": "1.5.0"}]}]
                }],
                "references": [
                    {"type": "WEB", "url": "https://example.com/blog"},
                    {"type": "ADVISORY", "url": "https://github.com/advisories/GHSA-aaaa-bbbb-cccc"}
                ]
            },
            {
                "id": "GHSA-dddd-eeee-ffff",
                "details": "\nOld issue\nmore text",
                "affected": [{
                    "package": {"name": "lodash", "ecosystem": "npm"},
                    "ranges": [{"type": "SEMVER", "events": [{"introduced": "0"}, {"fixed": "0.9.0"}]}]
                }],
                "database_specific": {"severity": "LOW"}
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_installed_inside_range_is_vulnerable() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/query")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "package": {"name": "lodash", "ecosystem": "npm"}
            })))
            .with_status(200)
            .with_body(LODASH_RESPONSE)
            .create_async()
            .await;

        let matches = source(&server.url(), Ecosystem::Node)
            .check("lodash", "1.4.9")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.advisory_id, "GHSA-aaaa-bbbb-cccc");
        assert_eq!(m.severity, Severity::High);
        assert_eq!(m.cve.as_deref(), Some("CVE-2021-23337"));
        assert_eq!(m.title, "Command injection in template");
        assert_eq!(m.reference, "https://github.com/advisories/GHSA-aaaa-bbbb-cccc");
        assert_eq!(m.affected_versions_description, ">=1.0.0, <1.5.0");
    }

    #[tokio::test]
    async fn test_advisory_fields() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/query")
            .with_status(200)
            .with_body(LODASH_RESPONSE)
            .create_async()
            .await;

        let advisories = source(&server.url(), Ecosystem::Node)
            .advisories("lodash")
            .await
            .unwrap();

        assert_eq!(advisories.len(), 2);
        let old = &advisories[1];
        assert_eq!(old.title, "Old issue");
        assert_eq!(old.severity, Severity::Low);
        assert_eq!(old.reference, "https://osv.dev/vulnerability/GHSA-dddd-eeee-ffff");
        assert_eq!(old.cve, None);
    }

    #[tokio::test]
    async fn test_fixed_version_not_vulnerable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/query")
            .with_status(200)
            .with_body(LODASH_RESPONSE)
            .create_async()
            .await;

        let matches = source(&server.url(), Ecosystem::Node)
            .check("lodash", "1.5.0")
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_other_package_ranges_ignored() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/query")
            .with_status(200)
            .with_body(
                r#"{"vulns": [{"id": "PYSEC-1", "summary": "x",
                    "affected": [
                        {"package": {"name": "Other", "ecosystem": "PyPI"},
                         "ranges": [{"type": "ECOSYSTEM", "events": [{"introduced": "0"}]}]},
                        {"package": {"name": "My_Pkg", "ecosystem": "PyPI"},
                         "ranges": [{"type": "ECOSYSTEM", "events": [{"introduced": "2.0"}]}]}
                    ]}]}"#,
            )
            .create_async()
            .await;

        let source = source(&server.url(), Ecosystem::Python);
        assert!(source.check("my-pkg", "1.0").await.unwrap().is_empty());
        assert_eq!(source.check("my-pkg", "2.1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_git_only_ranges_not_reported() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/query")
            .with_status(200)
            .with_body(
                r#"{"vulns": [{"id": "OSV-1", "affected": [{"package": {"name": "m", "ecosystem": "Go"},
                    "ranges": [{"type": "GIT", "events": [{"introduced": "abc123"}]}]}]}]}"#,
            )
            .create_async()
            .await;

        let matches = source(&server.url(), Ecosystem::Go)
            .check("m", "v1.0.0")
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_event_reported() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/query")
            .with_status(200)
            .with_body(
                r#"{"vulns": [{"id": "RUSTSEC-1", "summary": "bad", "affected": [{"package": {"name": "c", "ecosystem": "crates.io"},
                    "ranges": [{"type": "SEMVER", "events": [{"introduced": "unknown"}]}]}]}]}"#,
            )
            .create_async()
            .await;

        let matches = source(&server.url(), Ecosystem::Rust)
            .check("c", "1.0.0")
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[tokio::test]
    async fn test_follows_page_token() {
        let mut server = Server::new_async().await;
        let second = server
            .mock("POST", "/v1/query")
            .match_body(Matcher::PartialJson(serde_json::json!({"page_token": "p2"})))
            .with_status(200)
            .with_body(r#"{"vulns": [{"id": "B", "affected": [{"versions": ["1.0.0"]}]}]}"#)
            .create_async()
            .await;
        let first = server
            .mock("POST", "/v1/query")
            .with_status(200)
            .with_body(r#"{"vulns": [{"id": "A", "affected": []}], "next_page_token": "p2"}"#)
            .create_async()
            .await;

        let advisories = source(&server.url(), Ecosystem::Node)
            .advisories("pkg")
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        let ids: Vec<_> = advisories.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
    }

    #[test]
    fn test_parse_event() {
        let event = serde_json::json!({"last_affected": "2.0.0"});
        assert_eq!(
            parse_event(&event),
            Some(RangeEvent::LastAffected("2.0.0".to_string()))
        );
        assert_eq!(parse_event(&serde_json::json!({"other": "1"})), None);
    }
}
