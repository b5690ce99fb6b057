//! Vulnerability advisory lookup and matching
//!
//! Sources:
//! - OSV.dev query API (Node, Python, Go, Rust)
//! - NuGet vulnerability resource (.NET)
//! - Packagist security advisories API (PHP)
//!
//! Each source fetches every advisory filed against a package; membership of
//! the installed version is decided locally by [`matcher`].

pub mod matcher;
mod nuget;
mod osv;
mod packagist;
pub mod severity;

pub use matcher::{AffectedRange, RangeEvent, UnparseablePolicy};
pub use nuget::NugetAdvisorySource;
pub use osv::OsvSource;
pub use packagist::PackagistAdvisorySource;
pub use severity::{derive_severity, SeverityInput};

use crate::config::AnalyzerConfig;
use crate::domain::{Ecosystem, Severity, VulnerabilityMatch};
use crate::error::RegistryError;
use crate::registry::{HttpClient, NugetServiceIndex};
use async_trait::async_trait;

/// One advisory as published by a source, before membership is checked
#[derive(Debug, Clone, PartialEq)]
pub struct Advisory {
    pub id: String,
    pub title: String,
    pub cve: Option<String>,
    pub reference: String,
    pub severity: Severity,
    pub ranges: Vec<AffectedRange>,
}

impl Advisory {
    /// Returns a match record if `installed` is affected
    pub fn match_version(
        &self,
        package: &str,
        installed: &str,
        policy: UnparseablePolicy,
    ) -> Option<VulnerabilityMatch> {
        if !matcher::any_affected(&self.ranges, installed, policy) {
            return None;
        }
        let description = self
            .ranges
            .iter()
            .map(AffectedRange::describe)
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join(" || ");
        Some(VulnerabilityMatch {
            advisory_id: self.id.clone(),
            package_name: package.to_string(),
            title: self.title.clone(),
            cve: self.cve.clone(),
            affected_versions_description: description,
            severity: self.severity,
            reference: self.reference.clone(),
        })
    }
}

/// Trait for advisory databases
#[async_trait]
pub trait AdvisorySource: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &'static str;

    /// What an unparseable range means for this source
    fn unparseable_policy(&self) -> UnparseablePolicy;

    /// All advisories filed against `package`
    async fn advisories(&self, package: &str) -> Result<Vec<Advisory>, RegistryError>;

    /// Advisories that apply to `installed`
    async fn check(
        &self,
        package: &str,
        installed: &str,
    ) -> Result<Vec<VulnerabilityMatch>, RegistryError> {
        let policy = self.unparseable_policy();
        Ok(self
            .advisories(package)
            .await?
            .iter()
            .filter_map(|advisory| advisory.match_version(package, installed, policy))
            .collect())
    }
}

/// Create the advisory source for the given ecosystem
pub fn create_source(
    ecosystem: Ecosystem,
    client: HttpClient,
    config: &AnalyzerConfig,
) -> Box<dyn AdvisorySource> {
    let urls = &config.registries;
    match ecosystem {
        Ecosystem::DotNet => {
            let index = NugetServiceIndex::new(
                client.clone(),
                urls.nuget_index.as_str(),
                config.cache.ttl(),
            );
            Box::new(NugetAdvisorySource::new(client, index, config.cache.ttl()))
        }
        Ecosystem::Php => Box::new(PackagistAdvisorySource::new(
            client,
            urls.packagist_api.as_str(),
        )),
        _ => Box::new(OsvSource::new(client, urls.osv.as_str(), ecosystem)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advisory(ranges: Vec<AffectedRange>) -> Advisory {
        Advisory {
            id: "GHSA-xxxx-yyyy-zzzz".to_string(),
            title: "Prototype pollution".to_string(),
            cve: Some("CVE-2024-0001".to_string()),
            reference: "https://osv.dev/vulnerability/GHSA-xxxx-yyyy-zzzz".to_string(),
            severity: Severity::High,
            ranges,
        }
    }

    #[test]
    fn test_match_version_builds_record() {
        let adv = advisory(vec![AffectedRange::Events(vec![
            RangeEvent::Introduced("1.0.0".to_string()),
            RangeEvent::Fixed("1.5.0".to_string()),
        ])]);
        let matched = adv
            .match_version("lodash", "1.4.9", UnparseablePolicy::Affected)
            .unwrap();
        assert_eq!(matched.package_name, "lodash");
        assert_eq!(matched.severity, Severity::High);
        assert_eq!(matched.affected_versions_description, ">=1.0.0, <1.5.0");
        assert!(adv
            .match_version("lodash", "1.5.0", UnparseablePolicy::Affected)
            .is_none());
    }

    #[test]
    fn test_create_source_per_ecosystem() {
        let config = AnalyzerConfig::default();
        let client = HttpClient::new().unwrap();
        assert_eq!(create_source(Ecosystem::Node, client.clone(), &config).name(), "OSV");
        assert_eq!(create_source(Ecosystem::Rust, client.clone(), &config).name(), "OSV");
        assert_eq!(
            create_source(Ecosystem::DotNet, client.clone(), &config).name(),
            "NuGet"
        );
        assert_eq!(create_source(Ecosystem::Php, client, &config).name(), "Packagist");
    }

    #[test]
    fn test_policies_per_source() {
        let config = AnalyzerConfig::default();
        let client = HttpClient::new().unwrap();
        let policy = |e| create_source(e, client.clone(), &config).unparseable_policy();
        assert_eq!(policy(Ecosystem::Python), UnparseablePolicy::Affected);
        assert_eq!(policy(Ecosystem::DotNet), UnparseablePolicy::Affected);
        assert_eq!(policy(Ecosystem::Php), UnparseablePolicy::NotAffected);
    }
}
