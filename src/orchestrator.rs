//! Analysis orchestrator for coordinating the whole workflow
//!
//! This module provides:
//! - Workflow coordination: parse → filter → normalize → fetch → classify → sort
//! - Bounded parallel registry queries, with a per-ecosystem limit
//! - The vulnerability path over the same extracted versions
//! - Error handling with partial continuation: a failed package is logged
//!   and dropped, only whole-batch conditions are returned as errors

use crate::advisory::{create_source, AdvisorySource};
use crate::classify::{sort_results, PackageFilter};
use crate::config::AnalyzerConfig;
use crate::domain::{DependencyEntry, DependencyResult, Ecosystem, PackageVulnerabilities};
use crate::ecosystem::EcosystemAdapter;
use crate::error::AnalysisError;
use crate::manifest::{registry_entries, DependencyMap};
use crate::progress::Progress;
use crate::registry::HttpClient;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Orchestrator for one or more analysis batches
pub struct Orchestrator {
    config: AnalyzerConfig,
    /// HTTP client shared by every registry and advisory request
    client: HttpClient,
    /// Whether to draw a progress bar on stderr
    show_progress: bool,
}

impl Orchestrator {
    /// Create a new orchestrator from configuration
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalysisError> {
        let client = HttpClient::from_settings(&config.http)?;
        Ok(Self::with_client(config, client))
    }

    /// Create an orchestrator with a custom HTTP client (for testing)
    pub fn with_client(config: AnalyzerConfig, client: HttpClient) -> Self {
        Self {
            config,
            client,
            show_progress: false,
        }
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Classify every dependency declared in `manifest`
    pub async fn analyze(
        &self,
        manifest: &str,
        ecosystem: Ecosystem,
    ) -> Result<Vec<DependencyResult>, AnalysisError> {
        self.analyze_filtered(manifest, ecosystem, &PackageFilter::new())
            .await
    }

    /// Classify the dependencies in `manifest` that pass `filter`
    pub async fn analyze_filtered(
        &self,
        manifest: &str,
        ecosystem: Ecosystem,
        filter: &PackageFilter,
    ) -> Result<Vec<DependencyResult>, AnalysisError> {
        let adapter = EcosystemAdapter::new(ecosystem, self.client.clone(), &self.config);
        self.analyze_with_adapter(&adapter, manifest, filter).await
    }

    /// Classify using an explicit ecosystem adapter
    pub async fn analyze_with_adapter(
        &self,
        adapter: &EcosystemAdapter,
        manifest: &str,
        filter: &PackageFilter,
    ) -> Result<Vec<DependencyResult>, AnalysisError> {
        let dependencies = adapter.parse_manifest(manifest)?;
        let entries = self.entries(adapter.ecosystem(), &dependencies, filter)?;

        let limit = self.config.concurrency.limit_for(adapter.ecosystem());
        info!(
            ecosystem = %adapter.ecosystem(),
            count = entries.len(),
            limit,
            "resolving dependencies"
        );

        let mut progress = Progress::new(self.show_progress);
        progress.start(
            entries.len() as u64,
            &format!("Checking {} dependencies", adapter.ecosystem()),
        );

        let progress_ref = &progress;
        let mut results: Vec<DependencyResult> = stream::iter(&entries)
            .map(|entry| async move {
                let result = resolve_entry(adapter, entry).await;
                progress_ref.inc();
                result
            })
            .buffer_unordered(limit)
            .filter_map(futures::future::ready)
            .collect()
            .await;
        progress.finish_and_clear();

        if results.is_empty() {
            return Err(AnalysisError::EmptyBatch);
        }
        debug!(
            resolved = results.len(),
            dropped = entries.len() - results.len(),
            "batch resolved"
        );

        sort_results(&mut results);
        Ok(results)
    }

    /// Check a pre-extracted name → specifier map against the advisory
    /// database for `ecosystem`
    pub async fn check_vulnerabilities(
        &self,
        dependencies: &DependencyMap,
        ecosystem: Ecosystem,
    ) -> Result<Vec<PackageVulnerabilities>, AnalysisError> {
        let entries = self.entries(ecosystem, dependencies, &PackageFilter::new())?;
        let source = create_source(ecosystem, self.client.clone(), &self.config);
        self.check_entries(source.as_ref(), ecosystem, &entries).await
    }

    /// Parse `manifest` and check its dependencies against the advisory
    /// database
    pub async fn audit(
        &self,
        manifest: &str,
        ecosystem: Ecosystem,
        filter: &PackageFilter,
    ) -> Result<Vec<PackageVulnerabilities>, AnalysisError> {
        let dependencies = crate::manifest::get_parser(ecosystem).parse(manifest)?;
        let entries = self.entries(ecosystem, &dependencies, filter)?;
        let source = create_source(ecosystem, self.client.clone(), &self.config);
        self.check_entries(source.as_ref(), ecosystem, &entries).await
    }

    /// Checks entries against `source`; every checked package is returned,
    /// vulnerable or not, sorted by package name
    pub async fn check_entries(
        &self,
        source: &dyn AdvisorySource,
        ecosystem: Ecosystem,
        entries: &[DependencyEntry],
    ) -> Result<Vec<PackageVulnerabilities>, AnalysisError> {
        let parser = crate::parser::get_parser(ecosystem);
        let limit = self.config.concurrency.advisory_limit();
        info!(source = source.name(), count = entries.len(), limit, "checking advisories");

        let mut progress = Progress::new(self.show_progress);
        progress.start(entries.len() as u64, &format!("Querying {}", source.name()));

        let progress_ref = &progress;
        let parser_ref = parser.as_ref();
        let mut checked: Vec<PackageVulnerabilities> = stream::iter(entries)
            .map(|entry| async move {
                let result = check_entry(source, parser_ref, entry).await;
                progress_ref.inc();
                result
            })
            .buffer_unordered(limit)
            .filter_map(futures::future::ready)
            .collect()
            .await;
        progress.finish_and_clear();

        if checked.is_empty() {
            return Err(AnalysisError::EmptyBatch);
        }
        checked.sort_by(|a, b| a.package.cmp(&b.package));
        Ok(checked)
    }

    /// Registry-resolvable entries that pass `filter`; an empty list is an
    /// empty batch
    fn entries(
        &self,
        ecosystem: Ecosystem,
        dependencies: &DependencyMap,
        filter: &PackageFilter,
    ) -> Result<Vec<DependencyEntry>, AnalysisError> {
        let entries = filter.apply(registry_entries(
            ecosystem,
            dependencies,
            self.config.limits.max_specifier_len,
        ));
        if entries.is_empty() {
            return Err(AnalysisError::EmptyBatch);
        }
        Ok(entries)
    }
}

/// normalize → fetch → classify for one entry; `None` drops it
async fn resolve_entry(
    adapter: &EcosystemAdapter,
    entry: &DependencyEntry,
) -> Option<DependencyResult> {
    let parsed = match adapter.normalize_specifier(&entry.raw_specifier) {
        Ok(parsed) => parsed,
        Err(reason) => {
            debug!(package = %entry.name, %reason, "unsupported specifier");
            return None;
        }
    };

    let versions = match adapter.fetch_versions(&entry.name).await {
        Ok(versions) => versions,
        Err(e) if e.is_not_found() => {
            debug!(package = %entry.name, registry = adapter.registry_name(), "package not found");
            return None;
        }
        Err(e) => {
            warn!(package = %entry.name, error = %e, "registry lookup failed");
            return None;
        }
    };

    let result = adapter.classifier().resolve(entry, &parsed, &versions);
    if result.is_none() {
        debug!(package = %entry.name, "registry returned no usable version");
    }
    result
}

async fn check_entry(
    source: &dyn AdvisorySource,
    parser: &dyn crate::parser::VersionParser,
    entry: &DependencyEntry,
) -> Option<PackageVulnerabilities> {
    let installed = match parser.parse(&entry.raw_specifier) {
        Ok(parsed) => parsed.cleaned,
        Err(reason) => {
            debug!(package = %entry.name, %reason, "unsupported specifier");
            return None;
        }
    };

    match source.check(&entry.name, &installed).await {
        Ok(matches) => Some(PackageVulnerabilities::new(
            entry.name.clone(),
            installed,
            matches,
        )),
        Err(e) if e.is_not_found() => {
            debug!(package = %entry.name, source = source.name(), "no advisory record");
            Some(PackageVulnerabilities::new(entry.name.clone(), installed, Vec::new()))
        }
        Err(e) => {
            warn!(package = %entry.name, error = %e, "advisory lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryUrls;
    use crate::domain::{DependencyStatus, Severity};
    use mockito::{Server, ServerGuard};

    fn orchestrator(server: &ServerGuard) -> Orchestrator {
        let config = AnalyzerConfig {
            registries: RegistryUrls::all_at(&server.url()),
            ..Default::default()
        };
        let client = HttpClient::new().unwrap().with_max_retries(0);
        Orchestrator::with_client(config, client)
    }

    async fn mock_npm(server: &mut ServerGuard, name: &str, latest: &str, versions: &[&str]) {
        let versions: Vec<String> = versions.iter().map(|v| format!(r#""{v}": {{}}"#)).collect();
        server
            .mock("GET", format!("/{name}").as_str())
            .with_status(200)
            .with_body(format!(
                r#"{{"dist-tags": {{"latest": "{latest}"}}, "versions": {{{}}}}}"#,
                versions.join(", ")
            ))
            .create_async()
            .await;
    }

    #[tokio::test]
    async fn test_analyze_current_package() {
        let mut server = Server::new_async().await;
        mock_npm(&mut server, "left-pad", "1.3.0", &["1.2.0", "1.3.0"]).await;

        let results = orchestrator(&server)
            .analyze(r#"{"dependencies": {"left-pad": "1.3.0"}}"#, Ecosystem::Node)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "left-pad");
        assert_eq!(results[0].status, DependencyStatus::Current);
    }

    #[tokio::test]
    async fn test_analyze_sorts_and_drops_failures() {
        let mut server = Server::new_async().await;
        mock_npm(&mut server, "foo", "2.5.0", &["1.0.0", "2.5.0"]).await;
        mock_npm(&mut server, "bar", "1.1.0", &["1.0.0", "1.1.0"]).await;
        mock_npm(&mut server, "baz", "1.0.0", &["1.0.0"]).await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/broken")
            .with_status(500)
            .create_async()
            .await;

        let manifest = r#"{
            "dependencies": {"baz": "1.0.0", "foo": "^1.0.0", "missing": "1.0.0", "local": "file:../x"},
            "devDependencies": {"bar": "1.0.0", "broken": "2.0.0"}
        }"#;
        let results = orchestrator(&server)
            .analyze(manifest, Ecosystem::Node)
            .await
            .unwrap();

        let summary: Vec<_> = results
            .iter()
            .map(|r| (r.name.as_str(), r.status))
            .collect();
        assert_eq!(
            summary,
            [
                ("foo", DependencyStatus::Major),
                ("bar", DependencyStatus::Outdated),
                ("baz", DependencyStatus::Current),
            ]
        );
    }

    #[tokio::test]
    async fn test_analyze_go_module() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/example.com/pkg/@v/list")
            .with_status(200)
            .with_body("v1.2.0\nv1.3.0\n")
            .create_async()
            .await;

        let manifest = "module example.com/app\n\ngo 1.22\n\nrequire example.com/pkg v1.2.0\n";
        let results = orchestrator(&server)
            .analyze(manifest, Ecosystem::Go)
            .await
            .unwrap();

        assert_eq!(results[0].current_version, "v1.2.0");
        assert_eq!(results[0].latest_version, "v1.3.0");
        assert_eq!(results[0].status, DependencyStatus::Outdated);
    }

    #[tokio::test]
    async fn test_branch_reference_only_is_empty_batch() {
        let server = Server::new_async().await;
        let result = orchestrator(&server)
            .analyze(r#"{"require": {"vendor/pkg": "dev-main"}}"#, Ecosystem::Php)
            .await;
        assert!(matches!(result, Err(AnalysisError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_empty_dependencies_is_empty_batch() {
        let server = Server::new_async().await;
        let result = orchestrator(&server)
            .analyze(r#"{"dependencies": {}}"#, Ecosystem::Node)
            .await;
        assert!(matches!(result, Err(AnalysisError::EmptyBatch)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "no dependencies could be processed"
        );
    }

    #[tokio::test]
    async fn test_all_lookups_failing_is_empty_batch() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/ghost")
            .with_status(404)
            .create_async()
            .await;
        let result = orchestrator(&server)
            .analyze(r#"{"dependencies": {"ghost": "1.0.0"}}"#, Ecosystem::Node)
            .await;
        assert!(matches!(result, Err(AnalysisError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_invalid_manifest_is_unparseable() {
        let server = Server::new_async().await;
        let result = orchestrator(&server)
            .analyze("{not json", Ecosystem::Node)
            .await;
        assert!(matches!(result, Err(AnalysisError::ManifestUnparseable(_))));
    }

    #[tokio::test]
    async fn test_filter_applied() {
        let mut server = Server::new_async().await;
        mock_npm(&mut server, "keep", "1.0.0", &["1.0.0"]).await;

        let filter = PackageFilter::new().with_exclude(vec!["skip".to_string()]);
        let results = orchestrator(&server)
            .analyze_filtered(
                r#"{"dependencies": {"keep": "1.0.0", "skip": "1.0.0"}}"#,
                Ecosystem::Node,
                &filter,
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "keep");
    }

    #[tokio::test]
    async fn test_check_vulnerabilities() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/query")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "package": {"name": "lodash"}
            })))
            .with_status(200)
            .with_body(
                r#"{"vulns": [{"id": "GHSA-1", "summary": "Prototype pollution",
                    "severity": [{"type": "CVSS_V3", "score": "CVSS:3.1/AV:N/AC:L/PR:H/UI:N/S:U/C:H/I:H/A:H"}],
                    "affected": [{"package": {"name": "lodash", "ecosystem": "npm"},
                        "ranges": [{"type": "SEMVER", "events": [{"introduced": "1.0.0"}, {"fixed": "1.5.0"}]}]}]}]}"#,
            )
            .create_async()
            .await;
        server
            .mock("POST", "/v1/query")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "package": {"name": "express"}
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let mut deps = DependencyMap::new();
        deps.insert("lodash".to_string(), "1.4.9".to_string());
        deps.insert("express".to_string(), "^4.18.2".to_string());

        let report = orchestrator(&server)
            .check_vulnerabilities(&deps, Ecosystem::Node)
            .await
            .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].package, "express");
        assert!(!report[0].is_vulnerable);
        assert_eq!(report[0].installed_version, "4.18.2");
        assert_eq!(report[1].package, "lodash");
        assert!(report[1].is_vulnerable);
        assert_eq!(report[1].max_severity(), Some(Severity::High));
    }

    #[tokio::test]
    async fn test_audit_drops_failed_lookups() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/security-advisories/")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let result = orchestrator(&server)
            .audit(
                r#"{"require": {"monolog/monolog": "3.5.0"}}"#,
                Ecosystem::Php,
                &PackageFilter::new(),
            )
            .await;
        assert!(matches!(result, Err(AnalysisError::EmptyBatch)));
    }
}
