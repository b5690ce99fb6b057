//! Per-ecosystem capability bundle
//!
//! An [`EcosystemAdapter`] ties together the four ecosystem-specific steps
//! of the pipeline (manifest parsing, specifier normalization, registry
//! lookup and version ordering) so the orchestrator and the classifier can
//! stay ecosystem-agnostic.

use crate::classify::StatusClassifier;
use crate::config::AnalyzerConfig;
use crate::domain::{Ecosystem, ParsedVersion};
use crate::error::{ManifestError, RegistryError, SpecifierError};
use crate::manifest::{self, DependencyMap, ManifestParser};
use crate::parser::{self, VersionParser};
use crate::registry::{create_adapter, HttpClient, RegistryAdapter, VersionSet};
use std::cmp::Ordering;

/// The ecosystem-specific half of the pipeline
pub struct EcosystemAdapter {
    ecosystem: Ecosystem,
    manifest: Box<dyn ManifestParser>,
    specifier: Box<dyn VersionParser>,
    registry: Box<dyn RegistryAdapter>,
}

impl EcosystemAdapter {
    /// Create the adapter for `ecosystem` using the configured registry URLs
    pub fn new(ecosystem: Ecosystem, client: HttpClient, config: &AnalyzerConfig) -> Self {
        Self::with_registry(ecosystem, create_adapter(ecosystem, client, config))
    }

    /// Create the adapter around an existing registry client
    pub fn with_registry(ecosystem: Ecosystem, registry: Box<dyn RegistryAdapter>) -> Self {
        Self {
            ecosystem,
            manifest: manifest::get_parser(ecosystem),
            specifier: parser::get_parser(ecosystem),
            registry,
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    pub fn registry_name(&self) -> &'static str {
        self.registry.registry_name()
    }

    /// Manifest text → ordered name → specifier map
    pub fn parse_manifest(&self, content: &str) -> Result<DependencyMap, ManifestError> {
        self.manifest.parse(content)
    }

    /// Raw specifier → bare comparable version plus range kind
    pub fn normalize_specifier(&self, spec: &str) -> Result<ParsedVersion, SpecifierError> {
        self.specifier.parse(spec)
    }

    /// Package name → published versions
    pub async fn fetch_versions(&self, package: &str) -> Result<VersionSet, RegistryError> {
        self.registry.fetch_versions(package).await
    }

    /// Ecosystem-aware ordering of two versions
    pub fn compare_versions(&self, a: &str, b: &str) -> Ordering {
        crate::version::compare_versions(a, b)
    }

    pub fn classifier(&self) -> StatusClassifier {
        StatusClassifier::new(self.ecosystem)
    }
}
