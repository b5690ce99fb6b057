//! Registry adapters for fetching package version information
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - TTL cache for multi-step lookups
//! - npm Registry adapter
//! - PyPI JSON API adapter
//! - Go Module Proxy adapter
//! - Packagist (Composer v2) adapter
//! - crates.io API adapter
//! - NuGet v3 adapter

mod cache;
mod client;
mod crates_io;
mod go_proxy;
mod npm;
mod nuget;
mod packagist;
mod pypi;
mod version_set;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use client::HttpClient;
pub use crates_io::CratesIoAdapter;
pub use go_proxy::GoProxyAdapter;
pub use npm::NpmAdapter;
pub use nuget::{NugetAdapter, NugetServiceIndex};
pub use packagist::PackagistAdapter;
pub use pypi::PyPIAdapter;
pub use version_set::{PackageMetadata, PublishedVersion, VersionSet};

use crate::config::AnalyzerConfig;
use crate::domain::Ecosystem;
use crate::error::RegistryError;
use async_trait::async_trait;

/// Trait for registry adapters
#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    /// Get the ecosystem this adapter handles
    fn ecosystem(&self) -> Ecosystem;

    /// Get the registry name
    fn registry_name(&self) -> &'static str;

    /// Fetch published versions and package metadata
    async fn fetch_versions(&self, package: &str) -> Result<VersionSet, RegistryError>;
}

/// Create a registry adapter for the given ecosystem
pub fn create_adapter(
    ecosystem: Ecosystem,
    client: HttpClient,
    config: &AnalyzerConfig,
) -> Box<dyn RegistryAdapter> {
    let urls = &config.registries;
    match ecosystem {
        Ecosystem::Node => Box::new(NpmAdapter::new(client, urls.npm.as_str())),
        Ecosystem::Python => Box::new(PyPIAdapter::new(client, urls.pypi.as_str())),
        Ecosystem::Go => Box::new(GoProxyAdapter::new(client, urls.go_proxy.as_str())),
        Ecosystem::Php => Box::new(PackagistAdapter::new(client, urls.packagist.as_str())),
        Ecosystem::Rust => Box::new(CratesIoAdapter::new(client, urls.crates_io.as_str())),
        Ecosystem::DotNet => {
            let index = NugetServiceIndex::new(
                client.clone(),
                urls.nuget_index.as_str(),
                config.cache.ttl(),
            );
            Box::new(NugetAdapter::new(client, index))
        }
    }
}
