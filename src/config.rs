//! Analyzer configuration
//!
//! Every field has a default, so an absent file and an empty file behave the
//! same. A file only needs the keys it wants to change:
//!
//! ```toml
//! [http]
//! timeout_secs = 20
//!
//! [concurrency]
//! python = 4
//!
//! [registries]
//! npm = "https://npm.internal.example"
//! ```

use crate::domain::Ecosystem;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub http: HttpSettings,
    pub concurrency: ConcurrencyLimits,
    pub cache: CacheSettings,
    pub limits: Limits,
    pub registries: RegistryUrls,
}

/// Outbound HTTP behavior shared by every registry and advisory source
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Retries after the first attempt, transport failures only
    pub max_retries: u32,
    /// First backoff delay; doubled after every retry
    pub backoff_base_ms: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 2,
            backoff_base_ms: 200,
            user_agent: concat!("depstat/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

/// Maximum in-flight registry lookups per batch
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConcurrencyLimits {
    pub node: usize,
    pub python: usize,
    pub go: usize,
    pub php: usize,
    pub rust: usize,
    pub dotnet: usize,
    pub osv: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            node: 10,
            python: 8,
            go: 2,
            php: 2,
            rust: 2,
            dotnet: 5,
            osv: 5,
        }
    }
}

impl ConcurrencyLimits {
    /// Limit for the version lookups of one ecosystem, never below 1
    pub fn limit_for(&self, ecosystem: Ecosystem) -> usize {
        let limit = match ecosystem {
            Ecosystem::Node => self.node,
            Ecosystem::Python => self.python,
            Ecosystem::Go => self.go,
            Ecosystem::Php => self.php,
            Ecosystem::Rust => self.rust,
            Ecosystem::DotNet => self.dotnet,
        };
        limit.max(1)
    }

    /// Limit for advisory lookups
    pub fn advisory_limit(&self) -> usize {
        self.osv.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Specifiers longer than this are dropped before normalization
    pub max_specifier_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_specifier_len: 100,
        }
    }
}

/// Base URLs of every upstream service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryUrls {
    pub npm: String,
    pub pypi: String,
    pub go_proxy: String,
    /// Composer v2 metadata repository
    pub packagist: String,
    /// Packagist web API (security advisories, package statistics)
    pub packagist_api: String,
    pub crates_io: String,
    /// NuGet v3 service index
    pub nuget_index: String,
    pub osv: String,
}

impl Default for RegistryUrls {
    fn default() -> Self {
        Self {
            npm: "https://registry.npmjs.org".to_string(),
            pypi: "https://pypi.org".to_string(),
            go_proxy: "https://proxy.golang.org".to_string(),
            packagist: "https://repo.packagist.org".to_string(),
            packagist_api: "https://packagist.org".to_string(),
            crates_io: "https://crates.io".to_string(),
            nuget_index: "https://api.nuget.org/v3/index.json".to_string(),
            osv: "https://api.osv.dev".to_string(),
        }
    }
}

impl RegistryUrls {
    /// Points every service at one base URL; used by tests against a mock server
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            npm: base.to_string(),
            pypi: base.to_string(),
            go_proxy: base.to_string(),
            packagist: base.to_string(),
            packagist_api: base.to_string(),
            crates_io: base.to_string(),
            nuget_index: format!("{}/v3/index.json", base),
            osv: base.to_string(),
        }
    }
}

impl AnalyzerConfig {
    /// Parses configuration from TOML text
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidToml {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    /// Loads configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Loads the file when one is given, otherwise returns the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
