//! Engine error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: the manifest text could not be parsed at all
//! - SpecifierError: a single specifier cannot be resolved from a registry
//! - RegistryError: package registry communication failed
//! - ConfigError: the configuration file is unusable
//! - AnalysisError: batch-level failures surfaced to the caller

use std::path::PathBuf;
use thiserror::Error;

/// Batch-level error surfaced to the caller
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The manifest could not be parsed; no per-dependency attempt was made
    #[error(transparent)]
    ManifestUnparseable(#[from] ManifestError),

    /// Every dependency in the manifest was excluded
    #[error("no dependencies could be processed")]
    EmptyBatch,

    /// The registry HTTP client could not be constructed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to manifest parsing
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Malformed JSON in a JSON-based manifest
    #[error("failed to parse JSON in {manifest}: {message}")]
    InvalidJson { manifest: String, message: String },

    /// Malformed TOML in a TOML-based manifest
    #[error("failed to parse TOML in {manifest}: {message}")]
    InvalidToml { manifest: String, message: String },

    /// Malformed XML in a project file
    #[error("failed to parse XML in {manifest}: {message}")]
    InvalidXml { manifest: String, message: String },

    /// The top-level JSON value is not an object
    #[error("invalid manifest {manifest}: top-level value must be an object")]
    NotAnObject { manifest: String },

    /// Failed to read a manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No supported manifest could be found at the path
    #[error("unsupported manifest format: {path}")]
    UnsupportedFormat { path: PathBuf },
}

/// Why a single specifier was excluded from registry resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecifierError {
    /// Local path, git/URL/file reference or workspace/link protocol
    #[error("'{spec}' refers to a non-registry source")]
    NonRegistrySource { spec: String },

    /// `latest`, `*`, branch names and other tag aliases
    #[error("'{spec}' is a wildcard or tag alias")]
    TagAlias { spec: String },

    #[error("empty version specifier")]
    Empty,

    #[error("specifier exceeds {limit} characters")]
    TooLong { limit: usize },

    /// The cleaned remainder has no numeric version prefix
    #[error("'{spec}' is not a comparable version")]
    Malformed { spec: String },
}

/// Errors related to package registry communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed or returned a non-success status
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML in the configuration file
    #[error("invalid config file {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },
}

impl ManifestError {
    /// Creates a new InvalidJson error
    pub fn invalid_json(manifest: impl Into<String>, message: impl Into<String>) -> Self {
        ManifestError::InvalidJson {
            manifest: manifest.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidToml error
    pub fn invalid_toml(manifest: impl Into<String>, message: impl Into<String>) -> Self {
        ManifestError::InvalidToml {
            manifest: manifest.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidXml error
    pub fn invalid_xml(manifest: impl Into<String>, message: impl Into<String>) -> Self {
        ManifestError::InvalidXml {
            manifest: manifest.into(),
            message: message.into(),
        }
    }

    /// Creates a new NotAnObject error
    pub fn not_an_object(manifest: impl Into<String>) -> Self {
        ManifestError::NotAnObject {
            manifest: manifest.into(),
        }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new RateLimitExceeded error
    pub fn rate_limit_exceeded(registry: impl Into<String>) -> Self {
        RegistryError::RateLimitExceeded {
            registry: registry.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Returns true for "the package does not exist", which callers skip quietly
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::PackageNotFound { .. })
    }
}
