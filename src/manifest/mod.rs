//! Manifest file detection and parsing
//!
//! This module provides functionality to:
//! - Detect a supported manifest from a file or directory path
//! - Parse declared dependencies into an ordered name → specifier map
//! - Drop entries that cannot be resolved from a public registry

mod cargo_toml;
mod composer_json;
mod csproj;
mod detector;
mod filter;
mod go_mod;
mod package_json;
mod python;

pub use cargo_toml::CargoTomlParser;
pub use composer_json::ComposerJsonParser;
pub use csproj::CsprojParser;
pub use detector::{detect_manifest, detect_manifests, ManifestInfo};
pub use filter::{check_specifier, registry_entries};
pub use go_mod::GoModParser;
pub use package_json::PackageJsonParser;
pub use python::PythonManifestParser;

use crate::domain::Ecosystem;
use crate::error::ManifestError;
use indexmap::IndexMap;
use std::path::Path;

/// Declared dependencies in manifest order; a later duplicate overwrites an
/// earlier one
pub type DependencyMap = IndexMap<String, String>;

/// Trait for parsing manifest files
pub trait ManifestParser: Send + Sync {
    /// Parse the declared dependencies from manifest text
    fn parse(&self, content: &str) -> Result<DependencyMap, ManifestError>;

    /// Returns the ecosystem this parser handles
    fn ecosystem(&self) -> Ecosystem;
}

/// Get a manifest parser for the specified ecosystem
pub fn get_parser(ecosystem: Ecosystem) -> Box<dyn ManifestParser> {
    match ecosystem {
        Ecosystem::Node => Box::new(PackageJsonParser),
        Ecosystem::Python => Box::new(PythonManifestParser),
        Ecosystem::Go => Box::new(GoModParser),
        Ecosystem::Php => Box::new(ComposerJsonParser),
        Ecosystem::Rust => Box::new(CargoTomlParser),
        Ecosystem::DotNet => Box::new(CsprojParser),
    }
}

/// A manifest read from disk
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub info: ManifestInfo,
    pub content: String,
}

/// Detect and read the manifest at `path` (a file or a directory)
///
/// `ecosystem` overrides detection from the file name.
pub fn load_manifest(
    path: &Path,
    ecosystem: Option<Ecosystem>,
) -> Result<LoadedManifest, ManifestError> {
    let info = match (detect_manifest(path), ecosystem) {
        (Some(info), None) => info,
        (Some(info), Some(ecosystem)) => ManifestInfo::new(info.path, ecosystem),
        (None, Some(ecosystem)) if path.is_file() => ManifestInfo::new(path, ecosystem),
        _ => {
            return Err(ManifestError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    let content = std::fs::read_to_string(&info.path)
        .map_err(|e| ManifestError::read_error(&info.path, e))?;

    Ok(LoadedManifest { info, content })
}
