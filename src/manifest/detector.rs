//! Manifest file detection
//!
//! Recognized file names:
//! - Node.js: `package.json`
//! - Python: `pyproject.toml`, `Pipfile`, `requirements*.txt`
//! - Go: `go.mod`
//! - PHP: `composer.json`
//! - Rust: `Cargo.toml`
//! - .NET: `*.csproj`, `*.fsproj`, `*.vbproj`, `Directory.Packages.props`

use crate::domain::Ecosystem;
use std::path::{Path, PathBuf};

/// Information about a detected manifest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
    /// Path to the manifest file
    pub path: PathBuf,
    /// Ecosystem the manifest belongs to
    pub ecosystem: Ecosystem,
}

impl ManifestInfo {
    /// Create a new ManifestInfo
    pub fn new(path: impl Into<PathBuf>, ecosystem: Ecosystem) -> Self {
        Self {
            path: path.into(),
            ecosystem,
        }
    }

    /// File name of the manifest, for messages
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// Classifies a manifest by its file name
pub fn ecosystem_for_file(file_name: &str) -> Option<Ecosystem> {
    let lower = file_name.to_ascii_lowercase();
    match file_name {
        "package.json" => Some(Ecosystem::Node),
        "pyproject.toml" | "Pipfile" => Some(Ecosystem::Python),
        "go.mod" => Some(Ecosystem::Go),
        "composer.json" => Some(Ecosystem::Php),
        "Cargo.toml" => Some(Ecosystem::Rust),
        "Directory.Packages.props" => Some(Ecosystem::DotNet),
        _ if lower.starts_with("requirements") && lower.ends_with(".txt") => {
            Some(Ecosystem::Python)
        }
        _ if [".csproj", ".fsproj", ".vbproj"]
            .iter()
            .any(|ext| lower.ends_with(ext)) =>
        {
            Some(Ecosystem::DotNet)
        }
        _ => None,
    }
}

/// Preference among several manifests of one ecosystem in the same directory
fn file_rank(file_name: &str) -> u8 {
    match file_name {
        "pyproject.toml" => 0,
        "Pipfile" => 1,
        "requirements.txt" => 2,
        "Directory.Packages.props" => 4,
        _ => 3,
    }
}

/// Detect all manifest files directly inside `dir`
///
/// Results are ordered by ecosystem, then by preference within an
/// ecosystem, then by file name.
pub fn detect_manifests(dir: &Path) -> Vec<ManifestInfo> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut found: Vec<(Ecosystem, u8, String, PathBuf)> = entries
        .flatten()
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            let ecosystem = ecosystem_for_file(&name)?;
            Some((ecosystem, file_rank(&name), name, entry.path()))
        })
        .collect();
    found.sort();

    found
        .into_iter()
        .map(|(ecosystem, _, _, path)| ManifestInfo::new(path, ecosystem))
        .collect()
}

/// Detect the manifest at `path`
///
/// A file is classified by its name; for a directory the first manifest in
/// [`detect_manifests`] order is returned.
pub fn detect_manifest(path: &Path) -> Option<ManifestInfo> {
    if path.is_dir() {
        return detect_manifests(path).into_iter().next();
    }
    let name = path.file_name()?.to_str()?;
    ecosystem_for_file(name).map(|ecosystem| ManifestInfo::new(path, ecosystem))
}
