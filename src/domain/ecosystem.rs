//! Ecosystem type definitions for supported package registries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported packaging ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// Node.js ecosystem (package.json, npm registry)
    Node,
    /// Python ecosystem (requirements.txt, Pipfile, pyproject.toml, PyPI)
    Python,
    /// Go ecosystem (go.mod, Go module proxy)
    Go,
    /// PHP ecosystem (composer.json, Packagist)
    Php,
    /// Rust ecosystem (Cargo.toml, crates.io)
    Rust,
    /// .NET ecosystem (*.csproj, NuGet)
    DotNet,
}

impl Ecosystem {
    /// Returns the display name for this ecosystem
    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::Node => "Node.js",
            Ecosystem::Python => "Python",
            Ecosystem::Go => "Go",
            Ecosystem::Php => "PHP",
            Ecosystem::Rust => "Rust",
            Ecosystem::DotNet => ".NET",
        }
    }

    /// Returns the registry name used in log and error messages
    pub fn registry_name(&self) -> &'static str {
        match self {
            Ecosystem::Node => "npm",
            Ecosystem::Python => "PyPI",
            Ecosystem::Go => "Go Proxy",
            Ecosystem::Php => "Packagist",
            Ecosystem::Rust => "crates.io",
            Ecosystem::DotNet => "NuGet",
        }
    }

    /// Returns the ecosystem identifier understood by the OSV database
    pub fn osv_name(&self) -> &'static str {
        match self {
            Ecosystem::Node => "npm",
            Ecosystem::Python => "PyPI",
            Ecosystem::Go => "Go",
            Ecosystem::Php => "Packagist",
            Ecosystem::Rust => "crates.io",
            Ecosystem::DotNet => "NuGet",
        }
    }

    /// Returns true if specifiers in this ecosystem can express a range
    /// that admits more than one published version.
    ///
    /// go.mod always names a single minimum version, so Go is the only
    /// ecosystem without range semantics.
    pub fn supports_ranges(&self) -> bool {
        !matches!(self, Ecosystem::Go)
    }

    /// Returns all supported ecosystems
    pub fn all() -> &'static [Ecosystem] {
        &[
            Ecosystem::Node,
            Ecosystem::Python,
            Ecosystem::Go,
            Ecosystem::Php,
            Ecosystem::Rust,
            Ecosystem::DotNet,
        ]
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Ecosystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "node" | "nodejs" | "npm" | "javascript" => Ok(Ecosystem::Node),
            "python" | "pypi" | "pip" => Ok(Ecosystem::Python),
            "go" | "golang" => Ok(Ecosystem::Go),
            "php" | "composer" | "packagist" => Ok(Ecosystem::Php),
            "rust" | "cargo" | "crates" => Ok(Ecosystem::Rust),
            "dotnet" | ".net" | "nuget" | "csharp" => Ok(Ecosystem::DotNet),
            other => Err(format!(
                "unknown ecosystem '{}': expected node, python, go, php, rust or dotnet",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(Ecosystem::Node.display_name(), "Node.js");
        assert_eq!(Ecosystem::Python.display_name(), "Python");
        assert_eq!(Ecosystem::Go.display_name(), "Go");
        assert_eq!(Ecosystem::Php.display_name(), "PHP");
        assert_eq!(Ecosystem::Rust.display_name(), "Rust");
        assert_eq!(Ecosystem::DotNet.display_name(), ".NET");
    }

    #[test]
    fn test_registry_names() {
        assert_eq!(Ecosystem::Node.registry_name(), "npm");
        assert_eq!(Ecosystem::Rust.registry_name(), "crates.io");
        assert_eq!(Ecosystem::DotNet.registry_name(), "NuGet");
    }

    #[test]
    fn test_osv_names() {
        assert_eq!(Ecosystem::Python.osv_name(), "PyPI");
        assert_eq!(Ecosystem::Php.osv_name(), "Packagist");
        assert_eq!(Ecosystem::Go.osv_name(), "Go");
    }

    #[test]
    fn test_supports_ranges() {
        assert!(Ecosystem::Node.supports_ranges());
        assert!(Ecosystem::DotNet.supports_ranges());
        assert!(!Ecosystem::Go.supports_ranges());
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("node".parse::<Ecosystem>().unwrap(), Ecosystem::Node);
        assert_eq!("NuGet".parse::<Ecosystem>().unwrap(), Ecosystem::DotNet);
        assert_eq!("golang".parse::<Ecosystem>().unwrap(), Ecosystem::Go);
        assert_eq!("composer".parse::<Ecosystem>().unwrap(), Ecosystem::Php);
        assert!("ruby".parse::<Ecosystem>().is_err());
    }

    #[test]
    fn test_all_ecosystems() {
        assert_eq!(Ecosystem::all().len(), 6);
    }

    #[test]
    fn test_serde_round_names() {
        assert_eq!(serde_json::to_string(&Ecosystem::DotNet).unwrap(), "\"dotnet\"");
        let eco: Ecosystem = serde_json::from_str("\"php\"").unwrap();
        assert_eq!(eco, Ecosystem::Php);
    }
}
