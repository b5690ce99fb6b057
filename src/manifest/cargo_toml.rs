//! Cargo.toml parser for Rust projects
//!
//! Handles:
//! - [dependencies], [dev-dependencies], [build-dependencies]
//! - [target.'cfg(...)'.dependencies] and friends
//! - `name = "1.2"` strings, inline tables and `[dependencies.name]` sub-tables
//! - `package = "real-name"` renames (the registry name is kept)
//!
//! Path, git and workspace-inherited dependencies are not resolved from
//! crates.io and are skipped.

use crate::domain::Ecosystem;
use crate::error::ManifestError;
use crate::manifest::{DependencyMap, ManifestParser};
use toml::{Table, Value};

const MANIFEST: &str = "Cargo.toml";
const SECTIONS: [&str; 3] = ["dependencies", "dev-dependencies", "build-dependencies"];

/// Parser for Cargo.toml files
pub struct CargoTomlParser;

impl ManifestParser for CargoTomlParser {
    fn parse(&self, content: &str) -> Result<DependencyMap, ManifestError> {
        let toml: Table = content
            .parse()
            .map_err(|e: toml::de::Error| ManifestError::invalid_toml(MANIFEST, e.message()))?;

        let mut dependencies = DependencyMap::new();

        for section in SECTIONS {
            if let Some(deps) = toml.get(section).and_then(Value::as_table) {
                parse_cargo_dependencies(deps, &mut dependencies);
            }
        }

        // Target-specific dependencies
        if let Some(targets) = toml.get("target").and_then(Value::as_table) {
            for target_config in targets.values() {
                for section in SECTIONS {
                    if let Some(deps) = target_config.get(section).and_then(Value::as_table) {
                        parse_cargo_dependencies(deps, &mut dependencies);
                    }
                }
            }
        }

        Ok(dependencies)
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }
}

fn parse_cargo_dependencies(deps: &Table, output: &mut DependencyMap) {
    for (name, value) in deps {
        match value {
            // Simple string: package = "1.0.0"
            Value::String(version) => {
                output.insert(name.clone(), version.clone());
            }
            // Inline table or sub-table: package = { version = "1.0.0", ... }
            Value::Table(table) => {
                if ["path", "git", "workspace"]
                    .iter()
                    .any(|key| table.contains_key(*key))
                {
                    continue;
                }
                let Some(version) = table.get("version").and_then(Value::as_str) else {
                    continue;
                };
                let registry_name = table
                    .get("package")
                    .and_then(Value::as_str)
                    .unwrap_or(name);
                output.insert(registry_name.to_string(), version.to_string());
            }
            _ => {}
        }
    }
}
