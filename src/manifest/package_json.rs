//! package.json parser for Node.js projects
//!
//! Handles:
//! - dependencies
//! - devDependencies (merged after dependencies, so a duplicate name takes
//!   the devDependencies specifier)

use crate::domain::Ecosystem;
use crate::error::ManifestError;
use crate::manifest::{DependencyMap, ManifestParser};
use serde_json::{Map, Value};

const MANIFEST: &str = "package.json";

/// Parser for package.json files
pub struct PackageJsonParser;

impl ManifestParser for PackageJsonParser {
    fn parse(&self, content: &str) -> Result<DependencyMap, ManifestError> {
        let json: Value = serde_json::from_str(content)
            .map_err(|e| ManifestError::invalid_json(MANIFEST, e.to_string()))?;
        let root = json
            .as_object()
            .ok_or_else(|| ManifestError::not_an_object(MANIFEST))?;

        let mut dependencies = DependencyMap::new();
        for section in ["dependencies", "devDependencies"] {
            if let Some(deps) = root.get(section).and_then(Value::as_object) {
                merge_string_entries(deps, &mut dependencies);
            }
        }

        Ok(dependencies)
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Node
    }
}

/// Copies `name: "specifier"` pairs, ignoring non-string values
pub(crate) fn merge_string_entries(deps: &Map<String, Value>, output: &mut DependencyMap) {
    for (name, value) in deps {
        if let Some(spec) = value.as_str() {
            output.insert(name.clone(), spec.to_string());
        }
    }
}
