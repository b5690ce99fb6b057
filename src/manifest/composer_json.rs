//! composer.json parser for PHP projects
//!
//! Handles:
//! - require section dependencies
//! - require-dev section dependencies (merged last)
//!
//! Platform requirements (`php`, `ext-*`, `lib-*`, `composer-*-api`) are not
//! Packagist packages and are removed.

use crate::domain::Ecosystem;
use crate::error::ManifestError;
use crate::manifest::package_json::merge_string_entries;
use crate::manifest::{DependencyMap, ManifestParser};
use serde_json::Value;

const MANIFEST: &str = "composer.json";

/// Parser for composer.json files
pub struct ComposerJsonParser;

impl ManifestParser for ComposerJsonParser {
    fn parse(&self, content: &str) -> Result<DependencyMap, ManifestError> {
        let json: Value = serde_json::from_str(content)
            .map_err(|e| ManifestError::invalid_json(MANIFEST, e.to_string()))?;
        let root = json
            .as_object()
            .ok_or_else(|| ManifestError::not_an_object(MANIFEST))?;

        let mut dependencies = DependencyMap::new();
        for section in ["require", "require-dev"] {
            if let Some(deps) = root.get(section).and_then(Value::as_object) {
                merge_string_entries(deps, &mut dependencies);
            }
        }
        dependencies.retain(|name, _| !is_platform_package(name));

        Ok(dependencies)
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Php
    }
}

fn is_platform_package(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == "php"
        || lower.starts_with("php-")
        || lower.starts_with("ext-")
        || lower.starts_with("lib-")
        || (lower.starts_with("composer-") && lower.ends_with("-api"))
}
