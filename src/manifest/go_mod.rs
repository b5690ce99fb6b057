//! go.mod parser for Go projects
//!
//! Handles:
//! - Single-line `require module/path v1.2.3`
//! - `require ( ... )` blocks
//! - `// indirect` entries (skipped)
//! - `replace` directives and blocks (skipped)

use crate::domain::Ecosystem;
use crate::error::ManifestError;
use crate::manifest::{DependencyMap, ManifestParser};
use regex::Regex;
use std::sync::LazyLock;

/// Parser for go.mod files
pub struct GoModParser;

// Regex for single require: require module/path v1.2.3
static SINGLE_REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^require\s+(\S+)\s+(v\S+)\s*(//.*)?$").unwrap());

// Regex for require block entry: module/path v1.2.3
static BLOCK_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+(v\S+)\s*(//.*)?$").unwrap());

// Regex for indirect marker comment
static INDIRECT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//\s*indirect").unwrap());

impl ManifestParser for GoModParser {
    fn parse(&self, content: &str) -> Result<DependencyMap, ManifestError> {
        let mut dependencies = DependencyMap::new();

        let mut in_require_block = false;
        let mut in_other_block = false;

        for line in content.lines() {
            let trimmed = line.trim();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }

            // Block start/end
            if trimmed.starts_with("require (") || trimmed == "require(" {
                in_require_block = true;
                continue;
            }
            if trimmed.ends_with('(') {
                // replace, exclude, retract and tool blocks
                in_other_block = true;
                continue;
            }
            if trimmed == ")" {
                in_require_block = false;
                in_other_block = false;
                continue;
            }
            if in_other_block || trimmed.starts_with("replace ") {
                continue;
            }

            if INDIRECT_RE.is_match(trimmed) {
                continue;
            }

            let caps = if in_require_block {
                BLOCK_ENTRY_RE.captures(trimmed)
            } else {
                SINGLE_REQUIRE_RE.captures(trimmed)
            };
            if let Some(caps) = caps {
                dependencies.insert(caps[1].to_string(), caps[2].to_string());
            }
        }

        Ok(dependencies)
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }
}
