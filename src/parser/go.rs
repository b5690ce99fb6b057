//! Go (go.mod) version specifier normalizer
//!
//! Handles version formats:
//! - Semantic version: `v1.2.3`
//! - Prerelease: `v1.2.3-beta.1`
//! - Incompatible major: `v2.0.0+incompatible` (suffix stripped)
//!
//! Pseudo-versions (`v0.0.0-20210101120000-abcdef123456`) name an unreleased
//! commit and cannot be compared against published releases, so they are
//! rejected. go.mod has no range operators; every version is exact.

use crate::domain::{Ecosystem, ParsedVersion, VersionSpecKind};
use crate::error::SpecifierError;
use crate::parser::{normalize, VersionParser};
use regex::Regex;
use std::sync::LazyLock;

/// Go module version specifier normalizer
pub struct GoVersionParser;

// Pseudo-version forms:
//   vX.0.0-yyyymmddhhmmss-abcdefabcdef
//   vX.Y.Z-pre.0.yyyymmddhhmmss-abcdefabcdef
//   vX.Y.(Z+1)-0.yyyymmddhhmmss-abcdefabcdef
static PSEUDO_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[-.])\d{14}-[0-9a-f]{12}$").unwrap());

/// Returns true for a Go pseudo-version
pub fn is_pseudo_version(version: &str) -> bool {
    let version = version.trim().trim_end_matches("+incompatible");
    PSEUDO_VERSION_RE.is_match(version)
}

impl VersionParser for GoVersionParser {
    fn parse(&self, spec: &str) -> Result<ParsedVersion, SpecifierError> {
        let trimmed = spec.trim();
        if is_pseudo_version(trimmed) {
            return Err(SpecifierError::Malformed {
                spec: trimmed.to_string(),
            });
        }

        let normalized = normalize(trimmed, &[])?;
        Ok(ParsedVersion::new(
            VersionSpecKind::Exact,
            trimmed,
            normalized.cleaned,
        ))
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }
}
