//! PHP (Composer) version specifier normalizer
//!
//! Handles version formats:
//! - Exact: `1.0.2`, `v1.0.2`
//! - Caret / tilde: `^1.2`, `~1.2.3`
//! - Comparison: `>=1.0`, `<2.0`
//! - Wildcard: `1.0.*`
//! - Constraint lists: `>=1.0 <2.0`, `>=1.0,<2.0`, `^1.0 || ^2.0`, `^1.0 | ^2.0`
//! - Stability flags: `^1.0@beta`

use crate::domain::{Ecosystem, ParsedVersion, VersionSpecKind};
use crate::error::SpecifierError;
use crate::parser::{normalize, resolve_kind, VersionParser};

/// PHP Composer version specifier normalizer
pub struct PhpVersionParser;

impl VersionParser for PhpVersionParser {
    fn parse(&self, spec: &str) -> Result<ParsedVersion, SpecifierError> {
        let trimmed = spec.trim();
        let without_flag = trimmed.split('@').next().unwrap_or(trimmed);
        let normalized = normalize(without_flag, &["||", "|"])?;
        let kind = resolve_kind(&normalized, VersionSpecKind::Exact);
        Ok(ParsedVersion::new(kind, trimmed, normalized.cleaned))
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Php
    }
}
