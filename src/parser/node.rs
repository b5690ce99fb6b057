//! Node.js (npm) version specifier normalizer
//!
//! Handles version formats:
//! - Exact: `1.2.3`, `=1.2.3`, `v1.2.3`
//! - Caret / tilde: `^1.2.3`, `~1.2.3`
//! - Comparison: `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`
//! - Wildcard and partial: `1.x`, `1.2.*`, `1.2`
//! - Range: `>=1.0.0 <2.0.0`, `1.0.0 - 2.0.0`, `^1.0.0 || ^2.0.0`

use crate::domain::{Ecosystem, ParsedVersion, VersionSpecKind};
use crate::error::SpecifierError;
use crate::parser::{normalize, resolve_kind, VersionParser};

/// Node.js version specifier normalizer
pub struct NodeVersionParser;

impl VersionParser for NodeVersionParser {
    fn parse(&self, spec: &str) -> Result<ParsedVersion, SpecifierError> {
        let normalized = normalize(spec, &["||"])?;
        let mut kind = resolve_kind(&normalized, VersionSpecKind::Exact);

        // A partial bare version (`1.2`) behaves like `1.2.x`
        if kind == VersionSpecKind::Exact
            && normalized.operator.is_empty()
            && normalized.cleaned.split('.').count() < 3
        {
            kind = VersionSpecKind::Wildcard;
        }

        Ok(ParsedVersion::new(kind, spec.trim(), normalized.cleaned))
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Node
    }
}
