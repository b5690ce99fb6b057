//! Rust (Cargo) version specifier normalizer
//!
//! Handles version formats:
//! - Caret (default): `1.2.3` or `^1.2.3`
//! - Exact pinned: `=1.2.3`
//! - Tilde: `~1.2.3`
//! - Comparison: `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`
//! - Wildcard: `1.*`
//! - Range: `>=1.0, <2.0`

use crate::domain::{Ecosystem, ParsedVersion, VersionSpecKind};
use crate::error::SpecifierError;
use crate::parser::{normalize, resolve_kind, VersionParser};

/// Rust/Cargo version specifier normalizer
pub struct RustVersionParser;

impl VersionParser for RustVersionParser {
    fn parse(&self, spec: &str) -> Result<ParsedVersion, SpecifierError> {
        let normalized = normalize(spec, &[])?;
        // Cargo reads a bare version as a caret requirement
        let kind = resolve_kind(&normalized, VersionSpecKind::Caret);
        Ok(ParsedVersion::new(kind, spec.trim(), normalized.cleaned))
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Rust
    }
}
