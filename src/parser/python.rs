//! Python (PEP 440 / Poetry) version specifier normalizer
//!
//! Handles version formats:
//! - Exact: `==1.2.3`, `===1.2.3`, bare `1.2.3`
//! - Compatible release: `~=1.2.3`
//! - Caret / tilde (Poetry): `^1.2.3`, `~1.2.3`
//! - Comparison: `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3`
//! - Prefix match: `==1.2.*`
//! - Clause lists: `>=1.0,<2.0`, `!=1.5,>=1.0`
//!
//! Pre-release spellings such as `1.0.0rc1` or `2.0b3` are kept in the
//! cleaned version.

use crate::domain::{Ecosystem, ParsedVersion, VersionSpecKind};
use crate::error::SpecifierError;
use crate::parser::{normalize, resolve_kind, VersionParser};

/// Python version specifier normalizer
pub struct PythonVersionParser;

impl VersionParser for PythonVersionParser {
    fn parse(&self, spec: &str) -> Result<ParsedVersion, SpecifierError> {
        let normalized = normalize(spec, &[])?;
        let kind = resolve_kind(&normalized, VersionSpecKind::Exact);
        Ok(ParsedVersion::new(kind, spec.trim(), normalized.cleaned))
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }
}
