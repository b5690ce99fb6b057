//! .NET (NuGet) version specifier normalizer
//!
//! Handles version formats:
//! - Exact: `13.0.3`, `6.0.0-preview.7`
//! - Interval notation: `[1.0,2.0)`, `[1.0,)`, `(,2.0]`
//! - Exact interval: `[1.0.0]`
//!
//! For an interval the cleaned version is its lower end, or the upper end if
//! the interval is unbounded below.

use crate::domain::{Ecosystem, ParsedVersion, VersionSpecKind};
use crate::error::SpecifierError;
use crate::parser::{normalize, VersionParser};

/// NuGet version specifier normalizer
pub struct DotNetVersionParser;

impl VersionParser for DotNetVersionParser {
    fn parse(&self, spec: &str) -> Result<ParsedVersion, SpecifierError> {
        let trimmed = spec.trim();

        if let Some(inner) = trimmed
            .strip_prefix(['[', '('])
            .and_then(|s| s.strip_suffix([']', ')']))
        {
            let (kind, endpoint) = match inner.split_once(',') {
                None => (VersionSpecKind::Exact, inner.trim()),
                Some((low, high)) if low.trim().is_empty() => {
                    (VersionSpecKind::Interval, high.trim())
                }
                Some((low, _)) => (VersionSpecKind::Interval, low.trim()),
            };
            let normalized = normalize(endpoint, &[]).map_err(|_| SpecifierError::Malformed {
                spec: trimmed.to_string(),
            })?;
            return Ok(ParsedVersion::new(kind, trimmed, normalized.cleaned));
        }

        let normalized = normalize(trimmed, &[])?;
        Ok(ParsedVersion::new(
            VersionSpecKind::Exact,
            trimmed,
            normalized.cleaned,
        ))
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::DotNet
    }
}
