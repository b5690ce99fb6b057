//! Normalized version specifier types for different package ecosystems
//!
//! Handles version constraints like:
//! - Node.js: `^1.2.3`, `~1.2.3`, `>=1.0.0`, `1.2.3`, `1.x`
//! - Python: `==1.2.3`, `~=1.2`, `>=1.2,<2.0`
//! - Rust: `1.2.3` (implicit caret), `^1.2.3`, `~1.2.3`, `=1.2.3`
//! - Go: `v1.2.3`
//! - PHP: `^1.2`, `~1.2.3`, `1.2.*`, `>=1.0 <2.0`
//! - .NET: `1.2.3`, `[1.0,2.0)`

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of version specification (the range operator it was written with)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSpecKind {
    /// Exact/pinned version (e.g., `1.2.3` for Node, `==1.2.3` for Python, `=1.2.3` for Rust)
    Exact,
    /// Caret range (e.g., `^1.2.3`) - compatible with major version
    Caret,
    /// Tilde range (e.g., `~1.2.3`) - compatible with minor version
    Tilde,
    /// PEP 440 compatible release (e.g., `~=1.2`)
    Compatible,
    /// Greater than or equal (e.g., `>=1.2.3`)
    GreaterOrEqual,
    /// Greater than (e.g., `>1.2.3`)
    Greater,
    /// Less than or equal (e.g., `<=1.2.3`)
    LessOrEqual,
    /// Less than (e.g., `<1.2.3`)
    Less,
    /// Wildcard segment (e.g., `1.2.*`, `1.x`)
    Wildcard,
    /// Compound range (e.g., `>=1.0.0 <2.0.0`, `^1.0 || ^2.0`)
    Range,
    /// NuGet interval notation (e.g., `[1.0,2.0)`)
    Interval,
}

impl VersionSpecKind {
    /// Returns true if this kind admits more than a single version
    pub fn is_range(&self) -> bool {
        !matches!(self, VersionSpecKind::Exact)
    }

    /// Returns the operator as written in a manifest, or an empty string
    pub fn operator(&self) -> &'static str {
        match self {
            VersionSpecKind::Exact => "",
            VersionSpecKind::Caret => "^",
            VersionSpecKind::Tilde => "~",
            VersionSpecKind::Compatible => "~=",
            VersionSpecKind::GreaterOrEqual => ">=",
            VersionSpecKind::Greater => ">",
            VersionSpecKind::LessOrEqual => "<=",
            VersionSpecKind::Less => "<",
            VersionSpecKind::Wildcard => "*",
            VersionSpecKind::Range => "range",
            VersionSpecKind::Interval => "interval",
        }
    }
}

/// A dependency specifier after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedVersion {
    /// The raw specifier as it appears in the manifest
    pub original: String,
    /// Bare comparable version (operators, `v` prefix and build metadata removed)
    pub cleaned: String,
    /// The range operator the specifier was written with
    pub kind: VersionSpecKind,
}

impl ParsedVersion {
    /// Creates a new ParsedVersion
    pub fn new(kind: VersionSpecKind, original: impl Into<String>, cleaned: impl Into<String>) -> Self {
        Self {
            kind,
            original: original.into(),
            cleaned: cleaned.into(),
        }
    }

    /// Returns true if the original specifier was a bound or range
    pub fn is_range(&self) -> bool {
        self.kind.is_range()
    }

    /// Returns the range operator, empty for exact versions
    pub fn range_operator(&self) -> &'static str {
        self.kind.operator()
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}
