//! Version specifier normalizers for different package ecosystems
//!
//! Each parser turns a raw manifest specifier into a [`ParsedVersion`]: the
//! bare comparable version plus the operator it was written with.
//! - Node.js (npm semver ranges)
//! - Python (PEP 440 / Poetry)
//! - Go (go.mod)
//! - PHP (Composer)
//! - Rust (Cargo)
//! - .NET (NuGet)

mod dotnet;
mod go;
mod node;
mod php;
mod python;
mod rust;

pub use dotnet::DotNetVersionParser;
pub use go::{is_pseudo_version, GoVersionParser};
pub use node::NodeVersionParser;
pub use php::PhpVersionParser;
pub use python::PythonVersionParser;
pub use rust::RustVersionParser;

use crate::domain::{Ecosystem, ParsedVersion, VersionSpecKind};
use crate::error::SpecifierError;
use regex::Regex;
use std::sync::LazyLock;

/// Trait for normalizing version specifiers
pub trait VersionParser: Send + Sync {
    /// Normalize a raw specifier
    fn parse(&self, spec: &str) -> Result<ParsedVersion, SpecifierError>;

    /// Returns the ecosystem this parser handles
    fn ecosystem(&self) -> Ecosystem;
}

/// Get a version parser for the specified ecosystem
pub fn get_parser(ecosystem: Ecosystem) -> Box<dyn VersionParser> {
    match ecosystem {
        Ecosystem::Node => Box::new(NodeVersionParser),
        Ecosystem::Python => Box::new(PythonVersionParser),
        Ecosystem::Go => Box::new(GoVersionParser),
        Ecosystem::Php => Box::new(PhpVersionParser),
        Ecosystem::Rust => Box::new(RustVersionParser),
        Ecosystem::DotNet => Box::new(DotNetVersionParser),
    }
}

// Leading operator run: ^ ~ >= <= > < = ! * and interleaved whitespace
static OPERATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\^~<>=!*\s]*").unwrap());

// The cleaned remainder must start with a numeric version
static NUMERIC_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?(\.\d+)?").unwrap());

/// Intermediate result shared by all ecosystem parsers
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Normalized {
    /// Operator run with whitespace removed (`^`, `>=`, `~=`, ...), may be empty
    pub operator: String,
    /// Bare comparable version
    pub cleaned: String,
    /// More than one clause or alternative was present
    pub compound: bool,
    /// A trailing `.*`/`.x` segment was collapsed to `.0`
    pub wildcard: bool,
}

/// Strips the operator run, `v` prefix, build metadata and wildcard segments
///
/// Only the first alternative (split on any of `alternative_separators`) and
/// the first clause of it (cut at whitespace or `,`) are kept.
pub(crate) fn normalize(
    spec: &str,
    alternative_separators: &[&str],
) -> Result<Normalized, SpecifierError> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err(SpecifierError::Empty);
    }

    let mut first = trimmed;
    let mut compound = false;
    for sep in alternative_separators {
        if let Some((head, _)) = first.split_once(*sep) {
            first = head.trim();
            compound = true;
        }
    }

    let op_end = OPERATOR_RE.find(first).map_or(0, |m| m.end());
    let operator: String = first[..op_end].chars().filter(|c| !c.is_whitespace()).collect();
    let rest = &first[op_end..];

    let clause_end = rest.find(|c: char| c.is_whitespace() || c == ',').unwrap_or(rest.len());
    let clause = &rest[..clause_end];
    if !rest[clause_end..].trim().is_empty() {
        compound = true;
    }

    let clause = clause.strip_prefix(['v', 'V']).unwrap_or(clause);
    let clause = clause.split('+').next().unwrap_or(clause);

    let mut cleaned = clause.to_string();
    let mut wildcard = false;
    while let Some(stem) = [".*", ".x", ".X"]
        .iter()
        .find_map(|suffix| cleaned.strip_suffix(*suffix))
    {
        cleaned = stem.to_string();
        wildcard = true;
    }
    if wildcard {
        cleaned.push_str(".0");
    }

    if !NUMERIC_PREFIX_RE.is_match(&cleaned) {
        return Err(SpecifierError::Malformed {
            spec: trimmed.to_string(),
        });
    }

    Ok(Normalized {
        operator,
        cleaned,
        compound,
        wildcard,
    })
}

/// Maps an operator run to its kind; `None` for a bare version
pub(crate) fn kind_for_operator(operator: &str) -> Option<VersionSpecKind> {
    match operator {
        "" | "=" | "==" | "===" => None,
        "^" => Some(VersionSpecKind::Caret),
        "~" => Some(VersionSpecKind::Tilde),
        "~=" => Some(VersionSpecKind::Compatible),
        ">=" | "=>" => Some(VersionSpecKind::GreaterOrEqual),
        ">" => Some(VersionSpecKind::Greater),
        "<=" | "=<" => Some(VersionSpecKind::LessOrEqual),
        "<" => Some(VersionSpecKind::Less),
        _ => Some(VersionSpecKind::Range),
    }
}

/// Shared kind resolution: compound beats wildcard beats operator, and a
/// bare version falls back to `bare`
pub(crate) fn resolve_kind(normalized: &Normalized, bare: VersionSpecKind) -> VersionSpecKind {
    if normalized.compound {
        VersionSpecKind::Range
    } else if normalized.wildcard {
        VersionSpecKind::Wildcard
    } else {
        match kind_for_operator(&normalized.operator) {
            Some(kind) => kind,
            None if normalized.operator.is_empty() => bare,
            None => VersionSpecKind::Exact,
        }
    }
}
