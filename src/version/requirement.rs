//! Compiles a manifest specifier into a set of [`VersionRange`] alternatives
//!
//! Supported grammars:
//! - Node (npm semver): `^1.2.3`, `~1.2`, `1.x`, `>=1.0.0 <2.0.0`, `1.0 - 2.0`, `a || b`
//! - PHP (Composer): `^1.2`, `~1.2`, `1.2.*`, `>=1.0,<2.0`, `a || b` / `a | b`
//! - Python (PEP 440): `==1.2.*`, `~=1.4.2`, `>=1.0,<2.0`, `!=1.3` (ignored)
//! - Rust (Cargo): parsed with the `semver` crate, bare versions are caret ranges
//! - .NET (NuGet): interval notation, bare versions are exact
//!
//! Go has no range grammar in go.mod and never produces a requirement.

use super::compare::{numeric_parts, strip_version_noise};
use super::range::{parse_nuget_interval, VersionRange};
use crate::domain::Ecosystem;
use semver::{Comparator, Op, VersionReq};

/// A union of ranges; a version is admitted if any alternative contains it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub alternatives: Vec<VersionRange>,
}

impl Requirement {
    /// Parses a raw specifier for the given ecosystem
    ///
    /// Returns `None` if any part of the specifier is not understood.
    pub fn parse(ecosystem: Ecosystem, spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        let alternatives = match ecosystem {
            Ecosystem::Node => parse_alternatives(spec, &["||"], parse_node_set)?,
            Ecosystem::Php => parse_alternatives(spec, &["||", "|"], parse_composer_set)?,
            Ecosystem::Python => vec![parse_pep440_set(spec)?],
            Ecosystem::Rust => parse_cargo(spec)?,
            Ecosystem::DotNet => vec![parse_nuget(spec)?],
            Ecosystem::Go => return None,
        };

        Some(Self { alternatives })
    }

    /// Returns true if any alternative contains `version`
    pub fn admits(&self, version: &str) -> bool {
        self.alternatives.iter().any(|range| range.contains(version))
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.alternatives.iter().map(|r| r.to_string()).collect();
        f.write_str(&parts.join(" || "))
    }
}

fn parse_alternatives(
    spec: &str,
    separators: &[&str],
    parse_set: impl Fn(&str) -> Option<VersionRange>,
) -> Option<Vec<VersionRange>> {
    let mut pieces = vec![spec];
    for sep in separators {
        pieces = pieces.into_iter().flat_map(|p| p.split(*sep)).collect();
    }
    pieces.into_iter().map(|p| parse_set(p.trim())).collect()
}

/// Whitespace-separated comparators, or a hyphen range
fn parse_node_set(set: &str) -> Option<VersionRange> {
    let tokens = join_operator_tokens(set.split_whitespace());
    if tokens.is_empty() {
        return Some(VersionRange::any());
    }
    if tokens.len() == 3 && tokens[1] == "-" {
        return hyphen_range(&tokens[0], &tokens[2]);
    }
    intersect_all(tokens.iter().map(|t| parse_comparator(t, BareMeaning::Wildcard)))
}

/// Comma or whitespace separated comparators (logical AND), or a hyphen range
fn parse_composer_set(set: &str) -> Option<VersionRange> {
    let tokens = join_operator_tokens(set.split([',', ' ', '\t']).filter(|t| !t.is_empty()));
    if tokens.is_empty() {
        return None;
    }
    if tokens.len() == 3 && tokens[1] == "-" {
        return hyphen_range(&tokens[0], &tokens[2]);
    }
    intersect_all(
        tokens
            .iter()
            .map(|t| parse_comparator(strip_stability_flag(t), BareMeaning::Exact)),
    )
}

/// Comma-separated PEP 440 clauses
fn parse_pep440_set(set: &str) -> Option<VersionRange> {
    intersect_all(set.split(',').map(|clause| {
        let clause = clause.trim();
        if clause.starts_with("!=") {
            // exclusions do not narrow a contiguous range
            return Some(VersionRange::any());
        }
        if let Some(rest) = clause.strip_prefix("~=") {
            return compatible_range(rest.trim());
        }
        let clause = clause
            .strip_prefix("===")
            .or_else(|| clause.strip_prefix("=="))
            .map(|rest| format!("={}", rest.trim()))
            .unwrap_or_else(|| clause.to_string());
        parse_comparator(&clause, BareMeaning::Exact)
    }))
}

/// Cargo requirements go through the `semver` crate; its comparators are
/// then lowered to ranges so they share the evaluator with other ecosystems
fn parse_cargo(spec: &str) -> Option<Vec<VersionRange>> {
    match VersionReq::parse(spec) {
        Ok(req) => {
            let range = intersect_all(req.comparators.iter().map(lower_semver_comparator))?;
            Some(vec![range])
        }
        Err(_) => Some(vec![intersect_all(
            spec.split(',')
                .map(|clause| parse_comparator(clause.trim(), BareMeaning::Caret)),
        )?]),
    }
}

fn parse_nuget(spec: &str) -> Option<VersionRange> {
    if spec.starts_with(['[', '(']) {
        parse_nuget_interval(spec)
    } else if is_plain_version(spec) {
        Some(VersionRange::exact(spec))
    } else {
        None
    }
}

/// How a version written without an operator is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BareMeaning {
    /// Exact unless it contains a wildcard segment
    Exact,
    /// Partial versions act as wildcards (`1.2` means `1.2.x`)
    Wildcard,
    /// Caret range (Cargo)
    Caret,
}

fn parse_comparator(token: &str, bare: BareMeaning) -> Option<VersionRange> {
    let token = token.trim();
    if matches!(token, "*" | "x" | "X" | "") {
        return Some(VersionRange::any());
    }

    let ops = [">=", "<=", "==", ">", "<", "=", "^", "~"];
    let op = ops.iter().find(|op| token.starts_with(**op)).copied();
    let version = op.map_or(token, |op| token[op.len()..].trim());
    let version = strip_version_noise(version);

    if version.is_empty() {
        return None;
    }
    if has_wildcard_segment(version) {
        return match op {
            None | Some("=") | Some("==") => wildcard_range(version),
            Some(">=") | Some("^") | Some("~") => wildcard_lower(version).map(VersionRange::at_least),
            _ => None,
        };
    }
    if !is_plain_version(version) {
        return None;
    }

    match op {
        Some(">=") => Some(VersionRange::at_least(version)),
        Some(">") => Some(VersionRange::greater_than(version)),
        Some("<=") => Some(VersionRange::at_most(version)),
        Some("<") => Some(VersionRange::less_than(version)),
        Some("=") | Some("==") => Some(VersionRange::exact(version)),
        Some("^") => caret_range(version),
        Some("~") if bare == BareMeaning::Exact => compatible_range(version),
        Some("~") => tilde_range(version),
        _ => match bare {
            BareMeaning::Exact => Some(VersionRange::exact(version)),
            BareMeaning::Caret => caret_range(version),
            BareMeaning::Wildcard if numeric_parts(version).len() < 3 => wildcard_range(version),
            BareMeaning::Wildcard => Some(VersionRange::exact(version)),
        },
    }
}

/// `^1.2.3` → `<2.0.0`, `^0.2.3` → `<0.3.0`, `^0.0.3` → `<0.0.4`
fn caret_range(version: &str) -> Option<VersionRange> {
    let parts = numeric_parts(version);
    let upper = match parts.as_slice() {
        [] => return None,
        [major, ..] if *major > 0 => format!("{}.0.0", major.checked_add(1)?),
        [0, minor, ..] if *minor > 0 => format!("0.{}.0", minor.checked_add(1)?),
        [0, 0, patch, ..] => format!("0.0.{}", patch.checked_add(1)?),
        [0, 0] => "0.1.0".to_string(),
        _ => "1.0.0".to_string(),
    };
    Some(VersionRange::between(version, upper))
}

/// npm/Cargo tilde: `~1.2.3` → `<1.3.0`, `~1` → `<2.0.0`
fn tilde_range(version: &str) -> Option<VersionRange> {
    let parts = numeric_parts(version);
    let upper = match parts.as_slice() {
        [] => return None,
        [major] => format!("{}.0.0", major.checked_add(1)?),
        [major, minor, ..] => format!("{}.{}.0", major, minor.checked_add(1)?),
    };
    Some(VersionRange::between(version, upper))
}

/// PEP 440 `~=` and Composer `~`: the last given segment may increase
///
/// `~=1.4.2` → `<1.5`, `~1.2` → `<2`, `~1` → `<2`
fn compatible_range(version: &str) -> Option<VersionRange> {
    let mut parts = numeric_parts(version);
    if parts.len() > 1 {
        parts.pop();
    }
    let last = parts.last_mut()?;
    *last = last.checked_add(1)?;
    let upper = parts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".");
    Some(VersionRange::between(version, upper))
}

/// `1.2.*` / `1.2.x` / partial `1.2` → `[1.2.0, 1.3.0)`
fn wildcard_range(version: &str) -> Option<VersionRange> {
    let parts = numeric_parts(version);
    match parts.as_slice() {
        [] => Some(VersionRange::any()),
        [major] => Some(VersionRange::between(
            format!("{}.0.0", major),
            format!("{}.0.0", major.checked_add(1)?),
        )),
        [major, minor] => Some(VersionRange::between(
            format!("{}.{}.0", major, minor),
            format!("{}.{}.0", major, minor.checked_add(1)?),
        )),
        _ => Some(VersionRange::exact(version)),
    }
}

fn wildcard_lower(version: &str) -> Option<String> {
    let parts = numeric_parts(version);
    if parts.is_empty() {
        return None;
    }
    let mut padded: Vec<String> = parts.iter().map(u64::to_string).collect();
    padded.resize(3.max(padded.len()), "0".to_string());
    Some(padded.join("."))
}

/// `1.2.3 - 2.3.4` is inclusive on both ends; a partial upper end admits
/// everything within it (`1.0 - 2` means `<3.0.0`)
fn hyphen_range(low: &str, high: &str) -> Option<VersionRange> {
    let low = strip_version_noise(low);
    let high = strip_version_noise(high);
    if !is_plain_version(low) || !is_plain_version(high) {
        return None;
    }
    let lower = VersionRange::at_least(low);
    let upper = if numeric_parts(high).len() >= 3 {
        VersionRange::at_most(high)
    } else {
        let upper_wild = wildcard_range(high)?;
        VersionRange {
            lower: None,
            upper: upper_wild.upper,
        }
    };
    Some(lower.intersect(upper))
}

fn lower_semver_comparator(c: &Comparator) -> Option<VersionRange> {
    let pre = c.pre.as_str();
    let full = |major: u64, minor: u64, patch: u64| {
        if pre.is_empty() {
            format!("{}.{}.{}", major, minor, patch)
        } else {
            format!("{}.{}.{}-{}", major, minor, patch, pre)
        }
    };
    let (major, minor, patch) = (c.major, c.minor, c.patch);

    let range = match (c.op, minor, patch) {
        (Op::Exact | Op::Wildcard, Some(mi), Some(pa)) => VersionRange::exact(full(major, mi, pa)),
        (Op::Exact | Op::Wildcard, Some(mi), None) => {
            VersionRange::between(full(major, mi, 0), format!("{}.{}.0", major, mi.checked_add(1)?))
        }
        (Op::Exact | Op::Wildcard, None, _) => {
            VersionRange::between(full(major, 0, 0), format!("{}.0.0", major.checked_add(1)?))
        }
        (Op::Greater, Some(mi), Some(pa)) => VersionRange::greater_than(full(major, mi, pa)),
        (Op::Greater, Some(mi), None) => VersionRange::at_least(format!("{}.{}.0", major, mi.checked_add(1)?)),
        (Op::Greater, None, _) => VersionRange::at_least(format!("{}.0.0", major.checked_add(1)?)),
        (Op::GreaterEq, mi, pa) => {
            VersionRange::at_least(full(major, mi.unwrap_or(0), pa.unwrap_or(0)))
        }
        (Op::Less, mi, pa) => VersionRange::less_than(full(major, mi.unwrap_or(0), pa.unwrap_or(0))),
        (Op::LessEq, Some(mi), Some(pa)) => VersionRange::at_most(full(major, mi, pa)),
        (Op::LessEq, Some(mi), None) => VersionRange::less_than(format!("{}.{}.0", major, mi.checked_add(1)?)),
        (Op::LessEq, None, _) => VersionRange::less_than(format!("{}.0.0", major.checked_add(1)?)),
        (Op::Tilde, mi, pa) => {
            let lower = full(major, mi.unwrap_or(0), pa.unwrap_or(0));
            match mi {
                Some(mi) => VersionRange::between(lower, format!("{}.{}.0", major, mi.checked_add(1)?)),
                None => VersionRange::between(lower, format!("{}.0.0", major.checked_add(1)?)),
            }
        }
        (Op::Caret, mi, pa) => {
            let lower = full(major, mi.unwrap_or(0), pa.unwrap_or(0));
            let upper = match (major, mi, pa) {
                (m, _, _) if m > 0 => format!("{}.0.0", m.checked_add(1)?),
                (0, Some(mi), _) if mi > 0 => format!("0.{}.0", mi.checked_add(1)?),
                (0, Some(0), Some(pa)) => format!("0.0.{}", pa.checked_add(1)?),
                (0, Some(0), None) => "0.1.0".to_string(),
                _ => "1.0.0".to_string(),
            };
            VersionRange::between(lower, upper)
        }
        _ => return None,
    };
    Some(range)
}

fn intersect_all(ranges: impl Iterator<Item = Option<VersionRange>>) -> Option<VersionRange> {
    ranges.fold(Some(VersionRange::any()), |acc, next| Some(acc?.intersect(next?)))
}

/// Glues bare operators to the version that follows (`>= 1.0` → `>=1.0`)
fn join_operator_tokens<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut joined: Vec<String> = Vec::new();
    let mut pending = String::new();
    for token in tokens {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) && !token.is_empty() {
            pending.push_str(token);
            continue;
        }
        joined.push(format!("{}{}", std::mem::take(&mut pending), token));
    }
    if !pending.is_empty() {
        joined.push(pending);
    }
    joined
}

/// Composer `@dev` / `@stable` flags do not change the version bounds
fn strip_stability_flag(token: &str) -> &str {
    token.split('@').next().unwrap_or(token)
}

fn has_wildcard_segment(version: &str) -> bool {
    version
        .split('.')
        .any(|segment| matches!(segment, "*" | "x" | "X"))
}

fn is_plain_version(version: &str) -> bool {
    !numeric_parts(version).is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admits(ecosystem: Ecosystem, spec: &str, version: &str) -> bool {
        Requirement::parse(ecosystem, spec)
            .unwrap_or_else(|| panic!("failed to parse {spec}"))
            .admits(version)
    }

    mod node {
        use super::*;

        #[test]
        fn test_caret() {
            assert!(admits(Ecosystem::Node, "^1.0.0", "1.9.3"));
            assert!(!admits(Ecosystem::Node, "^1.0.0", "2.5.0"));
            assert!(admits(Ecosystem::Node, "^0.2.3", "0.2.9"));
            assert!(!admits(Ecosystem::Node, "^0.2.3", "0.3.0"));
            assert!(!admits(Ecosystem::Node, "^0.0.3", "0.0.4"));
        }

        #[test]
        fn test_tilde() {
            assert!(admits(Ecosystem::Node, "~1.2.3", "1.2.9"));
            assert!(!admits(Ecosystem::Node, "~1.2.3", "1.3.0"));
            assert!(admits(Ecosystem::Node, "~1", "1.9.0"));
        }

        #[test]
        fn test_x_ranges_and_partials() {
            assert!(admits(Ecosystem::Node, "1.x", "1.4.0"));
            assert!(!admits(Ecosystem::Node, "1.x", "2.0.0"));
            assert!(admits(Ecosystem::Node, "1.2", "1.2.7"));
            assert!(admits(Ecosystem::Node, "*", "9.9.9"));
        }

        #[test]
        fn test_exact() {
            assert!(admits(Ecosystem::Node, "1.3.0", "1.3.0"));
            assert!(!admits(Ecosystem::Node, "1.3.0", "1.3.1"));
            assert!(admits(Ecosystem::Node, "=v1.3.0", "1.3.0"));
        }

        #[test]
        fn test_compound_and_or() {
            assert!(admits(Ecosystem::Node, ">=1.0.0 <2.0.0", "1.5.0"));
            assert!(!admits(Ecosystem::Node, ">=1.0.0 <2.0.0", "2.0.0"));
            assert!(admits(Ecosystem::Node, ">= 1.0.0 < 2.0.0", "1.5.0"));
            assert!(admits(Ecosystem::Node, "^1.0.0 || ^2.0.0", "2.3.0"));
            assert!(!admits(Ecosystem::Node, "^1.0.0 || ^2.0.0", "3.0.0"));
        }

        #[test]
        fn test_hyphen_range() {
            assert!(admits(Ecosystem::Node, "1.2.3 - 2.3.4", "2.3.4"));
            assert!(!admits(Ecosystem::Node, "1.2.3 - 2.3.4", "2.3.5"));
            assert!(admits(Ecosystem::Node, "1.0 - 2", "2.9.0"));
            assert!(!admits(Ecosystem::Node, "1.0 - 2", "3.0.0"));
        }

        #[test]
        fn test_unparseable() {
            assert!(Requirement::parse(Ecosystem::Node, "latest").is_none());
            assert!(Requirement::parse(Ecosystem::Node, "").is_none());
        }
    }

    mod php {
        use super::*;

        #[test]
        fn test_composer_tilde_is_compatible_release() {
            assert!(admits(Ecosystem::Php, "~1.2", "1.9.0"));
            assert!(!admits(Ecosystem::Php, "~1.2", "2.0.0"));
            assert!(admits(Ecosystem::Php, "~1.2.3", "1.2.9"));
            assert!(!admits(Ecosystem::Php, "~1.2.3", "1.3.0"));
        }

        #[test]
        fn test_comma_and_pipe() {
            assert!(admits(Ecosystem::Php, ">=1.0,<2.0", "1.5"));
            assert!(!admits(Ecosystem::Php, ">=1.0,<2.0", "2.0"));
            assert!(admits(Ecosystem::Php, ">=1.0,<1.1|>=2.0,<2.1", "2.0.5"));
            assert!(admits(Ecosystem::Php, "^7.0 || ^8.0", "8.1.0"));
        }

        #[test]
        fn test_wildcard_and_stability_flag() {
            assert!(admits(Ecosystem::Php, "5.4.*", "5.4.12"));
            assert!(!admits(Ecosystem::Php, "5.4.*", "5.5.0"));
            assert!(admits(Ecosystem::Php, "^2.0@dev", "2.3.0"));
        }

        #[test]
        fn test_bare_is_exact() {
            assert!(admits(Ecosystem::Php, "1.0.2", "1.0.2"));
            assert!(!admits(Ecosystem::Php, "1.0.2", "1.0.3"));
        }

        #[test]
        fn test_branch_is_unparseable() {
            assert!(Requirement::parse(Ecosystem::Php, "dev-main").is_none());
        }
    }

    mod python {
        use super::*;

        #[test]
        fn test_pinned() {
            assert!(admits(Ecosystem::Python, "==2.31.0", "2.31.0"));
            assert!(!admits(Ecosystem::Python, "==2.31.0", "2.32.0"));
            assert!(admits(Ecosystem::Python, "===1.0", "1.0"));
        }

        #[test]
        fn test_prefix_match() {
            assert!(admits(Ecosystem::Python, "==1.2.*", "1.2.9"));
            assert!(!admits(Ecosystem::Python, "==1.2.*", "1.3.0"));
        }

        #[test]
        fn test_compatible_release() {
            assert!(admits(Ecosystem::Python, "~=1.4.2", "1.4.9"));
            assert!(!admits(Ecosystem::Python, "~=1.4.2", "1.5.0"));
            assert!(admits(Ecosystem::Python, "~=2.2", "2.9"));
            assert!(!admits(Ecosystem::Python, "~=2.2", "3.0"));
        }

        #[test]
        fn test_clause_list() {
            assert!(admits(Ecosystem::Python, ">=1.0, <2.0, !=1.5", "1.7"));
            assert!(!admits(Ecosystem::Python, ">=1.0,<2.0", "2.1"));
        }
    }

    mod rust {
        use super::*;

        #[test]
        fn test_bare_is_caret() {
            assert!(admits(Ecosystem::Rust, "1.0", "1.9.0"));
            assert!(!admits(Ecosystem::Rust, "1.0", "2.0.0"));
            assert!(admits(Ecosystem::Rust, "0.4", "0.4.7"));
            assert!(!admits(Ecosystem::Rust, "0.4", "0.5.0"));
        }

        #[test]
        fn test_operators() {
            assert!(admits(Ecosystem::Rust, "=1.2.3", "1.2.3"));
            assert!(!admits(Ecosystem::Rust, "=1.2.3", "1.2.4"));
            assert!(admits(Ecosystem::Rust, "~1.2", "1.2.8"));
            assert!(!admits(Ecosystem::Rust, "~1.2", "1.3.0"));
            assert!(admits(Ecosystem::Rust, ">=1.2, <1.5", "1.4.0"));
            assert!(!admits(Ecosystem::Rust, "<=1.2", "1.3.0"));
            assert!(admits(Ecosystem::Rust, "<=1.2", "1.2.9"));
            assert!(admits(Ecosystem::Rust, "1.*", "1.4.0"));
            assert!(admits(Ecosystem::Rust, "*", "0.1.0"));
        }
    }

    mod dotnet {
        use super::*;

        #[test]
        fn test_interval_and_exact() {
            assert!(admits(Ecosystem::DotNet, "[1.0,2.0)", "1.5.0"));
            assert!(!admits(Ecosystem::DotNet, "[1.0,2.0)", "2.0.0"));
            assert!(admits(Ecosystem::DotNet, "13.0.1", "13.0.1"));
            assert!(!admits(Ecosystem::DotNet, "13.0.1", "13.0.3"));
        }

        #[test]
        fn test_property_reference_is_unparseable() {
            assert!(Requirement::parse(Ecosystem::DotNet, "$(NewtonsoftVersion)").is_none());
        }
    }

    #[test]
    fn test_go_has_no_requirement() {
        assert!(Requirement::parse(Ecosystem::Go, "v1.2.0").is_none());
    }

    #[test]
    fn test_component_at_u64_max_is_unparseable() {
        let max = u64::MAX;
        assert!(Requirement::parse(Ecosystem::Node, &format!("^{max}.0.0")).is_none());
        assert!(Requirement::parse(Ecosystem::Node, &format!("~1.{max}.0")).is_none());
        assert!(Requirement::parse(Ecosystem::Node, &format!("{max}.x")).is_none());
        assert!(Requirement::parse(Ecosystem::Php, &format!("~{max}.1")).is_none());
        assert!(Requirement::parse(Ecosystem::Python, &format!("~={max}.0")).is_none());
        assert!(Requirement::parse(Ecosystem::Rust, &format!("^{max}.0.0")).is_none());
        assert!(Requirement::parse(Ecosystem::Rust, &format!("{max}")).is_none());
    }

    #[test]
    fn test_display() {
        let req = Requirement::parse(Ecosystem::Node, "^1.0.0 || 2.0.0").unwrap();
        assert_eq!(req.to_string(), ">=1.0.0, <2.0.0 || =2.0.0");
    }
}
