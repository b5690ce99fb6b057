//! Post-parse filtering of specifiers that cannot be resolved from a registry
//!
//! Applies to every ecosystem after manifest parsing. A rejected entry is
//! logged and dropped, never surfaced as an error.

use super::DependencyMap;
use crate::domain::{DependencyEntry, Ecosystem};
use crate::error::SpecifierError;
use tracing::debug;

const NON_REGISTRY_PREFIXES: &[&str] = &[
    "file:",
    "link:",
    "portal:",
    "workspace:",
    "git:",
    "git+",
    "github:",
    "gitlab:",
    "bitbucket:",
    "npm:",
    "./",
    "../",
    "/",
    "~/",
];

const TAG_ALIASES: &[&str] = &["latest", "next", "*", "x", "X", "stable", "canary", "beta"];

/// Checks whether a specifier can be resolved from the ecosystem's registry
pub fn check_specifier(
    ecosystem: Ecosystem,
    spec: &str,
    max_len: usize,
) -> Result<(), SpecifierError> {
    let trimmed = spec.trim();

    if trimmed.is_empty() {
        return Err(SpecifierError::Empty);
    }
    if trimmed.len() > max_len {
        return Err(SpecifierError::TooLong { limit: max_len });
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.contains("://")
        || lower.contains("$(")
        || NON_REGISTRY_PREFIXES.iter().any(|p| lower.starts_with(p))
    {
        return Err(SpecifierError::NonRegistrySource {
            spec: trimmed.to_string(),
        });
    }

    if TAG_ALIASES.contains(&trimmed) || is_branch_reference(ecosystem, &lower) {
        return Err(SpecifierError::TagAlias {
            spec: trimmed.to_string(),
        });
    }

    // GitHub shorthand `user/repo` or `user/repo#ref`
    if ecosystem == Ecosystem::Node && !trimmed.starts_with('@') && trimmed.contains('/') {
        return Err(SpecifierError::NonRegistrySource {
            spec: trimmed.to_string(),
        });
    }

    if !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return Err(SpecifierError::TagAlias {
            spec: trimmed.to_string(),
        });
    }

    Ok(())
}

/// Composer branch constraints: `dev-main`, `1.x-dev`, `dev-feature as 1.0`
fn is_branch_reference(ecosystem: Ecosystem, lower: &str) -> bool {
    ecosystem == Ecosystem::Php
        && lower
            .split(['|', ',', ' '])
            .any(|part| part.starts_with("dev-") || part.ends_with("-dev"))
}

/// Turns a parsed manifest into registry-resolvable entries
pub fn registry_entries(
    ecosystem: Ecosystem,
    dependencies: &DependencyMap,
    max_len: usize,
) -> Vec<DependencyEntry> {
    dependencies
        .iter()
        .filter_map(|(name, spec)| match check_specifier(ecosystem, spec, max_len) {
            Ok(()) => Some(DependencyEntry::new(name.clone(), spec.trim())),
            Err(reason) => {
                debug!(package = %name, %reason, "skipping dependency");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(ecosystem: Ecosystem, spec: &str) -> Result<(), SpecifierError> {
        check_specifier(ecosystem, spec, 100)
    }

    #[test]
    fn test_accepts_registry_versions() {
        assert!(check(Ecosystem::Node, "^1.2.3").is_ok());
        assert!(check(Ecosystem::Python, ">=1.0,<2.0").is_ok());
        assert!(check(Ecosystem::Go, "v1.2.0").is_ok());
        assert!(check(Ecosystem::DotNet, "[1.0,2.0)").is_ok());
        assert!(check(Ecosystem::Php, "^8.1").is_ok());
    }

    #[test]
    fn test_rejects_local_and_vcs_sources() {
        for spec in [
            "file:../local",
            "link:./pkg",
            "workspace:*",
            "git+https://github.com/a/b.git",
            "github:user/repo",
            "https://example.com/pkg.tgz",
            "../sibling",
            "npm:other-package@1.0.0",
        ] {
            assert!(
                matches!(
                    check(Ecosystem::Node, spec),
                    Err(SpecifierError::NonRegistrySource { .. })
                ),
                "{spec}"
            );
        }
    }

    #[test]
    fn test_rejects_github_shorthand() {
        assert!(check(Ecosystem::Node, "expressjs/express#4.18.2").is_err());
    }

    #[test]
    fn test_rejects_tag_aliases() {
        for spec in ["latest", "next", "*", "x"] {
            assert!(
                matches!(
                    check(Ecosystem::Node, spec),
                    Err(SpecifierError::TagAlias { .. })
                ),
                "{spec}"
            );
        }
    }

    #[test]
    fn test_rejects_composer_branches() {
        assert!(check(Ecosystem::Php, "dev-main").is_err());
        assert!(check(Ecosystem::Php, "2.x-dev").is_err());
        assert!(check(Ecosystem::Php, "^1.0 || dev-master").is_err());
    }

    #[test]
    fn test_rejects_msbuild_property() {
        assert!(matches!(
            check(Ecosystem::DotNet, "$(NewtonsoftVersion)"),
            Err(SpecifierError::NonRegistrySource { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_long() {
        assert_eq!(check(Ecosystem::Node, "  "), Err(SpecifierError::Empty));
        let long = format!("^{}", "1".repeat(120));
        assert_eq!(
            check(Ecosystem::Node, &long),
            Err(SpecifierError::TooLong { limit: 100 })
        );
    }

    #[test]
    fn test_rejects_text_without_digits() {
        assert!(check(Ecosystem::Php, "stable-branch").is_err());
    }

    #[test]
    fn test_registry_entries_drops_unresolvable() {
        let mut deps = DependencyMap::new();
        deps.insert("left-pad".to_string(), "1.3.0".to_string());
        deps.insert("local".to_string(), "file:../local".to_string());
        deps.insert("edge".to_string(), "latest".to_string());

        let entries = registry_entries(Ecosystem::Node, &deps, 100);
        assert_eq!(entries, vec![DependencyEntry::new("left-pad", "1.3.0")]);
    }
}
