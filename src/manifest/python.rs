//! Python manifest parser
//!
//! One parser covers the three Python manifest formats, told apart by
//! content:
//! - Pipfile: `[packages]` and `[dev-packages]` tables
//! - pyproject.toml: PEP 621 `project.dependencies` /
//!   `project.optional-dependencies` arrays and Poetry
//!   `tool.poetry.dependencies` / `dev-dependencies` / `group.*.dependencies`
//!   tables (the `python` key is skipped)
//! - requirements.txt: one PEP 508 requirement per line
//!
//! Every format is best-effort: a line or entry that cannot be read is
//! skipped, never fatal. A TOML manifest the `toml` crate rejects is
//! scanned line by line over its dependency sections instead.

use crate::domain::Ecosystem;
use crate::error::ManifestError;
use crate::manifest::{DependencyMap, ManifestParser};
use regex::Regex;
use std::sync::LazyLock;
use toml::{Table, Value};
use tracing::warn;

/// Parser for requirements.txt, Pipfile and pyproject.toml
pub struct PythonManifestParser;

// PEP 508: name, optional [extras], then the version specifier
static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[[^\]]*\])?\s*(.*)$").unwrap()
});

// A TOML table header at the start of a line
static TABLE_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\[[A-Za-z_.\-]+\]\s*$").unwrap());

// Line scanner fallback: `[section]` / `[[section]]` headers and `name = value` entries
static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\[?\s*([^\]]+?)\s*\]\]?\s*(?:#.*)?$").unwrap());
static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^["']?([A-Za-z0-9][A-Za-z0-9._-]*)["']?\s*=\s*(.+?)\s*$"#).unwrap()
});
static INLINE_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bversion\s*=\s*["']([^"']*)["']"#).unwrap());
static INLINE_SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:git|path)\s*=").unwrap());

impl ManifestParser for PythonManifestParser {
    fn parse(&self, content: &str) -> Result<DependencyMap, ManifestError> {
        if !TABLE_HEADER_RE.is_match(content) {
            return Ok(parse_requirements(content));
        }

        match content.parse::<Table>() {
            Ok(toml) if toml.contains_key("packages") || toml.contains_key("dev-packages") => {
                Ok(parse_pipfile(&toml))
            }
            Ok(toml) => Ok(parse_pyproject(&toml)),
            Err(e) => {
                warn!(error = %e.message(), "unreadable Python TOML manifest, scanning lines");
                Ok(scan_dependency_sections(content))
            }
        }
    }

    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }
}

/// Parses a requirements.txt body
///
/// Physical lines ending in `\` are joined before parsing, so hashed
/// requirements from `pip-compile --generate-hashes` keep their entry.
fn parse_requirements(content: &str) -> DependencyMap {
    let mut dependencies = DependencyMap::new();
    let mut logical = String::new();

    for line in content.lines() {
        let line = strip_comment(line).trim_end();
        if let Some(head) = line.strip_suffix('\\') {
            logical.push_str(head);
            logical.push(' ');
            continue;
        }
        logical.push_str(line);
        insert_requirement(&logical, &mut dependencies);
        logical.clear();
    }
    insert_requirement(&logical, &mut dependencies);

    dependencies
}

fn insert_requirement(line: &str, output: &mut DependencyMap) {
    let line = line.trim();
    // Options (-r, -e, -c, --index-url, ...)
    if line.is_empty() || line.starts_with('-') {
        return;
    }
    // Per-requirement options such as `--hash=sha256:...`
    let requirement = line.find(" --").map_or(line, |idx| &line[..idx]);
    if let Some((name, spec)) = parse_pep508(requirement) {
        output.insert(name, spec);
    }
}

/// Splits a PEP 508 requirement into name and version specifier
///
/// Environment markers after `;` are dropped. Direct URL references
/// (`name @ https://...`) are kept verbatim so the registry filter rejects
/// them.
fn parse_pep508(requirement: &str) -> Option<(String, String)> {
    let requirement = requirement.split(';').next()?.trim();
    let caps = REQUIREMENT_RE.captures(requirement)?;
    let name = caps.get(1)?.as_str().to_string();
    let spec = caps.get(2).map_or("", |m| m.as_str()).trim();
    let spec = spec.strip_prefix('@').map_or(spec, str::trim);
    // Parenthesized specifiers: `name (>=1.0)`
    let spec = spec
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(spec)
        .trim();
    Some((name, spec.to_string()))
}

fn strip_comment(line: &str) -> &str {
    match line.find(" #").or_else(|| line.starts_with('#').then_some(0)) {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_pipfile(toml: &Table) -> DependencyMap {
    let mut dependencies = DependencyMap::new();
    for section in ["packages", "dev-packages"] {
        if let Some(deps) = toml.get(section).and_then(Value::as_table) {
            parse_table_dependencies(deps, &mut dependencies);
        }
    }
    dependencies
}

fn parse_pyproject(toml: &Table) -> DependencyMap {
    let mut dependencies = DependencyMap::new();

    let project = toml.get("project");
    if let Some(deps) = project
        .and_then(|p| p.get("dependencies"))
        .and_then(Value::as_array)
    {
        parse_array_dependencies(deps, &mut dependencies);
    }
    if let Some(groups) = project
        .and_then(|p| p.get("optional-dependencies"))
        .and_then(Value::as_table)
    {
        for deps in groups.values().filter_map(Value::as_array) {
            parse_array_dependencies(deps, &mut dependencies);
        }
    }

    let poetry = toml.get("tool").and_then(|t| t.get("poetry"));
    for section in ["dependencies", "dev-dependencies"] {
        if let Some(deps) = poetry.and_then(|p| p.get(section)).and_then(Value::as_table) {
            parse_table_dependencies(deps, &mut dependencies);
        }
    }
    if let Some(groups) = poetry.and_then(|p| p.get("group")).and_then(Value::as_table) {
        for group in groups.values() {
            if let Some(deps) = group.get("dependencies").and_then(Value::as_table) {
                parse_table_dependencies(deps, &mut dependencies);
            }
        }
    }

    dependencies
}

fn parse_array_dependencies(deps: &[Value], output: &mut DependencyMap) {
    for requirement in deps.iter().filter_map(Value::as_str) {
        if let Some((name, spec)) = parse_pep508(requirement) {
            output.insert(name, spec);
        }
    }
}

/// Pipfile / Poetry tables: `name = "spec"` or `name = { version = "spec", ... }`
fn parse_table_dependencies(deps: &Table, output: &mut DependencyMap) {
    for (name, value) in deps {
        if name.eq_ignore_ascii_case("python") {
            continue;
        }
        let spec = match value {
            Value::String(spec) => Some(spec.as_str()),
            Value::Table(table) if !table.contains_key("git") && !table.contains_key("path") => {
                table.get("version").and_then(Value::as_str)
            }
            _ => None,
        };
        if let Some(spec) = spec {
            output.insert(name.clone(), spec.to_string());
        }
    }
}

/// Recovers entries from a TOML manifest that does not parse as a whole
///
/// Only Pipfile `packages` / `dev-packages` and Poetry dependency sections
/// are read. Lines that do not look like `name = "spec"` or
/// `name = { version = "spec" }` are skipped.
fn scan_dependency_sections(content: &str) -> DependencyMap {
    let mut dependencies = DependencyMap::new();
    let mut active = false;

    for line in content.lines() {
        let line = line.trim();
        if let Some(caps) = SECTION_RE.captures(line) {
            active = is_dependency_section(&caps[1].replace(['"', '\''], ""));
            continue;
        }
        if !active {
            continue;
        }
        let Some(caps) = ENTRY_RE.captures(line) else {
            continue;
        };
        let name = &caps[1];
        if name.eq_ignore_ascii_case("python") {
            continue;
        }
        if let Some(spec) = scan_value(&caps[2]) {
            dependencies.insert(name.to_string(), spec.to_string());
        }
    }

    dependencies
}

fn is_dependency_section(name: &str) -> bool {
    match name {
        "packages" | "dev-packages" | "tool.poetry.dependencies" | "tool.poetry.dev-dependencies" => {
            true
        }
        _ => name
            .strip_prefix("tool.poetry.group.")
            .and_then(|rest| rest.strip_suffix(".dependencies"))
            .is_some_and(|group| !group.is_empty() && !group.contains('.')),
    }
}

/// Specifier from a quoted string or an inline table's `version` key
fn scan_value(value: &str) -> Option<&str> {
    if value.starts_with('{') {
        if INLINE_SOURCE_RE.is_match(value) {
            return None;
        }
        return INLINE_VERSION_RE.captures(value)?.get(1).map(|m| m.as_str());
    }
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &value[1..];
    rest.find(quote).map(|end| &rest[..end])
}
