//! Affected-range membership
//!
//! Every advisory grammar is compiled to [`VersionRange`]s and evaluated by
//! the same comparator used for status classification.

use crate::domain::Ecosystem;
use crate::version::{compare_versions, parse_nuget_interval, Requirement, VersionRange};
use std::cmp::Ordering;
use tracing::warn;

/// What to report when an advisory's range cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnparseablePolicy {
    /// Report the advisory; a false positive is cheaper than a miss
    Affected,
    /// Skip the advisory
    NotAffected,
}

impl UnparseablePolicy {
    fn as_bool(self) -> bool {
        matches!(self, UnparseablePolicy::Affected)
    }
}

/// One OSV range event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeEvent {
    Introduced(String),
    Fixed(String),
    LastAffected(String),
    /// Upper limit on the whole range; does not open or close an interval
    Limit(String),
}

/// An affected-version descriptor in one of the supported grammars
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffectedRange {
    /// OSV `SEMVER`/`ECOSYSTEM` events, evaluated in order
    Events(Vec<RangeEvent>),
    /// Enumerated affected versions
    Versions(Vec<String>),
    /// NuGet interval notation, `[1.0.0, 2.0.0)`
    Interval(String),
    /// Composer constraint list: `,`/space is AND, `|`/`||` is OR
    Constraint(String),
}

/// Why a descriptor could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unparseable(pub String);

impl AffectedRange {
    /// Compiles the descriptor to a union of ranges
    pub fn to_ranges(&self) -> Result<Vec<VersionRange>, Unparseable> {
        match self {
            AffectedRange::Events(events) => events_to_ranges(events),
            AffectedRange::Versions(versions) => Ok(versions
                .iter()
                .filter(|v| is_comparable(v))
                .map(|v| VersionRange::exact(v.as_str()))
                .collect()),
            AffectedRange::Interval(raw) => parse_nuget_interval(raw)
                .map(|r| vec![r])
                .ok_or_else(|| Unparseable(raw.clone())),
            AffectedRange::Constraint(raw) => Requirement::parse(Ecosystem::Php, raw)
                .map(|req| req.alternatives)
                .ok_or_else(|| Unparseable(raw.clone())),
        }
    }

    /// Human-readable description of the affected versions
    pub fn describe(&self) -> String {
        match self {
            AffectedRange::Interval(raw) | AffectedRange::Constraint(raw) => raw.clone(),
            AffectedRange::Versions(versions) => versions.join(", "),
            AffectedRange::Events(_) => match self.to_ranges() {
                Ok(ranges) => ranges
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join(" || "),
                Err(Unparseable(raw)) => raw,
            },
        }
    }

    /// Returns true if `installed` lies in the affected set
    pub fn is_affected(&self, installed: &str, policy: UnparseablePolicy) -> bool {
        match self.to_ranges() {
            Ok(ranges) => ranges.iter().any(|r| r.contains(installed)),
            Err(Unparseable(raw)) => {
                warn!(range = %raw, installed, "unparseable advisory range");
                policy.as_bool()
            }
        }
    }
}

/// Returns true if any descriptor covers `installed`
pub fn any_affected(ranges: &[AffectedRange], installed: &str, policy: UnparseablePolicy) -> bool {
    ranges.iter().any(|r| r.is_affected(installed, policy))
}

/// `0` and anything starting with a digit (after an optional `v`)
fn is_comparable(version: &str) -> bool {
    let v = version.trim();
    let v = v.strip_prefix(['v', 'V']).unwrap_or(v);
    v.starts_with(|c: char| c.is_ascii_digit())
}

/// Walks the event list: `introduced` opens an interval, `fixed` closes it
/// exclusively, `last_affected` closes it inclusively; an interval still
/// open at the end is unbounded above
fn events_to_ranges(events: &[RangeEvent]) -> Result<Vec<VersionRange>, Unparseable> {
    let mut ranges = Vec::new();
    let mut open: Option<VersionRange> = None;
    let mut limit: Option<&str> = None;

    for event in events {
        let version = match event {
            RangeEvent::Introduced(v)
            | RangeEvent::Fixed(v)
            | RangeEvent::LastAffected(v)
            | RangeEvent::Limit(v) => v.as_str(),
        };
        if !is_comparable(version) && version != "*" {
            return Err(Unparseable(version.to_string()));
        }

        match event {
            RangeEvent::Introduced(v) => {
                if let Some(range) = open.take() {
                    ranges.push(range);
                }
                open = Some(if v == "0" {
                    VersionRange::any()
                } else {
                    VersionRange::at_least(v.as_str())
                });
            }
            RangeEvent::Fixed(v) => {
                let start = open.take().unwrap_or_default();
                ranges.push(start.intersect(VersionRange::less_than(v.as_str())));
            }
            RangeEvent::LastAffected(v) => {
                let start = open.take().unwrap_or_default();
                ranges.push(start.intersect(VersionRange::at_most(v.as_str())));
            }
            RangeEvent::Limit(v) => {
                if v != "*" {
                    limit = Some(v.as_str());
                }
            }
        }
    }
    if let Some(range) = open {
        ranges.push(range);
    }

    if let Some(limit) = limit {
        ranges = ranges
            .into_iter()
            .map(|r| r.intersect(VersionRange::less_than(limit)))
            .collect();
    }

    // A range whose lower bound sits above its upper bound is empty
    ranges.retain(|r| match (&r.lower, &r.upper) {
        (Some(l), Some(u)) => compare_versions(&l.version, &u.version) != Ordering::Greater,
        _ => true,
    });
    Ok(ranges)
}
