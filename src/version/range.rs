//! Lower/upper bound value type shared by every range grammar
//!
//! SemVer ranges, Composer constraint lists, PEP 440 specifier sets and NuGet
//! interval notation all compile down to a [`VersionRange`], so membership is
//! decided in exactly one place.

use super::compare::compare_versions;
use std::cmp::Ordering;
use std::fmt;

/// One end of a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: String,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            inclusive: true,
        }
    }

    pub fn exclusive(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            inclusive: false,
        }
    }
}

/// A contiguous set of versions; a missing bound is unbounded on that side
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl VersionRange {
    /// Every version
    pub fn any() -> Self {
        Self::default()
    }

    /// `>= version`
    pub fn at_least(version: impl Into<String>) -> Self {
        Self {
            lower: Some(Bound::inclusive(version)),
            upper: None,
        }
    }

    /// `> version`
    pub fn greater_than(version: impl Into<String>) -> Self {
        Self {
            lower: Some(Bound::exclusive(version)),
            upper: None,
        }
    }

    /// `<= version`
    pub fn at_most(version: impl Into<String>) -> Self {
        Self {
            lower: None,
            upper: Some(Bound::inclusive(version)),
        }
    }

    /// `< version`
    pub fn less_than(version: impl Into<String>) -> Self {
        Self {
            lower: None,
            upper: Some(Bound::exclusive(version)),
        }
    }

    /// Exactly one version
    pub fn exact(version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            lower: Some(Bound::inclusive(version.clone())),
            upper: Some(Bound::inclusive(version)),
        }
    }

    /// Half-open `[lower, upper)`
    pub fn between(lower: impl Into<String>, upper: impl Into<String>) -> Self {
        Self {
            lower: Some(Bound::inclusive(lower)),
            upper: Some(Bound::exclusive(upper)),
        }
    }

    /// Returns true if `version` lies within both bounds
    pub fn contains(&self, version: &str) -> bool {
        let above_lower = match &self.lower {
            None => true,
            Some(bound) => match compare_versions(version, &bound.version) {
                Ordering::Greater => true,
                Ordering::Equal => bound.inclusive,
                Ordering::Less => false,
            },
        };
        let below_upper = match &self.upper {
            None => true,
            Some(bound) => match compare_versions(version, &bound.version) {
                Ordering::Less => true,
                Ordering::Equal => bound.inclusive,
                Ordering::Greater => false,
            },
        };
        above_lower && below_upper
    }

    /// Narrows this range by another (logical AND of two clauses)
    pub fn intersect(self, other: VersionRange) -> VersionRange {
        VersionRange {
            lower: tighter(self.lower, other.lower, Ordering::Greater),
            upper: tighter(self.upper, other.upper, Ordering::Less),
        }
    }
}

/// Picks the more restrictive of two bounds; `prefer` is the ordering that
/// makes a bound tighter (`Greater` for lower bounds, `Less` for upper)
fn tighter(a: Option<Bound>, b: Option<Bound>, prefer: Ordering) -> Option<Bound> {
    match (a, b) {
        (None, other) | (other, None) => other,
        (Some(a), Some(b)) => match compare_versions(&a.version, &b.version) {
            Ordering::Equal => Some(Bound {
                inclusive: a.inclusive && b.inclusive,
                version: a.version,
            }),
            ord if ord == prefer => Some(a),
            _ => Some(b),
        },
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.lower, &self.upper) {
            (None, None) => f.write_str("*"),
            (Some(l), Some(u)) if l.inclusive && u.inclusive && l.version == u.version => {
                write!(f, "={}", l.version)
            }
            (lower, upper) => {
                let mut parts = Vec::new();
                if let Some(l) = lower {
                    parts.push(format!("{}{}", if l.inclusive { ">=" } else { ">" }, l.version));
                }
                if let Some(u) = upper {
                    parts.push(format!("{}{}", if u.inclusive { "<=" } else { "<" }, u.version));
                }
                f.write_str(&parts.join(", "))
            }
        }
    }
}

/// Parses NuGet interval notation
///
/// `[1.0,2.0)`, `(,1.0]`, `[1.0,)` and the exact form `[1.0]`. Returns `None`
/// for anything that is not a well-formed interval.
pub fn parse_nuget_interval(input: &str) -> Option<VersionRange> {
    let s = input.trim();
    let lower_inclusive = match s.chars().next()? {
        '[' => true,
        '(' => false,
        _ => return None,
    };
    let upper_inclusive = match s.chars().last()? {
        ']' => true,
        ')' => false,
        _ => return None,
    };
    if s.len() < 2 {
        return None;
    }
    let inner = s[1..s.len() - 1].trim();

    let Some((low, high)) = inner.split_once(',') else {
        // `[1.0]` is the only legal single-version interval
        if lower_inclusive && upper_inclusive && is_version_like(inner) {
            return Some(VersionRange::exact(inner));
        }
        return None;
    };

    let (low, high) = (low.trim(), high.trim());
    if high.contains(',') || (low.is_empty() && high.is_empty()) {
        return None;
    }
    if (!low.is_empty() && !is_version_like(low)) || (!high.is_empty() && !is_version_like(high))
    {
        return None;
    }

    Some(VersionRange {
        lower: (!low.is_empty()).then(|| Bound {
            version: low.to_string(),
            inclusive: lower_inclusive,
        }),
        upper: (!high.is_empty()).then(|| Bound {
            version: high.to_string(),
            inclusive: upper_inclusive,
        }),
    })
}

fn is_version_like(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_'))
}
