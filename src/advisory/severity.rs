//! Severity derivation for advisories
//!
//! Priority: an explicit machine severity, then a CVSS score (numeric or a
//! v3 base vector), then keywords in the advisory text. Anything left over
//! is moderate.

use crate::domain::Severity;
use regex::Regex;
use std::sync::LazyLock;

static SEVERITY_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(critical|high|moderate|medium|low)\b").unwrap()
});

/// Raw severity signals carried by one advisory
#[derive(Debug, Clone, Default)]
pub struct SeverityInput<'a> {
    /// Label such as `HIGH` or `moderate`
    pub label: Option<&'a str>,
    /// CVSS score or vector strings, in the order the source lists them
    pub cvss: Vec<&'a str>,
    /// Title, summary and similar free text
    pub text: Vec<&'a str>,
}

/// Derives the severity of an advisory
pub fn derive_severity(input: &SeverityInput<'_>) -> Severity {
    if let Some(severity) = input.label.and_then(Severity::from_label) {
        return severity;
    }
    if let Some(severity) = input
        .cvss
        .iter()
        .filter_map(|raw| cvss_score(raw))
        .find_map(Severity::from_cvss)
    {
        return severity;
    }
    input
        .text
        .iter()
        .find_map(|text| severity_from_keywords(text))
        .unwrap_or(Severity::Moderate)
}

/// Highest severity word in `text`, matched on whole words only
fn severity_from_keywords(text: &str) -> Option<Severity> {
    let lower = text.to_ascii_lowercase();
    if lower.contains("remote code execution") {
        return Some(Severity::Critical);
    }
    SEVERITY_WORD_RE
        .find_iter(&lower)
        .filter_map(|m| Severity::from_label(m.as_str()))
        .max()
}

/// Numeric CVSS score from a plain number, a vector with a trailing
/// `/score:X.X` component, or a CVSS v3.x base vector
pub fn cvss_score(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if let Ok(score) = raw.parse::<f64>() {
        return (0.0..=10.0).contains(&score).then_some(score);
    }
    let embedded = raw.split('/').find_map(|part| {
        part.to_ascii_lowercase()
            .strip_prefix("score:")
            .and_then(|s| s.parse::<f64>().ok())
    });
    embedded.or_else(|| cvss3_base_score(raw))
}

/// CVSS v3.0/v3.1 base score from a vector string
///
/// `CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H` → 9.8. Returns `None` for
/// other versions or when a base metric is missing.
pub fn cvss3_base_score(vector: &str) -> Option<f64> {
    let mut parts = vector.split('/');
    let version = parts.next()?;
    if !matches!(version, "CVSS:3.0" | "CVSS:3.1") {
        return None;
    }

    let mut av = None;
    let mut ac = None;
    let mut pr = None;
    let mut ui = None;
    let mut scope_changed = None;
    let mut cia = [None; 3];

    for part in parts {
        let (metric, value) = part.split_once(':')?;
        match metric {
            "AV" => av = Some(weight(value, &[("N", 0.85), ("A", 0.62), ("L", 0.55), ("P", 0.2)])?),
            "AC" => ac = Some(weight(value, &[("L", 0.77), ("H", 0.44)])?),
            "PR" => pr = Some(value),
            "UI" => ui = Some(weight(value, &[("N", 0.85), ("R", 0.62)])?),
            "S" => {
                scope_changed = Some(match value {
                    "U" => false,
                    "C" => true,
                    _ => return None,
                })
            }
            "C" | "I" | "A" => {
                let idx = match metric {
                    "C" => 0,
                    "I" => 1,
                    _ => 2,
                };
                cia[idx] = Some(weight(value, &[("H", 0.56), ("L", 0.22), ("N", 0.0)])?);
            }
            // temporal and environmental metrics do not affect the base score
            _ => {}
        }
    }

    let changed = scope_changed?;
    let pr = match (pr?, changed) {
        ("N", _) => 0.85,
        ("L", false) => 0.62,
        ("L", true) => 0.68,
        ("H", false) => 0.27,
        ("H", true) => 0.5,
        _ => return None,
    };
    let [c, i, a] = cia;
    let (c, i, a) = (c?, i?, a?);

    let iss = 1.0 - (1.0 - c) * (1.0 - i) * (1.0 - a);
    let impact = if changed {
        7.52 * (iss - 0.029) - 3.25 * (iss - 0.02).powi(15)
    } else {
        6.42 * iss
    };
    if impact <= 0.0 {
        return Some(0.0);
    }
    let exploitability = 8.22 * av? * ac? * pr * ui?;
    let base = if changed {
        1.08 * (impact + exploitability)
    } else {
        impact + exploitability
    };
    Some(round_up(base.min(10.0)))
}

fn weight(value: &str, table: &[(&str, f64)]) -> Option<f64> {
    table.iter().find(|(k, _)| *k == value).map(|(_, w)| *w)
}

/// CVSS v3.1 "Roundup": smallest one-decimal number >= the input
fn round_up(value: f64) -> f64 {
    let scaled = (value * 100_000.0).round() as i64;
    if scaled % 10_000 == 0 {
        scaled as f64 / 100_000.0
    } else {
        ((scaled / 10_000) + 1) as f64 / 10.0
    }
}
