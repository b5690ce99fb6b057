//! Ecosystem-agnostic version ordering
//!
//! Versions are split on `.`, `-` and `_`, and each segment is further split
//! at digit/letter boundaries so that `1.0.0a1`, `1.0.0-a.1` and `1.0.0-a1`
//! tokenize the same way. Tokens are then compared positionally:
//! - two numbers compare numerically
//! - a number sorts above any tag
//! - two tags compare by the fixed pre-release ladder
//!   (`dev < alpha < beta < rc/pre < unrecognized`), then lexically
//! - a missing token counts as `0` against a number, sorts above a
//!   pre-release tag and below a post-release tag

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Digits with leading zeros removed ("0" for all-zero)
    Num(String),
    /// Lowercased alphabetic tag
    Tag(String),
}

/// Position of a tag on the pre-release ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TagClass {
    Dev,
    Alpha,
    Beta,
    Candidate,
    Unknown,
    Post,
}

fn tag_class(tag: &str) -> TagClass {
    match tag {
        "dev" | "snapshot" | "nightly" => TagClass::Dev,
        "a" | "alpha" => TagClass::Alpha,
        "b" | "beta" => TagClass::Beta,
        "c" | "rc" | "pre" | "preview" => TagClass::Candidate,
        "post" | "patch" | "pl" | "p" | "r" | "rev" => TagClass::Post,
        _ => TagClass::Unknown,
    }
}

/// Removes a leading `v`/`V` in front of a digit and any `+build` metadata
pub fn strip_version_noise(version: &str) -> &str {
    let trimmed = version.trim();
    let trimmed = match trimmed.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => trimmed,
    };
    match trimmed.find('+') {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    }
}

fn tokenize(version: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for segment in strip_version_noise(version).split(['.', '-', '_']) {
        let mut current = String::new();
        let mut current_is_digit = false;

        for ch in segment.chars() {
            let is_digit = ch.is_ascii_digit();
            if !current.is_empty() && is_digit != current_is_digit {
                tokens.push(make_token(&current, current_is_digit));
                current.clear();
            }
            current_is_digit = is_digit;
            current.push(ch);
        }
        if !current.is_empty() {
            tokens.push(make_token(&current, current_is_digit));
        }
    }

    tokens
}

fn make_token(raw: &str, is_digit: bool) -> Token {
    if is_digit {
        let trimmed = raw.trim_start_matches('0');
        Token::Num(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
    } else {
        Token::Tag(raw.to_ascii_lowercase())
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_tokens(a: &Token, b: &Token) -> Ordering {
    match (a, b) {
        (Token::Num(x), Token::Num(y)) => compare_numeric(x, y),
        (Token::Num(_), Token::Tag(_)) => Ordering::Greater,
        (Token::Tag(_), Token::Num(_)) => Ordering::Less,
        (Token::Tag(x), Token::Tag(y)) => tag_class(x)
            .cmp(&tag_class(y))
            .then_with(|| x.cmp(y)),
    }
}

/// Compares a token against a position the other version does not have
fn compare_to_missing(token: &Token) -> Ordering {
    match token {
        Token::Num(n) => compare_numeric(n, "0"),
        Token::Tag(tag) if tag_class(tag) == TagClass::Post => Ordering::Greater,
        Token::Tag(_) => Ordering::Less,
    }
}

/// Compare two version strings
///
/// Returns `Less` if `a` is older than `b`. Leading `v` prefixes and build
/// metadata are ignored, and trailing zero segments are insignificant
/// (`1.0` equals `1.0.0`).
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    let len = tokens_a.len().max(tokens_b.len());

    for i in 0..len {
        let ordering = match (tokens_a.get(i), tokens_b.get(i)) {
            (Some(x), Some(y)) => compare_tokens(x, y),
            (Some(x), None) => compare_to_missing(x),
            (None, Some(y)) => compare_to_missing(y).reverse(),
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Leading major version number, if the version starts with one
pub fn major_version(version: &str) -> Option<u64> {
    match tokenize(version).first() {
        Some(Token::Num(n)) => n.parse().ok(),
        _ => None,
    }
}

/// Returns true if the version carries a pre-release tag (alpha, beta, rc, dev, ...)
pub fn is_prerelease_version(version: &str) -> bool {
    tokenize(version)
        .iter()
        .any(|t| matches!(t, Token::Tag(tag) if tag_class(tag) != TagClass::Post))
}

/// Leading numeric segments of a version (`1.2.3-rc1` → `[1, 2, 3]`)
pub fn numeric_parts(version: &str) -> Vec<u64> {
    let release = strip_version_noise(version);
    let release = release.split('-').next().unwrap_or(release);
    let mut parts = Vec::new();

    for segment in release.split('.') {
        let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<u64>() {
            Ok(n) => parts.push(n),
            Err(_) => break,
        }
        if digits.len() < segment.len() {
            break;
        }
    }

    parts
}
