//! Core domain models for depstat
//!
//! This module contains the fundamental types used throughout the engine:
//! - Ecosystem types for supported package registries
//! - Normalized version specifiers
//! - Dependency entries and status results
//! - Vulnerability matches

mod advisory;
mod dependency;
mod ecosystem;
mod version_spec;

pub use advisory::{PackageVulnerabilities, Severity, VulnerabilityMatch};
pub use dependency::{DependencyEntry, DependencyResult, DependencyStatus};
pub use ecosystem::Ecosystem;
pub use version_spec::{ParsedVersion, VersionSpecKind};
