//! CLI argument parsing module for depstat

use crate::classify::PackageFilter;
use crate::domain::Ecosystem;
use crate::output::OutputConfig;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Dependency status and vulnerability checker
#[derive(Parser, Debug, Clone)]
#[command(
    name = "depstat",
    version,
    about = "Check a manifest's dependencies against their registries and advisory databases"
)]
pub struct CliArgs {
    /// Manifest file or directory containing one (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Ecosystem of the manifest, overriding detection from the file name
    /// (node, python, go, php, rust, dotnet)
    #[arg(short, long)]
    pub ecosystem: Option<Ecosystem>,

    /// Also check installed versions against known vulnerabilities
    #[arg(long)]
    pub vulns: bool,

    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    // Package filters
    /// Exclude specific packages (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Check only specific packages (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub only: Vec<String>,

    // Output options
    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output, including up-to-date packages and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable quiet mode - summary only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl CliArgs {
    /// Build the package filter from `--only` / `--exclude`
    pub fn package_filter(&self) -> PackageFilter {
        PackageFilter::new()
            .with_only(self.only.clone())
            .with_exclude(self.exclude.clone())
    }

    pub fn output_config(&self) -> OutputConfig {
        OutputConfig::from_cli(self.json, self.verbose, self.quiet)
    }

    /// Progress bars go to stderr and would only clutter quiet or JSON runs
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
