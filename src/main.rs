//! depstat - dependency status and vulnerability checker CLI tool
//!
//! Reads one manifest, resolves every dependency against its public
//! registry and reports which are behind a major version, outdated or
//! current. With `--vulns` the declared versions are also matched against
//! the ecosystem's advisory database.

use anyhow::Context;
use clap::Parser;
use depstat::cli::CliArgs;
use depstat::config::AnalyzerConfig;
use depstat::manifest::load_manifest;
use depstat::orchestrator::Orchestrator;
use depstat::output::{create_formatter, AnalysisReport};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let config = AnalyzerConfig::load_or_default(args.config.as_deref())?;
    let manifest = load_manifest(&args.path, args.ecosystem)?;
    let ecosystem = manifest.info.ecosystem;

    if args.verbose {
        eprintln!("depstat v{}", env!("CARGO_PKG_VERSION"));
        eprintln!(
            "Manifest: {} ({})",
            manifest.info.path.display(),
            ecosystem.display_name()
        );
    }

    let filter = args.package_filter();
    let orchestrator = Orchestrator::new(config)?.with_progress(args.show_progress());

    let dependencies = orchestrator
        .analyze_filtered(&manifest.content, ecosystem, &filter)
        .await?;

    let vulnerabilities = if args.vulns {
        let checked = orchestrator
            .audit(&manifest.content, ecosystem, &filter)
            .await
            .context("vulnerability check failed")?;
        Some(checked)
    } else {
        None
    };

    let report = AnalysisReport {
        path: manifest.info.path,
        ecosystem,
        dependencies,
        vulnerabilities,
    };

    let formatter = create_formatter(args.output_config());
    let mut stdout = io::stdout().lock();
    formatter.format(&report, &mut stdout)?;
    stdout.flush()?;

    Ok(ExitCode::SUCCESS)
}
