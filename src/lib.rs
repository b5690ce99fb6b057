//! depstat - dependency status and vulnerability checker library
//!
//! This library reads a dependency manifest, resolves each declared
//! dependency against its ecosystem's public registry and classifies it as
//! behind a major version, outdated or current. It can also match the
//! declared versions against published security advisories. Supported
//! ecosystems:
//! - Node.js (package.json)
//! - Python (requirements.txt, Pipfile, pyproject.toml)
//! - Go (go.mod)
//! - PHP (composer.json)
//! - Rust (Cargo.toml)
//! - .NET (*.csproj, Directory.Packages.props)

pub mod advisory;
pub mod classify;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ecosystem;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod parser;
pub mod progress;
pub mod registry;
pub mod version;
