//! End-to-end tests for the depstat CLI
//!
//! These tests verify:
//! - Exit codes and error messages for unusable input
//! - Text and JSON output against a mock registry configured through
//!   `--config`
//! - Package filters and the vulnerability check

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn depstat() -> Command {
    let mut cmd = Command::cargo_bin("depstat").expect("binary should be built");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Create a test directory with a package.json
fn create_node_project(manifest: &str) -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    fs::write(temp_dir.path().join("package.json"), manifest).unwrap();
    temp_dir
}

/// Write a config file pointing every registry at `base_url`
fn write_config(dir: &Path, base_url: &str) -> PathBuf {
    let path = dir.join("depstat.toml");
    fs::write(
        &path,
        format!(
            "[http]\nmax_retries = 0\ntimeout_secs = 5\n\n[registries]\nnpm = \"{base_url}\"\nosv = \"{base_url}\"\n"
        ),
    )
    .unwrap();
    path
}

mod exit_code_tests {
    use super::*;

    #[test]
    fn test_help() {
        depstat()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("depstat").and(predicate::str::contains("--vulns")));
    }

    #[test]
    fn test_version() {
        depstat()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_empty_dependencies_fail() {
        let project = create_node_project(r#"{"name": "empty", "dependencies": {}}"#);
        depstat()
            .arg(project.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("no dependencies could be processed"));
    }

    #[test]
    fn test_only_non_registry_sources_fail() {
        let project = create_node_project(
            r#"{"dependencies": {"local": "file:../local", "fork": "github:me/fork", "next": "latest"}}"#,
        );
        depstat()
            .arg(project.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("no dependencies could be processed"));
    }

    #[test]
    fn test_invalid_json_fails() {
        let project = create_node_project("{ \"dependencies\": ");
        depstat()
            .arg(project.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to parse JSON"));
    }

    #[test]
    fn test_directory_without_manifest_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        depstat()
            .arg(temp_dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("unsupported manifest format"));
    }

    #[test]
    fn test_unknown_ecosystem_rejected() {
        depstat()
            .args(["--ecosystem", "cobol"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown ecosystem"));
    }

    #[test]
    fn test_invalid_config_fails() {
        let project = create_node_project(r#"{"dependencies": {"lodash": "4.17.20"}}"#);
        let config = project.path().join("bad.toml");
        fs::write(&config, "[http\ntimeout_secs = ").unwrap();

        depstat()
            .arg(project.path())
            .arg("--config")
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }
}

mod mock_registry_tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    const MANIFEST: &str = r#"{
  "dependencies": {"left-pad": "1.3.0", "lodash": "4.17.20"},
  "devDependencies": {"react": "^17.0.2"}
}"#;

    fn mock_packages(server: &mut ServerGuard) {
        server
            .mock("GET", "/react")
            .with_status(200)
            .with_body(r#"{"dist-tags": {"latest": "18.3.1"}, "versions": {"17.0.2": {}, "18.3.1": {}}}"#)
            .create();
        server
            .mock("GET", "/lodash")
            .with_status(200)
            .with_body(
                r#"{"dist-tags": {"latest": "4.17.21"}, "license": "MIT", "versions": {"4.17.20": {}, "4.17.21": {}}}"#,
            )
            .create();
        server
            .mock("GET", "/left-pad")
            .with_status(200)
            .with_body(r#"{"dist-tags": {"latest": "1.3.0"}, "versions": {"1.3.0": {}}}"#)
            .create();
    }

    #[test]
    fn test_text_output() {
        let mut server = Server::new();
        mock_packages(&mut server);
        let project = create_node_project(MANIFEST);
        let config = write_config(project.path(), &server.url());

        depstat()
            .arg(project.path())
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stdout(
                predicate::str::contains("Major updates available (1):")
                    .and(predicate::str::contains("react"))
                    .and(predicate::str::contains("Outdated (1):"))
                    .and(predicate::str::contains("1 major, 1 outdated, 1 current")),
            );
    }

    #[test]
    fn test_json_output_schema() {
        let mut server = Server::new();
        mock_packages(&mut server);
        let project = create_node_project(MANIFEST);
        let config = write_config(project.path(), &server.url());

        let output = depstat()
            .arg(project.path())
            .arg("--config")
            .arg(&config)
            .arg("--json")
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["ecosystem"], "node");
        assert_eq!(json["summary"]["total"], 3);

        let names: Vec<_> = json["dependencies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["react", "lodash", "left-pad"]);
        assert_eq!(json["dependencies"][1]["status"], "outdated");
        assert_eq!(json["dependencies"][1]["license"], "MIT");
        assert!(json.get("vulnerabilities").is_none());
    }

    #[test]
    fn test_exclude_package() {
        let mut server = Server::new();
        mock_packages(&mut server);
        let project = create_node_project(MANIFEST);
        let config = write_config(project.path(), &server.url());

        depstat()
            .arg(project.path())
            .arg("--config")
            .arg(&config)
            .args(["--exclude", "react", "--quiet"])
            .assert()
            .success()
            .stdout("0 major, 1 outdated, 1 current\n");
    }

    #[test]
    fn test_vulnerability_check() {
        let mut server = Server::new();
        mock_packages(&mut server);
        server
            .mock("POST", "/v1/query")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "package": {"name": "lodash", "ecosystem": "npm"}
            })))
            .with_status(200)
            .with_body(
                r#"{"vulns": [{"id": "GHSA-35jh-r3h4-6jhm", "summary": "Command Injection in lodash",
                    "aliases": ["CVE-2021-23337"],
                    "database_specific": {"severity": "HIGH"},
                    "affected": [{"package": {"name": "lodash", "ecosystem": "npm"},
                        "ranges": [{"type": "SEMVER", "events": [{"introduced": "0"}, {"fixed": "4.17.21"}]}]}]}]}"#,
            )
            .create();
        for clean in ["react", "left-pad"] {
            server
                .mock("POST", "/v1/query")
                .match_body(Matcher::PartialJson(serde_json::json!({
                    "package": {"name": clean}
                })))
                .with_status(200)
                .with_body("{}")
                .create();
        }
        let project = create_node_project(MANIFEST);
        let config = write_config(project.path(), &server.url());

        depstat()
            .arg(project.path())
            .arg("--config")
            .arg(&config)
            .arg("--vulns")
            .assert()
            .success()
            .stdout(
                predicate::str::contains("Vulnerabilities (1):")
                    .and(predicate::str::contains("GHSA-35jh-r3h4-6jhm"))
                    .and(predicate::str::contains("CVE-2021-23337"))
                    .and(predicate::str::contains("1 vulnerable package(s)")),
            );
    }
}
