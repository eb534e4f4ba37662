//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - An isolated home directory, catalog and destination per test
//! - Kubeconfig fixtures written as local sources
//! - Command builder helpers for common patterns

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with an isolated home directory.
///
/// `HOME` points into the temporary directory, so the default destination
/// (`~/.kube/config`) and `~/.ssh/config` never touch the real user files.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory, also used as `HOME`
    pub temp_path: PathBuf,
    /// Catalog file passed with `--config`
    pub catalog: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        let catalog = temp_path.join("kubegather.yaml");

        Self {
            temp_dir,
            temp_path,
            catalog,
        }
    }

    /// Get a bare command builder with an isolated environment but no flags.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("kubegather").expect("Failed to find kubegather binary");
        cmd.env("HOME", &self.temp_path)
            .env_remove("KUBEGATHER_CONFIG")
            .env_remove("KUBEGATHER_PERSISTENT")
            .env_remove("KUBEGATHER_LOG_MODE")
            .env_remove("KUBEGATHER_OUTPUT_FORMAT")
            .current_dir(&self.temp_path);
        cmd
    }

    /// Get a command builder with `--config` pointing at this environment's
    /// catalog.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--config").arg(&self.catalog);
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Default destination under the isolated home.
    pub fn destination(&self) -> PathBuf {
        self.temp_path.join(".kube").join("config")
    }

    /// Write a single-context kubeconfig named `file` and return its path.
    pub fn write_source(&self, file: &str, context: &str, server: &str) -> PathBuf {
        let path = self.temp_path.join(file);
        std::fs::write(&path, kubeconfig(context, server)).expect("Failed to write source");
        path
    }

    /// Read the destination as text.
    pub fn destination_text(&self) -> String {
        std::fs::read_to_string(self.destination()).expect("Failed to read destination")
    }

    /// Run `get` for a local source under `label`.
    pub fn get(&self, source: &Path, label: &str) {
        self.command()
            .arg("get")
            .arg(source)
            .arg("--label")
            .arg(label)
            .assert()
            .success();
    }

    /// Run `list` with the given format and return stdout.
    pub fn list(&self, format: &str) -> String {
        let output = self
            .command()
            .arg("list")
            .arg("--format")
            .arg(format)
            .output()
            .expect("Failed to run list command");

        assert!(
            output.status.success(),
            "List failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        String::from_utf8(output.stdout).expect("Invalid UTF-8 in output")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// A kubeconfig whose current context `context` uses cluster `c1` and user
/// `u1`.
pub fn kubeconfig(context: &str, server: &str) -> String {
    format!(
        "apiVersion: v1
kind: Config
current-context: {context}
clusters:
- name: c1
  cluster:
    server: {server}
    certificate-authority-data: Q0FEQVRB
contexts:
- name: {context}
  context:
    cluster: c1
    user: u1
users:
- name: u1
  user:
    token: secret
"
    )
}
