// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! External build and validation commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, info};

/// Captured result of one external command
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    /// The command line that ran
    pub command: String,
    /// Exit code, `None` if killed by a signal
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Wall-clock duration
    pub duration_ms: u64,
}

impl ScriptOutput {
    /// Whether the command exited zero
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Short failure description: exit code plus the tail of stderr (or stdout)
    #[must_use]
    pub fn failure_summary(&self) -> String {
        let code = self
            .code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let tail: Vec<&str> = text.lines().rev().take(5).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        if tail.is_empty() {
            format!("`{}` exited with {}", self.command, code)
        } else {
            format!("`{}` exited with {}: {}", self.command, code, tail.join(" | "))
        }
    }

    /// Lines of output mentioning warnings
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .filter(|l| l.to_lowercase().contains("warn"))
            .map(|l| l.trim().to_string())
            .collect()
    }
}

/// Runs configured shell commands in a working directory
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    cwd: PathBuf,
    env: Vec<(String, String)>,
}

impl ScriptRunner {
    /// Runner executing in `cwd`
    #[must_use]
    pub fn new(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            env: Vec::new(),
        }
    }

    /// Add an environment variable for every command
    #[must_use]
    pub fn with_env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }

    /// Run `command` through the platform shell, capturing its output.
    ///
    /// Returns `Ok(None)` when the command is empty (nothing configured).
    /// Spawn failures are errors; a non-zero exit is reported in the output.
    pub fn run(&self, command: &str) -> Result<Option<ScriptOutput>> {
        let command = command.trim();
        if command.is_empty() {
            debug!("No command configured, skipping");
            return Ok(None);
        }

        info!("Running `{}`", command);
        let started = Instant::now();

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.current_dir(&self.cwd);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to spawn `{command}`"))?;

        let result = ScriptOutput {
            command: command.to_string(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        debug!("`{}` exited with {:?} in {}ms", command, result.code, result.duration_ms);

        Ok(Some(result))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_command_skipped() {
        let dir = TempDir::new().unwrap();
        assert!(ScriptRunner::new(dir.path()).run("  ").unwrap().is_none());
    }

    #[test]
    fn test_captures_output_and_env() {
        let dir = TempDir::new().unwrap();
        let out = ScriptRunner::new(dir.path())
            .with_env("TOKENYARD_TEST_VAR", "hello")
            .run("echo $TOKENYARD_TEST_VAR; echo 'warning: slow' >&2")
            .unwrap()
            .unwrap();

        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.warnings(), vec!["warning: slow".to_string()]);
    }

    #[test]
    fn test_non_zero_exit_reported() {
        let dir = TempDir::new().unwrap();
        let out = ScriptRunner::new(dir.path())
            .run("echo broken >&2; exit 3")
            .unwrap()
            .unwrap();

        assert!(!out.success());
        assert_eq!(out.code, Some(3));
        assert!(out.failure_summary().contains("broken"));
    }
}
