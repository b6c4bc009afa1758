// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod activate;
pub mod check_breaking;
pub mod completions;
pub mod config;
pub mod create;
pub mod diff;
pub mod info;
pub mod init;
pub mod list;
pub mod prompt;

use crate::config::Config;
use crate::runner::ScriptRunner;
use crate::store::VersionStore;
use crate::types::{BreakingChange, Impact};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Absolute token root
    pub root: PathBuf,
    /// Print JSON instead of text
    pub json: bool,
    /// Colorize text output
    pub color: bool,
}

impl CommandContext {
    /// Build a context, making the token root absolute
    pub fn new(config: Config, json: bool, color: bool) -> Result<Self> {
        let root = if config.root.is_absolute() {
            config.root.clone()
        } else {
            std::env::current_dir()
                .context("Failed to determine working directory")?
                .join(&config.root)
        };
        Ok(Self {
            config,
            root,
            json,
            color,
        })
    }

    /// Open the version store
    #[must_use]
    pub fn store(&self) -> VersionStore {
        VersionStore::new(&self.root, self.config.cache_capacity)
    }

    /// Runner for the build/validation commands, with the yard paths exported
    pub fn runner(&self, store: &VersionStore, version: &str) -> Result<ScriptRunner> {
        let cwd = std::env::current_dir().context("Failed to determine working directory")?;
        Ok(ScriptRunner::new(&cwd)
            .with_env("TOKENYARD_ROOT", self.root.to_string_lossy())
            .with_env("TOKENYARD_SOURCE_DIR", store.active_source_dir().to_string_lossy())
            .with_env("TOKENYARD_BUILD_DIR", store.active_build_dir().to_string_lossy())
            .with_env("TOKENYARD_VERSION", version))
    }

    /// Impact label, colored by severity when color is on
    #[must_use]
    pub fn impact_label(&self, impact: Impact) -> String {
        let label = format!("{:<8}", impact.as_str());
        if !self.color {
            return label;
        }
        match impact {
            Impact::Critical => label.red().bold().to_string(),
            Impact::High => label.red().to_string(),
            Impact::Medium => label.yellow().to_string(),
            Impact::Low => label.green().to_string(),
        }
    }

    /// Section heading, bold when color is on
    #[must_use]
    pub fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    /// Print breaking changes, most severe first
    pub fn print_breaking(&self, changes: &[BreakingChange]) {
        for impact in Impact::descending() {
            for change in changes.iter().filter(|c| c.impact == impact) {
                println!("  [{}] {}", self.impact_label(change.impact), change.description);
                println!("             {}", change.migration_path);
            }
        }
    }
}
