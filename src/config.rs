// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management

use crate::diff::DEFAULT_RENAME_THRESHOLD;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the user config dir and the working directory
pub const CONFIG_FILE: &str = "tokenyard.toml";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Token root holding `versions/` and `active/`
    pub root: PathBuf,
    /// Shell command that builds platform outputs into `active/build`
    pub build_command: String,
    /// Shell command that validates `active/source`
    pub validate_command: String,
    /// Platforms expected as subdirectories of the build output
    pub platforms: Vec<String>,
    /// Token sets kept in memory per invocation
    pub cache_capacity: usize,
    /// Minimum path similarity for rename detection
    pub rename_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("design-tokens"),
            build_command: "npm run build:tokens".to_string(),
            validate_command: "npm run validate-tokens".to_string(),
            platforms: ["css", "tailwind", "js", "ios", "android"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            cache_capacity: 8,
            rename_threshold: DEFAULT_RENAME_THRESHOLD,
        }
    }
}

impl Config {
    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Path of the per-user configuration file, if the platform has one
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "tokenyard")
        .map(|d| d.config_dir().join(CONFIG_FILE))
}

/// Load configuration: defaults, user file, `./tokenyard.toml`, explicit file, then `TOKENYARD_*` env
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let defaults = ::config::Config::try_from(&Config::default())
        .context("Failed to build default configuration")?;

    let mut builder = ::config::Config::builder().add_source(defaults);

    if let Some(path) = user_config_path() {
        builder = builder.add_source(::config::File::from(path).required(false));
    }
    builder = builder.add_source(::config::File::from(PathBuf::from(CONFIG_FILE)).required(false));
    if let Some(path) = explicit {
        builder = builder.add_source(::config::File::from(path.to_path_buf()).required(true));
    }
    builder = builder.add_source(::config::Environment::with_prefix("TOKENYARD").try_parsing(true));

    let settings = builder.build().context("Failed to load configuration")?;
    let config: Config = settings
        .try_deserialize()
        .context("Invalid configuration")?;

    tracing::debug!("Configuration: {:?}", config);
    Ok(config)
}
