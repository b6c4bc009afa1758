// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - shows the effective configuration

use super::CommandContext;
use anyhow::{anyhow, Context, Result};

/// Print the effective configuration, or a single key of it
pub fn run(ctx: &CommandContext, key: Option<&str>) -> Result<()> {
    let text = ctx.config.to_toml()?;

    let Some(key) = key else {
        print!("{text}");
        return Ok(());
    };

    let table: toml::Table = toml::from_str(&text).context("Failed to read configuration back")?;
    let value = table
        .get(key)
        .ok_or_else(|| anyhow!("Unknown configuration key: {key}"))?;
    match value {
        toml::Value::String(s) => println!("{s}"),
        other => println!("{other}"),
    }
    Ok(())
}
