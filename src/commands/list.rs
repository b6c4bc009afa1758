// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! List command - shows archived versions

use super::CommandContext;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

/// One row of the version list
#[derive(Debug, Serialize)]
struct VersionRow {
    version: String,
    status: String,
    created_at: String,
    breaking_changes: usize,
    tokens: usize,
}

/// Run the list command
pub fn run(ctx: &CommandContext) -> Result<()> {
    let store = ctx.store();
    let versions = store.list_versions()?;
    let active = store.load_active_metadata()?;

    let mut rows = Vec::new();
    for version in versions.iter().rev() {
        match store.load_metadata(version) {
            Ok(meta) => rows.push(VersionRow {
                version: meta.version,
                status: meta.status.to_string(),
                created_at: meta.created_at.format("%Y-%m-%d").to_string(),
                breaking_changes: meta.breaking_changes.len(),
                tokens: meta.build.token_counts.total,
            }),
            Err(e) => warn!("Skipping {}: {:#}", version, e),
        }
    }

    if ctx.json {
        let out = serde_json::json!({
            "active": active.as_ref().map(|m| m.version.clone()),
            "versions": rows,
        });
        println!("{}", serde_json::to_string_pretty(&out).context("Failed to serialize version list")?);
        return Ok(());
    }

    if let Some(active) = &active {
        println!("Active: {} ({})", active.version, active.status);
        println!();
    }

    if rows.is_empty() {
        println!("No versions archived yet. Use 'tokenyard create' to release one.");
        return Ok(());
    }

    println!(
        "{}",
        ctx.heading(&format!("{:<16} {:<12} {:<12} {:>8} {:>8}", "VERSION", "STATUS", "CREATED", "BREAKING", "TOKENS"))
    );
    for row in &rows {
        println!(
            "{:<16} {:<12} {:<12} {:>8} {:>8}",
            row.version, row.status, row.created_at, row.breaking_changes, row.tokens
        );
    }

    Ok(())
}
