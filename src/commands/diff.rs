// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Diff command - compares two token sets

use super::CommandContext;
use crate::breaking::{display_value, BreakingChangeReport};
use crate::store::{TokenSet, TokenSource, VersionStore};
use crate::tokens::LoadMode;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::rc::Rc;

/// Build the report for two CLI version names (`active` allowed)
pub fn report_for(ctx: &CommandContext, store: &mut VersionStore, from: &str, to: &str) -> Result<BreakingChangeReport> {
    let from_source = store.resolve_source(from)?;
    let to_source = store.resolve_source(to)?;

    let from_set = load(store, &from_source)?;
    let to_set = load(store, &to_source)?;

    Ok(BreakingChangeReport::generate(
        &from_source.to_string(),
        &to_source.to_string(),
        &from_set.tokens,
        &to_set.tokens,
        ctx.config.rename_threshold,
    ))
}

fn load(store: &mut VersionStore, source: &TokenSource) -> Result<Rc<TokenSet>> {
    store
        .load_tokens(source, LoadMode::Strict)
        .with_context(|| format!("Failed to load token set {source}"))
}

/// Run the diff command
pub fn run(ctx: &CommandContext, from: &str, to: &str) -> Result<()> {
    let mut store = ctx.store();
    let report = report_for(ctx, &mut store, from, to)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
        return Ok(());
    }

    println!("{}", ctx.heading(&format!("Token diff {} → {}", report.from_version, report.to_version)));
    println!();

    if report.diff.is_empty() && report.renames.is_empty() {
        println!("No token changes.");
        return Ok(());
    }

    let (plus, minus, tilde, arrow) = if ctx.color {
        (
            "+".green().to_string(),
            "-".red().to_string(),
            "~".yellow().to_string(),
            ">".cyan().to_string(),
        )
    } else {
        ("+".into(), "-".into(), "~".into(), ">".into())
    };

    for change in &report.diff.added {
        let value = change.new_value.as_ref().map(display_value).unwrap_or_default();
        println!("  {plus} {} = {}", change.path, value);
    }
    for change in &report.diff.removed {
        let value = change.old_value.as_ref().map(display_value).unwrap_or_default();
        println!("  {minus} {} = {}", change.path, value);
    }
    for change in &report.diff.modified {
        println!(
            "  {tilde} {}: {} → {}",
            change.path,
            change.old_value.as_ref().map(display_value).unwrap_or_default(),
            change.new_value.as_ref().map(display_value).unwrap_or_default()
        );
    }
    for rename in &report.renames {
        println!(
            "  {arrow} {} → {} ({:.0}%)",
            rename.old_path,
            rename.new_path,
            rename.confidence * 100.0
        );
    }

    println!();
    println!(
        "{} added, {} removed, {} modified, {} renamed",
        report.diff.added.len(),
        report.diff.removed.len(),
        report.diff.modified.len(),
        report.renames.len()
    );

    if report.has_breaking() {
        println!();
        println!("{}", ctx.heading(&format!("Breaking changes ({})", report.summary.total)));
        ctx.print_breaking(&report.breaking_changes);
    }
    println!("Recommended bump: {}", report.summary.recommended_bump);

    Ok(())
}
