// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Activate command - restores an archived version into the working set

use super::{prompt, CommandContext};
use crate::breaking::BreakingChangeReport;
use crate::error::TokenError;
use crate::metadata::{create_metadata, MetadataOverrides};
use crate::store::{TokenSource, ACTIVE};
use crate::tokens::LoadMode;
use crate::types::VersionStatus;
use anyhow::Result;
use tracing::info;

/// Run the activate command
pub fn run(ctx: &CommandContext, version: &str, force: bool, dry_run: bool) -> Result<()> {
    let mut store = ctx.store();
    let version = store.resolve(version)?;
    let archived = store.load_metadata(&version)?;

    // Lenient: a broken working set must not block restoring a good one
    let current = store.load_tokens(&TokenSource::Active, LoadMode::Lenient)?;
    let target = store.load_tokens(&TokenSource::Version(version.clone()), LoadMode::Strict)?;
    let report = BreakingChangeReport::generate(
        ACTIVE,
        &version.to_string(),
        &current.tokens,
        &target.tokens,
        ctx.config.rename_threshold,
    );

    println!("{}", ctx.heading(&format!("Activate {version}")));
    println!(
        "  Replaces {} with {} tokens ({} added, {} removed, {} modified, {} renamed)",
        store.active_source_dir().display(),
        target.tokens.len(),
        report.diff.added.len(),
        report.diff.removed.len(),
        report.diff.modified.len(),
        report.renames.len()
    );

    if dry_run {
        println!();
        println!("Dry-run: active set would become {}", version.next_dev());
        return Ok(());
    }

    if !force
        && !prompt::confirm(&format!(
            "Replace the active token set with {version}? Unreleased changes will be lost"
        ))?
    {
        return Err(TokenError::Aborted(
            "activation not confirmed; re-run with --force to proceed".into(),
        )
        .into());
    }

    store.restore_version(&version)?;

    let next = version.next_dev();
    let metadata = create_metadata(
        &next.to_string(),
        MetadataOverrides {
            status: Some(VersionStatus::Development),
            description: Some(format!("Development based on {version}")),
            deprecations: archived.deprecations.clone(),
            ..MetadataOverrides::default()
        },
    )?;
    store.save_active_metadata(&metadata)?;

    info!("Activated {}", version);
    println!("Activated {version}; active set is now {next}");
    Ok(())
}
