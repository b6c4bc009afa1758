// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Create command - validates, diffs, builds and archives a token release

use super::{prompt, CommandContext};
use crate::breaking::{dropped_platforms, BreakingChangeReport, Bump};
use crate::error::TokenError;
use crate::guide::{prepend_changelog, render_changelog_entry, render_migration_guide};
use crate::metadata::{create_metadata, MetadataOverrides, SemVer};
use crate::store::{hash_dir, platform_support, Archive, TokenSource, VersionStore};
use crate::tokens::{self, LoadMode};
use crate::types::{
    BuildMetadata, Compatibility, SourceMetadata, TokenCounts, TokenMap, ValidationResults,
    VersionMetadata, VersionStatus,
};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use tracing::{info, warn};

/// Arguments for version creation
#[derive(Debug, Default)]
pub struct CreateArgs {
    /// Explicit version (default: derived from the active version and the changes)
    pub version: Option<String>,
    /// Release description
    pub description: Option<String>,
    /// Release status (default: derived from the prerelease tag)
    pub status: Option<String>,
    /// Skip confirmations and overwrite an existing version
    pub force: bool,
    /// Show what would happen without building or writing
    pub dry_run: bool,
}

/// Version to release when none is given.
///
/// The active development version wins unless the changes since the latest
/// release call for a bigger bump.
#[must_use]
pub fn suggest_version(active: &SemVer, latest: Option<&SemVer>, bump: Bump) -> SemVer {
    let candidate = active.release();
    match latest {
        None => candidate,
        Some(latest) => {
            let bumped = match bump {
                Bump::Major => latest.bump_major(),
                Bump::Minor => latest.bump_minor(),
                Bump::Patch => latest.bump_patch(),
            };
            candidate.max(bumped)
        }
    }
}

/// Run the validation command
fn validate(ctx: &CommandContext, store: &VersionStore, version: &SemVer, tokens: &TokenMap) -> Result<ValidationResults> {
    let mut results = ValidationResults {
        checked_at: Some(Utc::now()),
        ..ValidationResults::default()
    };
    if tokens.is_empty() {
        results.warnings.push("Active token set is empty".into());
    }

    let runner = ctx.runner(store, &version.to_string())?;
    match runner.run(&ctx.config.validate_command)? {
        None => results.warnings.push("No validation command configured".into()),
        Some(out) if out.success() => results.warnings.extend(out.warnings()),
        Some(out) => return Err(TokenError::ValidationFailed(out.failure_summary()).into()),
    }

    Ok(results)
}

/// Run the build command, returning its duration
fn build(ctx: &CommandContext, store: &VersionStore, version: &SemVer) -> Result<u64> {
    let build_dir = store.active_build_dir();
    fs::create_dir_all(&build_dir)
        .with_context(|| format!("Failed to create directory {}", build_dir.display()))?;

    let runner = ctx.runner(store, &version.to_string())?;
    match runner.run(&ctx.config.build_command)? {
        None => {
            warn!("No build command configured; archiving existing build output");
            Ok(0)
        }
        Some(out) if out.success() => Ok(out.duration_ms),
        Some(out) => Err(TokenError::BuildFailed(out.failure_summary()).into()),
    }
}

/// Run the create command
pub fn run(ctx: &CommandContext, args: CreateArgs) -> Result<()> {
    let mut store = ctx.store();

    let active = store.load_active_metadata()?.ok_or_else(|| {
        anyhow!(
            "No active token set at {}. Run 'tokenyard init' first",
            store.active_dir().display()
        )
    })?;
    let previous = store.list_versions()?;
    let latest = previous.last().cloned();

    let status = args
        .status
        .as_deref()
        .map(|s| VersionStatus::parse(s).ok_or_else(|| anyhow!("Unknown status: {s}. Valid: development, alpha, beta, rc, stable, deprecated, archived")))
        .transpose()?;

    // Diffing: compare the working set with the latest release
    let current = store.load_tokens(&TokenSource::Active, LoadMode::Strict)?;
    let (baseline_label, baseline) = match &latest {
        Some(v) => {
            let set = store.load_tokens(&TokenSource::Version(v.clone()), LoadMode::Strict)?;
            (v.to_string(), set.tokens.clone())
        }
        None => ("(none)".to_string(), TokenMap::new()),
    };
    let mut report = BreakingChangeReport::generate(
        &baseline_label,
        "active",
        &baseline,
        &current.tokens,
        ctx.config.rename_threshold,
    );

    // Platforms missing from the current build output; re-checked after building
    let build_dir = store.active_build_dir();
    let released_platforms = match &latest {
        Some(v) => store.load_metadata(v)?.compatibility.platforms,
        None => BTreeMap::new(),
    };
    let known_drops = dropped_platforms(
        &released_platforms,
        &platform_support(&build_dir, &ctx.config.platforms),
    );
    report.set_build_changes(known_drops.clone());

    let version = match &args.version {
        Some(v) => SemVer::parse(v)?,
        None => suggest_version(&active.semver, latest.as_ref(), report.summary.recommended_bump),
    };
    report.to_version = version.to_string();
    info!("Creating version {}", version);

    if store.version_dir(&version).exists() && !args.force {
        return Err(TokenError::VersionExists(version.to_string()).into());
    }
    if let Some(latest) = &latest {
        if version <= *latest && !args.force {
            bail!("Version {} is not newer than the latest release {} (use --force to create it anyway)", version, latest);
        }
        if report.has_breaking() && version.major == latest.major && version.major > 0 {
            warn!(
                "{} breaking change(s) in a non-major release ({} -> {})",
                report.summary.total, latest, version
            );
        }
    }

    // Validating
    let validation = validate(ctx, &store, &version, &current.tokens)?;

    println!("{}", ctx.heading(&format!("Version {version}")));
    println!("  Baseline: {baseline_label}");
    println!(
        "  Tokens: {} ({} added, {} removed, {} modified, {} renamed)",
        current.tokens.len(),
        report.diff.added.len(),
        report.diff.removed.len(),
        report.diff.modified.len(),
        report.renames.len()
    );
    println!("  Breaking changes: {}", report.summary.total);
    if report.has_breaking() {
        ctx.print_breaking(&report.breaking_changes);
    }

    if args.dry_run {
        println!();
        println!("Dry-run: would build and archive {} at {}", version, store.version_dir(&version).display());
        println!("Active set would move to {}", version.next_dev());
        return Ok(());
    }

    if report.has_breaking() && !args.force {
        confirm_breaking(&version, report.summary.total)?;
    }

    // Building
    let duration_ms = build(ctx, &store, &version)?;
    let platforms = platform_support(&build_dir, &ctx.config.platforms);
    let dropped = dropped_platforms(&released_platforms, &platforms);
    let unconfirmed: Vec<_> = dropped.iter().filter(|c| !known_drops.contains(c)).cloned().collect();
    report.set_build_changes(dropped);

    if !unconfirmed.is_empty() && !args.force {
        println!();
        println!("The build no longer produces {} platform(s):", unconfirmed.len());
        ctx.print_breaking(&unconfirmed);
        confirm_breaking(&version, report.summary.total)?;
    }

    let metadata = create_metadata(
        &version.to_string(),
        MetadataOverrides {
            status,
            description: args.description.clone(),
            breaking_changes: report.breaking_changes.clone(),
            compatibility: Some(Compatibility::compute(
                &version,
                &previous,
                report.has_breaking(),
                platforms,
            )),
            deprecations: tokens::collect_deprecations(&current.tree),
            build: Some(BuildMetadata {
                built_at: Some(Utc::now()),
                outputs: hash_dir(&build_dir)?,
                token_counts: TokenCounts::from_map(&current.tokens),
                duration_ms,
            }),
            source: Some(SourceMetadata {
                files: hash_dir(&store.active_source_dir())?,
            }),
            validation: Some(validation),
            ..MetadataOverrides::default()
        },
    )?;

    // Writing the archive
    let guide = render_migration_guide(&report, &metadata);
    let source_dir = store.active_source_dir();
    let archive = Archive {
        metadata: &metadata,
        guide: &guide,
        source_dir: &source_dir,
        build_dir: &build_dir,
    };
    let target = store.write_archive(&version, &archive, args.force)?;

    advance_active(&store, &active, &metadata, &report)?;

    println!();
    println!("Created {} at {}", version, target.display());
    println!("  Status: {}", metadata.status);
    println!("  Build outputs: {}", metadata.build.outputs.len());
    let supported: Vec<&str> = metadata
        .compatibility
        .platforms
        .iter()
        .filter(|(_, on)| **on)
        .map(|(p, _)| p.as_str())
        .collect();
    if !supported.is_empty() {
        println!("  Platforms: {}", supported.join(", "));
    }
    println!("  Active set is now {}", version.next_dev());

    Ok(())
}

/// Ask to go ahead despite breaking changes; declining aborts the release
fn confirm_breaking(version: &SemVer, count: usize) -> Result<()> {
    if prompt::confirm(&format!("Continue creating {version} with {count} breaking change(s)?"))? {
        return Ok(());
    }
    Err(TokenError::Aborted(format!(
        "{count} breaking change(s) not confirmed; re-run with --force to proceed"
    ))
    .into())
}

/// Move the working set to the next development version and record the release in the changelog
fn advance_active(
    store: &VersionStore,
    active: &VersionMetadata,
    released: &VersionMetadata,
    report: &BreakingChangeReport,
) -> Result<()> {
    let next = released.semver.next_dev();
    let dev = create_metadata(
        &next.to_string(),
        MetadataOverrides {
            status: Some(VersionStatus::Development),
            created_by: Some(active.created_by.clone()),
            description: active.description.clone(),
            deprecations: released.deprecations.clone(),
            ..MetadataOverrides::default()
        },
    )?;
    store.save_active_metadata(&dev)?;

    let changelog = store.changelog_path();
    let existing = if changelog.exists() {
        fs::read_to_string(&changelog)
            .with_context(|| format!("Failed to read {}", changelog.display()))?
    } else {
        String::new()
    };
    let updated = prepend_changelog(&existing, &render_changelog_entry(report, released));
    fs::write(&changelog, updated).with_context(|| format!("Failed to write {}", changelog.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemVer {
        SemVer::parse(s).unwrap()
    }

    #[test]
    fn test_suggest_first_release_uses_active() {
        assert_eq!(suggest_version(&v("0.1.0-dev"), None, Bump::Major), v("0.1.0"));
    }

    #[test]
    fn test_suggest_bumps_past_active_when_breaking() {
        assert_eq!(suggest_version(&v("1.2.4-dev"), Some(&v("1.2.3")), Bump::Major), v("2.0.0"));
        assert_eq!(suggest_version(&v("1.2.4-dev"), Some(&v("1.2.3")), Bump::Minor), v("1.3.0"));
        assert_eq!(suggest_version(&v("1.2.4-dev"), Some(&v("1.2.3")), Bump::Patch), v("1.2.4"));
    }

    #[test]
    fn test_suggest_keeps_larger_active() {
        assert_eq!(suggest_version(&v("3.0.0-dev"), Some(&v("1.2.3")), Bump::Patch), v("3.0.0"));
    }
}
