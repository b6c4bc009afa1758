// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Init command - seeds the active working set

use super::CommandContext;
use crate::guide::CHANGELOG_HEADING;
use crate::metadata::{create_metadata, MetadataOverrides, SemVer};
use crate::tokens::{self, LoadMode};
use crate::types::VersionStatus;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Arguments for init
#[derive(Debug, Default)]
pub struct InitArgs {
    /// Directory of token files to import
    pub source: Option<PathBuf>,
    /// First version to be released (default 0.1.0)
    pub version: Option<String>,
    /// Re-initialise an existing working set
    pub force: bool,
}

/// Run the init command
pub fn run(ctx: &CommandContext, args: InitArgs) -> Result<()> {
    let store = ctx.store();

    if store.load_active_metadata()?.is_some() && !args.force {
        bail!(
            "{} is already initialised (use --force to re-initialise)",
            store.active_dir().display()
        );
    }

    let release = SemVer::parse(args.version.as_deref().unwrap_or("0.1.0"))?;
    let dev = SemVer {
        prerelease: Some("dev".into()),
        build: None,
        ..release.release()
    };

    let source_dir = store.active_source_dir();
    fs::create_dir_all(&source_dir)
        .with_context(|| format!("Failed to create directory {}", source_dir.display()))?;
    fs::create_dir_all(store.active_build_dir())
        .with_context(|| format!("Failed to create directory {}", store.active_build_dir().display()))?;

    let mut imported = 0;
    let mut skipped = 0;
    if let Some(from) = &args.source {
        if !from.is_dir() {
            bail!("Source directory not found: {}", from.display());
        }
        for file in tokens::token_files(from)? {
            // Lenient: a malformed file is reported and left behind
            if let Err(e) = tokens::parse_file(&file) {
                warn!("Skipping {}: {:#}", file.display(), e);
                skipped += 1;
                continue;
            }
            let relative = file.strip_prefix(from)?;
            let target = source_dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            fs::copy(&file, &target)
                .with_context(|| format!("Failed to copy {} to {}", file.display(), target.display()))?;
            imported += 1;
        }
    }

    let tree = tokens::load_tree(&source_dir, LoadMode::Lenient)?;
    let metadata = create_metadata(
        &dev.to_string(),
        MetadataOverrides {
            status: Some(VersionStatus::Development),
            description: Some("Unreleased development".into()),
            deprecations: tokens::collect_deprecations(&tree),
            ..MetadataOverrides::default()
        },
    )?;
    store.save_active_metadata(&metadata)?;

    let changelog = store.changelog_path();
    if !changelog.exists() {
        fs::write(&changelog, format!("{CHANGELOG_HEADING}\n\n"))
            .with_context(|| format!("Failed to write {}", changelog.display()))?;
    }

    info!("Initialised {} at {}", dev, store.active_dir().display());

    println!("Initialised active token set {} at {}", dev, store.active_dir().display());
    println!("  Tokens: {}", tokens::count_leaves(&tree));
    if args.source.is_some() {
        println!("  Files imported: {imported}");
        if skipped > 0 {
            println!("  Files skipped (malformed): {skipped}");
        }
    }

    Ok(())
}
