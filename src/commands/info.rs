// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Info command - shows a version's metadata

use super::CommandContext;
use crate::store::ACTIVE;
use crate::types::VersionMetadata;
use anyhow::{anyhow, Context, Result};

/// Run the info command
pub fn run(ctx: &CommandContext, version: &str) -> Result<()> {
    let store = ctx.store();

    let metadata = if version == ACTIVE {
        store
            .load_active_metadata()?
            .ok_or_else(|| anyhow!("No active token set at {}", store.active_dir().display()))?
    } else {
        let v = store.resolve(version)?;
        store.load_metadata(&v)?
    };

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?);
        return Ok(());
    }

    print_metadata(ctx, &metadata);
    Ok(())
}

/// First 12 characters of a digest, or all of it if shorter or not cut cleanly
fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

fn print_metadata(ctx: &CommandContext, meta: &VersionMetadata) {
    println!("{}", ctx.heading(&format!("Version {}", meta.version)));
    println!("  Status:      {}", meta.status);
    println!("  Created:     {} by {}", meta.created_at.format("%Y-%m-%d %H:%M UTC"), meta.created_by);
    if let Some(description) = &meta.description {
        println!("  Description: {description}");
    }

    let counts = &meta.build.token_counts;
    if counts.total > 0 {
        println!();
        println!("{}", ctx.heading(&format!("Tokens ({})", counts.total)));
        for (category, n) in &counts.by_category {
            println!("  {category:<16} {n}");
        }
    }

    if !meta.build.outputs.is_empty() {
        println!();
        println!("{}", ctx.heading("Build outputs"));
        for file in &meta.build.outputs {
            println!("  {:<40} {:>8} B  {}", file.path, file.size, short_digest(&file.sha256));
        }
    }

    let compat = &meta.compatibility;
    if !compat.platforms.is_empty() || !compat.upgrade_from.is_empty() || !compat.migration_paths.is_empty() {
        println!();
        println!("{}", ctx.heading("Compatibility"));
        if !compat.platforms.is_empty() {
            let platforms: Vec<String> = compat
                .platforms
                .iter()
                .map(|(p, on)| format!("{p}: {}", if *on { "yes" } else { "no" }))
                .collect();
            println!("  Platforms:       {}", platforms.join(", "));
        }
        if !compat.upgrade_from.is_empty() {
            println!("  Upgrade from:    {}", compat.upgrade_from.join(", "));
        }
        if !compat.migration_paths.is_empty() {
            println!("  Needs migration: {}", compat.migration_paths.join(", "));
        }
        if !compat.downgrade_to.is_empty() {
            println!("  Downgrade to:    {}", compat.downgrade_to.join(", "));
        }
    }

    println!();
    println!("{}", ctx.heading(&format!("Breaking changes ({})", meta.breaking_changes.len())));
    ctx.print_breaking(&meta.breaking_changes);

    if !meta.deprecations.is_empty() {
        println!();
        println!("{}", ctx.heading(&format!("Deprecated ({})", meta.deprecations.len())));
        for dep in &meta.deprecations {
            match &dep.replacement {
                Some(r) => println!("  {} → {}", dep.token, r),
                None => println!("  {}", dep.token),
            }
        }
    }

    println!();
    println!(
        "Validation: {}{}",
        if meta.validation.passed { "passed" } else { "failed" },
        if meta.validation.warnings.is_empty() {
            String::new()
        } else {
            format!(" ({} warning(s))", meta.validation.warnings.len())
        }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_digest() {
        assert_eq!(short_digest("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_digest("abc"), "abc");
        // A hand-edited digest with a multi-byte char across the cut
        assert_eq!(short_digest("0123456789aé"), "0123456789aé");
    }
}
