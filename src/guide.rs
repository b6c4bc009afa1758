// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Markdown migration guides and changelog entries

use crate::breaking::{display_value, BreakingChangeReport};
use crate::types::{Impact, VersionMetadata};
use std::fmt::Write as _;

/// Heading every changelog starts with
pub const CHANGELOG_HEADING: &str = "# Changelog";

/// Render the migration guide for upgrading from `report.from_version`
#[must_use]
pub fn render_migration_guide(report: &BreakingChangeReport, metadata: &VersionMetadata) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Migration guide: {} → {}", report.from_version, report.to_version);
    md.push('\n');
    let _ = writeln!(md, "Generated {}.", report.generated_at.format("%Y-%m-%d %H:%M UTC"));
    if let Some(description) = &metadata.description {
        md.push('\n');
        let _ = writeln!(md, "{description}");
    }
    md.push('\n');

    md.push_str("## Summary\n\n");
    md.push_str("| | Count |\n|---|---|\n");
    let _ = writeln!(md, "| Added tokens | {} |", report.diff.added.len());
    let _ = writeln!(md, "| Removed tokens | {} |", report.diff.removed.len());
    let _ = writeln!(md, "| Modified tokens | {} |", report.diff.modified.len());
    let _ = writeln!(md, "| Renamed tokens | {} |", report.renames.len());
    let _ = writeln!(md, "| Breaking changes | {} |", report.summary.total);
    let _ = writeln!(md, "| Automatable | {} |", report.summary.automatable);
    md.push('\n');
    let _ = writeln!(md, "Recommended version bump: **{}**", report.summary.recommended_bump);
    md.push('\n');

    if !report.renames.is_empty() {
        md.push_str("## Renamed tokens\n\n");
        md.push_str("| Old | New | Confidence |\n|---|---|---|\n");
        for rename in &report.renames {
            let _ = writeln!(
                md,
                "| `{}` | `{}` | {:.0}% |",
                rename.old_path,
                rename.new_path,
                rename.confidence * 100.0
            );
        }
        md.push('\n');
    }

    if report.breaking_changes.is_empty() {
        md.push_str("## Breaking changes\n\nNone. This release is a drop-in upgrade.\n\n");
    } else {
        md.push_str("## Breaking changes\n\n");
        for impact in Impact::descending() {
            let changes: Vec<_> = report
                .breaking_changes
                .iter()
                .filter(|c| c.impact == impact)
                .collect();
            if changes.is_empty() {
                continue;
            }
            let _ = writeln!(md, "### {} impact\n", capitalize(impact.as_str()));
            for change in changes {
                let _ = writeln!(md, "- **`{}`** ({}): {}", change.token, change.change_type, change.description);
                let _ = writeln!(md, "  - Migration: {}", change.migration_path);
                let _ = writeln!(
                    md,
                    "  - Effort: {}{}",
                    change.estimated_effort.as_str(),
                    if change.automatable { ", automatable" } else { "" }
                );
            }
            md.push('\n');
        }
    }

    if !metadata.deprecations.is_empty() {
        md.push_str("## Deprecated tokens\n\n");
        for dep in &metadata.deprecations {
            let _ = write!(md, "- `{}`", dep.token);
            if let Some(replacement) = &dep.replacement {
                let _ = write!(md, " → use `{replacement}`");
            }
            if let Some(comment) = &dep.comment {
                let _ = write!(md, " ({comment})");
            }
            md.push('\n');
        }
        md.push('\n');
    }

    md
}

/// Render one changelog entry for a release
#[must_use]
pub fn render_changelog_entry(report: &BreakingChangeReport, metadata: &VersionMetadata) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "## [{}] - {}", metadata.version, metadata.created_at.format("%Y-%m-%d"));
    md.push('\n');

    let mut section = |title: &str, lines: Vec<String>| {
        if lines.is_empty() {
            return;
        }
        let _ = writeln!(md, "### {title}\n");
        for line in lines {
            let _ = writeln!(md, "- {line}");
        }
        md.push('\n');
    };

    section(
        "Added",
        report.diff.added.iter().map(|c| format!("`{}`", c.path)).collect(),
    );
    section(
        "Changed",
        report
            .diff
            .modified
            .iter()
            .map(|c| {
                format!(
                    "`{}`: {} → {}",
                    c.path,
                    c.old_value.as_ref().map(display_value).unwrap_or_default(),
                    c.new_value.as_ref().map(display_value).unwrap_or_default()
                )
            })
            .collect(),
    );
    section(
        "Renamed",
        report
            .renames
            .iter()
            .map(|r| format!("`{}` → `{}`", r.old_path, r.new_path))
            .collect(),
    );
    section(
        "Removed",
        report.diff.removed.iter().map(|c| format!("`{}`", c.path)).collect(),
    );

    if report.diff.is_empty() && report.renames.is_empty() {
        md.push_str("No token changes.\n\n");
    }

    md
}

/// Insert `entry` below the changelog heading, creating the heading if missing
#[must_use]
pub fn prepend_changelog(existing: &str, entry: &str) -> String {
    let body = existing
        .trim_start()
        .strip_prefix(CHANGELOG_HEADING)
        .unwrap_or(existing)
        .trim_start_matches('\n');

    let mut out = format!("{CHANGELOG_HEADING}\n\n{entry}");
    if !body.trim().is_empty() {
        if !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(body);
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
