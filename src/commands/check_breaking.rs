// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Check-breaking command - CI gate on breaking changes

use super::diff::report_for;
use super::CommandContext;
use anyhow::{Context, Result};

/// Run the check; returns whether breaking changes were found
pub fn run(ctx: &CommandContext, from: &str, to: &str) -> Result<bool> {
    let mut store = ctx.store();
    let report = report_for(ctx, &mut store, from, to)?;

    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report.summary).context("Failed to serialize summary")?
        );
        return Ok(report.has_breaking());
    }

    if report.has_breaking() {
        println!(
            "{} breaking change(s) between {} and {}:",
            report.summary.total, report.from_version, report.to_version
        );
        ctx.print_breaking(&report.breaking_changes);
    } else {
        println!(
            "No breaking changes between {} and {}",
            report.from_version, report.to_version
        );
    }

    Ok(report.has_breaking())
}
