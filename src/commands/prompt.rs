// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Confirmation prompts for destructive operations

use anyhow::{Context, Result};
use dialoguer::Confirm;
use std::io::IsTerminal;

/// Whether prompts can be shown.
///
/// False when stdin or stdout is not a TTY, when `CI` is set, or when
/// `TOKENYARD_NON_INTERACTIVE` is set.
#[must_use]
pub fn should_be_interactive() -> bool {
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        return false;
    }
    if std::env::var_os("CI").is_some() {
        return false;
    }
    std::env::var_os("TOKENYARD_NON_INTERACTIVE").is_none()
}

/// Ask a yes/no question; non-interactive sessions always answer no
pub fn confirm(question: &str) -> Result<bool> {
    if !should_be_interactive() {
        tracing::debug!("Not interactive, declining: {}", question);
        return Ok(false);
    }
    Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}
