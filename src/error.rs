// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Domain errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the version yard
#[derive(Debug, Error)]
pub enum TokenError {
    /// Version string does not match `major.minor.patch[-pre][+build]`
    #[error("Invalid version format: {0} (expected major.minor.patch[-prerelease][+build])")]
    InvalidVersion(String),

    /// No archived version with this name
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    /// A version directory already exists
    #[error("Version {0} already exists (use --force to overwrite)")]
    VersionExists(String),

    /// The validation command exited non-zero
    #[error("Token validation failed: {0}")]
    ValidationFailed(String),

    /// The build command exited non-zero
    #[error("Token build failed: {0}")]
    BuildFailed(String),

    /// A token source file could not be parsed
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Offending file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// The user declined a confirmation
    #[error("Aborted: {0}")]
    Aborted(String),
}
