// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Tokenyard library - Version yard for your design tokens
//!
//! This crate provides the core functionality for archiving design-token
//! releases, diffing token sets, detecting renames and classifying breaking
//! changes before they reach consumers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod breaking;
pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
pub mod guide;
pub mod metadata;
pub mod runner;
pub mod store;
pub mod tokens;

/// Core data types shared by the diff engine, classifier and version store
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use sha2::{Digest, Sha256};
    use std::collections::BTreeMap;
    use std::fmt;

    use crate::metadata::SemVer;

    /// Flattened token map: dot-joined path to leaf value
    pub type TokenMap = BTreeMap<String, Value>;

    // =========================================================================
    // Token Changes
    // =========================================================================

    /// Layer a token belongs to, inferred from its path
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum TokenType {
        /// Raw design values (palette, scale steps)
        Primitive,
        /// Purpose-named aliases (e.g. `semantic.text.primary`)
        Semantic,
        /// Component-scoped tokens (e.g. `component.button.bg`)
        Component,
    }

    impl TokenType {
        /// Infer the token type from its path segments
        #[must_use]
        pub fn from_path(path: &str) -> Self {
            let segments: Vec<&str> = path.split('.').collect();
            if segments.iter().any(|s| s.contains("semantic")) {
                Self::Semantic
            } else if segments.iter().any(|s| s.contains("component")) {
                Self::Component
            } else {
                Self::Primitive
            }
        }

        /// Lowercase name
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Primitive => "primitive",
                Self::Semantic => "semantic",
                Self::Component => "component",
            }
        }
    }

    /// First path segment of a token path
    #[must_use]
    pub fn category_of(path: &str) -> &str {
        path.split('.').next().unwrap_or(path)
    }

    /// A single added, removed or modified token
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TokenChange {
        /// Dot path of the token
        pub path: String,
        /// Value before the change (absent for additions)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub old_value: Option<Value>,
        /// Value after the change (absent for removals)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub new_value: Option<Value>,
        /// First path segment
        pub category: String,
        /// Inferred token layer
        pub token_type: TokenType,
    }

    impl TokenChange {
        /// Build a change record, deriving category and type from the path
        #[must_use]
        pub fn new(path: &str, old_value: Option<Value>, new_value: Option<Value>) -> Self {
            Self {
                path: path.to_string(),
                old_value,
                new_value,
                category: category_of(path).to_string(),
                token_type: TokenType::from_path(path),
            }
        }
    }

    /// A removed token believed to live on under a new path
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TokenRename {
        /// Path in the older token set
        pub old_path: String,
        /// Path in the newer token set
        pub new_path: String,
        /// The shared value
        pub value: Value,
        /// Category of the old path
        pub category: String,
        /// Match confidence (0.0 to 1.0)
        pub confidence: f64,
    }

    // =========================================================================
    // Breaking Changes
    // =========================================================================

    /// Kind of breaking change
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum BreakingChangeType {
        /// Token no longer exists
        TokenRemoved,
        /// Token moved to a new path
        TokenRenamed,
        /// Token value changed significantly
        ValueChanged,
        /// Token became a category (or vice versa)
        StructureChanged,
        /// Token value changed kind (number, string, ...)
        FormatChanged,
        /// Platform output dropped from the build
        BuildChanged,
    }

    impl BreakingChangeType {
        /// Kebab-case name, as serialized
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::TokenRemoved => "token-removed",
                Self::TokenRenamed => "token-renamed",
                Self::ValueChanged => "value-changed",
                Self::StructureChanged => "structure-changed",
                Self::FormatChanged => "format-changed",
                Self::BuildChanged => "build-changed",
            }
        }
    }

    impl fmt::Display for BreakingChangeType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// Impact of a breaking change on consumers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Impact {
        /// Cosmetic or mechanical
        Low,
        /// Visible but contained
        Medium,
        /// Consumers will break or render differently
        High,
        /// Whole platforms affected
        Critical,
    }

    impl Impact {
        /// Lowercase name
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Low => "low",
                Self::Medium => "medium",
                Self::High => "high",
                Self::Critical => "critical",
            }
        }

        /// All levels, most severe first
        #[must_use]
        pub fn descending() -> [Self; 4] {
            [Self::Critical, Self::High, Self::Medium, Self::Low]
        }
    }

    impl fmt::Display for Impact {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// Estimated consumer effort to migrate
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Effort {
        /// Search and replace
        Minimal,
        /// A few targeted edits
        Low,
        /// Review of affected screens
        Medium,
        /// Redesign of affected components
        High,
        /// Platform-wide work
        Extensive,
    }

    impl Effort {
        /// Lowercase name
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Minimal => "minimal",
                Self::Low => "low",
                Self::Medium => "medium",
                Self::High => "high",
                Self::Extensive => "extensive",
            }
        }
    }

    /// A change that may alter visual output or require consumer code changes
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct BreakingChange {
        /// Content-hash ID: <type>-<hash of (token, type)>
        pub id: String,
        /// Kind of change
        #[serde(rename = "type")]
        pub change_type: BreakingChangeType,
        /// Human-readable description
        pub description: String,
        /// Impact level
        pub impact: Impact,
        /// Affected token path (or platform name for build changes)
        pub token: String,
        /// Previous value
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub old_value: Option<Value>,
        /// New value
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub new_value: Option<Value>,
        /// Migration guidance
        pub migration_path: String,
        /// Whether a codemod could apply the migration
        pub automatable: bool,
        /// Estimated consumer effort
        pub estimated_effort: Effort,
    }

    impl BreakingChange {
        /// Generate a deterministic ID for a breaking change
        #[must_use]
        pub fn generate_id(change_type: BreakingChangeType, token: &str) -> String {
            let mut hasher = Sha256::new();
            hasher.update(token.as_bytes());
            hasher.update(b"|");
            hasher.update(change_type.as_str().as_bytes());
            let hash = hex::encode(hasher.finalize());
            format!("{}-{}", change_type.as_str(), &hash[..8])
        }
    }

    /// A token marked `deprecated: true` in its source
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Deprecation {
        /// Dot path of the deprecated token
        pub token: String,
        /// Comment carried on the leaf
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub comment: Option<String>,
        /// Suggested replacement token
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub replacement: Option<String>,
    }

    // =========================================================================
    // Version Metadata
    // =========================================================================

    /// Release status of a token version
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum VersionStatus {
        /// Unreleased work in `active/`
        Development,
        /// Early preview
        Alpha,
        /// Feature-complete preview
        Beta,
        /// Release candidate
        Rc,
        /// Released
        Stable,
        /// Still available, no longer recommended
        Deprecated,
        /// Kept for history only
        Archived,
    }

    impl VersionStatus {
        /// Lowercase name
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Development => "development",
                Self::Alpha => "alpha",
                Self::Beta => "beta",
                Self::Rc => "rc",
                Self::Stable => "stable",
                Self::Deprecated => "deprecated",
                Self::Archived => "archived",
            }
        }

        /// Parse a status name
        #[must_use]
        pub fn parse(s: &str) -> Option<Self> {
            match s.to_lowercase().as_str() {
                "development" | "dev" => Some(Self::Development),
                "alpha" => Some(Self::Alpha),
                "beta" => Some(Self::Beta),
                "rc" => Some(Self::Rc),
                "stable" => Some(Self::Stable),
                "deprecated" => Some(Self::Deprecated),
                "archived" => Some(Self::Archived),
                _ => None,
            }
        }

        /// Default status for a version, from its prerelease tag
        #[must_use]
        pub fn for_version(version: &SemVer) -> Self {
            match version.prerelease.as_deref() {
                None => Self::Stable,
                Some(pre) => {
                    let head = pre.split('.').next().unwrap_or(pre);
                    match head {
                        "alpha" => Self::Alpha,
                        "beta" => Self::Beta,
                        "rc" => Self::Rc,
                        _ => Self::Development,
                    }
                }
            }
        }
    }

    impl fmt::Display for VersionStatus {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// Which versions a release is compatible with
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Compatibility {
        /// Versions that can upgrade to this one without migration
        #[serde(default)]
        pub upgrade_from: Vec<String>,
        /// Versions this one can safely downgrade to
        #[serde(default)]
        pub downgrade_to: Vec<String>,
        /// Versions that need the migration guide to reach this one
        #[serde(default)]
        pub migration_paths: Vec<String>,
        /// Platform support flags
        #[serde(default)]
        pub platforms: BTreeMap<String, bool>,
    }

    /// A file with its digest
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FileDigest {
        /// Path relative to the hashed directory, `/`-separated
        pub path: String,
        /// SHA-256 hex digest
        pub sha256: String,
        /// Size in bytes
        pub size: u64,
    }

    /// Token counts for a token set
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TokenCounts {
        /// All tokens
        pub total: usize,
        /// Tokens per category
        #[serde(default)]
        pub by_category: BTreeMap<String, usize>,
        /// Tokens per layer
        #[serde(default)]
        pub by_type: BTreeMap<String, usize>,
    }

    impl TokenCounts {
        /// Count the tokens of a flattened map
        #[must_use]
        pub fn from_map(tokens: &TokenMap) -> Self {
            let mut counts = Self {
                total: tokens.len(),
                ..Self::default()
            };
            for path in tokens.keys() {
                *counts
                    .by_category
                    .entry(category_of(path).to_string())
                    .or_default() += 1;
                *counts
                    .by_type
                    .entry(TokenType::from_path(path).as_str().to_string())
                    .or_default() += 1;
            }
            counts
        }
    }

    /// Build output description
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct BuildMetadata {
        /// When the build ran
        #[serde(default)]
        pub built_at: Option<DateTime<Utc>>,
        /// Build output files
        #[serde(default)]
        pub outputs: Vec<FileDigest>,
        /// Token counts of the built set
        #[serde(default)]
        pub token_counts: TokenCounts,
        /// Wall-clock build time
        #[serde(default)]
        pub duration_ms: u64,
    }

    /// Source files of a version
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SourceMetadata {
        /// Token source files
        #[serde(default)]
        pub files: Vec<FileDigest>,
    }

    /// Outcome of token validation
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ValidationResults {
        /// Whether validation passed
        pub passed: bool,
        /// Errors reported
        #[serde(default)]
        pub errors: Vec<String>,
        /// Warnings reported
        #[serde(default)]
        pub warnings: Vec<String>,
        /// When validation ran
        #[serde(default)]
        pub checked_at: Option<DateTime<Utc>>,
    }

    impl Default for ValidationResults {
        fn default() -> Self {
            Self {
                passed: true,
                errors: Vec::new(),
                warnings: Vec::new(),
                checked_at: None,
            }
        }
    }

    /// Metadata record for one token version
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct VersionMetadata {
        /// Version string as given
        pub version: String,
        /// Parsed version
        pub semver: SemVer,
        /// Release status
        pub status: VersionStatus,
        /// When the record was created
        pub created_at: DateTime<Utc>,
        /// Who created it
        pub created_by: String,
        /// Free-form description
        #[serde(default)]
        pub description: Option<String>,
        /// Breaking changes against the previous release
        #[serde(default)]
        pub breaking_changes: Vec<BreakingChange>,
        /// Compatibility matrix
        #[serde(default)]
        pub compatibility: Compatibility,
        /// Deprecated tokens in this version
        #[serde(default)]
        pub deprecations: Vec<Deprecation>,
        /// Build description
        #[serde(default)]
        pub build: BuildMetadata,
        /// Source description
        #[serde(default)]
        pub source: SourceMetadata,
        /// Validation outcome
        #[serde(default)]
        pub validation: ValidationResults,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::TokenError;
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
