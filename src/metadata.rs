// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Semantic versions and version metadata records

use crate::error::TokenError;
use crate::types::{
    BreakingChange, BuildMetadata, Compatibility, Deprecation, SourceMetadata, ValidationResults,
    VersionMetadata, VersionStatus,
};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static SEMVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([^+]+))?(?:\+(.+))?$").expect("semver regex is valid")
});

/// Parsed `major.minor.patch[-prerelease][+build]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SemVer {
    /// Major version
    pub major: u64,
    /// Minor version
    pub minor: u64,
    /// Patch version
    pub patch: u64,
    /// Prerelease tag (`dev`, `beta.2`, ...)
    #[serde(default)]
    pub prerelease: Option<String>,
    /// Build metadata, ignored for ordering
    #[serde(default)]
    pub build: Option<String>,
}

impl SemVer {
    /// Plain release version
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Parse a version string
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        let invalid = || TokenError::InvalidVersion(s.to_string());
        let caps = SEMVER_RE.captures(s).ok_or_else(invalid)?;
        let number = |i: usize| caps[i].parse::<u64>().map_err(|_| invalid());

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            prerelease: caps.get(4).map(|m| m.as_str().to_string()),
            build: caps.get(5).map(|m| m.as_str().to_string()),
        })
    }

    /// Whether this is a prerelease
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Drop prerelease and build metadata
    #[must_use]
    pub fn release(&self) -> Self {
        Self::new(self.major, self.minor, self.patch)
    }

    /// Next major release
    #[must_use]
    pub fn bump_major(&self) -> Self {
        Self::new(self.major.saturating_add(1), 0, 0)
    }

    /// Next minor release
    #[must_use]
    pub fn bump_minor(&self) -> Self {
        Self::new(self.major, self.minor.saturating_add(1), 0)
    }

    /// Next patch release
    #[must_use]
    pub fn bump_patch(&self) -> Self {
        Self::new(self.major, self.minor, self.patch.saturating_add(1))
    }

    /// Development version following a release: next patch with `-dev`
    #[must_use]
    pub fn next_dev(&self) -> Self {
        Self {
            prerelease: Some("dev".into()),
            ..self.release().bump_patch()
        }
    }

    /// Directory name for an archived version
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!("v{self}")
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{pre}")?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl FromStr for SemVer {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(m), Ok(n)) => m.cmp(&n),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl Ord for SemVer {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_prerelease(a, b),
            })
            // Keep Ord consistent with Eq; build metadata has no precedence meaning
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for SemVer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fields a caller may set when creating metadata; unset fields get defaults
#[derive(Debug, Clone, Default)]
pub struct MetadataOverrides {
    /// Release status (default: derived from the prerelease tag)
    pub status: Option<VersionStatus>,
    /// Creator (default: `$USER`)
    pub created_by: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Breaking changes against the previous release
    pub breaking_changes: Vec<BreakingChange>,
    /// Compatibility matrix
    pub compatibility: Option<Compatibility>,
    /// Deprecated tokens
    pub deprecations: Vec<Deprecation>,
    /// Build description
    pub build: Option<BuildMetadata>,
    /// Source description
    pub source: Option<SourceMetadata>,
    /// Validation outcome
    pub validation: Option<ValidationResults>,
}

/// Build a metadata record for `version`
pub fn create_metadata(version: &str, overrides: MetadataOverrides) -> Result<VersionMetadata, TokenError> {
    let semver = SemVer::parse(version)?;
    let status = overrides
        .status
        .unwrap_or_else(|| VersionStatus::for_version(&semver));

    Ok(VersionMetadata {
        version: version.to_string(),
        status,
        created_at: Utc::now(),
        created_by: overrides
            .created_by
            .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "unknown".into())),
        description: overrides.description,
        breaking_changes: overrides.breaking_changes,
        compatibility: overrides.compatibility.unwrap_or_default(),
        deprecations: overrides.deprecations,
        build: overrides.build.unwrap_or_default(),
        source: overrides.source.unwrap_or_default(),
        validation: overrides.validation.unwrap_or_default(),
        semver,
    })
}

impl VersionMetadata {
    /// Whether `token` is affected by a breaking change in this version
    #[must_use]
    pub fn is_breaking_change(&self, token: &str) -> bool {
        self.breaking_changes.iter().any(|c| c.token == token)
    }

    /// Whether `from` can upgrade to this version without migration
    #[must_use]
    pub fn can_upgrade(&self, from: &str) -> bool {
        self.compatibility.upgrade_from.iter().any(|v| v == from)
    }

    /// Whether this version can be safely downgraded to `to`
    #[must_use]
    pub fn can_downgrade(&self, to: &str) -> bool {
        self.compatibility.downgrade_to.iter().any(|v| v == to)
    }

    /// Whether a migration guide covers upgrading from `from`
    #[must_use]
    pub fn has_migration_path(&self, from: &str) -> bool {
        self.compatibility.migration_paths.iter().any(|v| v == from)
    }
}

impl Compatibility {
    /// Compute the matrix for a new release against the versions before it.
    ///
    /// Same-major predecessors upgrade directly unless the release breaks
    /// something; every other predecessor needs the migration guide. Only
    /// same-minor predecessors are safe downgrade targets.
    #[must_use]
    pub fn compute(
        version: &SemVer,
        previous: &[SemVer],
        has_breaking: bool,
        platforms: BTreeMap<String, bool>,
    ) -> Self {
        let mut matrix = Self {
            platforms,
            ..Self::default()
        };

        let mut earlier: Vec<&SemVer> = previous.iter().filter(|v| *v < version).collect();
        earlier.sort();

        for prev in earlier {
            let label = prev.to_string();
            if prev.major == version.major && !has_breaking {
                matrix.upgrade_from.push(label.clone());
            } else {
                matrix.migration_paths.push(label.clone());
            }
            if prev.major == version.major && prev.minor == version.minor {
                matrix.downgrade_to.push(label);
            }
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BreakingChangeType, Effort, Impact};

    #[test]
    fn test_parse_full() {
        let v = SemVer::parse("1.2.3-beta.1+build.5").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
        assert_eq!(v.prerelease.as_deref(), Some("beta.1"));
        assert_eq!(v.build.as_deref(), Some("build.5"));
        assert_eq!(v.to_string(), "1.2.3-beta.1+build.5");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for bad in ["1.2", "v1.2.3", "1.2.3.4", "a.b.c", "", "1.2.3-"] {
            assert!(SemVer::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_ordering() {
        let mut versions: Vec<SemVer> = ["1.0.0", "1.0.0-rc.1", "0.9.9", "1.0.0-beta.2", "1.0.0-beta.10", "2.0.0"]
            .iter()
            .map(|s| SemVer::parse(s).unwrap())
            .collect();
        versions.sort();

        let labels: Vec<String> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            ["0.9.9", "1.0.0-beta.2", "1.0.0-beta.10", "1.0.0-rc.1", "1.0.0", "2.0.0"]
        );
    }

    #[test]
    fn test_next_dev() {
        let v = SemVer::parse("1.4.2").unwrap();
        assert_eq!(v.next_dev().to_string(), "1.4.3-dev");
        assert_eq!(v.dir_name(), "v1.4.2");
    }

    #[test]
    fn test_create_metadata_defaults() {
        let meta = create_metadata("2.0.0-rc.1", MetadataOverrides::default()).unwrap();
        assert_eq!(meta.status, VersionStatus::Rc);
        assert!(meta.breaking_changes.is_empty());
        assert!(meta.validation.passed);

        let meta = create_metadata("2.0.0", MetadataOverrides::default()).unwrap();
        assert_eq!(meta.status, VersionStatus::Stable);
    }

    #[test]
    fn test_create_metadata_invalid_version() {
        let err = create_metadata("two", MetadataOverrides::default()).unwrap_err();
        assert!(matches!(err, TokenError::InvalidVersion(_)));
    }

    #[test]
    fn test_predicates() {
        let change = BreakingChange {
            id: BreakingChange::generate_id(BreakingChangeType::TokenRemoved, "colors.red"),
            change_type: BreakingChangeType::TokenRemoved,
            description: "removed".into(),
            impact: Impact::High,
            token: "colors.red".into(),
            old_value: None,
            new_value: None,
            migration_path: String::new(),
            automatable: false,
            estimated_effort: Effort::High,
        };
        let previous = vec![SemVer::new(1, 0, 0), SemVer::new(1, 1, 0), SemVer::new(2, 0, 0)];
        let meta = create_metadata(
            "2.0.1",
            MetadataOverrides {
                breaking_changes: vec![change],
                compatibility: Some(Compatibility::compute(
                    &SemVer::new(2, 0, 1),
                    &previous,
                    false,
                    BTreeMap::new(),
                )),
                ..MetadataOverrides::default()
            },
        )
        .unwrap();

        assert!(meta.is_breaking_change("colors.red"));
        assert!(!meta.is_breaking_change("colors.blue"));
        assert!(meta.can_upgrade("2.0.0"));
        assert!(!meta.can_upgrade("1.1.0"));
        assert!(meta.has_migration_path("1.0.0"));
        assert!(meta.can_downgrade("2.0.0"));
        assert!(!meta.can_downgrade("1.1.0"));
    }

    #[test]
    fn test_compatibility_breaking_release() {
        let previous = vec![SemVer::new(1, 0, 0), SemVer::new(1, 2, 0), SemVer::new(3, 0, 0)];
        let matrix = Compatibility::compute(&SemVer::new(1, 2, 1), &previous, true, BTreeMap::new());

        assert!(matrix.upgrade_from.is_empty());
        assert_eq!(matrix.migration_paths, vec!["1.0.0", "1.2.0"]);
        assert_eq!(matrix.downgrade_to, vec!["1.2.0"]);
    }
}
