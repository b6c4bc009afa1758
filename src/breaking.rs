// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Breaking-change classification

use crate::diff::{compare, FilteredDiff, TokenDiff};
use crate::types::{
    BreakingChange, BreakingChangeType, Effort, Impact, TokenChange, TokenMap, TokenRename,
    TokenType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Relative spacing change above which a spacing token counts as breaking
pub const SPACING_THRESHOLD: f64 = 0.2;

/// Relative spacing change above which a spacing change is high impact
const SPACING_HIGH_IMPACT: f64 = 0.5;

/// Renames at or above this confidence are low impact
const CONFIDENT_RENAME: f64 = 0.8;

/// Category families the classifier knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    /// colors, color
    Color,
    /// spacing, space, sizing
    Spacing,
    /// typography, font, fonts
    Typography,
    /// Anything else
    Other,
}

impl CategoryKind {
    /// Classify a category name
    #[must_use]
    pub fn of(category: &str) -> Self {
        match category.to_lowercase().as_str() {
            "colors" | "color" => Self::Color,
            "spacing" | "space" | "sizing" => Self::Spacing,
            "typography" | "font" | "fonts" => Self::Typography,
            _ => Self::Other,
        }
    }
}

/// Render a token value for messages: strings bare, everything else as JSON
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a numeric magnitude by stripping everything but digits, `.` and `-`
#[must_use]
pub fn parse_magnitude(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

/// Relative change between two spacing values, `None` if either is unparsable or old is zero
#[must_use]
pub fn relative_change(old: &Value, new: &Value) -> Option<f64> {
    let old = parse_magnitude(old)?;
    let new = parse_magnitude(new)?;
    if old == 0.0 {
        return None;
    }
    Some((new - old).abs() / old.abs())
}

/// Whether a modification in this category is significant enough to break consumers
#[must_use]
pub fn is_significant(category: &str, old: &Value, new: &Value) -> bool {
    match CategoryKind::of(category) {
        // Equality only; no perceptual color distance
        CategoryKind::Color | CategoryKind::Typography => old != new,
        CategoryKind::Spacing => match relative_change(old, new) {
            Some(change) => change > SPACING_THRESHOLD,
            None => true,
        },
        CategoryKind::Other => false,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn removal(change: &TokenChange) -> BreakingChange {
    let high = change.token_type == TokenType::Primitive
        || matches!(CategoryKind::of(&change.category), CategoryKind::Color | CategoryKind::Spacing);
    BreakingChange {
        id: BreakingChange::generate_id(BreakingChangeType::TokenRemoved, &change.path),
        change_type: BreakingChangeType::TokenRemoved,
        description: format!("Token '{}' was removed", change.path),
        impact: if high { Impact::High } else { Impact::Medium },
        token: change.path.clone(),
        old_value: change.old_value.clone(),
        new_value: None,
        migration_path: format!(
            "Remove usages of '{}' or replace them with an equivalent {} token{}",
            change.path,
            change.category,
            change
                .old_value
                .as_ref()
                .map(|v| format!(" (previous value: {})", display_value(v)))
                .unwrap_or_default()
        ),
        automatable: false,
        estimated_effort: if change.token_type == TokenType::Primitive {
            Effort::High
        } else {
            Effort::Medium
        },
    }
}

fn restructure(change: &TokenChange, children: &[&str]) -> BreakingChange {
    let preview = children.iter().take(3).copied().collect::<Vec<_>>().join(", ");
    BreakingChange {
        id: BreakingChange::generate_id(BreakingChangeType::StructureChanged, &change.path),
        change_type: BreakingChangeType::StructureChanged,
        description: format!(
            "Token '{}' became a category with {} child token(s)",
            change.path,
            children.len()
        ),
        impact: Impact::High,
        token: change.path.clone(),
        old_value: change.old_value.clone(),
        new_value: None,
        migration_path: format!(
            "'{}' is now a group; pick one of its children instead: {}",
            change.path, preview
        ),
        automatable: false,
        estimated_effort: Effort::High,
    }
}

fn rename(rename: &TokenRename) -> BreakingChange {
    BreakingChange {
        id: BreakingChange::generate_id(BreakingChangeType::TokenRenamed, &rename.old_path),
        change_type: BreakingChangeType::TokenRenamed,
        description: format!(
            "Token '{}' was renamed to '{}' ({:.0}% confidence)",
            rename.old_path,
            rename.new_path,
            rename.confidence * 100.0
        ),
        impact: if rename.confidence >= CONFIDENT_RENAME {
            Impact::Low
        } else {
            Impact::Medium
        },
        token: rename.old_path.clone(),
        old_value: Some(rename.value.clone()),
        new_value: Some(rename.value.clone()),
        migration_path: format!("Replace '{}' with '{}'", rename.old_path, rename.new_path),
        automatable: true,
        estimated_effort: Effort::Minimal,
    }
}

fn modification(change: &TokenChange) -> Option<BreakingChange> {
    let (old, new) = (change.old_value.as_ref()?, change.new_value.as_ref()?);
    let kind = CategoryKind::of(&change.category);
    if kind == CategoryKind::Other {
        return None;
    }

    // Spacing values that both parse are judged by magnitude, whatever their JSON kind
    let magnitude = match kind {
        CategoryKind::Spacing => relative_change(old, new),
        _ => None,
    };

    if magnitude.is_none() && value_kind(old) != value_kind(new) {
        return Some(BreakingChange {
            id: BreakingChange::generate_id(BreakingChangeType::FormatChanged, &change.path),
            change_type: BreakingChangeType::FormatChanged,
            description: format!(
                "Token '{}' changed format from {} to {}",
                change.path,
                value_kind(old),
                value_kind(new)
            ),
            impact: Impact::High,
            token: change.path.clone(),
            old_value: Some(old.clone()),
            new_value: Some(new.clone()),
            migration_path: format!(
                "Update consumers of '{}' that parse its value as a {}",
                change.path,
                value_kind(old)
            ),
            automatable: false,
            estimated_effort: Effort::Medium,
        });
    }

    if !is_significant(&change.category, old, new) {
        debug!("{} changed within tolerance", change.path);
        return None;
    }

    let impact = match kind {
        CategoryKind::Spacing => match magnitude {
            Some(c) if c <= SPACING_HIGH_IMPACT => Impact::Medium,
            _ => Impact::High,
        },
        _ => Impact::Medium,
    };

    Some(BreakingChange {
        id: BreakingChange::generate_id(BreakingChangeType::ValueChanged, &change.path),
        change_type: BreakingChangeType::ValueChanged,
        description: format!(
            "Token '{}' changed from {} to {}",
            change.path,
            display_value(old),
            display_value(new)
        ),
        impact,
        token: change.path.clone(),
        old_value: Some(old.clone()),
        new_value: Some(new.clone()),
        migration_path: format!(
            "Review components using '{}'; pin {} locally if the old look must be kept",
            change.path,
            display_value(old)
        ),
        automatable: false,
        estimated_effort: Effort::Low,
    })
}

/// Classify a filtered diff into breaking changes
#[must_use]
pub fn classify(filtered: &FilteredDiff) -> Vec<BreakingChange> {
    let mut changes = Vec::new();

    for removed in &filtered.diff.removed {
        let prefix = format!("{}.", removed.path);
        let children: Vec<&str> = filtered
            .diff
            .added
            .iter()
            .map(|c| c.path.as_str())
            .filter(|p| p.starts_with(&prefix))
            .collect();

        if children.is_empty() {
            changes.push(removal(removed));
        } else {
            changes.push(restructure(removed, &children));
        }
    }

    changes.extend(filtered.renames.iter().map(rename));
    changes.extend(filtered.diff.modified.iter().filter_map(modification));

    changes
}

/// Suggested semantic-version bump
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bump {
    /// Backwards-compatible fixes only
    Patch,
    /// New tokens, nothing broken
    Minor,
    /// Breaking changes
    Major,
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        })
    }
}

/// Totals over a set of breaking changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of breaking changes
    pub total: usize,
    /// Count per impact level
    pub by_impact: BTreeMap<String, usize>,
    /// Count per change kind
    pub by_type: BTreeMap<String, usize>,
    /// How many can be migrated mechanically
    pub automatable: usize,
    /// Whether any breaking change exists
    pub has_breaking: bool,
    /// Most severe impact present
    pub highest_impact: Option<Impact>,
    /// Bump the changes call for
    pub recommended_bump: Bump,
}

impl ReportSummary {
    /// Summarise breaking changes against the diff they came from
    #[must_use]
    pub fn from_changes(changes: &[BreakingChange], diff: &TokenDiff) -> Self {
        let mut by_impact = BTreeMap::new();
        let mut by_type = BTreeMap::new();
        for change in changes {
            *by_impact.entry(change.impact.as_str().to_string()).or_insert(0) += 1;
            *by_type.entry(change.change_type.as_str().to_string()).or_insert(0) += 1;
        }

        let recommended_bump = if !changes.is_empty() {
            Bump::Major
        } else if !diff.added.is_empty() {
            Bump::Minor
        } else {
            Bump::Patch
        };

        Self {
            total: changes.len(),
            by_impact,
            by_type,
            automatable: changes.iter().filter(|c| c.automatable).count(),
            has_breaking: !changes.is_empty(),
            highest_impact: changes.iter().map(|c| c.impact).max(),
            recommended_bump,
        }
    }
}

/// Full comparison of two token sets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakingChangeReport {
    /// Older version label
    pub from_version: String,
    /// Newer version label
    pub to_version: String,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// Diff with renamed tokens removed
    pub diff: TokenDiff,
    /// Detected renames
    pub renames: Vec<TokenRename>,
    /// Breaking changes
    pub breaking_changes: Vec<BreakingChange>,
    /// Totals
    pub summary: ReportSummary,
}

impl BreakingChangeReport {
    /// Compare two flattened token sets end to end
    #[must_use]
    pub fn generate(from_version: &str, to_version: &str, from: &TokenMap, to: &TokenMap, threshold: f64) -> Self {
        let filtered = compare(from, to, threshold);
        let breaking_changes = classify(&filtered);
        let summary = ReportSummary::from_changes(&breaking_changes, &filtered.diff);

        Self {
            from_version: from_version.to_string(),
            to_version: to_version.to_string(),
            generated_at: Utc::now(),
            diff: filtered.diff,
            renames: filtered.renames,
            breaking_changes,
            summary,
        }
    }

    /// Whether any breaking change was found
    #[must_use]
    pub fn has_breaking(&self) -> bool {
        self.summary.has_breaking
    }

    /// Add breaking changes found outside the token diff, refreshing the summary
    pub fn extend(&mut self, extra: impl IntoIterator<Item = BreakingChange>) {
        self.breaking_changes.extend(extra);
        self.summary = ReportSummary::from_changes(&self.breaking_changes, &self.diff);
    }

    /// Replace the build-changed records, refreshing the summary
    pub fn set_build_changes(&mut self, changes: Vec<BreakingChange>) {
        self.breaking_changes
            .retain(|c| c.change_type != BreakingChangeType::BuildChanged);
        self.extend(changes);
    }
}

/// Build-changed records for platforms supported `before` and missing `after`
#[must_use]
pub fn dropped_platforms(before: &BTreeMap<String, bool>, after: &BTreeMap<String, bool>) -> Vec<BreakingChange> {
    before
        .iter()
        .filter(|(name, supported)| **supported && !after.get(*name).copied().unwrap_or(false))
        .map(|(name, _)| platform_dropped(name))
        .collect()
}

/// Breaking change for a platform whose build output disappeared
#[must_use]
pub fn platform_dropped(platform: &str) -> BreakingChange {
    BreakingChange {
        id: BreakingChange::generate_id(BreakingChangeType::BuildChanged, platform),
        change_type: BreakingChangeType::BuildChanged,
        description: format!("Platform '{platform}' is no longer produced by the build"),
        impact: Impact::Critical,
        token: platform.to_string(),
        old_value: None,
        new_value: None,
        migration_path: format!(
            "Stay on the previous version for {platform} or switch to another platform output"
        ),
        automatable: false,
        estimated_effort: Effort::Extensive,
    }
}
