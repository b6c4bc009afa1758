// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Token set diffing and rename detection

use crate::types::{category_of, TokenChange, TokenMap, TokenRename};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Minimum similarity for a removed/added pair to count as a rename
pub const DEFAULT_RENAME_THRESHOLD: f64 = 0.5;

/// Weight of the segment-by-segment bonus when segment counts match
const STRUCTURE_BONUS: f64 = 0.3;

/// Added, removed and modified tokens between two token sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenDiff {
    /// Present only in the newer set
    pub added: Vec<TokenChange>,
    /// Present only in the older set
    pub removed: Vec<TokenChange>,
    /// Present in both with different values
    pub modified: Vec<TokenChange>,
}

impl TokenDiff {
    /// Whether the two sets were identical
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Total number of changes
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Structural value equality
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    a == b
}

/// Compare two flattened token sets
#[must_use]
pub fn diff_tokens(from: &TokenMap, to: &TokenMap) -> TokenDiff {
    let mut diff = TokenDiff::default();

    for (path, old) in from {
        match to.get(path) {
            None => diff.removed.push(TokenChange::new(path, Some(old.clone()), None)),
            Some(new) if !values_equal(old, new) => diff
                .modified
                .push(TokenChange::new(path, Some(old.clone()), Some(new.clone()))),
            Some(_) => {}
        }
    }

    for (path, new) in to {
        if !from.contains_key(path) {
            diff.added.push(TokenChange::new(path, None, Some(new.clone())));
        }
    }

    diff
}

/// Normalised Levenshtein similarity of two strings (1.0 = identical)
#[must_use]
pub fn string_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = strsim::levenshtein(a, b) as f64 / max_len as f64;
    1.0 - ratio
}

/// Path similarity: string similarity plus a bonus for matching segments, capped at 1.0
#[must_use]
pub fn path_similarity(old_path: &str, new_path: &str) -> f64 {
    let mut score = string_similarity(old_path, new_path);

    let old_segments: Vec<&str> = old_path.split('.').collect();
    let new_segments: Vec<&str> = new_path.split('.').collect();
    if old_segments.len() == new_segments.len() {
        let matching = old_segments
            .iter()
            .zip(&new_segments)
            .filter(|(a, b)| a == b)
            .count();
        #[allow(clippy::cast_precision_loss)]
        let bonus = STRUCTURE_BONUS * matching as f64 / old_segments.len() as f64;
        score += bonus;
    }

    score.min(1.0)
}

/// Pair removed tokens with added tokens that carry the same value under a similar path.
///
/// Candidates are ranked by confidence, ties broken by old path then new
/// path, and accepted greedily so each path is used at most once.
#[must_use]
pub fn detect_renames(removed: &[TokenChange], added: &[TokenChange], threshold: f64) -> Vec<TokenRename> {
    let mut candidates = Vec::new();

    for old in removed {
        let Some(old_value) = old.old_value.as_ref() else { continue };
        for new in added {
            let Some(new_value) = new.new_value.as_ref() else { continue };
            if !values_equal(old_value, new_value) {
                continue;
            }
            let confidence = path_similarity(&old.path, &new.path);
            if confidence > threshold {
                candidates.push(TokenRename {
                    old_path: old.path.clone(),
                    new_path: new.path.clone(),
                    value: old_value.clone(),
                    category: category_of(&old.path).to_string(),
                    confidence,
                });
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.old_path.cmp(&b.old_path))
            .then_with(|| a.new_path.cmp(&b.new_path))
    });

    let mut used_old = HashSet::new();
    let mut used_new = HashSet::new();
    let mut renames = Vec::new();
    for candidate in candidates {
        if used_old.contains(&candidate.old_path) || used_new.contains(&candidate.new_path) {
            continue;
        }
        debug!(
            "Rename {} -> {} ({:.2})",
            candidate.old_path, candidate.new_path, candidate.confidence
        );
        used_old.insert(candidate.old_path.clone());
        used_new.insert(candidate.new_path.clone());
        renames.push(candidate);
    }

    renames
}

/// A diff with renamed tokens pulled out of the added/removed lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredDiff {
    /// Remaining added/removed/modified tokens
    pub diff: TokenDiff,
    /// Detected renames
    pub renames: Vec<TokenRename>,
}

/// Detect renames and drop the matched tokens from the diff
#[must_use]
pub fn apply_renames(mut diff: TokenDiff, threshold: f64) -> FilteredDiff {
    let renames = detect_renames(&diff.removed, &diff.added, threshold);

    let renamed_old: HashSet<&str> = renames.iter().map(|r| r.old_path.as_str()).collect();
    let renamed_new: HashSet<&str> = renames.iter().map(|r| r.new_path.as_str()).collect();
    diff.removed.retain(|c| !renamed_old.contains(c.path.as_str()));
    diff.added.retain(|c| !renamed_new.contains(c.path.as_str()));

    FilteredDiff { diff, renames }
}

/// Diff two token sets and detect renames in one step
#[must_use]
pub fn compare(from: &TokenMap, to: &TokenMap, threshold: f64) -> FilteredDiff {
    apply_renames(diff_tokens(from, to), threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(entries: &[(&str, Value)]) -> TokenMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_diff_added_removed_modified() {
        let from = map(&[("colors.a", json!("#000")), ("colors.b", json!("#111"))]);
        let to = map(&[("colors.b", json!("#222")), ("colors.c", json!("#333"))]);

        let diff = diff_tokens(&from, &to);

        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].path, "colors.c");
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].path, "colors.a");
        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.modified[0].old_value, Some(json!("#111")));
        assert_eq!(diff.modified[0].new_value, Some(json!("#222")));
    }

    #[test]
    fn test_diff_compares_objects_structurally() {
        let from = map(&[("shadow.card", json!({ "x": 0, "y": 2 }))]);
        let to = map(&[("shadow.card", json!({ "y": 2, "x": 0 }))]);

        assert!(diff_tokens(&from, &to).is_empty());
    }

    #[test]
    fn test_change_type_inference() {
        let to = map(&[
            ("semantic.text.primary", json!("#000")),
            ("component.button.bg", json!("#fff")),
            ("colors.red", json!("#f00")),
        ]);
        let diff = diff_tokens(&TokenMap::new(), &to);

        let kinds: Vec<_> = diff.added.iter().map(|c| (c.path.as_str(), c.token_type)).collect();
        assert!(kinds.contains(&("semantic.text.primary", crate::types::TokenType::Semantic)));
        assert!(kinds.contains(&("component.button.bg", crate::types::TokenType::Component)));
        assert!(kinds.contains(&("colors.red", crate::types::TokenType::Primitive)));
    }

    #[test]
    fn test_identical_paths_score_one() {
        assert!((path_similarity("colors.brand.purple", "colors.brand.purple") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dissimilar_paths_not_renamed() {
        let from = map(&[("colors.a", json!("#fff"))]);
        let to = map(&[("spacing.z", json!("#fff"))]);

        let result = compare(&from, &to, DEFAULT_RENAME_THRESHOLD);

        assert!(result.renames.is_empty());
        assert_eq!(result.diff.removed.len(), 1);
        assert_eq!(result.diff.added.len(), 1);
    }

    #[test]
    fn test_rename_detected_and_filtered() {
        let from = map(&[("colors.brand.purple", json!("#7B00FF"))]);
        let to = map(&[("colors.brand.purpleNew", json!("#7B00FF"))]);

        let result = compare(&from, &to, DEFAULT_RENAME_THRESHOLD);

        assert_eq!(result.renames.len(), 1);
        assert_eq!(result.renames[0].old_path, "colors.brand.purple");
        assert_eq!(result.renames[0].new_path, "colors.brand.purpleNew");
        assert!(result.renames[0].confidence > 0.8);
        assert!(result.diff.removed.is_empty());
        assert!(result.diff.added.is_empty());
    }

    #[test]
    fn test_rename_requires_equal_values() {
        let from = map(&[("colors.brand.purple", json!("#7B00FF"))]);
        let to = map(&[("colors.brand.purpleNew", json!("#7B00FE"))]);

        assert!(compare(&from, &to, DEFAULT_RENAME_THRESHOLD).renames.is_empty());
    }

    #[test]
    fn test_each_path_matched_once() {
        let from = map(&[("colors.gray1", json!("#ccc")), ("colors.gray2", json!("#ccc"))]);
        let to = map(&[("colors.grey1", json!("#ccc"))]);

        let result = compare(&from, &to, DEFAULT_RENAME_THRESHOLD);

        assert_eq!(result.renames.len(), 1);
        assert_eq!(result.renames[0].old_path, "colors.gray1");
        assert_eq!(result.diff.removed.len(), 1);
        assert_eq!(result.diff.removed[0].path, "colors.gray2");
    }

    #[test]
    fn test_ties_broken_by_path_order() {
        // Both candidates score the same; the lexically smaller old path wins
        let from = map(&[("colors.b1", json!(1)), ("colors.a1", json!(1))]);
        let to = map(&[("colors.c1", json!(1))]);

        let result = compare(&from, &to, DEFAULT_RENAME_THRESHOLD);

        assert_eq!(result.renames.len(), 1);
        assert_eq!(result.renames[0].old_path, "colors.a1");
    }
}
