// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for flattening, diffing and rename detection
//!
//! These tests verify critical invariants:
//! 1. Flattening - one entry per leaf, flat maps pass through unchanged
//! 2. Diff symmetry - swapping the sides swaps added and removed
//! 3. Rename detection - confidence bounds and one-to-one matching

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use tokenyard::breaking::{is_significant, BreakingChangeReport};
use tokenyard::diff::{compare, diff_tokens, path_similarity, DEFAULT_RENAME_THRESHOLD};
use tokenyard::metadata::SemVer;
use tokenyard::tokens::{count_leaves, flatten};
use tokenyard::types::{BreakingChangeType, TokenChange, TokenCounts, TokenMap};

// =============================================================================
// Strategies
// =============================================================================

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z0-9#]{1,8}".prop_map(|s| json!({ "value": s })),
        (0i64..100).prop_map(|n| json!({ "value": n, "comment": "n" })),
    ]
}

fn node() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 32, 4, |inner| {
        prop::collection::btree_map("[a-u]{1,6}", inner, 1..4)
            .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>()))
    })
}

fn tree() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-u]{1,6}", node(), 0..4)
        .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>()))
}

fn flat_map() -> impl Strategy<Value = TokenMap> {
    prop::collection::btree_map("[a-c]{1,2}\\.[a-c]{1,2}", "[0-3]{1}".prop_map(Value::from), 0..12)
}

/// Count `{ value }` leaves independently of the library
fn leaves(node: &Value) -> usize {
    match node {
        Value::Object(map) if map.contains_key("value") => 1,
        Value::Object(map) => map.values().map(leaves).sum(),
        _ => 1,
    }
}

fn paths(changes: &[TokenChange]) -> BTreeSet<String> {
    changes.iter().map(|c| c.path.clone()).collect()
}

// =============================================================================
// Flattening
// =============================================================================

proptest! {
    #[test]
    fn flatten_has_one_entry_per_leaf(t in tree()) {
        let expected: usize = t.as_object().unwrap().values().map(leaves).sum();
        prop_assert_eq!(flatten(&t).len(), expected);
        prop_assert_eq!(count_leaves(&t), expected);
    }

    #[test]
    fn token_counts_agree_with_leaf_count(t in tree()) {
        let counts = TokenCounts::from_map(&flatten(&t));
        prop_assert_eq!(counts.total, count_leaves(&t));
        prop_assert_eq!(counts.by_category.values().sum::<usize>(), counts.total);
    }

    #[test]
    fn flatten_is_idempotent_on_flat_maps(m in flat_map()) {
        let as_tree = Value::Object(m.clone().into_iter().collect::<Map<_, _>>());
        let once = flatten(&as_tree);
        prop_assert_eq!(&once, &m);

        let again = flatten(&Value::Object(once.clone().into_iter().collect::<Map<_, _>>()));
        prop_assert_eq!(again, once);
    }

    #[test]
    fn diff_is_symmetric(a in flat_map(), b in flat_map()) {
        let forward = diff_tokens(&a, &b);
        let backward = diff_tokens(&b, &a);

        prop_assert_eq!(paths(&forward.added), paths(&backward.removed));
        prop_assert_eq!(paths(&forward.removed), paths(&backward.added));
        prop_assert_eq!(paths(&forward.modified), paths(&backward.modified));
    }

    #[test]
    fn diff_values_swap_sides(a in flat_map(), b in flat_map()) {
        let forward = diff_tokens(&a, &b);
        let backward = diff_tokens(&b, &a);

        let added: Vec<_> = forward.added.iter().map(|c| (&c.path, &c.new_value)).collect();
        let removed: Vec<_> = backward.removed.iter().map(|c| (&c.path, &c.old_value)).collect();
        prop_assert_eq!(added, removed);

        for (f, b) in forward.modified.iter().zip(&backward.modified) {
            prop_assert_eq!(&f.path, &b.path);
            prop_assert_eq!(&f.old_value, &b.new_value);
            prop_assert_eq!(&f.new_value, &b.old_value);
        }
    }

    #[test]
    fn diff_against_self_is_empty(a in flat_map()) {
        prop_assert!(diff_tokens(&a, &a).is_empty());
    }

    #[test]
    fn renames_are_one_to_one_and_bounded(a in flat_map(), b in flat_map()) {
        let result = compare(&a, &b, DEFAULT_RENAME_THRESHOLD);

        let olds: BTreeSet<_> = result.renames.iter().map(|r| r.old_path.clone()).collect();
        let news: BTreeSet<_> = result.renames.iter().map(|r| r.new_path.clone()).collect();
        prop_assert_eq!(olds.len(), result.renames.len());
        prop_assert_eq!(news.len(), result.renames.len());

        for rename in &result.renames {
            prop_assert!(rename.confidence > DEFAULT_RENAME_THRESHOLD);
            prop_assert!(rename.confidence <= 1.0);
            prop_assert_eq!(&a[&rename.old_path], &b[&rename.new_path]);
            prop_assert!(!paths(&result.diff.removed).contains(&rename.old_path));
            prop_assert!(!paths(&result.diff.added).contains(&rename.new_path));
        }
    }

    #[test]
    fn rename_detection_is_deterministic(a in flat_map(), b in flat_map()) {
        let first = compare(&a, &b, DEFAULT_RENAME_THRESHOLD);
        let second = compare(&a, &b, DEFAULT_RENAME_THRESHOLD);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn semver_display_parses_back(major in 0u64..50, minor in 0u64..50, patch in 0u64..50, pre in proptest::option::of("[a-z]{1,5}(\\.[0-9]{1,2})?")) {
        let v = SemVer { major, minor, patch, prerelease: pre, build: None };
        prop_assert_eq!(SemVer::parse(&v.to_string()).unwrap(), v);
    }
}

// =============================================================================
// Named scenarios
// =============================================================================

fn map(entries: &[(&str, Value)]) -> TokenMap {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

#[test]
fn test_identical_path_confidence_is_one() {
    let score = path_similarity("colors.brand.purple", "colors.brand.purple");
    assert!((score - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_dissimilar_paths_with_equal_values_are_not_renames() {
    let from = map(&[("colors.a", json!("#fff"))]);
    let to = map(&[("spacing.z", json!("#fff"))]);

    let result = compare(&from, &to, DEFAULT_RENAME_THRESHOLD);

    assert!(result.renames.is_empty());
    assert!(path_similarity("colors.a", "spacing.z") <= DEFAULT_RENAME_THRESHOLD);
}

#[test]
fn test_similarity_at_threshold_is_not_a_rename() {
    let score = path_similarity("ab", "ax");
    assert!((score - DEFAULT_RENAME_THRESHOLD).abs() < f64::EPSILON);

    let result = compare(
        &map(&[("ab", json!("#fff"))]),
        &map(&[("ax", json!("#fff"))]),
        DEFAULT_RENAME_THRESHOLD,
    );

    assert!(result.renames.is_empty());
    assert_eq!(paths(&result.diff.removed), BTreeSet::from(["ab".to_string()]));
    assert_eq!(paths(&result.diff.added), BTreeSet::from(["ax".to_string()]));
}

#[test]
fn test_spacing_twenty_percent_boundary() {
    assert!(!is_significant("spacing", &json!("10px"), &json!("12px")));

    let report = BreakingChangeReport::generate(
        "1.0.0",
        "1.1.0",
        &map(&[("spacing.md", json!("10px"))]),
        &map(&[("spacing.md", json!("12px"))]),
        DEFAULT_RENAME_THRESHOLD,
    );
    assert!(!report.has_breaking());
    assert_eq!(report.diff.modified.len(), 1);
}

#[test]
fn test_end_to_end_rename_from_trees() {
    let from_tokens = json!({ "colors": { "brand": { "purple": { "value": "#7B00FF" } } } });
    let to_tokens = json!({ "colors": { "brand": { "purpleNew": { "value": "#7B00FF" } } } });

    let report = BreakingChangeReport::generate(
        "1.0.0",
        "2.0.0",
        &flatten(&from_tokens),
        &flatten(&to_tokens),
        DEFAULT_RENAME_THRESHOLD,
    );

    assert_eq!(report.renames.len(), 1);
    assert_eq!(report.renames[0].old_path, "colors.brand.purple");
    assert_eq!(report.renames[0].new_path, "colors.brand.purpleNew");
    assert!(report.renames[0].confidence > 0.8);
    assert!(report.diff.removed.is_empty());
    assert!(report.diff.added.is_empty());
    assert_eq!(report.breaking_changes.len(), 1);
    assert_eq!(report.breaking_changes[0].change_type, BreakingChangeType::TokenRenamed);
}

#[test]
fn test_added_only_is_not_breaking_removed_is() {
    let base = map(&[("colors.red", json!("#f00"))]);
    let added = map(&[("colors.red", json!("#f00")), ("colors.blue", json!("#00f"))]);

    let report = BreakingChangeReport::generate("a", "b", &base, &added, DEFAULT_RENAME_THRESHOLD);
    assert!(!report.has_breaking());

    let report = BreakingChangeReport::generate("b", "a", &added, &base, DEFAULT_RENAME_THRESHOLD);
    assert!(report.has_breaking());
    assert_eq!(report.breaking_changes[0].change_type, BreakingChangeType::TokenRemoved);
}
