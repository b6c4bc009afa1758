// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Token trees: loading from disk and flattening to dot paths

use crate::error::TokenError;
use crate::types::{Deprecation, TokenMap};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Key that marks an object as a token leaf
pub const VALUE_KEY: &str = "value";

/// Whether a node is a token leaf (`{ value, ... }`)
#[must_use]
pub fn is_leaf(node: &Value) -> bool {
    matches!(node, Value::Object(map) if map.contains_key(VALUE_KEY))
}

/// Flatten a token tree into a dot-path map.
///
/// Objects with a `value` key are leaves and yield just that value. Other
/// objects are categories and are descended into. Scalars and arrays found
/// in category position are kept as-is, so flattening an already-flat map
/// returns it unchanged.
#[must_use]
pub fn flatten(tree: &Value) -> TokenMap {
    let mut out = TokenMap::new();
    match tree {
        Value::Object(map) if !is_leaf(tree) => {
            for (key, child) in map {
                flatten_into(child, key, &mut out);
            }
        }
        _ => {}
    }
    out
}

fn flatten_into(node: &Value, path: &str, out: &mut TokenMap) {
    match node {
        Value::Object(map) => {
            if let Some(value) = map.get(VALUE_KEY) {
                out.insert(path.to_string(), value.clone());
            } else {
                for (key, child) in map {
                    flatten_into(child, &format!("{path}.{key}"), out);
                }
            }
        }
        other => {
            out.insert(path.to_string(), other.clone());
        }
    }
}

/// Count the leaves of a token tree, by the same rule `flatten` uses
#[must_use]
pub fn count_leaves(tree: &Value) -> usize {
    fn count(node: &Value) -> usize {
        match node {
            Value::Object(map) if !map.contains_key(VALUE_KEY) => map.values().map(count).sum(),
            _ => 1,
        }
    }
    match tree {
        Value::Object(map) if !is_leaf(tree) => map.values().map(count).sum(),
        _ => 0,
    }
}

/// Collect leaves marked `deprecated: true`
#[must_use]
pub fn collect_deprecations(tree: &Value) -> Vec<Deprecation> {
    fn walk(node: &Value, path: &str, out: &mut Vec<Deprecation>) {
        let Value::Object(map) = node else { return };
        if map.contains_key(VALUE_KEY) {
            if map.get("deprecated").and_then(Value::as_bool) == Some(true) {
                out.push(Deprecation {
                    token: path.to_string(),
                    comment: map.get("comment").and_then(Value::as_str).map(String::from),
                    replacement: map
                        .get("replacement")
                        .or_else(|| map.get("replacedBy"))
                        .and_then(Value::as_str)
                        .map(String::from),
                });
            }
            return;
        }
        for (key, child) in map {
            let child_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{path}.{key}")
            };
            walk(child, &child_path, out);
        }
    }

    let mut out = Vec::new();
    walk(tree, "", &mut out);
    out
}

/// Deep-merge `other` into `base`; objects merge key by key, anything else overwrites
pub fn merge(base: &mut Value, other: Value) {
    match (base, other) {
        (Value::Object(base_map), Value::Object(other_map)) => {
            for (key, value) in other_map {
                match base_map.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge(existing, value);
                    }
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// How the loader treats malformed files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// The first malformed file aborts the load
    #[default]
    Strict,
    /// Malformed files are logged and skipped
    Lenient,
}

/// Whether a path looks like a token source file
#[must_use]
pub fn is_token_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

/// Token source files under a directory, sorted by path
pub fn token_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() && is_token_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Parse one token source file into a tree
pub fn parse_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let parsed: Result<Value, String> = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
        _ => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
    };

    let tree = parsed.map_err(|message| TokenError::Parse {
        path: path.to_path_buf(),
        message,
    })?;

    // An empty YAML document parses to null
    Ok(if tree.is_null() {
        Value::Object(Map::new())
    } else {
        tree
    })
}

/// Load every token file under `dir` into one merged tree
pub fn load_tree(dir: &Path, mode: LoadMode) -> Result<Value> {
    let mut tree = Value::Object(Map::new());
    if !dir.exists() {
        debug!("Token directory {} does not exist", dir.display());
        return Ok(tree);
    }

    for file in token_files(dir)? {
        match parse_file(&file) {
            Ok(parsed) => {
                debug!("Loaded {}", file.display());
                merge(&mut tree, parsed);
            }
            Err(e) if mode == LoadMode::Lenient => {
                warn!("Skipping {}: {:#}", file.display(), e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(tree)
}
