// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! On-disk version yard: `versions/v<semver>/` archives and the `active/` working set

use crate::error::TokenError;
use crate::metadata::SemVer;
use crate::tokens::{self, LoadMode};
use crate::types::{FileDigest, TokenMap, VersionMetadata};
use anyhow::{Context, Result};
use lru::LruCache;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File name of a metadata record
pub const METADATA_FILE: &str = "metadata.json";

/// Name accepted on the CLI for the working set
pub const ACTIVE: &str = "active";

/// Where a token set lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// `active/source`
    Active,
    /// `versions/v<semver>/tokens`
    Version(SemVer),
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str(ACTIVE),
            Self::Version(v) => write!(f, "{v}"),
        }
    }
}

/// A loaded token set: the merged tree and its flattened form
#[derive(Debug, Clone)]
pub struct TokenSet {
    /// Merged source tree
    pub tree: Value,
    /// Dot-path map
    pub tokens: TokenMap,
}

/// Contents written into a new version directory
pub struct Archive<'a> {
    /// Metadata record
    pub metadata: &'a VersionMetadata,
    /// Rendered migration guide
    pub guide: &'a str,
    /// Token sources to copy into `tokens/`
    pub source_dir: &'a Path,
    /// Build outputs to copy into `build/`
    pub build_dir: &'a Path,
}

/// The version yard rooted at a token directory
pub struct VersionStore {
    root: PathBuf,
    cache: LruCache<PathBuf, Rc<TokenSet>>,
}

impl VersionStore {
    /// Open a store; nothing is created until something is written
    #[must_use]
    pub fn new(root: &Path, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            root: root.to_path_buf(),
            cache: LruCache::new(capacity),
        }
    }

    /// Token root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `versions/`
    #[must_use]
    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    /// `versions/v<semver>/`
    #[must_use]
    pub fn version_dir(&self, version: &SemVer) -> PathBuf {
        self.versions_dir().join(version.dir_name())
    }

    /// `active/`
    #[must_use]
    pub fn active_dir(&self) -> PathBuf {
        self.root.join(ACTIVE)
    }

    /// `active/source/`
    #[must_use]
    pub fn active_source_dir(&self) -> PathBuf {
        self.active_dir().join("source")
    }

    /// `active/build/`
    #[must_use]
    pub fn active_build_dir(&self) -> PathBuf {
        self.active_dir().join("build")
    }

    /// `active/CHANGELOG.md`
    #[must_use]
    pub fn changelog_path(&self) -> PathBuf {
        self.active_dir().join("CHANGELOG.md")
    }

    /// Directory holding the token files of a source
    #[must_use]
    pub fn tokens_dir(&self, source: &TokenSource) -> PathBuf {
        match source {
            TokenSource::Active => self.active_source_dir(),
            TokenSource::Version(v) => self.version_dir(v).join("tokens"),
        }
    }

    /// Archived versions, oldest first
    pub fn list_versions(&self) -> Result<Vec<SemVer>> {
        let dir = self.versions_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(stripped) = name.strip_prefix('v') else {
                continue;
            };
            match SemVer::parse(stripped) {
                Ok(v) => versions.push(v),
                Err(_) => debug!("Ignoring {}", name),
            }
        }

        versions.sort();
        Ok(versions)
    }

    /// Newest archived version
    pub fn latest_version(&self) -> Result<Option<SemVer>> {
        Ok(self.list_versions()?.pop())
    }

    /// Resolve `1.2.3` or `v1.2.3` to an existing archived version
    pub fn resolve(&self, name: &str) -> Result<SemVer> {
        let version = SemVer::parse(name.strip_prefix('v').unwrap_or(name))?;
        if !self.version_dir(&version).is_dir() {
            return Err(TokenError::VersionNotFound(version.to_string()).into());
        }
        Ok(version)
    }

    /// Resolve a CLI name to a token source; `active` names the working set
    pub fn resolve_source(&self, name: &str) -> Result<TokenSource> {
        if name == ACTIVE {
            if !self.active_dir().is_dir() {
                return Err(TokenError::VersionNotFound(ACTIVE.to_string()).into());
            }
            Ok(TokenSource::Active)
        } else {
            Ok(TokenSource::Version(self.resolve(name)?))
        }
    }

    /// Metadata of an archived version
    pub fn load_metadata(&self, version: &SemVer) -> Result<VersionMetadata> {
        let path = self.version_dir(version).join(METADATA_FILE);
        if !path.exists() {
            return Err(TokenError::VersionNotFound(version.to_string()).into());
        }
        read_metadata(&path)
    }

    /// Metadata of the working set, if initialised
    pub fn load_active_metadata(&self) -> Result<Option<VersionMetadata>> {
        let path = self.active_dir().join(METADATA_FILE);
        if path.exists() {
            read_metadata(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Overwrite the working set's metadata
    pub fn save_active_metadata(&self, metadata: &VersionMetadata) -> Result<()> {
        let dir = self.active_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        write_metadata(&dir.join(METADATA_FILE), metadata)
    }

    /// Load a token set, served from the cache when already loaded
    pub fn load_tokens(&mut self, source: &TokenSource, mode: LoadMode) -> Result<Rc<TokenSet>> {
        let dir = self.tokens_dir(source);
        if let Some(set) = self.cache.get(&dir) {
            debug!("Token cache hit for {}", source);
            return Ok(Rc::clone(set));
        }

        let tree = tokens::load_tree(&dir, mode)
            .with_context(|| format!("Failed to load tokens for {source}"))?;
        let set = Rc::new(TokenSet {
            tokens: tokens::flatten(&tree),
            tree,
        });
        debug!("Loaded {} tokens for {}", set.tokens.len(), source);

        self.cache.put(dir, Rc::clone(&set));
        Ok(set)
    }

    /// Drop a cached token set after its files changed
    pub fn invalidate(&mut self, source: &TokenSource) {
        let dir = self.tokens_dir(source);
        self.cache.pop(&dir);
    }

    /// Write a version directory atomically.
    ///
    /// Everything goes into a staging directory first, which is renamed into
    /// place on success and removed on failure. With `force` an existing
    /// version directory is replaced.
    pub fn write_archive(&self, version: &SemVer, archive: &Archive<'_>, force: bool) -> Result<PathBuf> {
        let target = self.version_dir(version);
        if target.exists() && !force {
            return Err(TokenError::VersionExists(version.to_string()).into());
        }

        let staging = self.versions_dir().join(format!(".staging-{}", version.dir_name()));
        if staging.exists() {
            fs::remove_dir_all(&staging)
                .with_context(|| format!("Failed to clear {}", staging.display()))?;
        }

        let staged = stage_archive(&staging, archive);
        if let Err(e) = staged {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!("Failed to remove {}: {}", staging.display(), cleanup);
            }
            return Err(e);
        }

        if target.exists() {
            fs::remove_dir_all(&target)
                .with_context(|| format!("Failed to replace {}", target.display()))?;
        }
        fs::rename(&staging, &target)
            .with_context(|| format!("Failed to move archive into {}", target.display()))?;

        info!("Archived {} at {}", version, target.display());
        Ok(target)
    }

    /// Replace `active/source` and `active/build` with the contents of an archived version
    pub fn restore_version(&mut self, version: &SemVer) -> Result<()> {
        let version_dir = self.version_dir(version);
        replace_dir(&version_dir.join("tokens"), &self.active_source_dir())?;
        replace_dir(&version_dir.join("build"), &self.active_build_dir())?;
        self.invalidate(&TokenSource::Active);
        Ok(())
    }
}

/// Replace `target` with a copy of `from`, via a sibling staging directory
fn replace_dir(from: &Path, target: &Path) -> Result<()> {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let staging = target.with_file_name(format!(".restore-{name}"));

    if staging.exists() {
        fs::remove_dir_all(&staging)
            .with_context(|| format!("Failed to clear {}", staging.display()))?;
    }
    if let Err(e) = copy_dir(from, &staging) {
        if let Err(cleanup) = fs::remove_dir_all(&staging) {
            warn!("Failed to remove {}: {}", staging.display(), cleanup);
        }
        return Err(e);
    }

    if target.exists() {
        fs::remove_dir_all(target)
            .with_context(|| format!("Failed to clear {}", target.display()))?;
    }
    fs::rename(&staging, target)
        .with_context(|| format!("Failed to move files into {}", target.display()))
}

fn stage_archive(staging: &Path, archive: &Archive<'_>) -> Result<()> {
    fs::create_dir_all(staging)
        .with_context(|| format!("Failed to create directory {}", staging.display()))?;

    copy_dir(archive.source_dir, &staging.join("tokens"))?;
    copy_dir(archive.build_dir, &staging.join("build"))?;

    let migration = staging.join("migration");
    fs::create_dir_all(&migration)
        .with_context(|| format!("Failed to create directory {}", migration.display()))?;
    fs::write(migration.join("guide.md"), archive.guide)
        .with_context(|| format!("Failed to write {}", migration.join("guide.md").display()))?;

    write_metadata(&staging.join(METADATA_FILE), archive.metadata)
}

/// Read a metadata record
pub fn read_metadata(path: &Path) -> Result<VersionMetadata> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write a metadata record as pretty JSON
pub fn write_metadata(path: &Path, metadata: &VersionMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Recursively copy `src` into `dst`; a missing `src` yields an empty `dst`
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).with_context(|| format!("Failed to create directory {}", dst.display()))?;
    if !src.exists() {
        return Ok(());
    }

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory {}", target.display()))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {} to {}", entry.path().display(), target.display()))?;
        }
    }
    Ok(())
}

/// SHA-256 and size of every file under `dir`, sorted by relative path
pub fn hash_dir(dir: &Path) -> Result<Vec<FileDigest>> {
    let mut digests = Vec::new();
    if !dir.exists() {
        return Ok(digests);
    }

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let bytes = fs::read(entry.path())
            .with_context(|| format!("Failed to read {}", entry.path().display()))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);

        let relative = entry.path().strip_prefix(dir)?;
        digests.push(FileDigest {
            path: relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            sha256: hex::encode(hasher.finalize()),
            size: bytes.len() as u64,
        });
    }
    Ok(digests)
}

/// Which platforms have a non-empty `build/<platform>/` directory
#[must_use]
pub fn platform_support(build_dir: &Path, platforms: &[String]) -> BTreeMap<String, bool> {
    platforms
        .iter()
        .map(|p| {
            let dir = build_dir.join(p);
            let present = fs::read_dir(&dir)
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false);
            (p.clone(), present)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{create_metadata, MetadataOverrides};
    use tempfile::TempDir;

    fn seed_version(store: &VersionStore, version: &str, tokens: &str) {
        let v = SemVer::parse(version).unwrap();
        let dir = store.version_dir(&v);
        fs::create_dir_all(dir.join("tokens")).unwrap();
        fs::write(dir.join("tokens").join("tokens.yaml"), tokens).unwrap();
        let meta = create_metadata(version, MetadataOverrides::default()).unwrap();
        write_metadata(&dir.join(METADATA_FILE), &meta).unwrap();
    }

    #[test]
    fn test_list_versions_sorted() {
        let root = TempDir::new().unwrap();
        let store = VersionStore::new(root.path(), 4);
        seed_version(&store, "1.10.0", "a: 1\n");
        seed_version(&store, "1.2.0", "a: 1\n");
        seed_version(&store, "1.2.0-beta.1", "a: 1\n");
        fs::create_dir_all(store.versions_dir().join("not-a-version")).unwrap();

        let versions: Vec<String> = store.list_versions().unwrap().iter().map(ToString::to_string).collect();

        assert_eq!(versions, ["1.2.0-beta.1", "1.2.0", "1.10.0"]);
        assert_eq!(store.latest_version().unwrap().unwrap().to_string(), "1.10.0");
    }

    #[test]
    fn test_resolve_with_and_without_prefix() {
        let root = TempDir::new().unwrap();
        let store = VersionStore::new(root.path(), 4);
        seed_version(&store, "1.0.0", "a: 1\n");

        assert_eq!(store.resolve("1.0.0").unwrap(), SemVer::new(1, 0, 0));
        assert_eq!(store.resolve("v1.0.0").unwrap(), SemVer::new(1, 0, 0));

        let err = store.resolve("2.0.0").unwrap_err();
        assert!(matches!(err.downcast_ref::<TokenError>(), Some(TokenError::VersionNotFound(_))));
    }

    #[test]
    fn test_load_tokens_cached_until_invalidated() {
        let root = TempDir::new().unwrap();
        let mut store = VersionStore::new(root.path(), 2);
        fs::create_dir_all(store.active_source_dir()).unwrap();
        let file = store.active_source_dir().join("colors.yaml");
        fs::write(&file, "colors:\n  red:\n    value: '#f00'\n").unwrap();

        let first = store.load_tokens(&TokenSource::Active, LoadMode::Strict).unwrap();
        fs::write(&file, "colors:\n  red:\n    value: '#e00'\n").unwrap();
        let second = store.load_tokens(&TokenSource::Active, LoadMode::Strict).unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        store.invalidate(&TokenSource::Active);
        let third = store.load_tokens(&TokenSource::Active, LoadMode::Strict).unwrap();
        assert_eq!(third.tokens["colors.red"], serde_json::json!("#e00"));
    }

    #[test]
    fn test_write_archive_refuses_existing_without_force() {
        let root = TempDir::new().unwrap();
        let store = VersionStore::new(root.path(), 2);
        seed_version(&store, "1.0.0", "a: 1\n");

        let meta = create_metadata("1.0.0", MetadataOverrides::default()).unwrap();
        let source = root.path().join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("t.yaml"), "b: 2\n").unwrap();
        let archive = Archive {
            metadata: &meta,
            guide: "# Guide\n",
            source_dir: &source,
            build_dir: &root.path().join("no-build"),
        };

        let v = SemVer::new(1, 0, 0);
        assert!(store.write_archive(&v, &archive, false).is_err());

        let dir = store.write_archive(&v, &archive, true).unwrap();
        assert!(dir.join("tokens").join("t.yaml").exists());
        assert!(!dir.join("tokens").join("tokens.yaml").exists());
        assert!(dir.join("migration").join("guide.md").exists());
        assert!(dir.join("build").is_dir());
        assert!(!store.versions_dir().join(".staging-v1.0.0").exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_archive_leaves_no_staging() {
        let root = TempDir::new().unwrap();
        let store = VersionStore::new(root.path(), 2);

        // Fits under PATH_MAX at the source, but not once re-rooted under the staging dir
        let source = root.path().join("s");
        let mut deep = source.clone();
        while deep.as_os_str().len() + 101 < 3890 {
            deep.push("d".repeat(100));
        }
        let pad = 3890 - deep.as_os_str().len() - 1;
        if pad > 0 {
            deep.push("e".repeat(pad));
        }
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("t.json"), "{}").unwrap();

        let v = SemVer::parse(&format!("1.0.0-{}", "a".repeat(200))).unwrap();
        let meta = create_metadata(&v.to_string(), MetadataOverrides::default()).unwrap();
        let archive = Archive {
            metadata: &meta,
            guide: "# Guide\n",
            source_dir: &source,
            build_dir: &root.path().join("no-build"),
        };

        assert!(store.write_archive(&v, &archive, false).is_err());

        assert!(!store.version_dir(&v).exists());
        let leftovers: Vec<_> = fs::read_dir(store.versions_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert!(leftovers.is_empty(), "left behind: {leftovers:?}");
    }

    #[test]
    fn test_restore_version_replaces_active() {
        let root = TempDir::new().unwrap();
        let mut store = VersionStore::new(root.path(), 2);
        seed_version(&store, "1.0.0", "colors:\n  red:\n    value: '#f00'\n");
        fs::create_dir_all(store.active_source_dir()).unwrap();
        fs::write(store.active_source_dir().join("extra.yaml"), "spacing:\n  sm: 4\n").unwrap();

        store.restore_version(&SemVer::new(1, 0, 0)).unwrap();

        assert!(store.active_source_dir().join("tokens.yaml").exists());
        assert!(!store.active_source_dir().join("extra.yaml").exists());
        assert!(store.active_build_dir().is_dir());
        let set = store.load_tokens(&TokenSource::Active, LoadMode::Strict).unwrap();
        assert_eq!(set.tokens.len(), 1);
    }

    #[test]
    fn test_hash_dir_and_platforms() {
        let root = TempDir::new().unwrap();
        let build = root.path().join("build");
        fs::create_dir_all(build.join("css")).unwrap();
        fs::create_dir_all(build.join("ios")).unwrap();
        fs::write(build.join("css").join("tokens.css"), ":root{}").unwrap();

        let digests = hash_dir(&build).unwrap();
        assert_eq!(digests.len(), 1);
        assert_eq!(digests[0].path, "css/tokens.css");
        assert_eq!(digests[0].size, 7);

        let support = platform_support(&build, &["css".into(), "ios".into(), "android".into()]);
        assert!(support["css"]);
        assert!(!support["ios"]);
        assert!(!support["android"]);
    }
}
