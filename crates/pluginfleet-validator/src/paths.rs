//! Package layout and filesystem helpers.

use std::path::{Path, PathBuf};

use crate::ValidatorError;

/// Directory holding the package metadata.
pub const METADATA_DIR: &str = ".claude-plugin";
/// Plugin manifest file name.
pub const PLUGIN_MANIFEST: &str = "plugin.json";
/// Marketplace manifest file name.
pub const MARKETPLACE_MANIFEST: &str = "marketplace.json";
/// Top-level readme required for publication.
pub const README: &str = "README.md";
/// Skill description file inside each skill directory.
pub const SKILL_FILE: &str = "SKILL.md";

/// Component directories that belong at the package root.
pub const COMPONENT_DIRS: [&str; 4] = ["agents", "skills", "commands", "hooks"];

/// Resolve a target against the marketplace root. Absolute targets are
/// returned unchanged.
pub fn resolve(root: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        root.join(target)
    }
}

/// Where the plugin manifest was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestLocation {
    /// `.claude-plugin/plugin.json`
    Metadata(PathBuf),
    /// `plugin.json` at the package root.
    Root(PathBuf),
}

impl ManifestLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::Metadata(p) | Self::Root(p) => p,
        }
    }
}

/// Locate the plugin manifest, preferring the metadata directory.
pub fn find_plugin_manifest(package: &Path) -> Option<ManifestLocation> {
    let preferred = package.join(METADATA_DIR).join(PLUGIN_MANIFEST);
    if preferred.is_file() {
        return Some(ManifestLocation::Metadata(preferred));
    }
    let fallback = package.join(PLUGIN_MANIFEST);
    fallback
        .is_file()
        .then_some(ManifestLocation::Root(fallback))
}

pub(crate) fn read_text(path: &Path) -> Result<String, ValidatorError> {
    std::fs::read_to_string(path).map_err(|source| ValidatorError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Entries of `dir`, sorted by path so reports are deterministic.
pub(crate) fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, ValidatorError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ValidatorError::List {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Files in `dir` with the given extension. A missing directory yields none.
pub(crate) fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    list_dir(dir)
        .unwrap_or_default()
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == extension))
        .collect()
}

/// Number of entries in `dir`, or zero if it cannot be listed.
pub(crate) fn count_entries(dir: &Path) -> usize {
    list_dir(dir).map(|entries| entries.len()).unwrap_or(0)
}

/// Every file under `root` with the given extension, recursively. Directories
/// that cannot be listed are returned as errors and the walk continues.
pub(crate) fn walk_files(root: &Path, extension: &str) -> Vec<Result<PathBuf, ValidatorError>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match list_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                found.push(Err(e));
                continue;
            }
        };
        for path in entries {
            let Ok(file_type) = path.symlink_metadata().map(|m| m.file_type()) else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && path.extension().is_some_and(|e| e == extension) {
                found.push(Ok(path));
            }
        }
    }

    found.sort_by(|a, b| match (a, b) {
        (Ok(a), Ok(b)) => a.cmp(b),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => std::cmp::Ordering::Equal,
    });
    found
}
