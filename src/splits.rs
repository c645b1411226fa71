//! Split layout on disk: `<root>/Split-<name>/<shard files>`.

use crate::util::copy_with_backoff;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SPLIT_DIR_PREFIX: &str = "Split-";

pub fn split_dir(root: &Path, split: &str) -> PathBuf {
    root.join(format!("{SPLIT_DIR_PREFIX}{split}"))
}

/// Map of split name -> directory for every `Split-<name>` child of `root`.
pub fn discover_splits(root: &Path) -> BTreeMap<String, PathBuf> {
    let mut map = BTreeMap::new();
    if !root.exists() {
        return map;
    }
    for ent in WalkDir::new(root).min_depth(1).max_depth(1).into_iter().flatten() {
        if !ent.file_type().is_dir() {
            continue;
        }
        if let Some(name) = ent.file_name().to_str().and_then(|n| n.strip_prefix(SPLIT_DIR_PREFIX)) {
            if !name.is_empty() {
                map.insert(name.to_string(), ent.path().to_path_buf());
            }
        }
    }
    map
}

/// Regular data files directly under a split directory, sorted by name.
/// Hidden files and anything under `_staging` are ignored.
pub fn list_shard_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for ent in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let ent = ent.with_context(|| format!("list {}", dir.display()))?;
        if !ent.file_type().is_file() {
            continue;
        }
        let hidden = ent.file_name().to_str().map_or(false, |n| n.starts_with('.') || n.starts_with('_'));
        if !hidden {
            files.push(ent.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Copy a split byte-for-byte. Returns the number of files copied.
pub fn copy_split(src: &Path, dst: &Path) -> Result<usize> {
    fs::create_dir_all(dst).with_context(|| format!("create {}", dst.display()))?;
    let files = list_shard_files(src)?;
    for f in &files {
        if let Some(name) = f.file_name() {
            copy_with_backoff(f, &dst.join(name), 16, 50)?;
        }
    }
    Ok(files.len())
}
