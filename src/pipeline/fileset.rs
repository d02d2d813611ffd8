//! File enumeration for stage inputs.

use crate::utils::path::fs::{key_path, rel_key};
use anyhow::{Context, Result};
use jwalk::WalkDir;
use std::fs;
use std::path::{Path, PathBuf};

/// Files under a root, keyed by `/`-separated relative path, sorted.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    root: PathBuf,
    keys: Vec<String>,
}

impl FileSet {
    /// Enumerate every file under `root` (dot-files included).
    pub fn scan(root: &Path) -> Result<Self> {
        let mut keys = Vec::new();
        if root.exists() {
            for entry in WalkDir::new(root).skip_hidden(false).sort(true) {
                let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(key) = rel_key(&entry.path(), root) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(Self {
            root: root.to_path_buf(),
            keys,
        })
    }

    #[cfg(test)]
    pub fn from_keys(root: &Path, mut keys: Vec<String>) -> Self {
        keys.sort();
        keys.dedup();
        Self {
            root: root.to_path_buf(),
            keys,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.binary_search_by(|k| k.as_str().cmp(key)).is_ok()
    }

    pub fn path_of(&self, key: &str) -> PathBuf {
        key_path(&self.root, key)
    }

    pub fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_of(key);
        fs::read(&path).with_context(|| format!("failed to read {}", path.display()))
    }
}

/// Write `bytes` to `key` under `root`, creating parent directories.
pub fn write_file(root: &Path, key: &str, bytes: &[u8]) -> Result<()> {
    let path = key_path(root, key);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

/// Remove `dir` if present and recreate it empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("failed to remove {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}

/// Copy every file under `from` to the same key under `to`.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let files = FileSet::scan(from)?;
    for key in files.keys() {
        let target = key_path(to, key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::copy(files.path_of(key), &target)
            .with_context(|| format!("failed to copy {key} to {}", to.display()))?;
    }
    Ok(files.len())
}
