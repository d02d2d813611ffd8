//! The reference map: original key -> final key.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Every key of the tree maps to its final key (itself when exempt).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionMap {
    entries: BTreeMap<String, String>,
}

impl RevisionMap {
    pub fn insert(&mut self, original: String, revisioned: String) {
        self.entries.insert(original, revisioned);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Final key when `key` was renamed; `None` for exempt or unknown keys.
    pub fn renamed(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|r| *r != key)
    }

    pub fn iter_renamed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(k, v)| k != v)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn renamed_count(&self) -> usize {
        self.iter_renamed().count()
    }

    /// Write the renamed entries as a sorted JSON object.
    pub fn write_manifest(&self, path: &Path) -> Result<()> {
        let renamed: BTreeMap<&str, &str> = self.iter_renamed().collect();
        let json = serde_json::to_string_pretty(&renamed)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display()))
    }
}
