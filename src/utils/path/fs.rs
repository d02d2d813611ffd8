//! Filesystem path helpers.
//!
//! Files inside a tree are keyed by their path relative to the tree root,
//! always `/`-separated (`css/main.css`), independent of the host platform.

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first, then falls back to joining with the cwd.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Relative key of `path` under `root` (`/`-separated, no leading slash).
///
/// Returns `None` when `path` is not inside `root`.
pub fn rel_key(path: &Path, root: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Filesystem path of a relative key under `root`.
pub fn key_path(root: &Path, key: &str) -> PathBuf {
    key.split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        assert!(normalize_path(Path::new("relative/file.txt")).is_absolute());
    }

    #[test]
    fn test_rel_key() {
        let root = Path::new("/site/build");
        assert_eq!(
            rel_key(Path::new("/site/build/css/main.css"), root).as_deref(),
            Some("css/main.css")
        );
        assert_eq!(rel_key(Path::new("/site/build"), root), None);
        assert_eq!(rel_key(Path::new("/elsewhere/a.css"), root), None);
    }

    #[test]
    fn test_key_path() {
        assert_eq!(
            key_path(Path::new("/out"), "js/app.js"),
            PathBuf::from("/out/js/app.js")
        );
    }
}
