//! Glob selectors with gitignore semantics.
//!
//! A selector claims the keys matched by its globs; `!`-prefixed globs carve
//! exceptions (`["**/*.js", "!**/*.min.js"]`). Globs without a slash match at
//! any depth, globs with a slash are anchored at the tree root.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("invalid glob `{glob}`: {message}")]
    InvalidGlob { glob: String, message: String },
}

#[derive(Debug, Clone)]
pub struct Selector {
    matcher: Gitignore,
}

impl Selector {
    pub fn new<S: AsRef<str>>(globs: &[S]) -> Result<Self, SelectorError> {
        let mut builder = GitignoreBuilder::new("");
        for glob in globs {
            let glob = glob.as_ref().trim();
            if glob.is_empty() {
                continue;
            }
            builder
                .add_line(None, glob)
                .map_err(|e| SelectorError::InvalidGlob {
                    glob: glob.to_string(),
                    message: e.to_string(),
                })?;
        }
        let matcher = builder.build().map_err(|e| SelectorError::InvalidGlob {
            glob: globs.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", "),
            message: e.to_string(),
        })?;
        Ok(Self { matcher })
    }

    /// Whether the file `key` (`/`-separated, relative) is claimed.
    pub fn matches(&self, key: &str) -> bool {
        self.matches_path(Path::new(key), false)
    }

    /// Same as `matches` for a relative filesystem path, file or directory.
    pub fn matches_path(&self, rel: &Path, is_dir: bool) -> bool {
        if rel.as_os_str().is_empty() || rel.has_root() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(rel, is_dir)
            .is_ignore()
    }
}
