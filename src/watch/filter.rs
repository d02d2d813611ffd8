//! Which changed paths trigger a rebuild.

use crate::config::SiteConfig;
use crate::pipeline::{Selector, SelectorError};
use std::path::{Path, PathBuf};

pub struct WatchFilter {
    root: PathBuf,
    output: PathBuf,
    ignore: Selector,
}

impl WatchFilter {
    pub fn new(config: &SiteConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            root: config.root.clone(),
            output: config.build.output.clone(),
            ignore: Selector::new(&config.watch.ignore)?,
        })
    }

    /// The output root never counts; `watch.ignore` is matched relative to
    /// the site root.
    pub fn is_relevant(&self, path: &Path) -> bool {
        if path.starts_with(&self.output) {
            return false;
        }
        match path.strip_prefix(&self.root) {
            Ok(rel) => !self.ignore.matches_path(rel, path.is_dir()),
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildEnv;

    #[test]
    fn test_output_and_ignored_paths() {
        let root = Path::new("/site");
        let config = SiteConfig::for_root(root, BuildEnv::Development);
        let filter = WatchFilter::new(&config).unwrap();

        assert!(filter.is_relevant(&root.join("_posts/hello.md")));
        assert!(filter.is_relevant(&root.join("sitepipe.toml")));
        assert!(!filter.is_relevant(&config.build.output.join("development/serve/index.html")));
        assert!(!filter.is_relevant(&root.join(".git/index")));
        assert!(!filter.is_relevant(&root.join("_site/index.html")));
        assert!(!filter.is_relevant(&root.join("node_modules/x/y.js")));
        assert!(filter.is_relevant(Path::new("/elsewhere/theme.scss")));
    }
}
