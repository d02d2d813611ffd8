//! Output directory layout.
//!
//! ```text
//! <output-root>/<env>/
//! ├── jekyll-build/    # generator snapshot (+ rendered diagrams)
//! ├── build/           # transformed assets
//! ├── serve/           # revisioned tree, served and published
//! └── rev-manifest.json
//! ```

use crate::core::BuildEnv;
use std::path::{Path, PathBuf};

pub const GENERATE_DIR: &str = "jekyll-build";
pub const BUILD_DIR: &str = "build";
pub const SERVE_DIR: &str = "serve";
pub const MANIFEST_FILE: &str = "rev-manifest.json";

/// Resolved directories for one build environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    env_root: PathBuf,
}

impl Layout {
    pub fn new(output_root: &Path, env: BuildEnv) -> Self {
        Self {
            env_root: output_root.join(env.as_str()),
        }
    }

    /// `<output-root>/<env>`; removed by `clean`.
    pub fn env_root(&self) -> &Path {
        &self.env_root
    }

    pub fn generate_dir(&self) -> PathBuf {
        self.env_root.join(GENERATE_DIR)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.env_root.join(BUILD_DIR)
    }

    pub fn serve_dir(&self) -> PathBuf {
        self.env_root.join(SERVE_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.env_root.join(MANIFEST_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_per_env() {
        let dev = Layout::new(Path::new("/site/.sitepipe"), BuildEnv::Development);
        assert_eq!(dev.generate_dir(), PathBuf::from("/site/.sitepipe/development/jekyll-build"));
        assert_eq!(dev.build_dir(), PathBuf::from("/site/.sitepipe/development/build"));
        assert_eq!(dev.serve_dir(), PathBuf::from("/site/.sitepipe/development/serve"));

        let prod = Layout::new(Path::new("/site/.sitepipe"), BuildEnv::Production);
        assert_eq!(prod.env_root(), Path::new("/site/.sitepipe/production"));
        assert_ne!(dev.serve_dir(), prod.serve_dir());
    }
}
