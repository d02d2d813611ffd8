//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! paths = ["."]
//! ignore = ["_site/", ".git/", "node_modules/", ".jekyll-cache/"]
//! debounce_ms = 300
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Roots to watch, relative to the site root.
    pub paths: Vec<PathBuf>,

    /// Gitignore-style globs, relative to the site root. The output root is
    /// always ignored.
    pub ignore: Vec<String>,

    /// Quiet window before a rebuild starts.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from(".")],
            ignore: ["_site/", ".git/", "node_modules/", ".jekyll-cache/", ".sass-cache/", "*.swp", "*~"]
                .map(String::from)
                .to_vec(),
            debounce_ms: 300,
        }
    }
}

impl WatchConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(err) = crate::pipeline::Selector::new(&self.ignore) {
            diag.error(FieldPath::new("watch.ignore"), err.to_string());
        }
        if self.debounce_ms == 0 {
            diag.warn(
                FieldPath::new("watch.debounce_ms"),
                "every single event triggers a rebuild",
            );
        }
    }
}
