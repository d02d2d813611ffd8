//! `[revision]` section configuration.
//!
//! Patterns are matched against the rooted path of each file (`/css/main.css`):
//! - `/.../` is a regular expression (`/\.html$/`)
//! - a literal starting with `/` must equal the rooted path (`/index.html`)
//! - any other literal matches a trailing path segment (`favicon.ico`)
//!
//! ```toml
//! [revision]
//! skip = ["/CNAME"]                        # copied untouched
//! skip_rename = ["/\\.html$/", "robots.txt"] # keep name, still rewritten
//! skip_rewrite = ["/vendor/"]              # renamed, content untouched
//! hash_length = 8
//! manifest = true
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::revision::PatternList;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionConfig {
    pub enable: bool,

    /// Excluded from both renaming and rewriting.
    pub skip: Vec<String>,

    /// Keep their original name.
    pub skip_rename: Vec<String>,

    /// Content is never rewritten.
    pub skip_rewrite: Vec<String>,

    /// Hex characters of the content hash in the new name.
    pub hash_length: usize,

    /// Extensions scanned for references.
    pub text_extensions: Vec<String>,

    /// Write `rev-manifest.json` next to the serve directory.
    pub manifest: bool,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            enable: true,
            skip: vec!["/CNAME".to_string(), "/.nojekyll".to_string()],
            skip_rename: [
                r"/\.html$/",
                "/robots.txt",
                "/sitemap.xml",
                "/feed.xml",
                "/atom.xml",
                "favicon.ico",
                "apple-touch-icon.png",
                "/site.webmanifest",
            ]
            .map(String::from)
            .to_vec(),
            skip_rewrite: Vec::new(),
            hash_length: 8,
            text_extensions: ["html", "css", "js", "json", "xml", "svg", "txt", "webmanifest", "map"]
                .map(String::from)
                .to_vec(),
            manifest: true,
        }
    }
}

impl RevisionConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !(4..=64).contains(&self.hash_length) {
            diag.error_with_hint(
                FieldPath::new("revision.hash_length"),
                format!("{} is out of range", self.hash_length),
                "use a value between 4 and 64",
            );
        }
        let lists = [
            ("revision.skip", &self.skip),
            ("revision.skip_rename", &self.skip_rename),
            ("revision.skip_rewrite", &self.skip_rewrite),
        ];
        for (field, patterns) in lists {
            if let Err(err) = PatternList::new(patterns) {
                diag.error(FieldPath::new(field), err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_revision_defaults() {
        let config = test_parse_config("");
        assert!(config.revision.enable);
        assert_eq!(config.revision.hash_length, 8);
        assert!(config.revision.skip_rename.iter().any(|p| p.contains("html")));
        assert!(config.revision.manifest);
    }

    #[test]
    fn test_revision_lists() {
        let config = test_parse_config(
            "[revision]\nskip = [\"/keep.txt\"]\nskip_rename = []\nskip_rewrite = [\"/\\\\.min\\\\.js$/\"]",
        );
        assert_eq!(config.revision.skip, ["/keep.txt"]);
        assert!(config.revision.skip_rename.is_empty());
        assert_eq!(config.revision.skip_rewrite, [r"/\.min\.js$/"]);
    }

    #[test]
    fn test_revision_invalid_regex() {
        let config = test_parse_config("[revision]\nskip = [\"/(unclosed/\"]\nhash_length = 2");
        let mut diag = ConfigDiagnostics::new();
        config.revision.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }
}
