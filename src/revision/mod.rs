//! Fingerprinting of the build tree.
//!
//! Every file is mapped to `stem.<hash>.ext` unless an exclusion list exempts
//! it, references inside text files are rewritten to the new names, and the
//! result is written to the serve directory.
//!
//! | List           | Renamed | Content rewritten |
//! |----------------|---------|-------------------|
//! | `skip`         | no      | no                |
//! | `skip_rename`  | no      | yes               |
//! | `skip_rewrite` | yes     | no                |
//!
//! Fingerprints come from the bytes before rewriting, so they only change
//! when the file itself changes.

mod exclude;
mod manifest;
mod rewrite;

pub use exclude::PatternList;
pub use manifest::RevisionMap;

use crate::config::RevisionConfig;
use crate::pipeline::fileset::{FileSet, write_file};
use crate::utils::hash::fingerprint;
use crate::{debug, log};
use anyhow::{Result, bail};
use rayon::prelude::*;
use rewrite::rewrite_references;
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("invalid pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// What happens to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Treatment {
    pub rename: bool,
    pub rewrite: bool,
}

#[derive(Debug)]
pub struct Revisioner {
    skip: PatternList,
    skip_rename: PatternList,
    skip_rewrite: PatternList,
    hash_length: usize,
    text_extensions: Vec<String>,
}

impl Revisioner {
    pub fn new(config: &RevisionConfig) -> Result<Self, RevisionError> {
        Ok(Self {
            skip: PatternList::new(&config.skip)?,
            skip_rename: PatternList::new(&config.skip_rename)?,
            skip_rewrite: PatternList::new(&config.skip_rewrite)?,
            hash_length: config.hash_length,
            text_extensions: config
                .text_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        })
    }

    pub fn treatment(&self, key: &str) -> Treatment {
        let rooted = format!("/{key}");
        if self.skip.matches(&rooted) {
            return Treatment {
                rename: false,
                rewrite: false,
            };
        }
        Treatment {
            rename: !self.skip_rename.matches(&rooted),
            rewrite: self.is_text(key) && !self.skip_rewrite.matches(&rooted),
        }
    }

    fn is_text(&self, key: &str) -> bool {
        let name = key.rsplit_once('/').map_or(key, |(_, n)| n);
        name.rsplit_once('.')
            .is_some_and(|(_, ext)| self.text_extensions.iter().any(|t| t.eq_ignore_ascii_case(ext)))
    }

    /// Compute the final key of every file in `input`.
    pub fn plan(&self, input: &FileSet) -> Result<RevisionMap> {
        let entries = input
            .keys()
            .par_iter()
            .map(|key| {
                if !self.treatment(key).rename {
                    return Ok((key.clone(), key.clone()));
                }
                let bytes = input.read(key)?;
                let revisioned = revisioned_name(key, &fingerprint(&bytes, self.hash_length));
                Ok((key.clone(), revisioned))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut owners: FxHashMap<&str, &str> = FxHashMap::default();
        for (original, revisioned) in &entries {
            if let Some(other) = owners.insert(revisioned, original) {
                bail!("`{other}` and `{original}` would both be written to `{revisioned}`");
            }
        }

        let mut map = RevisionMap::default();
        for (original, revisioned) in entries {
            map.insert(original, revisioned);
        }
        Ok(map)
    }

    /// Revision `build` into `serve` and return the reference map.
    pub fn run(&self, build: &Path, serve: &Path) -> Result<RevisionMap> {
        let input = FileSet::scan(build)?;
        let map = self.plan(&input)?;
        let rewritten = AtomicUsize::new(0);

        input.keys().par_iter().try_for_each(|key| -> Result<()> {
            let mut bytes = input.read(key)?;
            if self.treatment(key).rewrite
                && let Ok(text) = std::str::from_utf8(&bytes)
                && let Cow::Owned(updated) = rewrite_references(text, key, |k| map.renamed(k))
            {
                debug!("revision"; "rewrote references in {key}");
                rewritten.fetch_add(1, Ordering::Relaxed);
                bytes = updated.into_bytes();
            }
            let target = map.get(key).unwrap_or(key);
            write_file(serve, target, &bytes)
        })?;

        log!(
            "revision";
            "{} renamed, references rewritten in {}",
            crate::utils::plural::plural_count(map.renamed_count(), "file"),
            crate::utils::plural::plural_count(rewritten.into_inner(), "file")
        );
        Ok(map)
    }
}

/// `css/main.css` -> `css/main.<fp>.css`, `LICENSE` -> `LICENSE.<fp>`.
///
/// Dot-files keep their leading dot as part of the stem (`.htaccess.<fp>`).
pub fn revisioned_name(key: &str, fp: &str) -> String {
    let (dir, name) = match key.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, key),
    };
    let name = match name.rfind('.') {
        Some(pos) if pos > 0 => format!("{}.{fp}{}", &name[..pos], &name[pos..]),
        _ => format!("{name}.{fp}"),
    };
    match dir {
        Some(dir) => format!("{dir}/{name}"),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn build_tree(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (key, body) in files {
            write_file(dir.path(), key, body.as_bytes()).unwrap();
        }
        dir
    }

    fn revisioner() -> Revisioner {
        Revisioner::new(&RevisionConfig::default()).unwrap()
    }

    #[test]
    fn test_revisioned_name() {
        assert_eq!(revisioned_name("css/main.css", "1a2b3c4d"), "css/main.1a2b3c4d.css");
        assert_eq!(revisioned_name("LICENSE", "1a2b3c4d"), "LICENSE.1a2b3c4d");
        assert_eq!(revisioned_name("js/app.min.js", "ff"), "js/app.min.ff.js");
        assert_eq!(revisioned_name(".htaccess", "ff"), ".htaccess.ff");
    }

    #[test]
    fn test_treatment_defaults() {
        let rev = revisioner();
        assert_eq!(rev.treatment("CNAME"), Treatment { rename: false, rewrite: false });
        assert_eq!(rev.treatment("index.html"), Treatment { rename: false, rewrite: true });
        assert_eq!(rev.treatment("css/main.css"), Treatment { rename: true, rewrite: true });
        assert_eq!(rev.treatment("img/a.png"), Treatment { rename: true, rewrite: false });
        assert!(!rev.treatment("blog/favicon.ico").rename);
    }

    #[test]
    fn test_run_renames_and_rewrites() {
        let build = build_tree(&[
            ("index.html", r#"<link rel="stylesheet" href="/css/main.css"><a href="/CNAME">"#),
            ("css/main.css", "body{background:url(../img/bg.png)}"),
            ("img/bg.png", "PNG"),
            ("CNAME", "example.com /css/main.css"),
        ]);
        let serve = TempDir::new().unwrap();
        let map = revisioner().run(build.path(), serve.path()).unwrap();

        let css = map.get("css/main.css").unwrap().to_string();
        let png = map.get("img/bg.png").unwrap().to_string();
        let fp = fingerprint(b"body{background:url(../img/bg.png)}", 8);
        assert_eq!(css, format!("css/main.{fp}.css"));
        assert_eq!(map.get("index.html"), Some("index.html"));

        let index = fs::read_to_string(serve.path().join("index.html")).unwrap();
        assert_eq!(
            index,
            format!(r#"<link rel="stylesheet" href="/{css}"><a href="/CNAME">"#)
        );
        let png_name = png.rsplit_once('/').unwrap().1;
        let css_body = fs::read_to_string(serve.path().join(&css)).unwrap();
        assert_eq!(css_body, format!("body{{background:url(../img/{png_name})}}"));

        // Skipped entirely: untouched bytes, same name
        let cname = fs::read_to_string(serve.path().join("CNAME")).unwrap();
        assert_eq!(cname, "example.com /css/main.css");
        assert!(!serve.path().join("css/main.css").exists());
    }

    #[test]
    fn test_skip_rewrite_keeps_content() {
        let build = build_tree(&[
            ("vendor/lib.js", "load('/css/main.css')"),
            ("css/main.css", "a{}"),
        ]);
        let config = RevisionConfig {
            skip_rewrite: vec!["/^/vendor/.*/".to_string()],
            ..RevisionConfig::default()
        };
        let serve = TempDir::new().unwrap();
        let map = Revisioner::new(&config).unwrap().run(build.path(), serve.path()).unwrap();

        let lib = map.get("vendor/lib.js").unwrap();
        assert_ne!(lib, "vendor/lib.js");
        assert_eq!(
            fs::read_to_string(serve.path().join(lib)).unwrap(),
            "load('/css/main.css')"
        );
    }

    #[test]
    fn test_plan_is_idempotent() {
        let build = build_tree(&[("a.css", "a{}"), ("b/c.js", "x()"), ("index.html", "<p>")]);
        let input = FileSet::scan(build.path()).unwrap();
        let rev = revisioner();
        assert_eq!(rev.plan(&input).unwrap(), rev.plan(&input).unwrap());
    }

    #[test]
    fn test_equal_content_equal_fingerprint() {
        let build = build_tree(&[("a.css", "same"), ("b.css", "same"), ("c.css", "samE")]);
        let map = revisioner().plan(&FileSet::scan(build.path()).unwrap()).unwrap();
        let fp = |k: &str| map.get(k).unwrap().split('.').nth(1).unwrap().to_string();
        assert_eq!(fp("a.css"), fp("b.css"));
        assert_ne!(fp("a.css"), fp("c.css"));
    }
}
