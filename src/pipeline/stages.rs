//! The built-in stage catalog and the up-front partition of files.

use super::fileset::FileSet;
use super::selector::{Selector, SelectorError};
use super::stage::Stage;
use crate::asset::{CssMinify, DataMinify, HtmlMinify, InlineSvg, JsMinify, SvgOptimize};
use crate::config::{StageConfig, StagesConfig};

pub const XML_JSON: &str = "minify-xml-json";
pub const CSS: &str = "minify-css";
pub const JS: &str = "minify-js";
pub const SVG: &str = "optimize-svg";
pub const COPY: &str = "copy-misc";
pub const HTML: &str = "minify-html";

const XML_JSON_GLOBS: &[&str] = &["**/*.xml", "**/*.json", "**/*.webmanifest"];
const CSS_GLOBS: &[&str] = &["**/*.css"];
const JS_GLOBS: &[&str] = &["**/*.js", "!**/*.min.js"];
const SVG_GLOBS: &[&str] = &["**/*.svg"];
const HTML_GLOBS: &[&str] = &["**/*.html"];
const COPY_GLOBS: &[&str] = &["*"];

/// Fan-out stages plus the HTML stage that runs after them.
#[derive(Debug)]
pub struct StageSet {
    pub fanout: Vec<Stage>,
    pub html: Stage,
}

/// Keys per fan-out stage (same order as `StageSet::fanout`) and for HTML.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Partition {
    pub fanout: Vec<Vec<String>>,
    pub html: Vec<String>,
    /// Files no enabled stage claimed; they are left out of the build.
    pub unclaimed: Vec<String>,
}

impl StageSet {
    pub fn from_config(config: &StagesConfig) -> Result<Self, SelectorError> {
        let fanout = vec![
            stage(XML_JSON, &config.xml_json, XML_JSON_GLOBS)?.with(DataMinify),
            stage(CSS, &config.css, CSS_GLOBS)?.with(CssMinify),
            stage(JS, &config.js, JS_GLOBS)?.with(JsMinify),
            stage(SVG, &config.svg, SVG_GLOBS)?.with(SvgOptimize),
            stage(COPY, &config.copy, COPY_GLOBS)?,
        ];
        let html = stage(HTML, &config.html, HTML_GLOBS)?
            .with(InlineSvg)
            .with(HtmlMinify);
        Ok(Self { fanout, html })
    }

    /// Claim every key exactly once.
    ///
    /// Claim order: xml/json, css, js, svg, html, then copy-misc, so copy
    /// only receives what the specific stages (enabled ones) left over.
    pub fn partition(&self, files: &FileSet) -> Partition {
        let mut partition = Partition {
            fanout: vec![Vec::new(); self.fanout.len()],
            ..Partition::default()
        };
        let (specific, copy) = self.fanout.split_at(self.fanout.len().saturating_sub(1));

        for key in files.keys() {
            if let Some(i) = specific.iter().position(|s| s.claims(key)) {
                partition.fanout[i].push(key.clone());
            } else if self.html.claims(key) {
                partition.html.push(key.clone());
            } else if copy.first().is_some_and(|s| s.claims(key)) {
                partition.fanout[specific.len()].push(key.clone());
            } else {
                partition.unclaimed.push(key.clone());
            }
        }
        partition
    }
}

fn stage(
    name: &'static str,
    config: &StageConfig,
    defaults: &[&str],
) -> Result<Stage, SelectorError> {
    let selector = match &config.globs {
        Some(globs) => Selector::new(globs)?,
        None => Selector::new(defaults)?,
    };
    Ok(Stage::new(name, selector).enabled(config.enable))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(keys: &[&str]) -> FileSet {
        FileSet::from_keys(
            std::path::Path::new("/site"),
            keys.iter().map(ToString::to_string).collect(),
        )
    }

    #[test]
    fn test_default_partition() {
        let stages = StageSet::from_config(&StagesConfig::default()).unwrap();
        let set = files(&[
            ".nojekyll",
            "CNAME",
            "css/main.css",
            "feed.xml",
            "img/logo.svg",
            "index.html",
            "js/app.js",
            "js/vendor.min.js",
            "site.webmanifest",
        ]);
        let p = stages.partition(&set);

        assert_eq!(p.fanout[0], ["feed.xml", "site.webmanifest"]);
        assert_eq!(p.fanout[1], ["css/main.css"]);
        assert_eq!(p.fanout[2], ["js/app.js"]);
        assert_eq!(p.fanout[3], ["img/logo.svg"]);
        assert_eq!(p.fanout[4], [".nojekyll", "CNAME", "js/vendor.min.js"]);
        assert_eq!(p.html, ["index.html"]);
        assert!(p.unclaimed.is_empty());
    }

    #[test]
    fn test_disabled_stage_falls_through_to_copy() {
        let config = StagesConfig {
            css: StageConfig {
                enable: false,
                globs: None,
            },
            html: StageConfig {
                enable: false,
                globs: None,
            },
            ..StagesConfig::default()
        };
        let stages = StageSet::from_config(&config).unwrap();
        let p = stages.partition(&files(&["a.css", "index.html"]));
        assert!(p.fanout[1].is_empty());
        assert!(p.html.is_empty());
        assert_eq!(p.fanout[4], ["a.css", "index.html"]);
    }

    #[test]
    fn test_custom_globs_and_unclaimed() {
        let config = StagesConfig {
            copy: StageConfig {
                enable: true,
                globs: Some(vec!["assets/**".to_string()]),
            },
            ..StagesConfig::default()
        };
        let stages = StageSet::from_config(&config).unwrap();
        let p = stages.partition(&files(&["assets/font.woff2", "notes.txt"]));
        assert_eq!(p.fanout[4], ["assets/font.woff2"]);
        assert_eq!(p.unclaimed, ["notes.txt"]);
    }

    #[test]
    fn test_every_key_claimed_once() {
        let stages = StageSet::from_config(&StagesConfig::default()).unwrap();
        let set = files(&["a.css", "b.js", "c.svg", "d.json", "e.html", "f.png"]);
        let p = stages.partition(&set);
        let total: usize = p.fanout.iter().map(Vec::len).sum::<usize>() + p.html.len();
        assert_eq!(total, set.len());
    }
}
