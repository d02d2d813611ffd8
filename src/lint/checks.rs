//! Individual sub-lints. Each returns every issue it finds in one file.

use super::report::LintIssue;
use crate::asset::{minify_js, minify_xml};
use crate::config::LintConfig;
use crate::pipeline::fileset::FileSet;
use crate::utils::path::route::{is_external_link, parent_key, resolve_reference, split_suffix};
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use percent_encoding::percent_decode_str;
use std::fmt::Display;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Css,
    Js,
    Json,
    Xml,
    Html,
}

impl Check {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Html => "html",
        }
    }

    /// The enabled check for a file, by extension.
    pub fn for_key(key: &str, config: &LintConfig) -> Option<Self> {
        let ext = key.rsplit_once('.')?.1.to_ascii_lowercase();
        let check = match ext.as_str() {
            "css" => Self::Css,
            "js" | "mjs" if !key.ends_with(".min.js") => Self::Js,
            "json" | "webmanifest" => Self::Json,
            "xml" | "svg" => Self::Xml,
            "html" | "htm" => Self::Html,
            _ => return None,
        };
        let enabled = match check {
            Self::Css => config.css,
            Self::Js => config.js,
            Self::Json => config.json,
            Self::Xml => config.xml,
            Self::Html => config.html,
        };
        enabled.then_some(check)
    }

    pub fn run(self, key: &str, source: &str, files: &FileSet) -> Vec<LintIssue> {
        match self {
            Self::Css => check_css(source),
            Self::Js => minify_js(source, false)
                .err()
                .map(|e| LintIssue::new(e.to_string()))
                .into_iter()
                .collect(),
            Self::Json => check_json(source),
            Self::Xml => minify_xml(source, false)
                .err()
                .map(|e| LintIssue::new(format!("{e:#}")))
                .into_iter()
                .collect(),
            Self::Html => check_html(key, source, files),
        }
    }
}

/// Parse with error recovery so every bad rule is reported, not just the first.
fn check_css(source: &str) -> Vec<LintIssue> {
    let warnings = Arc::new(RwLock::new(Vec::new()));
    let options = ParserOptions {
        error_recovery: true,
        warnings: Some(Arc::clone(&warnings)),
        ..ParserOptions::default()
    };

    let mut issues = Vec::new();
    if let Err(err) = StyleSheet::parse(source, options) {
        issues.push(css_issue(&err));
    }
    if let Ok(list) = warnings.read() {
        issues.extend(list.iter().map(css_issue));
    }
    issues
}

fn css_issue<T: Display>(err: &lightningcss::error::Error<T>) -> LintIssue {
    match &err.loc {
        Some(loc) => LintIssue::at(format!("{}:{}", loc.line + 1, loc.column), err.kind.to_string()),
        None => LintIssue::new(err.kind.to_string()),
    }
}

fn check_json(source: &str) -> Vec<LintIssue> {
    match serde_json::from_str::<serde::de::IgnoredAny>(source) {
        Ok(_) => Vec::new(),
        Err(err) => {
            let message = err.to_string();
            let message = message
                .rsplit_once(" at line ")
                .map_or(message.as_str(), |(m, _)| m)
                .to_string();
            vec![LintIssue::at(format!("{}:{}", err.line(), err.column()), message)]
        }
    }
}

fn check_html(key: &str, source: &str, files: &FileSet) -> Vec<LintIssue> {
    let dom = match tl::parse(source, tl::ParserOptions::default()) {
        Ok(dom) => dom,
        Err(err) => return vec![LintIssue::new(format!("unparsable HTML: {err}"))],
    };

    let mut issues = Vec::new();
    for node in dom.nodes() {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        let name = tag.name().as_utf8_str().to_ascii_lowercase();
        let attrs = tag.attributes();

        if name == "img" && !attrs.contains("alt") {
            let src = attrs
                .get("src")
                .flatten()
                .map(|s| s.as_utf8_str().into_owned())
                .unwrap_or_default();
            issues.push(LintIssue::at(format!("<img src=\"{src}\">"), "missing alt attribute"));
        }

        for attr in ["href", "src"] {
            let Some(link) = attrs.get(attr).flatten() else {
                continue;
            };
            let link = link.as_utf8_str();
            if !link_resolves(key, &link, files) {
                issues.push(LintIssue::at(format!("`{link}`"), "not found"));
            }
        }
    }
    issues
}

/// Local references must name a file, a directory index, or a page reached
/// by `.html`/`.xml` fallback. External and fragment-only links pass.
fn link_resolves(key: &str, link: &str, files: &FileSet) -> bool {
    let link = link.trim();
    if link.is_empty() || link.contains("{{") || is_external_link(link) {
        return true;
    }
    let (path, _) = split_suffix(link);
    if path.is_empty() {
        return true;
    }
    let Ok(decoded) = percent_decode_str(path).decode_utf8() else {
        return false;
    };
    let Some(resolved) = resolve_reference(parent_key(key), &decoded) else {
        // The site root itself, or a path above it
        return !decoded.contains("..");
    };

    [
        resolved.clone(),
        format!("{resolved}/index.html"),
        format!("{resolved}.html"),
        format!("{resolved}.xml"),
    ]
    .iter()
    .any(|candidate| files.contains(candidate))
}
