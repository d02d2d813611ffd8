//! `[build]` and `[stages.*]` section configuration.
//!
//! ```toml
//! [build]
//! output = ".sitepipe"     # <output>/<env>/{jekyll-build,build,serve}
//! minify_dev = false       # production always minifies
//! lint = false             # run lint checks as an advisory stage
//! lint_fatal = false       # abort the build when that stage finds issues
//!
//! [stages.minify-js]
//! globs = ["**/*.js", "!**/*.min.js", "!vendor/**"]
//!
//! [stages.optimize-svg]
//! enable = false
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Output root, relative to the site root.
    pub output: PathBuf,

    /// Minify in development builds as well.
    pub minify_dev: bool,

    /// Run lint checks during builds. Issues are only reported.
    pub lint: bool,

    /// Abort the build when the build-time lint finds issues.
    pub lint_fatal: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(".sitepipe"),
            minify_dev: false,
            lint: false,
            lint_fatal: false,
        }
    }
}

impl BuildConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.output.as_os_str().is_empty() || self.output == PathBuf::from(".") {
            diag.error_with_hint(
                FieldPath::new("build.output"),
                "output root must be a dedicated directory",
                "`clean` removes it; use something like \".sitepipe\"",
            );
        }
    }
}

/// Per-stage overrides. `globs` replaces the stage's default selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub enable: bool,
    pub globs: Option<Vec<String>>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            enable: true,
            globs: None,
        }
    }
}

/// `[stages]`: one entry per asset stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    #[serde(rename = "minify-xml-json")]
    pub xml_json: StageConfig,
    #[serde(rename = "minify-css")]
    pub css: StageConfig,
    #[serde(rename = "minify-js")]
    pub js: StageConfig,
    #[serde(rename = "optimize-svg")]
    pub svg: StageConfig,
    #[serde(rename = "copy-misc")]
    pub copy: StageConfig,
    #[serde(rename = "minify-html")]
    pub html: StageConfig,
}

impl StagesConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.copy.enable {
            diag.warn(
                FieldPath::new("stages.copy-misc.enable"),
                "files claimed by no stage will be missing from the build",
            );
        }
        let all = [
            ("stages.minify-xml-json.globs", &self.xml_json),
            ("stages.minify-css.globs", &self.css),
            ("stages.minify-js.globs", &self.js),
            ("stages.optimize-svg.globs", &self.svg),
            ("stages.copy-misc.globs", &self.copy),
            ("stages.minify-html.globs", &self.html),
        ];
        for (field, stage) in all {
            if let Some(globs) = &stage.globs
                && let Err(err) = crate::pipeline::Selector::new(globs)
            {
                diag.error(FieldPath::new(field), err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};
    use std::path::PathBuf;

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.output, PathBuf::from(".sitepipe"));
        assert!(!config.build.minify_dev);
        assert!(!config.build.lint && !config.build.lint_fatal);
        assert!(config.stages.css.enable);
        assert!(config.stages.js.globs.is_none());
    }

    #[test]
    fn test_stage_overrides() {
        let config = test_parse_config(
            "[stages.minify-js]\nglobs = [\"**/*.js\", \"!vendor/**\"]\n[stages.optimize-svg]\nenable = false",
        );
        assert_eq!(
            config.stages.js.globs.as_deref(),
            Some(&["**/*.js".to_string(), "!vendor/**".to_string()][..])
        );
        assert!(!config.stages.svg.enable);
    }

    #[test]
    fn test_output_must_not_be_root() {
        let config = test_parse_config("[build]\noutput = \".\"");
        let mut diag = ConfigDiagnostics::new();
        config.build.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_invalid_stage_glob() {
        let config = test_parse_config("[stages.minify-css]\nglobs = [\"**/[*.css\"]");
        let mut diag = ConfigDiagnostics::new();
        config.stages.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
