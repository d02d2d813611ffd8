//! `[lint]` section configuration.
//!
//! ```toml
//! [lint]
//! fail_on_error = true
//! css = true
//! js = true
//! json = true
//! xml = true        # .xml and .svg
//! html = true       # parse, local links, <img alt>
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Fail the command after reporting when any issue was found.
    pub fail_on_error: bool,
    pub css: bool,
    pub js: bool,
    pub json: bool,
    pub xml: bool,
    pub html: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            fail_on_error: true,
            css: true,
            js: true,
            json: true,
            xml: true,
            html: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_lint_config() {
        let config = test_parse_config("[lint]\njs = false\nfail_on_error = false");
        assert!(!config.lint.js);
        assert!(config.lint.css);
        assert!(!config.lint.fail_on_error);
    }
}
