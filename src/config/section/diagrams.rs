//! `[diagrams]` section configuration.
//!
//! ```toml
//! [diagrams]
//! enable = true
//! command = ["dot", "-Tsvg"]   # reads source on stdin, writes image on stdout
//! globs = ["**/*.dot"]
//! extension = "svg"
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

/// Diagram renderer subprocess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    pub enable: bool,
    pub command: Vec<String>,
    /// Sources to render, relative to the generator output.
    pub globs: Vec<String>,
    /// Extension of the rendered file, written next to the source.
    pub extension: String,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            enable: true,
            command: vec!["dot".to_string(), "-Tsvg".to_string()],
            globs: vec!["**/*.dot".to_string()],
            extension: "svg".to_string(),
        }
    }
}

impl DiagramsConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        if self.command.first().is_none_or(|p| p.trim().is_empty()) {
            diag.error(FieldPath::new("diagrams.command"), "must name a program");
        }
        if self.extension.is_empty() || self.extension.contains(['/', '.']) {
            diag.error_with_hint(
                FieldPath::new("diagrams.extension"),
                format!("invalid extension `{}`", self.extension),
                "use a bare extension such as \"svg\"",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_diagrams_defaults() {
        let config = test_parse_config("");
        assert!(config.diagrams.enable);
        assert_eq!(config.diagrams.command, ["dot", "-Tsvg"]);
        assert_eq!(config.diagrams.extension, "svg");
    }

    #[test]
    fn test_diagrams_invalid_extension() {
        let config = test_parse_config("[diagrams]\nextension = \".svg\"");
        let mut diag = ConfigDiagnostics::new();
        config.diagrams.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn test_diagrams_disabled_skips_validation() {
        let config = test_parse_config("[diagrams]\nenable = false\ncommand = []");
        let mut diag = ConfigDiagnostics::new();
        config.diagrams.validate(&mut diag);
        assert!(diag.is_empty());
    }
}
