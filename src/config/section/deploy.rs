//! `[deploy]` section configuration.
//!
//! ```toml
//! [deploy]
//! env = "production"                     # only this env may publish
//! url = "https://github.com/user/user.github.io"
//! branch = "gh-pages"
//! force = true                           # each publish is a fresh single commit
//! token_path = "~/.github-token"         # optional, HTTPS remotes only
//! message = "Site update"                # ": <timestamp>" is appended
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::BuildEnv;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub env: BuildEnv,

    /// Remote repository URL (HTTPS, SSH, or a local path).
    pub url: String,

    pub branch: String,
    pub force: bool,

    /// File containing an access token (never commit it).
    pub token_path: Option<PathBuf>,

    pub message: String,

    /// Identity for the publish commit when git has none configured.
    pub user_name: String,
    pub user_email: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            env: BuildEnv::Production,
            url: String::new(),
            branch: "gh-pages".to_string(),
            force: true,
            token_path: None,
            message: "Site update".to_string(),
            user_name: "sitepipe".to_string(),
            user_email: "sitepipe@localhost".to_string(),
        }
    }
}

impl DeployConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.url.trim().is_empty() {
            diag.error_with_hint(
                FieldPath::new("deploy.url"),
                "no remote to publish to",
                "set `url` to the hosting repository",
            );
        }
        if self.branch.trim().is_empty() || self.branch.contains(char::is_whitespace) {
            diag.error(
                FieldPath::new("deploy.branch"),
                format!("invalid branch name `{}`", self.branch),
            );
        }
        if let Some(path) = &self.token_path
            && !path.is_file()
        {
            diag.error(
                FieldPath::new("deploy.token_path"),
                format!("file not found: {}", path.display()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};
    use crate::core::BuildEnv;
    use std::path::PathBuf;

    #[test]
    fn test_deploy_config() {
        let config = test_parse_config(
            "[deploy]\nurl = \"git@github.com:user/repo.git\"\nbranch = \"pages\"\nforce = false\ntoken_path = \"~/.github-token\"",
        );
        assert_eq!(config.deploy.url, "git@github.com:user/repo.git");
        assert_eq!(config.deploy.branch, "pages");
        assert!(!config.deploy.force);
        assert_eq!(config.deploy.token_path, Some(PathBuf::from("~/.github-token")));
    }

    #[test]
    fn test_deploy_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.deploy.env, BuildEnv::Production);
        assert_eq!(config.deploy.branch, "gh-pages");
        assert!(config.deploy.force);
    }

    #[test]
    fn test_deploy_requires_url() {
        let config = test_parse_config("");
        let mut diag = ConfigDiagnostics::new();
        config.deploy.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
