//! `deploy` task: publish the production serve directory.

use crate::config::{ConfigError, SiteConfig};
use crate::utils::date::DateTimeUtc;
use crate::utils::git;
use crate::{debug, log};
use anyhow::Result;
use std::path::Path;

/// Sends a committed repository to the hosting remote.
pub trait Pusher {
    fn push(&self, repo_root: &Path, remote: &str, branch: &str, force: bool) -> Result<()>;
}

/// `git push` through the CLI, so credential helpers and SSH agents work.
pub struct GitPusher;

impl Pusher for GitPusher {
    fn push(&self, repo_root: &Path, remote: &str, branch: &str, force: bool) -> Result<()> {
        git::push(repo_root, remote, branch, force)
    }
}

/// Refuse to publish from any env but `deploy.env`.
pub fn check_env(config: &SiteConfig) -> Result<(), ConfigError> {
    if config.env == config.deploy.env {
        return Ok(());
    }
    Err(ConfigError::DeployEnv {
        actual: config.env.to_string(),
        required: config.deploy.env.to_string(),
    })
}

/// Gate, then `build` (clean + full pipeline), then publish.
pub fn deploy<B>(config: &SiteConfig, build: B, pusher: &dyn Pusher) -> Result<()>
where
    B: FnOnce(&SiteConfig) -> Result<()>,
{
    check_env(config)?;
    build(config)?;
    publish(config, pusher)
}

/// Commit the serve directory as a fresh single-commit repository and push it.
pub fn publish(config: &SiteConfig, pusher: &dyn Pusher) -> Result<()> {
    let deploy = &config.deploy;
    let serve_dir = config.layout().serve_dir();

    let repo = git::create_repo(&serve_dir, &deploy.user_name, &deploy.user_email)?;
    let message = commit_message(&deploy.message, DateTimeUtc::now());
    git::commit_all(&repo, &message)?;
    debug!("deploy"; "{message}");

    let remote = git::authenticated_url(&deploy.url, deploy.token_path.as_deref())?;
    pusher.push(&serve_dir, &remote, &deploy.branch, deploy.force)?;
    log!("deploy"; "published to {} ({})", git::redact_url(&deploy.url), deploy.branch);
    Ok(())
}

/// `Site update: 2026-10-18T09:30:00Z`
fn commit_message(prefix: &str, now: DateTimeUtc) -> String {
    format!("{prefix}: {}", now.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildEnv;
    use parking_lot::Mutex;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingPusher {
        calls: Mutex<Vec<(String, String, bool)>>,
    }

    impl Pusher for RecordingPusher {
        fn push(&self, repo_root: &Path, remote: &str, branch: &str, force: bool) -> Result<()> {
            assert!(repo_root.join(".git").exists());
            self.calls.lock().push((remote.to_string(), branch.to_string(), force));
            Ok(())
        }
    }

    fn configured(root: &Path, env: BuildEnv) -> SiteConfig {
        let mut config = SiteConfig::for_root(root, env);
        config.deploy.url = "https://github.com/user/site.git".into();
        config
    }

    #[test]
    fn test_development_deploy_is_refused_before_side_effects() {
        let dir = TempDir::new().unwrap();
        let config = configured(dir.path(), BuildEnv::Development);
        let pusher = RecordingPusher::default();
        let mut built = false;

        let err = deploy(
            &config,
            |_| {
                built = true;
                Ok(())
            },
            &pusher,
        )
        .unwrap_err();

        assert!(err.downcast_ref::<ConfigError>().is_some());
        assert!(!built);
        assert!(pusher.calls.lock().is_empty());
        assert!(!config.build.output.exists());
    }

    #[test]
    fn test_production_deploy_commits_and_pushes() {
        let dir = TempDir::new().unwrap();
        let mut config = configured(dir.path(), BuildEnv::Production);
        config.deploy.user_name = "tester".into();
        config.deploy.user_email = "tester@example.com".into();
        let pusher = RecordingPusher::default();

        deploy(
            &config,
            |config| {
                let serve = config.layout().serve_dir();
                fs::create_dir_all(&serve)?;
                fs::write(serve.join("index.html"), "<p>hi</p>")?;
                fs::write(serve.join(".nojekyll"), "")?;
                Ok(())
            },
            &pusher,
        )
        .unwrap();

        let calls = pusher.calls.lock();
        assert_eq!(
            *calls,
            [("https://github.com/user/site.git".to_string(), "gh-pages".to_string(), true)]
        );
    }

    #[test]
    fn test_commit_message() {
        let at = DateTimeUtc::from_unix(0);
        assert_eq!(commit_message("Site update", at), "Site update: 1970-01-01T00:00:00Z");
    }
}
