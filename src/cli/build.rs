//! `build`, `rebuild`, `clean` and `lint` tasks.

use crate::config::SiteConfig;
use crate::core::CancelToken;
use crate::external::{CommandGenerator, CommandRenderer};
use crate::lint;
use crate::log;
use crate::pipeline::{BuildSummary, Pipeline};
use anyhow::{Context, Result};
use std::fs;

/// Run the full pipeline with the configured generator and renderer.
pub fn build_site(config: &SiteConfig) -> Result<BuildSummary> {
    let generator = CommandGenerator::new(&config.generator, &config.root);
    let renderer = CommandRenderer::new(&config.diagrams);
    if config.diagrams.enable {
        renderer.ensure_available()?;
    }
    Pipeline::new(config, &generator, &renderer).run()
}

/// Clean the environment's output, then build.
pub fn rebuild_site(config: &SiteConfig) -> Result<BuildSummary> {
    clean(config)?;
    build_site(config)
}

/// Remove `<output>/<env>/`. Other environments are left alone.
pub fn clean(config: &SiteConfig) -> Result<()> {
    let layout = config.layout();
    let dir = layout.env_root();
    if !dir.exists() {
        return Ok(());
    }
    fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    log!("clean"; "removed {}", config.root_relative(dir).display());
    Ok(())
}

/// Generate, render diagrams and lint the snapshot. Every issue is reported
/// before failing.
pub fn lint_site(config: &SiteConfig) -> Result<()> {
    let generator = CommandGenerator::new(&config.generator, &config.root);
    let renderer = CommandRenderer::new(&config.diagrams);
    let snapshot = Pipeline::new(config, &generator, &renderer).prepare(&CancelToken::new())?;
    let report = lint::run_checks(snapshot.root(), &config.lint)?;
    lint::conclude(&report, config.lint.fail_on_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildEnv;
    use tempfile::TempDir;

    #[test]
    fn test_clean_only_touches_env() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::for_root(dir.path(), BuildEnv::Development);
        let dev = config.layout().serve_dir();
        let prod = config.build.output.join("production/serve");
        fs::create_dir_all(&dev).unwrap();
        fs::create_dir_all(&prod).unwrap();

        clean(&config).unwrap();
        assert!(!config.layout().env_root().exists());
        assert!(prod.exists());
        // already clean
        clean(&config).unwrap();
    }
}
