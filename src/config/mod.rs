//! Site configuration management for `sitepipe.toml`.
//!
//! ```text
//! config/
//! ├── section/   # one module per TOML section
//! ├── types/     # errors, field paths, global handle, output layout
//! └── mod.rs     # SiteConfig (this file)
//! ```
//!
//! The file is optional: without it every section takes its defaults and the
//! current directory is the site root.

pub mod section;
pub mod types;
mod util;

pub use section::{
    BuildConfig, DeployConfig, DiagramsConfig, GeneratorConfig, LintConfig, RevisionConfig,
    ServeConfig, StageConfig, StagesConfig, WatchConfig,
};
pub use types::{
    ConfigDiagnostics, ConfigError, FieldPath, Layout, cfg, init_config, reload_config,
};

use crate::cli::{Cli, Commands, ServeArgs};
use crate::core::BuildEnv;
use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::{find_config_file, resolve_path};

/// Root configuration structure representing `sitepipe.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// CLI arguments reference (internal use only)
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file, which may not exist
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Site root: the config file's directory
    #[serde(skip)]
    pub root: PathBuf,

    /// Build environment from `--env`
    #[serde(skip)]
    pub env: BuildEnv,

    pub generator: GeneratorConfig,
    pub diagrams: DiagramsConfig,
    pub build: BuildConfig,
    pub stages: StagesConfig,
    pub revision: RevisionConfig,
    pub serve: ServeConfig,
    pub watch: WatchConfig,
    pub lint: LintConfig,
    pub deploy: DeployConfig,
}

impl SiteConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from the cwd for the config file. Unknown keys are
    /// reported and ignored.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path) = match find_config_file(&cli.config) {
            Some(path) => (Self::from_path(&path)?, path),
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config))
            }
        };

        config.config_path = crate::utils::path::normalize_path(&config_path);
        config.cli = Some(cli);
        config.finalize(cli, &cwd);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let name = path.file_name().map_or_else(
                || path.to_string_lossy(),
                |n| n.to_string_lossy(),
            );
            log!("warning"; "unknown fields in {name} are ignored: {}", ignored.join(", "));
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Set root, env and absolute paths; apply CLI overrides.
    fn finalize(&mut self, cli: &Cli, cwd: &Path) {
        let root = self
            .config_path
            .parent()
            .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf);
        self.root = crate::utils::path::normalize_path(&root);
        self.env = cli.env;

        crate::logger::set_verbose(cli.verbose);
        if let Some(args) = cli.serve_args() {
            self.apply_serve_args(&args);
        }
        self.normalize_paths();
    }

    fn apply_serve_args(&mut self, args: &ServeArgs) {
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
        Self::update_option(&mut self.serve.watch, args.watch.as_ref());
    }

    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    fn normalize_paths(&mut self) {
        let root = self.root.clone();
        self.build.output = resolve_path(&self.build.output, &root);
        self.serve.cert = resolve_path(&self.serve.cert, &root);
        self.serve.key = resolve_path(&self.serve.key, &root);
        self.watch.paths = self.watch.paths.iter().map(|p| resolve_path(p, &root)).collect();
        if let Some(token) = self.deploy.token_path.take() {
            self.deploy.token_path = Some(resolve_path(&token, &root));
        }
    }

    /// Validate configuration for the current task.
    ///
    /// Collects all problems and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.generator.validate(&mut diag);
        self.diagrams.validate(&mut diag);
        self.build.validate(&mut diag);
        self.stages.validate(&mut diag);
        self.revision.validate(&mut diag);
        self.watch.validate(&mut diag);

        match self.cli.map(Cli::task) {
            Some(Commands::Serve { .. } | Commands::ServeClean { .. }) => {
                self.serve.validate(&mut diag);
            }
            // The env gate runs before this so a development deploy fails on the gate
            Some(Commands::Deploy) if self.env == self.deploy.env => {
                self.deploy.validate(&mut diag);
            }
            _ => {}
        }

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Output directories for the active environment.
    pub fn layout(&self) -> Layout {
        Layout::new(&self.build.output, self.env)
    }

    /// Minification is always on in production.
    pub fn minify(&self) -> bool {
        self.env.is_production() || self.build.minify_dev
    }

    /// Get path relative to the site root, for display.
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Defaults rooted at `root`.
    #[cfg(test)]
    pub fn for_root(root: &Path, env: BuildEnv) -> Self {
        let mut config = Self {
            config_path: root.join("sitepipe.toml"),
            root: root.to_path_buf(),
            env,
            ..Self::default()
        };
        config.normalize_paths();
        config
    }
}

/// Parse config, panicking on unknown fields (catches typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(ignored.is_empty(), "test config has unknown fields: {ignored:?}");
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_toml() {
        assert!(SiteConfig::parse_with_ignored("[serve\nport = 1").is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let (config, ignored) =
            SiteConfig::parse_with_ignored("[serve]\nport = 9000\nbogus = 1\n[nope]\nx = 1").unwrap();
        assert_eq!(config.serve.port, 9000);
        assert!(ignored.iter().any(|f| f.contains("bogus")));
        assert!(ignored.iter().any(|f| f.contains("nope")));
    }

    #[test]
    fn test_minify_follows_env() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::for_root(dir.path(), BuildEnv::Development);
        assert!(!config.minify());
        config.build.minify_dev = true;
        assert!(config.minify());
        assert!(SiteConfig::for_root(dir.path(), BuildEnv::Production).minify());
    }

    #[test]
    fn test_layout_uses_env() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::for_root(dir.path(), BuildEnv::Production);
        let layout = config.layout();
        assert!(layout.serve_dir().ends_with(".sitepipe/production/serve"));
    }

    #[test]
    fn test_validate_collects_sections() {
        let (mut config, _) = SiteConfig::parse_with_ignored(
            "[generator]\ncommand = []\n[revision]\nhash_length = 1\n[watch]\nignore = [\"**/[*\"]",
        )
        .unwrap();
        config.root = PathBuf::from("/site");
        let err = config.validate().unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        assert_eq!(diag.len(), 3);
    }
}
