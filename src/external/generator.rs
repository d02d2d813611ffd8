use crate::config::GeneratorConfig;
use crate::core::BuildEnv;
use crate::utils::exec::{Cmd, FilterRule};
use crate::{debug, log};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Produces the raw site into `destination`.
pub trait Generator: Send + Sync {
    fn generate(&self, env: BuildEnv, destination: &Path) -> Result<()>;
}

/// Jekyll's per-run banner lines.
const GENERATOR_FILTER: FilterRule = FilterRule::new(&[
    "Configuration file:",
    "Source:",
    "Destination:",
    "Incremental build:",
    "Generating...",
    "done in",
    "Auto-regeneration:",
]);

/// Runs `generator.command` in the site root.
///
/// Argument order: `<command..> <destination_flag> <destination> <flags.<env>..>`,
/// with `<env_var>=<env>` in the child environment.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    config: GeneratorConfig,
    root: PathBuf,
}

impl CommandGenerator {
    pub fn new(config: &GeneratorConfig, root: &Path) -> Self {
        Self {
            config: config.clone(),
            root: root.to_path_buf(),
        }
    }

    fn command(&self, env: BuildEnv, destination: &Path) -> Cmd {
        Cmd::from_slice(&self.config.command)
            .arg(&self.config.destination_flag)
            .arg(destination)
            .args(self.config.flags_for(env))
            .cwd(&self.root)
            .envs([(self.config.env_var.as_str(), env.as_str())])
            .timeout(self.config.timeout())
            .filter(&GENERATOR_FILTER)
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, env: BuildEnv, destination: &Path) -> Result<()> {
        let cmd = self.command(env, destination);
        let name = cmd.program_name();
        cmd.ensure_available()?;

        log!("generate"; "`{}` ({env})", self.config.command.join(" "));
        let start = Instant::now();
        let output = cmd
            .run()
            .with_context(|| format!("site generator `{name}` failed"))?;

        if crate::logger::is_verbose() {
            GENERATOR_FILTER.log(&name, String::from_utf8_lossy(&output.stdout).trim());
        }
        debug!("generate"; "finished in {:.2?}", start.elapsed());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(command: &[&str]) -> GeneratorConfig {
        GeneratorConfig {
            command: command.iter().map(ToString::to_string).collect(),
            ..GeneratorConfig::default()
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_generator_receives_env_and_destination() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out");
        let script = r#"test "$JEKYLL_ENV" = production && test "$1" = --destination && mkdir -p "$2" && echo "$@" > "$2/args.txt""#;
        let generator = CommandGenerator::new(&config(&["sh", "-c", script, "sh"]), dir.path());

        generator.generate(BuildEnv::Production, &out).unwrap();
        let args = std::fs::read_to_string(out.join("args.txt")).unwrap();
        assert_eq!(args.trim(), format!("--destination {}", out.display()));
    }

    #[cfg(unix)]
    #[test]
    fn test_generator_env_flags_appended() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("out");
        let script = r#"mkdir -p "$2" && echo "$3" > "$2/flag.txt""#;
        let generator = CommandGenerator::new(&config(&["sh", "-c", script, "sh"]), dir.path());

        generator.generate(BuildEnv::Development, &out).unwrap();
        let flag = std::fs::read_to_string(out.join("flag.txt")).unwrap();
        assert_eq!(flag.trim(), "--drafts");
    }

    #[cfg(unix)]
    #[test]
    fn test_generator_failure_surfaces_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = "echo 'Liquid Exception: undefined variable' >&2; exit 1";
        let generator = CommandGenerator::new(&config(&["sh", "-c", script]), dir.path());

        let err = generator
            .generate(BuildEnv::Development, &dir.path().join("out"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("Liquid Exception: undefined variable"));
    }

    #[test]
    fn test_missing_generator_program() {
        let dir = tempfile::TempDir::new().unwrap();
        let generator =
            CommandGenerator::new(&config(&["sitepipe-no-such-generator"]), dir.path());
        let err = generator
            .generate(BuildEnv::Development, &dir.path().join("out"))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
