//! Command-line interface definitions.

use crate::core::BuildEnv;
use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Build pipeline for generator-based static sites
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Build environment; selects `<output>/<env>/` and generator flags
    #[arg(short, long, global = true, value_enum, default_value_t = BuildEnv::Development)]
    pub env: BuildEnv,

    /// Config file path (searched upward from the current directory)
    #[arg(short = 'C', long, global = true, default_value = "sitepipe.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// Task to run (default: serve)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available tasks
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Generate, transform and revision the site
    #[command(visible_alias = "b")]
    Build,

    /// Clean the environment's output, then build
    Rebuild,

    /// Build, serve over HTTPS and rebuild on changes
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },

    /// Clean, build, then serve
    #[command(name = "serve-clean")]
    ServeClean {
        #[command(flatten)]
        args: ServeArgs,
    },

    /// Check CSS, JS, JSON, XML/SVG and HTML; report every issue
    #[command(visible_alias = "l")]
    Lint,

    /// Clean, build and publish to the hosting branch (production only)
    #[command(visible_alias = "d")]
    Deploy,

    /// Remove the environment's output directory
    Clean,
}

/// Dev server overrides
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<std::net::IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Rebuild and reload on file changes
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub watch: Option<bool>,
}

impl Cli {
    /// The task to run; no subcommand means `serve`.
    pub fn task(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve {
            args: ServeArgs::default(),
        })
    }

    pub fn serve_args(&self) -> Option<ServeArgs> {
        match self.task() {
            Commands::Serve { args } | Commands::ServeClean { args } => Some(args),
            _ => None,
        }
    }
}
