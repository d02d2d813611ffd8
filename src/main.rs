//! sitepipe - build pipeline for generator-based static sites.

mod asset;
mod cli;
mod config;
mod core;
mod external;
mod lint;
mod logger;
mod pipeline;
mod reload;
mod revision;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::build::{build_site, clean, lint_site, rebuild_site};
use cli::deploy::{GitPusher, deploy};
use cli::{Cli, Commands};
use config::{SiteConfig, init_config};

fn main() -> Result<()> {
    // Ctrl+C handler goes in before anything blocks
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(SiteConfig::load(cli)?);

    // `deploy` checks its env gate before cleaning or building
    match cli.task() {
        Commands::Build => build_site(&config).map(drop),
        Commands::Rebuild => rebuild_site(&config).map(drop),
        Commands::Serve { .. } => cli::serve::serve_site(),
        Commands::ServeClean { .. } => {
            clean(&config)?;
            cli::serve::serve_site()
        }
        Commands::Lint => lint_site(&config),
        Commands::Deploy => deploy(&config, |c| rebuild_site(c).map(drop), &GitPusher),
        Commands::Clean => clean(&config),
    }
}
