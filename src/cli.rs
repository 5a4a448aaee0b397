//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;

use toml_repo::{Loader, RepoSettings, DEFAULT_CONFIG_SUFFIX};

use crate::commands;

/// TOML Repository - Inspect layered, import-resolved configuration
#[derive(Parser, Debug)]
#[command(name = "toml-repo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// File name looked up inside directory repos
    #[arg(
        long,
        global = true,
        value_name = "NAME",
        env = "TOML_REPO_SUFFIX",
        default_value = DEFAULT_CONFIG_SUFFIX
    )]
    suffix: String,

    /// Directory that `pkg://` URLs are resolved against
    #[arg(long, global = true, value_name = "DIR", env = "TOML_REPO_PKG_ROOT")]
    pkg_root: Option<PathBuf>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up a dotted path across the given repos
    Get(commands::get::GetArgs),

    /// List the repos that would be loaded, including repo-ref discoveries
    Repos(commands::repos::ReposArgs),

    /// Print the merged configuration of the given repos
    Show(commands::show::ShowArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::new()
            .parse_filters(&self.log_level)
            .try_init()
            .context("Failed to initialize logging")?;

        let loader = self.loader();
        debug!("Using loader {:?}", loader);

        match self.command {
            Commands::Get(args) => commands::get::execute(args, loader),
            Commands::Repos(args) => commands::repos::execute(args, loader),
            Commands::Show(args) => commands::show::execute(args, loader),
        }
    }

    fn loader(&self) -> Loader {
        let mut settings = RepoSettings::default().with_config_suffix(self.suffix.as_str());
        if let Some(root) = &self.pkg_root {
            settings = settings.with_pkg_resource_root(root);
        }
        Loader::new(settings)
    }
}
