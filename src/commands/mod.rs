//! # CLI Command Implementations
//!
//! Each subcommand of the `toml-repo` tool lives in its own module with an
//! `Args` struct derived using `clap` and an `execute` function that calls
//! into the `toml_repo` library.

pub mod get;
pub mod repos;
pub mod show;

use anyhow::{Context, Result};
use clap::Args;

use toml_repo::{Loader, RepoManager};

/// Repos shared by every command, in increasing precedence
#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Repo URL or directory; later repos override earlier ones
    #[arg(short, long = "repo", value_name = "URL", required = true)]
    pub repos: Vec<String>,
}

impl RepoArgs {
    /// Load every repo, plus the repos they reference, into a manager.
    pub fn load(&self, loader: Loader) -> Result<RepoManager> {
        let mut manager = RepoManager::with_loader(loader);
        for url in &self.repos {
            manager
                .add_repo(url)
                .with_context(|| format!("Failed to load repo {}", url))?;
        }
        Ok(manager)
    }
}
