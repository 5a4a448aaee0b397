//! # Show Command Implementation
//!
//! Prints the effective configuration: every repo's import-resolved tree
//! merged in precedence order.

use anyhow::Result;
use clap::Args;

use toml_repo::Loader;

use super::RepoArgs;

/// Print the merged configuration of the given repos
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub repos: RepoArgs,

    /// Print as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}

/// Execute the `show` command.
pub fn execute(args: ShowArgs, loader: Loader) -> Result<()> {
    let manager = args.repos.load(loader)?;
    let merged = manager.merged();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&merged)?);
    } else {
        print!("{}", toml::to_string_pretty(&merged)?);
    }
    Ok(())
}
