//! # Repos Command Implementation
//!
//! Lists every repo the given URLs expand to, following `repo-ref` entries,
//! from lowest to highest precedence.

use anyhow::Result;
use clap::Args;

use toml_repo::Loader;

use super::RepoArgs;

/// List the repos that would be loaded
#[derive(Args, Debug)]
pub struct ReposArgs {
    #[command(flatten)]
    pub repos: RepoArgs,

    /// Only list repos of this kind
    #[arg(short, long, value_name = "KIND")]
    pub kind: Option<String>,
}

/// Execute the `repos` command.
pub fn execute(args: ReposArgs, loader: Loader) -> Result<()> {
    let manager = args.repos.load(loader)?;

    for repo in manager.repos() {
        if args.kind.as_deref().is_some_and(|kind| kind != repo.kind()) {
            continue;
        }
        println!("{}\t{}\t{}", repo.kind(), repo.url(), repo.config_url());
    }
    Ok(())
}
