//! # Get Command Implementation
//!
//! Looks up one dotted path with last-wins precedence and prints the value.
//! Strings are printed bare; other values are printed as TOML or, with
//! `--json`, as JSON.

use anyhow::{bail, Result};
use clap::Args;
use toml::Value;

use toml_repo::Loader;

use super::RepoArgs;

/// Look up a dotted path across the given repos
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Dotted path such as `user.name` or `stages[0].tool`
    #[arg(value_name = "PATH")]
    pub path: String,

    #[command(flatten)]
    pub repos: RepoArgs,

    /// Printed when no repo defines the path
    #[arg(short, long, value_name = "VALUE")]
    pub default: Option<String>,

    /// Print the value as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print which repo supplied the value
    #[arg(long)]
    pub source: bool,
}

/// Execute the `get` command.
pub fn execute(args: GetArgs, loader: Loader) -> Result<()> {
    let manager = args.repos.load(loader)?;

    let Some(found) = manager.lookup(&args.path) else {
        match args.default {
            Some(default) => {
                println!("{}", default);
                return Ok(());
            }
            None => bail!("'{}' is not defined in any repo", args.path),
        }
    };

    println!("{}", render(found.value, args.json)?);
    if args.source {
        eprintln!("from {}", found.repo);
    }
    Ok(())
}

fn render(value: &Value, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(value)?);
    }
    Ok(match value {
        Value::String(s) => s.clone(),
        Value::Table(table) => toml::to_string_pretty(table)?.trim_end().to_string(),
        other => other.to_string(),
    })
}
