//! # TOML Repository CLI
//!
//! This is the binary entry point for the `toml-repo` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//!
//! The loading logic lives in the `toml_repo` library crate; the binary only
//! wires settings and output around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
