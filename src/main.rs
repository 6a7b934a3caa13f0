//! refnav - Navigable trees of find-references / find-implementations results
//!
//! refnav provides:
//! - Grouping of locations by file with deterministic ordering
//! - Nearest-match resolution for the query cursor
//! - Cyclic navigation across files and matches
//! - Unified output format (jsonl/json/md/raw)

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backends;
mod cli;
mod core;
mod tree;

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "refnav=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    cli::run(cli)
}
