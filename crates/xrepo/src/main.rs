//! xrepo CLI entry point

// CLI binary needs to output to stdout
#![allow(clippy::print_stdout)]

use clap::Parser;
use xrepo::cli::Cli;
use xrepo::commands;
use xrepo::tracing::{TracingConfig, init_tracing};

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    init_tracing(TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        filter: cli.log_filter,
    })?;

    let summary = commands::run(cli.command)?;
    println!("{summary}");
    Ok(())
}
