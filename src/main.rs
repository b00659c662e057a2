//! cachet - content-fingerprint cache busting for static assets.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    let verbose = cli.command.verbose();
    cachet::logger::set_verbose(verbose);

    let config = cli.config.as_deref();
    match &cli.command {
        Commands::Build { input, output, .. } => cli::build::build(input, output, config, !verbose),
        Commands::Inspect { input, .. } => {
            println!("{}", cli::inspect::inspect(input, config)?);
            Ok(())
        }
    }
}
