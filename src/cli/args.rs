//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Content-fingerprint cache busting for static assets
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: <INPUT>/cachet.toml when present)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fingerprint every asset under INPUT and write the result to OUTPUT
    #[command(visible_alias = "b")]
    Build {
        /// Asset directory
        #[arg(value_hint = clap::ValueHint::DirPath)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        output: PathBuf,

        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },

    /// Print the dependency graph of INPUT as JSON
    #[command(visible_alias = "i")]
    Inspect {
        /// Asset directory
        #[arg(value_hint = clap::ValueHint::DirPath)]
        input: PathBuf,

        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },
}

impl Commands {
    pub fn verbose(&self) -> bool {
        match self {
            Self::Build { verbose, .. } | Self::Inspect { verbose, .. } => *verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["cachet", "build", "site", "-o", "dist", "-V"]);
        assert!(cli.command.verbose());
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Build { input, output, .. } => {
                assert_eq!(input, PathBuf::from("site"));
                assert_eq!(output, PathBuf::from("dist"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_inspect_with_config() {
        let cli = Cli::parse_from(["cachet", "-C", "my.toml", "inspect", "site"]);
        assert_eq!(cli.config, Some(PathBuf::from("my.toml")));
        assert!(matches!(cli.command, Commands::Inspect { .. }));
        assert!(!cli.command.verbose());
    }

    #[test]
    fn test_build_requires_output() {
        assert!(Cli::try_parse_from(["cachet", "build", "site"]).is_err());
    }
}
