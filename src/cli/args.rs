//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// depfetch - Fetch third-party build dependencies.
#[derive(Debug, Parser)]
#[command(name = "depfetch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory destinations resolve against (default: the executable's directory)
    #[arg(long, global = true, env = "DEPFETCH_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Registry file to use instead of the built-in one
    #[arg(long, global = true, env = "DEPFETCH_REGISTRY", value_name = "FILE")]
    pub registry: Option<PathBuf>,

    /// Platform to fetch for (default: the host OS)
    #[arg(long, global = true, env = "DEPFETCH_PLATFORM", value_name = "NAME")]
    pub platform: Option<String>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch all dependencies (default if no command specified)
    Run(RunArgs),

    /// Show the registry for the platform
    List(ListArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Show what would be fetched without fetching
    #[arg(long)]
    pub dry_run: bool,

    /// Fetch archives only
    #[arg(long, conflicts_with = "repos_only")]
    pub archives_only: bool,

    /// Clone or pull repositories only
    #[arg(long)]
    pub repos_only: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["depfetch"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from(["depfetch", "run", "--dry-run", "--repos-only"]).unwrap();
        match cli.command {
            Some(Commands::Run(args)) => {
                assert!(args.dry_run);
                assert!(args.repos_only);
                assert!(!args.archives_only);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn only_flags_conflict() {
        let result =
            Cli::try_parse_from(["depfetch", "run", "--archives-only", "--repos-only"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "depfetch",
            "list",
            "--json",
            "--platform",
            "windows",
            "--root",
            "/opt/tools",
        ])
        .unwrap();

        assert_eq!(cli.platform.as_deref(), Some("windows"));
        assert_eq!(cli.root, Some(PathBuf::from("/opt/tools")));
        assert!(matches!(cli.command, Some(Commands::List(ListArgs { json: true }))));
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["depfetch", "-v", "-q"]).is_err());
    }

    #[test]
    fn completions_requires_shell() {
        assert!(Cli::try_parse_from(["depfetch", "completions"]).is_err());
        assert!(Cli::try_parse_from(["depfetch", "completions", "bash"]).is_ok());
    }
}
