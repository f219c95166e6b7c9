//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`Context`] for the settings every fetching command shares
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::error::Result;
use crate::paths;
use crate::platform::{resolve_platform, Platform};
use crate::registry::Registry;
use crate::ui::UserInterface;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Resolved global settings.
#[derive(Debug, Clone)]
pub struct Context {
    pub platform: Platform,
    pub script_root: PathBuf,
    pub registry_path: Option<PathBuf>,
}

impl Context {
    /// Resolve the platform and script root from CLI flags.
    ///
    /// The platform is resolved first so an unsupported host fails before
    /// any other work.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let platform = resolve_platform(cli.platform.as_deref())?;

        let script_root = match &cli.root {
            Some(root) => paths::normalize(&std::path::absolute(root)?),
            None => paths::default_script_root()?,
        };

        tracing::debug!("Script root: {}", script_root.display());

        Ok(Self {
            platform,
            script_root,
            registry_path: cli.registry.clone(),
        })
    }

    /// Load the registry for this context.
    pub fn load_registry(&self) -> Result<Registry> {
        Registry::load(self.registry_path.as_deref(), self.platform)
    }

    pub fn script_root(&self) -> &Path {
        &self.script_root
    }
}

/// Dispatches CLI commands to their implementations.
#[derive(Debug, Default)]
pub struct CommandDispatcher;

impl CommandDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if let Some(Commands::Completions(args)) = &cli.command {
            return super::completions::CompletionsCommand::new(args.clone()).execute(ui);
        }

        let context = Context::resolve(cli)?;

        match &cli.command {
            Some(Commands::Run(args)) => {
                super::run::RunCommand::new(context, args.clone()).execute(ui)
            }
            Some(Commands::List(args)) => {
                super::list::ListCommand::new(context, args.clone()).execute(ui)
            }
            Some(Commands::Completions(_)) => Ok(CommandResult::success()),
            // No subcommand means a full run.
            None => super::run::RunCommand::new(context, RunArgs::default()).execute(ui),
        }
    }
}
