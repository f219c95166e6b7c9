//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results. The
//! [`CommandDispatcher`] resolves the shared [`Context`] (platform, script
//! root, registry location) once and routes subcommands to their
//! implementations.

pub mod completions;
pub mod dispatcher;
pub mod list;
pub mod run;

pub use dispatcher::{Command, CommandDispatcher, CommandResult, Context};
