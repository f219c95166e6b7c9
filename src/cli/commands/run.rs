//! Run command implementation.
//!
//! The `depfetch run` command (and bare `depfetch`) fetches every archive
//! and repository in the registry.

use crate::cli::args::RunArgs;
use crate::error::Result;
use crate::materializer::{Materializer, RunOptions, RunSummary};
use crate::ui::{OutputMode, UserInterface};

use super::dispatcher::{Command, CommandResult, Context};

/// The run command implementation.
pub struct RunCommand {
    context: Context,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(context: Context, args: RunArgs) -> Self {
        Self { context, args }
    }

    fn build_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.args.dry_run,
            skip_archives: self.args.repos_only,
            skip_repositories: self.args.archives_only,
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let registry = self.context.load_registry()?;

        ui.show_header(&format!(
            "Fetching dependencies for {}",
            self.context.platform
        ));

        if self.args.dry_run || ui.output_mode() == OutputMode::Verbose {
            ui.message(&format!("Registry: {}", registry.source()));
            ui.message(&format!("Root: {}", self.context.script_root.display()));
        }

        if self.args.dry_run {
            ui.message("Running in dry-run mode - nothing will be downloaded or cloned");
        }

        if registry.is_empty() {
            ui.success("Nothing to fetch");
            return Ok(CommandResult::success());
        }

        let materializer = Materializer::new(&self.context.script_root)?;
        let summary = materializer.run(&registry, &self.build_options(), ui)?;

        report(&summary, self.args.dry_run, ui)
    }
}

fn report(summary: &RunSummary, dry_run: bool, ui: &mut dyn UserInterface) -> Result<CommandResult> {
    if dry_run {
        ui.success(&format!("{} entries checked", summary.planned));
        return Ok(CommandResult::success());
    }

    if summary.success() {
        ui.success(&format!(
            "Dependencies ready ({} downloaded, {} resumed, {} present, {} cloned, {} pulled)",
            summary.downloaded, summary.resumed, summary.present, summary.cloned, summary.pulled
        ));
        return Ok(CommandResult::success());
    }

    for step in &summary.failed {
        ui.warning(&format!(
            "{}: '{}' exited with {}",
            step.repository,
            step.command,
            step.exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "no status".to_string())
        ));
    }
    ui.error(&format!("{} step(s) failed", summary.failed.len()));
    Ok(CommandResult::failure(1))
}
