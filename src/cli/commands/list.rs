//! List command implementation.
//!
//! The `depfetch list` command shows the registry for the resolved platform
//! with every destination resolved against the script root.

use serde::Serialize;
use std::path::PathBuf;

use crate::cli::args::ListArgs;
use crate::error::{DepfetchError, Result};
use crate::paths;
use crate::registry::{Registry, RegistrySource, SetupStep};
use crate::ui::theme::DepfetchTheme;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, Context};

/// The list command implementation.
pub struct ListCommand {
    context: Context,
    args: ListArgs,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    platform: String,
    source: RegistrySource,
    root: PathBuf,
    archives: Vec<ArchiveEntry>,
    repositories: Vec<RepositoryEntry>,
}

#[derive(Debug, Serialize)]
struct ArchiveEntry {
    url: String,
    destination: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
}

#[derive(Debug, Serialize)]
struct RepositoryEntry {
    url: String,
    branch: String,
    destination: PathBuf,
    setup: SetupStep,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(context: Context, args: ListArgs) -> Self {
        Self { context, args }
    }

    fn build_output(&self, registry: &Registry) -> Result<ListOutput> {
        let root = &self.context.script_root;

        let archives = registry
            .archives()
            .iter()
            .map(|a| {
                Ok(ArchiveEntry {
                    url: a.url.clone(),
                    destination: paths::resolve_destination(root, &a.destination)?,
                    sha256: a.sha256.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let repositories = registry
            .repositories()
            .iter()
            .map(|r| {
                Ok(RepositoryEntry {
                    url: r.url.clone(),
                    branch: r.branch.clone(),
                    destination: paths::resolve_destination(root, &r.destination)?,
                    setup: r.setup.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ListOutput {
            platform: registry.platform().to_string(),
            source: registry.source().clone(),
            root: root.clone(),
            archives,
            repositories,
        })
    }

    fn render_json(output: &ListOutput) -> Result<String> {
        serde_json::to_string_pretty(output).map_err(|e| DepfetchError::Other(e.into()))
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let registry = self.context.load_registry()?;
        let output = self.build_output(&registry)?;

        if self.args.json {
            println!("{}", Self::render_json(&output)?);
            return Ok(CommandResult::success());
        }

        let theme = DepfetchTheme::new();

        ui.show_header(&format!(
            "Registry for {} ({})",
            output.platform, output.source
        ));
        ui.message(&format!("Root: {}", output.root.display()));
        ui.message("");

        ui.message(&format!("Archives ({}):", output.archives.len()));
        for archive in &output.archives {
            ui.message(&format!("  {}", archive.url));
            ui.message(&format!(
                "    {}",
                theme.format_skipped(&archive.destination.display().to_string())
            ));
        }

        ui.message("");
        ui.message(&format!("Repositories ({}):", output.repositories.len()));
        for repo in &output.repositories {
            ui.message(&format!("  {} ({})", repo.url, repo.branch));
            ui.message(&format!(
                "    {}",
                theme.format_skipped(&repo.destination.display().to_string())
            ));
            let setup = match &repo.setup.interpreter {
                Some(interpreter) => format!("{} {}/{}", interpreter, repo.setup.path, repo.setup.entry),
                None => format!("{}/{}", repo.setup.path, repo.setup.entry),
            };
            ui.message(&format!("    setup: {}", setup));
        }

        Ok(CommandResult::success())
    }
}
