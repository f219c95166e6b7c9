//! Git repository fetching.
//!
//! Clones and updates repositories with the `git` CLI. Results carry the
//! exit status so callers decide what a failed clone or pull means.

use std::path::Path;

use crate::error::Result;
use crate::shell::{self, CommandOptions, CommandResult};

/// Runs git clone/pull for repository dependencies.
#[derive(Debug, Clone)]
pub struct GitFetcher {
    program: String,
}

impl GitFetcher {
    /// Create a fetcher that uses `git` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Create a fetcher that uses a specific git executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The git executable in use.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Clone `url` at `branch` into `dest`.
    ///
    /// `dest` must not exist; its parent is created if needed.
    pub fn clone_repo(&self, url: &str, branch: &str, dest: &Path) -> Result<CommandResult> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Cloning {} ({}) into {}", url, branch, dest.display());

        let dest_arg = dest.to_string_lossy();
        shell::run(
            &self.program,
            ["clone", "--branch", branch, url, dest_arg.as_ref()],
            &CommandOptions::default(),
        )
    }

    /// Fast-forward the checkout at `repo` from `origin/<branch>`.
    pub fn pull(&self, repo: &Path, branch: &str) -> Result<CommandResult> {
        tracing::debug!("Pulling {} in {}", branch, repo.display());

        let options = CommandOptions {
            cwd: Some(repo.to_path_buf()),
            ..Default::default()
        };
        shell::run(
            &self.program,
            ["pull", "--ff-only", "origin", branch],
            &options,
        )
    }

    /// Current HEAD commit of the checkout at `repo`.
    #[cfg(test)]
    pub(crate) fn head_sha(&self, repo: &Path) -> Result<String> {
        let options = CommandOptions {
            cwd: Some(repo.to_path_buf()),
            ..Default::default()
        };
        let result = shell::run(&self.program, ["rev-parse", "HEAD"], &options)?;

        if !result.success {
            return Err(result.into_error());
        }

        Ok(result.stdout.trim().to_string())
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self::new()
    }
}
