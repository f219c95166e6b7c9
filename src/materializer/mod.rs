//! Dependency materialization.
//!
//! The [`Materializer`] makes registry entries present on disk:
//! - archives are downloaded into their destination, unpacked and deleted
//! - repositories are cloned (then set up) or pulled
//!
//! Destinations resolve against the script root, never the working
//! directory.

pub mod plan;
pub mod run;

pub use plan::PlannedAction;
pub use run::{FailedStep, RunOptions, RunSummary};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DepfetchError, Result};
use crate::fetch::{self, ArchiveKind, GitFetcher, HttpFetcher};
use crate::paths;
use crate::registry::{ArtifactRef, RepositoryRef};
use crate::shell::{self, CommandOptions, CommandResult};

/// What [`Materializer::materialize`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// Fetched over the network (and unpacked, for archives).
    Downloaded {
        destination: PathBuf,
        kind: ArchiveKind,
        bytes: u64,
    },
    /// Archive was already on disk from an earlier run; unpacked without
    /// network access.
    Resumed {
        destination: PathBuf,
        kind: ArchiveKind,
    },
    /// Opaque file already on disk; nothing done.
    AlreadyPresent { destination: PathBuf },
}

impl MaterializeOutcome {
    /// Resolved destination directory.
    pub fn destination(&self) -> &Path {
        match self {
            MaterializeOutcome::Downloaded { destination, .. }
            | MaterializeOutcome::Resumed { destination, .. }
            | MaterializeOutcome::AlreadyPresent { destination } => destination,
        }
    }
}

/// What [`Materializer::clone_or_pull`] did.
#[derive(Debug, Clone)]
pub enum RepositoryOutcome {
    /// Fresh clone followed by the setup step.
    Cloned {
        destination: PathBuf,
        setup: CommandResult,
    },
    /// Existing checkout updated in place.
    Pulled {
        destination: PathBuf,
        pull: CommandResult,
    },
}

impl RepositoryOutcome {
    pub fn destination(&self) -> &Path {
        match self {
            RepositoryOutcome::Cloned { destination, .. }
            | RepositoryOutcome::Pulled { destination, .. } => destination,
        }
    }

    /// The setup step after a clone, or the pull.
    pub fn step(&self) -> &CommandResult {
        match self {
            RepositoryOutcome::Cloned { setup, .. } => setup,
            RepositoryOutcome::Pulled { pull, .. } => pull,
        }
    }

    /// The setup or pull step, if it exited unsuccessfully.
    pub fn failed_step(&self) -> Option<&CommandResult> {
        let step = self.step();
        (!step.success).then_some(step)
    }
}

/// Fetches registry entries into directories under a script root.
pub struct Materializer {
    script_root: PathBuf,
    http: HttpFetcher,
    git: GitFetcher,
}

impl Materializer {
    /// Create a materializer with default fetchers.
    pub fn new(script_root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_fetchers(
            script_root,
            HttpFetcher::new()?,
            GitFetcher::new(),
        ))
    }

    /// Create a materializer with explicit fetchers.
    pub fn with_fetchers(script_root: impl Into<PathBuf>, http: HttpFetcher, git: GitFetcher) -> Self {
        Self {
            script_root: script_root.into(),
            http,
            git,
        }
    }

    pub fn script_root(&self) -> &Path {
        &self.script_root
    }

    /// Absolute, normalized path for a registry destination.
    pub fn destination(&self, destination: &str) -> Result<PathBuf> {
        paths::resolve_destination(&self.script_root, destination)
    }

    /// Local path and kind of the archive for `artifact`.
    pub fn archive_path(&self, artifact: &ArtifactRef) -> Result<(PathBuf, ArchiveKind)> {
        let file_name = paths::archive_file_name(&artifact.url)?;
        let dir = self.destination(&artifact.destination)?;
        let kind = ArchiveKind::from_file_name(&file_name);
        Ok((dir.join(file_name), kind))
    }

    /// Make `artifact` present in its destination.
    ///
    /// Nothing goes over the network when the archive file already exists
    /// in the destination.
    pub fn materialize(&self, artifact: &ArtifactRef) -> Result<MaterializeOutcome> {
        let (archive_path, kind) = self.archive_path(artifact)?;
        let destination = archive_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.script_root.clone());

        std::fs::create_dir_all(&destination)?;

        let downloaded = if archive_path.exists() {
            if !kind.is_archive() {
                tracing::debug!("{} already present", archive_path.display());
                return Ok(MaterializeOutcome::AlreadyPresent { destination });
            }
            tracing::debug!(
                "{} left over from an earlier run, extracting without download",
                archive_path.display()
            );
            None
        } else {
            let response = self
                .http
                .download(&artifact.url, &archive_path, artifact.sha256.as_deref())
                .map_err(|e| DepfetchError::DownloadFailed {
                    url: artifact.url.clone(),
                    message: format!("{:#}", e),
                })?;
            Some(response.bytes)
        };

        if kind.is_archive() {
            let entries = fetch::extract(kind, &archive_path, &destination).map_err(|e| {
                DepfetchError::ExtractFailed {
                    path: archive_path.clone(),
                    message: format!("{:#}", e),
                }
            })?;
            std::fs::remove_file(&archive_path)?;
            tracing::debug!(
                "Extracted {} entries into {}",
                entries,
                destination.display()
            );
        }

        Ok(match downloaded {
            Some(bytes) => MaterializeOutcome::Downloaded {
                destination,
                kind,
                bytes,
            },
            None => MaterializeOutcome::Resumed { destination, kind },
        })
    }

    /// Clone `repo` and run its setup step, or pull if already checked out.
    ///
    /// A failed clone is an error. A failed pull or setup step is reported
    /// through the outcome.
    pub fn clone_or_pull(&self, repo: &RepositoryRef) -> Result<RepositoryOutcome> {
        let destination = self.destination(&repo.destination)?;

        if destination.exists() {
            let pull = self.git.pull(&destination, &repo.branch)?;
            if !pull.success {
                tracing::warn!("{} exited with {:?}", pull.command, pull.exit_code);
            }
            return Ok(RepositoryOutcome::Pulled { destination, pull });
        }

        let clone = self.git.clone_repo(&repo.url, &repo.branch, &destination)?;
        if !clone.success {
            tracing::warn!("{}", clone.combined_output().trim());
            return Err(clone.into_error());
        }

        let setup = self.run_setup(repo, &destination);
        if !setup.success {
            tracing::warn!("{} exited with {:?}", setup.command, setup.exit_code);
        }

        Ok(RepositoryOutcome::Cloned { destination, setup })
    }

    /// Run the setup entry point inside `checkout`.
    fn run_setup(&self, repo: &RepositoryRef, checkout: &Path) -> CommandResult {
        let (program, args, cwd) = setup_command(repo, checkout);
        let options = CommandOptions {
            cwd: Some(cwd),
            ..Default::default()
        };

        tracing::debug!("Running setup step {}", program);

        match shell::run(&program, args, &options) {
            Ok(result) => result,
            // A setup script that cannot start is a failed step, not a fatal error.
            Err(e) => CommandResult {
                command: program,
                exit_code: None,
                stdout: String::new(),
                stderr: e.to_string(),
                duration: Duration::ZERO,
                success: false,
            },
        }
    }
}

/// Program, arguments and working directory of a repository's setup step.
pub fn setup_command(repo: &RepositoryRef, checkout: &Path) -> (String, Vec<String>, PathBuf) {
    let dir = paths::normalize(&checkout.join(&repo.setup.path));
    let entry = dir.join(&repo.setup.entry).to_string_lossy().into_owned();

    match &repo.setup.interpreter {
        Some(interpreter) => (interpreter.clone(), vec![entry], dir),
        None => (entry, Vec::new(), dir),
    }
}
