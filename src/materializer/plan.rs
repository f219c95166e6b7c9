//! Dry-run planning.
//!
//! Planning inspects the filesystem the same way a real run does but never
//! writes to it or touches the network.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::{setup_command, Materializer};
use crate::error::Result;
use crate::fetch::ArchiveKind;
use crate::registry::{ArtifactRef, RepositoryRef};

/// What a run would do for one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    /// Archive missing: download (and unpack).
    Download {
        url: String,
        archive: PathBuf,
        kind: ArchiveKind,
    },
    /// Archive on disk from an earlier run: unpack it.
    Extract { archive: PathBuf, kind: ArchiveKind },
    /// Opaque file already on disk.
    Skip { path: PathBuf },
    /// Checkout missing: clone, then run setup.
    Clone {
        url: String,
        branch: String,
        destination: PathBuf,
        setup: String,
    },
    /// Checkout present: pull.
    Pull { branch: String, destination: PathBuf },
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedAction::Download { url, archive, kind } => {
                write!(f, "download {} -> {}", url, archive.display())?;
                if kind.is_archive() {
                    f.write_str(" (extract, then delete)")?;
                }
                Ok(())
            }
            PlannedAction::Extract { archive, .. } => {
                write!(f, "extract {} (already downloaded)", archive.display())
            }
            PlannedAction::Skip { path } => write!(f, "skip {} (present)", path.display()),
            PlannedAction::Clone {
                url,
                branch,
                destination,
                setup,
            } => write!(
                f,
                "clone {} ({}) -> {}, then run {}",
                url,
                branch,
                destination.display(),
                setup
            ),
            PlannedAction::Pull {
                branch,
                destination,
            } => write!(f, "pull {} in {}", branch, destination.display()),
        }
    }
}

impl Materializer {
    /// What [`Materializer::materialize`] would do for `artifact`.
    pub fn plan_archive(&self, artifact: &ArtifactRef) -> Result<PlannedAction> {
        let (archive, kind) = self.archive_path(artifact)?;

        Ok(if !archive.exists() {
            PlannedAction::Download {
                url: artifact.url.clone(),
                archive,
                kind,
            }
        } else if kind.is_archive() {
            PlannedAction::Extract { archive, kind }
        } else {
            PlannedAction::Skip { path: archive }
        })
    }

    /// What [`Materializer::clone_or_pull`] would do for `repo`.
    pub fn plan_repository(&self, repo: &RepositoryRef) -> Result<PlannedAction> {
        let destination = self.destination(&repo.destination)?;

        if destination.exists() {
            return Ok(PlannedAction::Pull {
                branch: repo.branch.clone(),
                destination,
            });
        }

        let (program, args, _) = setup_command(repo, &destination);
        let setup = std::iter::once(program)
            .chain(args)
            .collect::<Vec<_>>()
            .join(" ");

        Ok(PlannedAction::Clone {
            url: repo.url.clone(),
            branch: repo.branch.clone(),
            destination,
            setup,
        })
    }
}
