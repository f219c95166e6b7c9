//! Registry file definitions.
//!
//! A registry file lists archives (url to destination) and repositories.
//! It is either flat, or split into `linux:` and `windows:` sections on top
//! of optional shared entries.

use crate::error::{DepfetchError, Result};
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// An archive to download into a destination directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    /// Download URL.
    pub url: String,

    /// Destination directory, relative to the script root.
    pub destination: String,

    /// Expected lowercase hex SHA-256 of the download.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl ArtifactRef {
    /// Create an artifact without a checksum.
    pub fn new(url: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            sha256: None,
        }
    }
}

/// A git repository to clone or pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryRef {
    /// Clone URL.
    pub url: String,

    /// Branch or tag to clone and pull.
    pub branch: String,

    /// Checkout directory, relative to the script root.
    pub destination: String,

    /// Step run once inside a fresh clone.
    pub setup: SetupStep,
}

/// Post-clone setup step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupStep {
    /// Directory inside the checkout that holds the entry point.
    #[serde(default = "default_setup_path")]
    pub path: String,

    /// Script to run, relative to `path`.
    pub entry: String,

    /// Program that runs the entry point (e.g. `python`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
}

fn default_setup_path() -> String {
    ".".to_string()
}

/// Value side of an `archives:` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ArchiveTarget {
    /// `url: destination`
    Destination(String),
    /// `url: { destination, sha256 }`
    Detailed(DetailedTarget),
}

/// Archive destination with a checksum.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedTarget {
    pub destination: String,
    #[serde(default)]
    pub sha256: Option<String>,
}

impl ArchiveTarget {
    fn into_artifact(self, url: String) -> ArtifactRef {
        match self {
            ArchiveTarget::Destination(destination) => ArtifactRef {
                url,
                destination,
                sha256: None,
            },
            ArchiveTarget::Detailed(target) => ArtifactRef {
                url,
                destination: target.destination,
                sha256: target.sha256,
            },
        }
    }
}

/// Entries for one platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformSection {
    #[serde(default)]
    pub archives: BTreeMap<String, ArchiveTarget>,

    #[serde(default)]
    pub repositories: Vec<RepositoryRef>,
}

/// A parsed registry file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryDocument {
    /// Entries shared by every platform.
    #[serde(default)]
    pub archives: BTreeMap<String, ArchiveTarget>,

    #[serde(default)]
    pub repositories: Vec<RepositoryRef>,

    #[serde(default)]
    pub linux: Option<PlatformSection>,

    #[serde(default)]
    pub windows: Option<PlatformSection>,
}

impl RegistryDocument {
    /// Parse YAML, attributing errors to `path`.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        // An empty file is an empty registry.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|e| DepfetchError::RegistryParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Flatten into the entries for `platform`.
    ///
    /// Shared entries come first; a platform entry for the same archive URL
    /// replaces the shared one.
    pub fn select(self, platform: Platform) -> (Vec<ArtifactRef>, Vec<RepositoryRef>) {
        let section = match platform {
            Platform::Linux => self.linux,
            Platform::Windows => self.windows,
        }
        .unwrap_or_default();

        let mut archives = self.archives;
        archives.extend(section.archives);

        let mut repositories = self.repositories;
        repositories.extend(section.repositories);

        let archives = archives
            .into_iter()
            .map(|(url, target)| target.into_artifact(url))
            .collect();

        (archives, repositories)
    }
}
