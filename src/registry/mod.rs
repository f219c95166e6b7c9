//! Fetch registry.
//!
//! The registry is the table of archives and repositories to materialize for
//! one platform. It comes either from the YAML embedded in the binary or from
//! a file passed with `--registry`, is built once at startup and never
//! changes afterwards.
//!
//! # Example
//!
//! ```
//! use depfetch::platform::Platform;
//! use depfetch::registry::Registry;
//!
//! let registry = Registry::builtin(Platform::Linux).unwrap();
//! assert!(!registry.archives().is_empty());
//! ```

pub mod builtin;
pub mod local;
pub mod manifest;

pub use manifest::{ArtifactRef, RegistryDocument, RepositoryRef, SetupStep};

use crate::error::Result;
use crate::platform::Platform;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a registry was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "path")]
pub enum RegistrySource {
    /// Embedded in the binary.
    Builtin,
    /// Loaded from a user file.
    File(PathBuf),
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrySource::Builtin => f.write_str("built-in"),
            RegistrySource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Archives and repositories to fetch for one platform.
#[derive(Debug, Clone, Serialize)]
pub struct Registry {
    platform: Platform,
    source: RegistrySource,
    archives: Vec<ArtifactRef>,
    repositories: Vec<RepositoryRef>,
}

impl Registry {
    /// The registry embedded for `platform`.
    pub fn builtin(platform: Platform) -> Result<Self> {
        let document = builtin::load_document(platform)?;
        Ok(Self::from_document(document, platform, RegistrySource::Builtin))
    }

    /// A registry read from `path`.
    pub fn from_file(path: &Path, platform: Platform) -> Result<Self> {
        let document = local::load_document(path)?;
        Ok(Self::from_document(
            document,
            platform,
            RegistrySource::File(path.to_path_buf()),
        ))
    }

    /// Load from `path` if given, else the built-in registry.
    pub fn load(path: Option<&Path>, platform: Platform) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path, platform),
            None => Self::builtin(platform),
        }
    }

    /// Build a registry from already-parsed entries.
    pub fn from_entries(
        platform: Platform,
        archives: Vec<ArtifactRef>,
        repositories: Vec<RepositoryRef>,
    ) -> Self {
        Self {
            platform,
            source: RegistrySource::Builtin,
            archives,
            repositories,
        }
    }

    fn from_document(document: RegistryDocument, platform: Platform, source: RegistrySource) -> Self {
        let (archives, repositories) = document.select(platform);
        tracing::debug!(
            "Registry ({}) for {}: {} archives, {} repositories",
            source,
            platform,
            archives.len(),
            repositories.len()
        );
        Self {
            platform,
            source,
            archives,
            repositories,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn source(&self) -> &RegistrySource {
        &self.source
    }

    pub fn archives(&self) -> &[ArtifactRef] {
        &self.archives
    }

    pub fn repositories(&self) -> &[RepositoryRef] {
        &self.repositories
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.archives.len() + self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DepfetchError;
    use tempfile::TempDir;

    #[test]
    fn builtin_registry_matches_platform() {
        let registry = Registry::builtin(Platform::Windows).unwrap();
        assert_eq!(registry.platform(), Platform::Windows);
        assert_eq!(registry.source(), &RegistrySource::Builtin);
        assert!(!registry.is_empty());
    }

    #[test]
    fn load_prefers_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deps.yml");
        std::fs::write(
            &path,
            r#"
linux:
  repositories:
    - url: https://example.com/r.git
      branch: main
      destination: ../R
      setup:
        entry: setup.sh
"#,
        )
        .unwrap();

        let registry = Registry::load(Some(&path), Platform::Linux).unwrap();

        assert_eq!(registry.source(), &RegistrySource::File(path.clone()));
        assert!(registry.archives().is_empty());
        assert_eq!(registry.repositories().len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn load_without_path_uses_builtin() {
        let registry = Registry::load(None, Platform::Linux).unwrap();
        assert_eq!(registry.source(), &RegistrySource::Builtin);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = Registry::load(Some(Path::new("/no/such/deps.yml")), Platform::Linux)
            .unwrap_err();
        assert!(matches!(err, DepfetchError::RegistryNotFound { .. }));
    }

    #[test]
    fn from_entries_is_empty_when_given_nothing() {
        let registry = Registry::from_entries(Platform::Linux, vec![], vec![]);
        assert!(registry.is_empty());
    }

    #[test]
    fn source_display() {
        assert_eq!(RegistrySource::Builtin.to_string(), "built-in");
        assert_eq!(
            RegistrySource::File(PathBuf::from("deps.yml")).to_string(),
            "deps.yml"
        );
    }
}
