//! Registry files given on the command line.

use crate::error::{DepfetchError, Result};
use crate::registry::manifest::RegistryDocument;
use std::fs;
use std::path::Path;

/// Load a registry document from `path`.
pub fn load_document(path: &Path) -> Result<RegistryDocument> {
    if !path.is_file() {
        return Err(DepfetchError::RegistryNotFound {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!("Loading registry from {}", path.display());

    let content = fs::read_to_string(path)?;
    RegistryDocument::parse(&content, path)
}
