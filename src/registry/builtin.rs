//! Registries embedded at compile time.

use crate::error::{DepfetchError, Result};
use crate::platform::Platform;
use crate::registry::manifest::RegistryDocument;
use include_dir::{include_dir, Dir};
use std::path::PathBuf;

/// Embedded registry directory, one `<platform>.yml` per platform.
static REGISTRY_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/registry");

/// Load the built-in registry document for `platform`.
pub fn load_document(platform: Platform) -> Result<RegistryDocument> {
    let name = format!("{}.yml", platform.as_str());
    let display_path = PathBuf::from("registry").join(&name);

    let file = REGISTRY_DIR
        .get_file(&name)
        .ok_or_else(|| DepfetchError::RegistryNotFound {
            path: display_path.clone(),
        })?;

    let content = file
        .contents_utf8()
        .ok_or_else(|| DepfetchError::RegistryParseError {
            path: display_path.clone(),
            message: "Invalid UTF-8".to_string(),
        })?;

    RegistryDocument::parse(content, &display_path)
}
