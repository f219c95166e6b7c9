//! Destination path resolution.
//!
//! Registry destinations are relative to the script root (the directory
//! holding the `depfetch` executable unless overridden), never the current
//! working directory. Other build steps depend on that layout.

use std::path::{Component, Path, PathBuf};

use reqwest::Url;

use crate::error::{DepfetchError, Result};

/// Collapse `.` and `..` segments without touching the filesystem.
///
/// The destination usually does not exist yet, so `canonicalize` is not an
/// option. A `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }

    out
}

/// Resolve a registry destination against the script root.
///
/// The result is absolute and normalized, so two spellings of the same
/// directory resolve to the same path before any existence check.
pub fn resolve_destination(script_root: &Path, destination: &str) -> Result<PathBuf> {
    let root = std::path::absolute(script_root)?;
    Ok(normalize(&root.join(destination)))
}

/// Default script root: the directory containing the running executable.
pub fn default_script_root() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(normalize(&dir))
}

/// Local file name for a download URL.
///
/// This is the last segment of the URL path; query and fragment never
/// contribute to it.
pub fn archive_file_name(url: &str) -> Result<String> {
    let invalid = |message: String| DepfetchError::InvalidArtifact {
        url: url.to_string(),
        message,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| invalid("URL has no file name".to_string()))
}
