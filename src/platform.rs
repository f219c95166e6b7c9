//! Host platform resolution.
//!
//! The registry is partitioned by platform, so the platform is resolved once
//! at startup and passed explicitly to everything that needs it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DepfetchError, Result};

/// Platforms that have a fetch registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
}

impl Platform {
    /// Map an OS identification string to a platform.
    ///
    /// Accepts Rust's `std::env::consts::OS` values as well as the
    /// spellings other tools report (`win32`, `cygwin`, `linux2`, ...).
    ///
    /// # Example
    ///
    /// ```
    /// use depfetch::platform::Platform;
    ///
    /// assert_eq!(Platform::from_os_name("linux").unwrap(), Platform::Linux);
    /// assert_eq!(Platform::from_os_name("Win32").unwrap(), Platform::Windows);
    /// assert!(Platform::from_os_name("plan9").is_err());
    /// ```
    pub fn from_os_name(name: &str) -> Result<Self> {
        let lower = name.trim().to_lowercase();

        if lower.starts_with("linux") {
            return Ok(Platform::Linux);
        }

        match lower.as_str() {
            "windows" | "win32" | "win64" | "cygwin" | "msys" => Ok(Platform::Windows),
            _ => Err(DepfetchError::UnsupportedPlatform {
                name: name.to_string(),
            }),
        }
    }

    /// Lowercase name used in registry file names and `--platform`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the platform to fetch for.
///
/// An explicit override wins; otherwise the compile-time host OS is used.
pub fn resolve_platform(override_name: Option<&str>) -> Result<Platform> {
    let name = override_name.unwrap_or(std::env::consts::OS);
    let platform = Platform::from_os_name(name)?;
    tracing::debug!("Resolved platform '{}' from '{}'", platform, name);
    Ok(platform)
}
