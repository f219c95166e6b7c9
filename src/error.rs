//! Error types for depfetch operations.
//!
//! This module defines [`DepfetchError`], the primary error type used
//! throughout the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `DepfetchError` for failures that callers report or map to exit codes
//! - Fetchers in [`crate::fetch`] return `anyhow::Result`; the materializer
//!   wraps those into the domain variants below
//! - Nothing is retried: every error here ends the run

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for depfetch operations.
#[derive(Debug, Error)]
pub enum DepfetchError {
    /// Host OS is neither Linux nor Windows.
    #[error("Unsupported platform: {name} (expected linux or windows)")]
    UnsupportedPlatform { name: String },

    /// Registry file does not exist.
    #[error("Registry not found: {path}")]
    RegistryNotFound { path: PathBuf },

    /// Registry file could not be parsed.
    #[error("Failed to parse registry at {path}: {message}")]
    RegistryParseError { path: PathBuf, message: String },

    /// An artifact entry cannot be materialized as written.
    #[error("Invalid artifact '{url}': {message}")]
    InvalidArtifact { url: String, message: String },

    /// Archive download failed.
    #[error("Download of {url} failed: {message}")]
    DownloadFailed { url: String, message: String },

    /// Archive extraction failed.
    #[error("Failed to extract {path}: {message}")]
    ExtractFailed { path: PathBuf, message: String },

    /// External command could not be run or exited unsuccessfully.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for depfetch operations.
pub type Result<T> = std::result::Result<T, DepfetchError>;
