//! Artifact fetching.
//!
//! - [`http`] downloads archives
//! - [`archive`] unpacks `.zip` and `.tgz` files
//! - [`git`] clones and pulls repositories

pub mod archive;
pub mod git;
pub mod http;

pub use archive::{extract, ArchiveKind};
pub use git::GitFetcher;
pub use http::{partial_path, DownloadResponse, HttpFetcher};
