//! depfetch - Fetch third-party build dependencies.
//!
//! depfetch makes the archives and repositories a native build needs present
//! on disk before the build runs. Archives are downloaded into fixed
//! directories relative to the tool's own location and unpacked there;
//! repositories are cloned (with a one-time setup step) or pulled.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`error`] - Error types and result aliases
//! - [`fetch`] - HTTP downloads, archive extraction, git
//! - [`materializer`] - Making registry entries present on disk
//! - [`paths`] - Destination resolution against the script root
//! - [`platform`] - Host platform resolution
//! - [`registry`] - The table of archives and repositories per platform
//! - [`shell`] - External program execution
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use depfetch::paths::{archive_file_name, resolve_destination};
//! use std::path::Path;
//!
//! assert_eq!(
//!     archive_file_name("https://example.com/dl/glew.zip?raw=1").unwrap(),
//!     "glew.zip"
//! );
//!
//! let dest = resolve_destination(Path::new("/opt/build/scripts"), "../Lib/Ext").unwrap();
//! assert!(dest.ends_with("Lib/Ext"));
//! ```

pub mod cli;
pub mod error;
pub mod fetch;
pub mod materializer;
pub mod paths;
pub mod platform;
pub mod registry;
pub mod shell;
pub mod ui;

pub use error::{DepfetchError, Result};
pub use materializer::{Materializer, MaterializeOutcome, RepositoryOutcome};
pub use platform::Platform;
pub use registry::Registry;
