//! External program execution.

pub mod command;

pub use command::{run, CommandOptions, CommandResult};

/// Whether we are running under a CI service.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "JENKINS_URL", "TF_BUILD"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}
