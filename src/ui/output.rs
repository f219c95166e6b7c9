//! Output verbosity.

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Show everything, including captured git and setup output.
    Verbose,
    /// Show progress and status only.
    #[default]
    Normal,
    /// Spinners, warnings, errors and the final status line.
    Quiet,
}

impl OutputMode {
    /// Pick the mode from the global CLI flags. `--quiet` wins over `--verbose`.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if this mode shows captured command output.
    pub fn shows_command_output(&self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Check if this mode shows plain messages and headers.
    pub fn shows_messages(&self) -> bool {
        !matches!(self, Self::Quiet)
    }
}
