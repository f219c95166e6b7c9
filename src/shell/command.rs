//! External program execution.
//!
//! Git and post-clone setup scripts run through here. Every run blocks until
//! the child exits and reports its status instead of discarding it.

use crate::error::{DepfetchError, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of running an external program.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Command line as displayed to the user.
    pub command: String,

    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether the program succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Combined stdout and stderr, for error reports.
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}{}", self.stdout, self.stderr),
        }
    }

    /// Convert a failed result into [`DepfetchError::CommandFailed`].
    pub fn into_error(self) -> DepfetchError {
        DepfetchError::CommandFailed {
            command: self.command,
            code: self.exit_code,
        }
    }
}

/// Options for program execution.
#[derive(Debug, Clone)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            env: HashMap::new(),
            capture_stdout: true,
            capture_stderr: true,
        }
    }
}

/// Run `program` with `args` and wait for it to exit.
///
/// Returns `Err` only when the program cannot be started; a non-zero exit
/// is reported through [`CommandResult::success`].
pub fn run<I, S>(program: &str, args: I, options: &CommandOptions) -> Result<CommandResult>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let start = Instant::now();
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let command_line = display_command(program, &args);

    let mut cmd = Command::new(program);
    cmd.args(&args);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());

    if options.capture_stdout {
        cmd.stdout(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
    }

    if options.capture_stderr {
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stderr(Stdio::inherit());
    }

    tracing::debug!("Running: {}", command_line);

    let output = cmd.output().map_err(|e| {
        tracing::debug!("Failed to start '{}': {}", command_line, e);
        DepfetchError::CommandFailed {
            command: command_line.clone(),
            code: None,
        }
    })?;

    let duration = start.elapsed();

    let stdout = if options.capture_stdout {
        String::from_utf8_lossy(&output.stdout).to_string()
    } else {
        String::new()
    };

    let stderr = if options.capture_stderr {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::new()
    };

    tracing::debug!(
        "'{}' exited with {:?} after {:?}",
        command_line,
        output.status.code(),
        duration
    );

    Ok(CommandResult {
        command: command_line,
        exit_code: output.status.code(),
        stdout,
        stderr,
        duration,
        success: output.status.success(),
    })
}

fn display_command(program: &str, args: &[OsString]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn run_successful_program() {
        let result = run("echo", ["hello"], &CommandOptions::default()).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
        assert_eq!(result.command, "echo hello");
    }

    #[cfg(unix)]
    #[test]
    fn run_failing_program_is_not_an_error() {
        let result = run("sh", ["-c", "echo oops >&2; exit 3"], &CommandOptions::default())
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert!(result.stderr.contains("oops"));
        assert!(result.combined_output().contains("oops"));
    }

    #[cfg(unix)]
    #[test]
    fn run_with_env_and_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut options = CommandOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        options
            .env
            .insert("DEPFETCH_TEST_VAR".to_string(), "value".to_string());

        let result = run("sh", ["-c", "echo $DEPFETCH_TEST_VAR; pwd"], &options).unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("value"));
        let dir_name = temp.path().file_name().unwrap().to_string_lossy();
        assert!(result.stdout.contains(dir_name.as_ref()));
    }

    #[test]
    fn missing_program_is_command_failed() {
        let err = run(
            "depfetch-definitely-not-a-program",
            Vec::<String>::new(),
            &CommandOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, DepfetchError::CommandFailed { code: None, .. }));
    }

    #[test]
    fn into_error_keeps_command_and_code() {
        let result = CommandResult {
            command: "git pull".into(),
            exit_code: Some(1),
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::from_millis(5),
            success: false,
        };
        let err = result.into_error();
        assert!(err.to_string().contains("git pull"));
    }

    #[test]
    fn combined_output_empty_when_silent() {
        let result = CommandResult {
            command: "true".into(),
            exit_code: Some(0),
            stdout: "\n".into(),
            stderr: String::new(),
            duration: Duration::ZERO,
            success: true,
        };
        assert!(result.combined_output().is_empty());
    }
}
