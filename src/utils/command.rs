//! External command execution.
//!
//! Commands run through the platform shell so command lines may use globs
//! and operators. A nonzero exit status is reported, not raised: callers
//! inspect the captured output to decide whether the run failed.

use std::path::Path;
use std::process::Command;

use serde::Serialize;

use crate::error::{CommandFailedDetails, Error, Result};

/// Captured result of one command invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandOutput {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

/// Runs a command line to completion inside a working directory.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command_line: &str, dir: &Path) -> Result<CommandOutput>;
}

/// Runs command lines with `sh -c` (`cmd /C` on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

// Exit statuses a POSIX shell uses for "not executable" / "not found".
const SHELL_CANNOT_EXECUTE: i32 = 126;
const SHELL_NOT_FOUND: i32 = 127;

impl CommandRunner for ShellRunner {
    fn run(&self, command_line: &str, dir: &Path) -> Result<CommandOutput> {
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command_line]);
            cmd
        };

        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command_line]);
            cmd
        };

        cmd.current_dir(dir);

        let out = cmd.output().map_err(|e| {
            Error::internal_io(
                format!("Failed to run '{}': {}", command_line, e),
                Some("run command".to_string()),
            )
        })?;

        let output = CommandOutput {
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            success: out.status.success(),
            exit_code: out.status.code().unwrap_or(-1),
        };

        if cfg!(not(windows))
            && matches!(output.exit_code, SHELL_CANNOT_EXECUTE | SHELL_NOT_FOUND)
        {
            return Err(Error::command_failed(CommandFailedDetails {
                command: command_line.to_string(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            }));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn captures_stdout_of_successful_command() {
        let out = ShellRunner.run("echo hello", Path::new(".")).unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.exit_code, 0);
    }

    #[cfg(not(windows))]
    #[test]
    fn nonzero_exit_is_reported_not_raised() {
        let out = ShellRunner
            .run("echo problem; exit 3", Path::new("."))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout.trim(), "problem");
    }

    #[cfg(not(windows))]
    #[test]
    fn missing_program_is_an_error() {
        let err = ShellRunner
            .run("nonexistent_command_xyz --fix", Path::new("."))
            .unwrap_err();
        assert_eq!(err.code.as_str(), "command.failed");
        assert_eq!(err.details["exitCode"], 127);
    }
}
