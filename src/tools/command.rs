//! Shell command execution.

use std::{
    process::{Command, Output, Stdio},
    time::Duration,
};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{MagicError, Result};

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Exit code, `-1` when the process was killed by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

impl From<Output> for CommandOutput {
    fn from(out: Output) -> Self {
        Self {
            code: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }
    }
}

/// Build a command that runs `cmd` in the platform shell, honouring the
/// `SHELL_NAME` environment variable.
pub fn shell_command(cmd: &str) -> Command {
    let shell_name = std::env::var("SHELL_NAME").unwrap_or_default();
    shell_command_with(cmd, &shell_name)
}

/// Build a shell command with an explicit shell preference; empty or
/// `auto` picks the platform default.
///
/// On Windows: PowerShell when `shell_name` says so or `PSModulePath` is
/// set, otherwise cmd.exe. Elsewhere: `shell_name`, then `$SHELL`, falling
/// back to `/bin/sh`.
pub fn shell_command_with(cmd: &str, shell_name: &str) -> Command {
    let shell_name = shell_name.trim();
    let auto = shell_name.is_empty() || shell_name.eq_ignore_ascii_case("auto");
    if cfg!(windows) {
        let override_shell = shell_name.to_ascii_lowercase();
        let prefer_ps = if override_shell.contains("powershell") || override_shell.contains("pwsh") {
            true
        } else if override_shell.contains("cmd") {
            false
        } else {
            !std::env::var("PSModulePath").unwrap_or_default().is_empty()
        };
        if prefer_ps {
            let mut c = Command::new("powershell.exe");
            c.args(["-NoLogo", "-NoProfile", "-Command", cmd]);
            c
        } else {
            let mut c = Command::new("cmd.exe");
            c.args(["/c", cmd]);
            c
        }
    } else {
        let shell = if auto {
            std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".into())
        } else {
            shell_name.to_string()
        };
        let mut c = Command::new(shell);
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `cmd` through the shell and capture its output. A non-zero exit is
/// reported in [`CommandOutput::code`], not as an error.
pub fn execute_command(cmd: &str) -> Result<CommandOutput> {
    debug!(command = cmd, "executing shell command");
    let out = shell_command(cmd)
        .output()
        .map_err(|e| MagicError::command(format!("failed to spawn `{cmd}`: {e}")))?;
    Ok(out.into())
}

/// Trimmed stdout of `cmd`; a non-zero exit becomes an error carrying the
/// exit code and stderr.
pub fn execute_checked(cmd: &str) -> Result<String> {
    check_output(cmd, execute_command(cmd)?)
}

/// Async [`execute_checked`] with an optional time limit.
///
/// The child is killed when the limit passes, so a timed-out command has
/// no further side effects from the shell.
pub async fn execute_checked_async(cmd: &str, limit: Option<Duration>) -> Result<String> {
    debug!(command = cmd, timeout = ?limit, "executing shell command");
    let mut command = tokio::process::Command::from(shell_command(cmd));
    command.stdin(Stdio::null()).kill_on_drop(true);

    let run = command.output();
    let out = match limit {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(out) => out,
            Err(_) => {
                let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                warn!(command = cmd, timeout_ms, "command timed out, child killed");
                return Err(MagicError::Timeout { timeout_ms });
            }
        },
        None => run.await,
    }
    .map_err(|e| MagicError::command(format!("failed to spawn `{cmd}`: {e}")))?;

    check_output(cmd, out.into())
}

fn check_output(cmd: &str, out: CommandOutput) -> Result<String> {
    if out.success() {
        Ok(out.stdout.trim_end().to_string())
    } else {
        Err(MagicError::command(format!(
            "`{cmd}` exited with code {}: {}",
            out.code,
            out.stderr.trim()
        )))
    }
}

/// Run `cmd` with inherited stdio; true when it exits with status 0.
pub fn execute_status(cmd: &str) -> bool {
    match shell_command(cmd).status() {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warn!(command = cmd, code = ?status.code(), "command exited with failure");
            false
        }
        Err(e) => {
            warn!(command = cmd, error = %e, "command could not be started");
            false
        }
    }
}

/// Run a program with explicit arguments, no shell involved.
pub fn execute_args<S: AsRef<std::ffi::OsStr>>(program: &str, args: &[S]) -> Result<CommandOutput> {
    let out = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| MagicError::command(format!("failed to spawn `{program}`: {e}")))?;
    Ok(out.into())
}
