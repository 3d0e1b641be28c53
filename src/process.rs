// src/process.rs

//! Standalone process helpers that do not go through the registry.

use tokio::process::Command;
use tracing::debug;

use crate::errors::{ProcessError, Result};
use crate::invoke::shell_command;

/// Captured output of [`run_command`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `exe args..` as one shell command line and wait for it.
///
/// A non-zero exit becomes [`ProcessError::Runtime`] carrying stderr.
pub async fn run_command(exe: &str, args: &[&str]) -> Result<CommandOutput> {
    let line = std::iter::once(exe)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(cmd = %line, "running one-shot command");

    let mut cmd: Command = shell_command(&line);
    let output = cmd
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ProcessError::launch(exe, &e))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(ProcessError::Runtime {
            program: exe.to_string(),
            code: output.status.code(),
            stderr,
        });
    }

    Ok(CommandOutput { stdout, stderr })
}

/// Whether a process with `pid` exists. A permission error still means it
/// is there.
///
/// Only single processes are probed: 0 and values outside `i32` would
/// address a process group, so they are never running.
#[cfg(unix)]
pub fn is_running(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let raw = match i32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => return false,
    };

    match kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}
