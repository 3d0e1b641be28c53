// src/invoke/completion.rs

//! Post-exit reporting for each strategy.

use std::fmt;
use std::io;
use std::process::ExitStatus;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::ProcessError;
use crate::invoke::DataHandler;

/// What the supervisor must do with output once the child has exited.
pub enum Completion {
    /// Whole stdout/stderr collected by reader tasks; reported once.
    Buffered {
        program: String,
        stdout: JoinHandle<Vec<u8>>,
        stderr: JoinHandle<Vec<u8>>,
        data: DataHandler,
    },
    /// Chunks already delivered by reader tasks; only the exit is left.
    Streamed {
        program: String,
        readers: Vec<JoinHandle<()>>,
        data: DataHandler,
    },
    /// Nothing is wired to the caller.
    Detached { program: String },
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Buffered { program, .. } => {
                f.debug_struct("Buffered").field("program", program).finish()
            }
            Completion::Streamed { program, readers, .. } => f
                .debug_struct("Streamed")
                .field("program", program)
                .field("readers", &readers.len())
                .finish(),
            Completion::Detached { program } => {
                f.debug_struct("Detached").field("program", program).finish()
            }
        }
    }
}

impl Completion {
    pub(crate) async fn finish(self, status: &io::Result<ExitStatus>) {
        match self {
            Completion::Buffered {
                program,
                stdout,
                stderr,
                data,
            } => {
                let stdout = stdout.await.unwrap_or_default();
                let stderr = stderr.await.unwrap_or_default();
                let error = match status {
                    Ok(s) if s.success() => None,
                    Ok(s) => Some(ProcessError::Runtime {
                        program,
                        code: s.code(),
                        stderr: String::from_utf8_lossy(&stderr).trim_end().to_string(),
                    }),
                    Err(e) => Some(runtime_fault(program, e)),
                };
                data(error, Some(stdout), Some(stderr));
            }
            Completion::Streamed {
                program,
                readers,
                data,
            } => {
                // Let the readers drain so every chunk lands before the exit.
                for reader in readers {
                    if let Err(e) = reader.await {
                        debug!(program = %program, error = %e, "stream reader task ended abnormally");
                    }
                }
                match status {
                    Ok(s) => info!(program = %program, exit_code = ?s.code(), "child process exited"),
                    Err(e) => data(Some(runtime_fault(program, e)), None, None),
                }
            }
            Completion::Detached { program } => match status {
                Ok(s) => info!(program = %program, exit_code = ?s.code(), "worker exited"),
                Err(e) => warn!(program = %program, error = %e, "lost track of worker"),
            },
        }
    }
}

fn runtime_fault(program: String, err: &io::Error) -> ProcessError {
    ProcessError::Runtime {
        program,
        code: None,
        stderr: err.to_string(),
    }
}
