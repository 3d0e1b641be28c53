// src/invoke/mod.rs

//! Process launch strategies.
//!
//! Every strategy implements [`Invoker`]: given a resolved [`Invocation`],
//! the descriptor's options and environment, and the caller's
//! [`DataHandler`], it starts the OS process and hands back a [`Launched`]
//! value. The child itself is then owned by the supervisor.
//!
//! - [`command`]: shell command line, output buffered until exit.
//! - [`stream`]: no shell, stdout/stderr delivered chunk by chunk.
//! - [`file`]: the image run directly, output buffered until exit.
//! - [`worker`]: worker launch with a stdin message channel, no output wiring.
//! - [`completion`]: what happens with output once the child exits.

pub mod command;
pub mod completion;
pub mod file;
pub mod stream;
pub mod worker;

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::{Child, Command};
use tracing::{debug, error};

use crate::descriptor::InvokeOptions;
use crate::errors::{ProcessError, Result};
use crate::resolver::Invocation;
use crate::types::{ExecutionStrategy, StdioMode};

pub use command::CommandInvoke;
pub use completion::Completion;
pub use file::FileInvoke;
pub use stream::StreamInvoke;
pub use worker::{WorkerInvoke, WORKER_ENV};

/// Output callback: `(error, stdout, stderr)`.
///
/// Buffered strategies call it exactly once after exit with both buffers;
/// the streaming strategy calls it once per chunk with only one slot set.
pub type DataHandler =
    Arc<dyn Fn(Option<ProcessError>, Option<Vec<u8>>, Option<Vec<u8>>) + Send + Sync>;

/// A freshly started process, before supervision.
#[derive(Debug)]
pub struct Launched {
    pub child: Child,
    pub pid: u32,
    pub completion: Completion,
}

/// Shared launch contract of the four strategies.
pub trait Invoker: Send + Sync {
    fn launch(
        &self,
        invocation: &Invocation,
        options: &InvokeOptions,
        env: &BTreeMap<String, String>,
        data: DataHandler,
    ) -> Result<Launched>;
}

impl ExecutionStrategy {
    pub fn invoker(self) -> &'static dyn Invoker {
        match self {
            ExecutionStrategy::Exec => &CommandInvoke,
            ExecutionStrategy::Spawn => &StreamInvoke,
            ExecutionStrategy::ExecFile => &FileInvoke,
            ExecutionStrategy::Fork => &WorkerInvoke,
        }
    }
}

/// Build a shell command appropriate for the platform.
pub(crate) fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}

/// Base command for `invocation`, either through the shell or direct.
pub(crate) fn base_command(
    invocation: &Invocation,
    env: &BTreeMap<String, String>,
    through_shell: bool,
) -> Command {
    let mut cmd = if through_shell {
        shell_command(&invocation.command_line())
    } else {
        let mut c = Command::new(&invocation.executable);
        c.args(&invocation.args);
        c
    };
    cmd.envs(env).kill_on_drop(true);
    cmd
}

pub(crate) fn stdio_for(mode: StdioMode) -> Stdio {
    match mode {
        StdioMode::Inherit => Stdio::inherit(),
        StdioMode::Pipe => Stdio::piped(),
        StdioMode::Null => Stdio::null(),
    }
}

/// Spawn `cmd`, turning an OS failure into a launch error.
///
/// When `report_to` is given the error is also pushed through the data
/// handler's error slot before being returned.
pub(crate) fn spawn_child(
    cmd: &mut Command,
    invocation: &Invocation,
    options: &InvokeOptions,
    report_to: Option<&DataHandler>,
) -> Result<(Child, u32)> {
    let program = invocation.program();
    debug!(program = %program, strategy = ?invocation.strategy, ?options, "spawning process");

    let spawned = cmd.spawn().and_then(|child| match child.id() {
        Some(pid) => Ok((child, pid)),
        None => Err(std::io::Error::other("spawned child has no pid")),
    });

    spawned.map_err(|e| {
        error!(program = %program, error = %e, "failed to start subprocess");
        if let Some(data) = report_to {
            data(Some(ProcessError::launch(&program, &e)), None, None);
        }
        ProcessError::launch(program, &e)
    })
}
