// src/invoke/worker.rs

use std::collections::BTreeMap;
use std::process::Stdio;

use tracing::info;

use crate::descriptor::InvokeOptions;
use crate::errors::Result;
use crate::invoke::{base_command, spawn_child, Completion, DataHandler, Invoker, Launched};
use crate::resolver::Invocation;
use crate::types::StdioMode;

/// Environment marker telling the child it was started as a worker.
pub const WORKER_ENV: &str = "PROCVISOR_WORKER";

/// Starts a worker whose stdin stays open as a line-oriented message
/// channel (see [`ProcessHandle::send`]).
///
/// The data handler is accepted for contract compatibility but never
/// called. The worker shares the supervisor's stdout/stderr, or writes to
/// null with `stdio = "null"`; nothing is piped back.
///
/// [`ProcessHandle::send`]: crate::supervisor::ProcessHandle::send
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerInvoke;

impl Invoker for WorkerInvoke {
    fn launch(
        &self,
        invocation: &Invocation,
        options: &InvokeOptions,
        env: &BTreeMap<String, String>,
        _data: DataHandler,
    ) -> Result<Launched> {
        info!(worker = %invocation.program(), args = ?invocation.args, "forking worker");

        let mut cmd = base_command(invocation, env, options.shell);
        cmd.env(WORKER_ENV, "1")
            .stdin(Stdio::piped())
            .stdout(output_for(options.stdio))
            .stderr(output_for(options.stdio));

        let (child, pid) = spawn_child(&mut cmd, invocation, options, None)?;

        Ok(Launched {
            child,
            pid,
            completion: Completion::Detached {
                program: invocation.program(),
            },
        })
    }
}

fn output_for(mode: StdioMode) -> Stdio {
    match mode {
        StdioMode::Null => Stdio::null(),
        StdioMode::Inherit | StdioMode::Pipe => Stdio::inherit(),
    }
}
