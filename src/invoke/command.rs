// src/invoke/command.rs

use std::collections::BTreeMap;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::descriptor::InvokeOptions;
use crate::errors::Result;
use crate::invoke::{
    base_command, spawn_child, stdio_for, Completion, DataHandler, Invoker, Launched,
};
use crate::resolver::Invocation;

/// Runs the invocation as one shell command line and reports once, after
/// the process has exited, with the full buffered output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandInvoke;

impl Invoker for CommandInvoke {
    fn launch(
        &self,
        invocation: &Invocation,
        options: &InvokeOptions,
        env: &BTreeMap<String, String>,
        data: DataHandler,
    ) -> Result<Launched> {
        info!(cmd = %invocation.command_line(), "starting shell command");
        let cmd = base_command(invocation, env, true);
        launch_buffered(cmd, invocation, options, data)
    }
}

/// Shared by the blocking strategies: pipe stdout/stderr into reader tasks
/// that collect everything until EOF.
pub(crate) fn launch_buffered(
    mut cmd: Command,
    invocation: &Invocation,
    options: &InvokeOptions,
    data: DataHandler,
) -> Result<Launched> {
    cmd.stdin(stdio_for(options.stdio))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let (mut child, pid) = spawn_child(&mut cmd, invocation, options, Some(&data))?;
    let program = invocation.program();

    let stdout = collect(child.stdout.take(), &program, "stdout");
    let stderr = collect(child.stderr.take(), &program, "stderr");

    Ok(Launched {
        child,
        pid,
        completion: Completion::Buffered {
            program,
            stdout,
            stderr,
            data,
        },
    })
}

fn collect<R>(pipe: Option<R>, program: &str, channel: &'static str) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let program = program.to_string();
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                debug!(program = %program, channel, error = %e, "pipe read failed; keeping partial output");
            }
        }
        buf
    })
}
