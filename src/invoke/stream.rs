// src/invoke/stream.rs

use std::collections::BTreeMap;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::descriptor::InvokeOptions;
use crate::errors::Result;
use crate::invoke::{
    base_command, spawn_child, stdio_for, Completion, DataHandler, Invoker, Launched,
};
use crate::resolver::Invocation;
use crate::types::StdioMode;

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Stdout,
    Stderr,
}

/// Launches without a shell and forwards output as it arrives: one data
/// call per chunk read from each channel, the other two slots unset.
///
/// Output is only observable with `stdio = "pipe"`; with `inherit` or
/// `null` the child writes straight to those targets and no chunk callbacks
/// fire. A failure to start is reported through the error slot, and the
/// exit code is logged rather than forwarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamInvoke;

impl Invoker for StreamInvoke {
    fn launch(
        &self,
        invocation: &Invocation,
        options: &InvokeOptions,
        env: &BTreeMap<String, String>,
        data: DataHandler,
    ) -> Result<Launched> {
        info!(program = %invocation.program(), args = ?invocation.args, "spawning streamed process");

        let mut cmd = base_command(invocation, env, options.shell);
        cmd.stdin(stdio_for(options.stdio))
            .stdout(stdio_for(options.stdio))
            .stderr(stdio_for(options.stdio));

        let (mut child, pid) = spawn_child(&mut cmd, invocation, options, Some(&data))?;
        let program = invocation.program();

        let mut readers = Vec::with_capacity(2);
        if options.stdio == StdioMode::Pipe {
            if let Some(stdout) = child.stdout.take() {
                readers.push(forward_chunks(stdout, Channel::Stdout, data.clone(), &program));
            }
            if let Some(stderr) = child.stderr.take() {
                readers.push(forward_chunks(stderr, Channel::Stderr, data.clone(), &program));
            }
        }

        Ok(Launched {
            child,
            pid,
            completion: Completion::Streamed {
                program,
                readers,
                data,
            },
        })
    }
}

fn forward_chunks<R>(
    mut pipe: R,
    channel: Channel,
    data: DataHandler,
    program: &str,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let program = program.to_string();
    tokio::spawn(async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            match pipe.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    trace!(program = %program, ?channel, bytes = n, "chunk");
                    let chunk = buf[..n].to_vec();
                    match channel {
                        Channel::Stdout => data(None, Some(chunk), None),
                        Channel::Stderr => data(None, None, Some(chunk)),
                    }
                }
                Err(e) => {
                    debug!(program = %program, ?channel, error = %e, "stream read failed");
                    break;
                }
            }
        }
        debug!(program = %program, ?channel, "stream closed");
    })
}
