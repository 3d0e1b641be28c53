// src/invoke/file.rs

use std::collections::BTreeMap;

use tracing::info;

use crate::descriptor::InvokeOptions;
use crate::errors::Result;
use crate::invoke::command::launch_buffered;
use crate::invoke::{base_command, DataHandler, Invoker, Launched};
use crate::resolver::Invocation;

/// Runs the target image directly (no shell unless `options.shell`), with
/// the same one-shot completion contract as [`CommandInvoke`].
///
/// [`CommandInvoke`]: crate::invoke::CommandInvoke
#[derive(Debug, Clone, Copy, Default)]
pub struct FileInvoke;

impl Invoker for FileInvoke {
    fn launch(
        &self,
        invocation: &Invocation,
        options: &InvokeOptions,
        env: &BTreeMap<String, String>,
        data: DataHandler,
    ) -> Result<Launched> {
        info!(file = %invocation.program(), args = ?invocation.args, "executing file");
        let cmd = base_command(invocation, env, options.shell);
        launch_buffered(cmd, invocation, options, data)
    }
}
