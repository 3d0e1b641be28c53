// src/descriptor.rs

//! Typed process descriptor.
//!
//! A descriptor is built once from its raw, deserialized form (see
//! [`crate::config::validate`]) and is never re-validated field by field
//! afterwards. The runtime-only `pid` / `handle` pair is private so it can
//! only be attached and cleared together.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::supervisor::ProcessHandle;
use crate::types::{ExecutionStrategy, ProcessType, StdioMode};

/// One entry of a descriptor's command map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubCommand {
    /// Overrides the descriptor's `exe` for this action.
    pub exe: Option<String>,
    /// Must be empty; all invocation text goes through `args`.
    pub usage: String,
    pub args: Vec<String>,
}

impl SubCommand {
    pub fn with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exe: None,
            usage: String::new(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Options handed to the invocation back-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct InvokeOptions {
    #[serde(default)]
    pub stdio: StdioMode,
    /// Route streaming / direct-file launches through the platform shell.
    #[serde(default)]
    pub shell: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Paths {
    #[serde(default)]
    pub conf: PathBuf,
    /// Directory the executable path is joined onto.
    #[serde(default)]
    pub exe: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtherOptions {
    pub paths: Paths,
    pub env: BTreeMap<String, String>,
    /// Persist the running descriptor back into the registry after launch.
    pub set_process: bool,
    pub execution_strategy: ExecutionStrategy,
    /// Currently selected action; empty until one is chosen.
    pub command: String,
}

#[derive(Debug, Clone)]
pub struct ProcessDescriptor {
    pub name: String,
    pub kind: ProcessType,
    pub exe: String,
    pub cmds: BTreeMap<String, SubCommand>,
    pub options: InvokeOptions,
    pub other: OtherOptions,
    pid: Option<u32>,
    handle: Option<ProcessHandle>,
}

impl ProcessDescriptor {
    pub fn new(name: impl Into<String>, kind: ProcessType, exe: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            exe: exe.into(),
            cmds: BTreeMap::new(),
            options: InvokeOptions::default(),
            other: OtherOptions::default(),
            pid: None,
            handle: None,
        }
    }

    pub fn with_command(mut self, action: impl Into<String>, cmd: SubCommand) -> Self {
        self.cmds.insert(action.into(), cmd);
        self
    }

    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.other.execution_strategy = strategy;
        self
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn handle(&self) -> Option<&ProcessHandle> {
        self.handle.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| h.is_alive())
    }

    pub(crate) fn attach(&mut self, handle: ProcessHandle) {
        self.pid = Some(handle.pid());
        self.handle = Some(handle);
    }

    /// Clear the runtime pair, returning the handle that was attached.
    pub(crate) fn detach(&mut self) -> Option<ProcessHandle> {
        self.pid = None;
        self.handle.take()
    }
}
