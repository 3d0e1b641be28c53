// src/orchestrator.rs

//! Public lifecycle operations: register, look up, launch, kill.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::descriptor::ProcessDescriptor;
use crate::errors::{ProcessError, Result};
use crate::invoke::DataHandler;
use crate::registry::Registry;
use crate::resolver::resolve;
use crate::supervisor::{supervise, CleanupHandler, ListenerSet};
use crate::types::{LifecycleEvent, Signal};

/// Composes registry, resolver, invokers and supervisor.
///
/// Per name the lifecycle is: registered -> launching -> running ->
/// terminated (by `kill` or a terminal event) -> running again on the next
/// launch. Descriptors are never removed.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    registry: Registry,
}

impl Orchestrator {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn register(&self, descriptor: ProcessDescriptor) -> bool {
        self.registry.set(descriptor)
    }

    pub fn get(&self, name: &str) -> Option<ProcessDescriptor> {
        self.registry.get(name)
    }

    pub fn get_many<I, S>(&self, names: I) -> Option<BTreeMap<String, ProcessDescriptor>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.registry.get_many(names)
    }

    /// Launch `action` of the descriptor registered as `name`.
    ///
    /// If the action exists, the stored descriptor is marked with
    /// `other.command = action` and `other.set_process = true` before
    /// resolution, so the selection sticks even when resolving then fails.
    /// Must be called from within a Tokio runtime.
    pub fn execute_action(
        &self,
        name: &str,
        action: &str,
        data: DataHandler,
        cleanup: CleanupHandler,
    ) -> Result<ProcessDescriptor> {
        let mut descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| ProcessError::NotRegistered(name.to_string()))?;

        if descriptor.cmds.contains_key(action) {
            descriptor.other.command = action.to_string();
            descriptor.other.set_process = true;
            self.registry.set(descriptor.clone());
        }

        self.launch(descriptor, action, data, cleanup)
    }

    /// Launch whatever `other.command` currently selects on `descriptor`.
    pub fn execute_process(
        &self,
        descriptor: ProcessDescriptor,
        data: DataHandler,
        cleanup: CleanupHandler,
    ) -> Result<ProcessDescriptor> {
        if descriptor.other.command.is_empty() {
            return Err(ProcessError::Configuration(format!(
                "process '{}' has no command selected to execute",
                descriptor.name
            )));
        }
        let action = descriptor.other.command.clone();
        self.launch(descriptor, &action, data, cleanup)
    }

    fn launch(
        &self,
        descriptor: ProcessDescriptor,
        action: &str,
        data: DataHandler,
        cleanup: CleanupHandler,
    ) -> Result<ProcessDescriptor> {
        let invocation = resolve(&descriptor, action)?;

        info!(name = %descriptor.name, action, strategy = ?invocation.strategy, "launching");
        let launched = invocation.strategy.invoker().launch(
            &invocation,
            &descriptor.options,
            &descriptor.other.env,
            data,
        )?;

        Ok(supervise(descriptor, launched, cleanup, &self.registry))
    }

    /// Attach `handler` for `events` to the running launch of `name`.
    ///
    /// The handler is called with the registered descriptor as it is now,
    /// in addition to the cleanup handler given at launch, and is silenced
    /// by `kill` like every other listener of that launch. Fails when the
    /// registry holds no running handle for `name` (never launched, not
    /// persisted, or already terminated).
    pub fn register_handlers(
        &self,
        name: &str,
        events: &[LifecycleEvent],
        handler: CleanupHandler,
    ) -> Result<ProcessDescriptor> {
        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| ProcessError::NotRegistered(name.to_string()))?;

        let handle = descriptor.handle().cloned().ok_or_else(|| {
            ProcessError::Configuration(format!(
                "process '{name}' is not running; nothing to attach handlers to"
            ))
        })?;

        handle.listen(ListenerSet::for_events(
            handle.clone(),
            descriptor.clone(),
            events,
            handler,
        ))?;

        info!(name, pid = handle.pid(), ?events, "extra handlers attached");
        Ok(descriptor)
    }

    /// Signal the running process of `name` and clear its handle.
    ///
    /// Listeners of that launch are detached first, so the cleanup handler
    /// does not fire for a caller-initiated kill. Returns `false` on any
    /// failure; the cause is only logged. Killing a descriptor that has no
    /// handle is a successful no-op.
    pub fn kill(&self, name: &str, signal: Signal) -> bool {
        match self.try_kill(name, signal) {
            Ok(()) => true,
            Err(err) => {
                warn!(name, %signal, error = %err, "kill failed");
                false
            }
        }
    }

    fn try_kill(&self, name: &str, signal: Signal) -> Result<()> {
        let mut descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| ProcessError::NotRegistered(name.to_string()))?;

        if let Some(handle) = descriptor.handle().cloned() {
            handle.signal_detached(signal)?;
            if !handle.close_stdin() {
                debug!(name, pid = handle.pid(), "supervisor already gone; stdin closed with it");
            }
            descriptor.detach();
        }

        if !self.registry.set(descriptor) {
            return Err(ProcessError::Kill(format!(
                "could not re-store descriptor '{name}'"
            )));
        }

        info!(name, %signal, "process stopped; descriptor retained");
        Ok(())
    }
}
