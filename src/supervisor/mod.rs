// src/supervisor/mod.rs

//! Supervision of launched processes.
//!
//! [`supervise`] takes a [`Launched`] process, attaches a handle and the
//! fixed [`ListenerSet`], optionally persists the running descriptor, and
//! hands the child to a background task. That task:
//! - applies control requests (close stdin, worker messages, extra
//!   listener sets added while the process runs),
//! - waits for the process to terminate,
//! - lets the invoker's [`Completion`] report output,
//! - fires the matching lifecycle event and detaches the listeners,
//! - clears the registry's handle for this launch.
//!
//! [`Completion`]: crate::invoke::Completion

pub mod handle;
pub mod listeners;

use std::io;
use std::process::ExitStatus;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::descriptor::ProcessDescriptor;
use crate::invoke::{Completion, Launched};
use crate::registry::Registry;
use crate::types::LifecycleEvent;

use handle::Control;

pub use handle::ProcessHandle;
pub use listeners::{CleanupHandler, ListenerSet};

/// Attach `launched` to `descriptor` and start supervising it.
///
/// Returns the descriptor now carrying `pid` and `handle`. Must be called
/// from within a Tokio runtime.
pub fn supervise(
    mut descriptor: ProcessDescriptor,
    launched: Launched,
    cleanup: CleanupHandler,
    registry: &Registry,
) -> ProcessDescriptor {
    let Launched {
        child,
        pid,
        completion,
    } = launched;

    let (handle, control_rx) = ProcessHandle::new(pid, descriptor.other.execution_strategy);
    descriptor.attach(handle.clone());

    let listeners = ListenerSet::attach(handle.clone(), descriptor.clone(), cleanup);

    if descriptor.other.set_process && registry.set(descriptor.clone()) {
        debug!(name = %descriptor.name, pid, "running descriptor persisted");
    }

    info!(name = %descriptor.name, pid, strategy = ?handle.strategy(), "process running");

    let task = SupervisedProcess {
        name: descriptor.name.clone(),
        child,
        completion,
        listeners,
        control_rx,
        handle,
        registry: registry.clone(),
    };
    tokio::spawn(task.run());

    descriptor
}

struct SupervisedProcess {
    name: String,
    child: Child,
    completion: Completion,
    listeners: ListenerSet,
    control_rx: mpsc::UnboundedReceiver<Control>,
    handle: ProcessHandle,
    registry: Registry,
}

impl SupervisedProcess {
    async fn run(self) {
        let SupervisedProcess {
            name,
            mut child,
            completion,
            listeners,
            mut control_rx,
            handle,
            registry,
        } = self;

        let mut stdin = child.stdin.take();
        let mut extra = Vec::new();

        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                Some(msg) = control_rx.recv() => match msg {
                    Control::Listen(set) => extra.push(set),
                    other => apply_control(other, &mut stdin, &mut child, &name).await,
                },
            }
        };
        handle.mark_exited();
        drop(stdin);

        // Sets registered just before the exit still see the terminal event;
        // after `close` further registrations fail at the sender.
        control_rx.close();
        while let Ok(msg) = control_rx.try_recv() {
            if let Control::Listen(set) = msg {
                extra.push(set);
            }
        }

        let event = event_for_status(&status);
        match &status {
            Ok(s) => debug!(name = %name, pid = handle.pid(), exit_code = ?s.code(), %event, "process terminated"),
            Err(e) => warn!(name = %name, pid = handle.pid(), error = %e, "waiting for process failed"),
        }

        completion.finish(&status).await;

        listeners.fire(event);
        for set in &extra {
            set.fire(event);
        }
        listeners.detach();

        if registry.clear_handle_if(&name, &handle) {
            debug!(name = %name, pid = handle.pid(), "handle cleared after termination");
        }
    }
}

async fn apply_control(
    msg: Control,
    stdin: &mut Option<ChildStdin>,
    child: &mut Child,
    name: &str,
) {
    match msg {
        Control::CloseStdin => {
            if stdin.take().is_some() {
                debug!(name = %name, "stdin closed");
            }
        }
        Control::Send(line) => match stdin.as_mut() {
            Some(pipe) => {
                let mut bytes = line.into_bytes();
                bytes.push(b'\n');
                let res = match pipe.write_all(&bytes).await {
                    Ok(()) => pipe.flush().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = res {
                    warn!(name = %name, error = %e, "failed to write to worker channel");
                }
            }
            None => warn!(name = %name, "worker channel already closed; message dropped"),
        },
        Control::Listen(_) => {}
        Control::Kill => {
            if let Err(e) = child.start_kill() {
                warn!(name = %name, error = %e, "failed to kill child process");
            }
        }
    }
}

/// Map how the process ended onto the listened event set.
fn event_for_status(status: &io::Result<ExitStatus>) -> LifecycleEvent {
    match status {
        Ok(status) => signal_event(status).unwrap_or(LifecycleEvent::Exit),
        Err(_) => LifecycleEvent::Fault,
    }
}

#[cfg(unix)]
fn signal_event(status: &ExitStatus) -> Option<LifecycleEvent> {
    use std::os::unix::process::ExitStatusExt;

    use crate::types::Signal;

    status
        .signal()
        .and_then(Signal::from_raw)
        .map(LifecycleEvent::from_signal)
}

#[cfg(not(unix))]
fn signal_event(_status: &ExitStatus) -> Option<LifecycleEvent> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn clean_exit_maps_to_exit_event() {
        let status = ExitStatus::from_raw(0);
        assert_eq!(event_for_status(&Ok(status)), LifecycleEvent::Exit);
    }

    #[test]
    fn non_zero_exit_is_still_exit() {
        // Exit code 3, encoded as a wait status.
        let status = ExitStatus::from_raw(3 << 8);
        assert_eq!(event_for_status(&Ok(status)), LifecycleEvent::Exit);
    }

    #[test]
    fn termination_by_signal_maps_to_signal_event() {
        assert_eq!(
            event_for_status(&Ok(ExitStatus::from_raw(15))),
            LifecycleEvent::Terminate
        );
        assert_eq!(
            event_for_status(&Ok(ExitStatus::from_raw(1))),
            LifecycleEvent::Hangup
        );
    }

    #[test]
    fn unlisted_signal_falls_back_to_exit() {
        // SIGWINCH is not part of the listened set.
        assert_eq!(
            event_for_status(&Ok(ExitStatus::from_raw(28))),
            LifecycleEvent::Exit
        );
    }

    #[test]
    fn wait_error_is_a_fault() {
        let err = io::Error::other("wait failed");
        assert_eq!(event_for_status(&Err(err)), LifecycleEvent::Fault);
    }
}
