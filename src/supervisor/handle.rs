// src/supervisor/handle.rs

//! Shared reference to one launched process.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::errors::{ProcessError, Result};
use crate::supervisor::ListenerSet;
use crate::types::{ExecutionStrategy, Signal};

/// Requests the supervising task applies to the child it owns.
#[derive(Debug)]
pub(crate) enum Control {
    CloseStdin,
    Send(String),
    Listen(ListenerSet),
    #[cfg_attr(unix, allow(dead_code))]
    Kill,
}

/// Cheap, clonable reference to a launched process.
///
/// The OS child is owned by its supervising task; every clone of the handle
/// (the registry's, the caller's) only talks to that task or signals the
/// recorded pid. Two handles are the same launch iff they share state.
#[derive(Clone)]
pub struct ProcessHandle {
    inner: Arc<HandleState>,
}

struct HandleState {
    pid: u32,
    strategy: ExecutionStrategy,
    alive: AtomicBool,
    listening: AtomicBool,
    /// Held across "still alive?" + delivery in `signal_detached`, and by
    /// `mark_exited`, so a kill and the reaping of the child never interleave.
    gate: Mutex<()>,
    control: mpsc::UnboundedSender<Control>,
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.inner.pid)
            .field("strategy", &self.inner.strategy)
            .field("alive", &self.is_alive())
            .field("listening", &self.is_listening())
            .finish()
    }
}

impl ProcessHandle {
    pub(crate) fn new(
        pid: u32,
        strategy: ExecutionStrategy,
    ) -> (Self, mpsc::UnboundedReceiver<Control>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            inner: Arc::new(HandleState {
                pid,
                strategy,
                alive: AtomicBool::new(true),
                listening: AtomicBool::new(false),
                gate: Mutex::new(()),
                control: tx,
            }),
        };
        (handle, rx)
    }

    pub fn pid(&self) -> u32 {
        self.inner.pid
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        self.inner.strategy
    }

    /// False once the supervising task has reaped the process.
    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    pub fn same_launch(&self, other: &ProcessHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn gate(&self) -> MutexGuard<'_, ()> {
        self.inner.gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn mark_exited(&self) {
        let _gate = self.gate();
        self.inner.alive.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::SeqCst)
    }

    pub(crate) fn set_listening(&self, on: bool) {
        self.inner.listening.store(on, Ordering::SeqCst);
    }

    /// Deliver `signal` to the process.
    pub fn signal(&self, signal: Signal) -> Result<()> {
        if !self.is_alive() {
            return Err(ProcessError::Kill(format!(
                "process {} has already exited",
                self.inner.pid
            )));
        }
        self.deliver(signal)
    }

    /// Silence this launch's listeners and deliver `signal`.
    ///
    /// Either the process is still unreaped and the signal goes out with
    /// listeners off, or it was already reaped and nothing changes, so its
    /// terminal event still reaches the listeners. A failed delivery turns
    /// the listeners back on.
    pub(crate) fn signal_detached(&self, signal: Signal) -> Result<()> {
        let _gate = self.gate();
        if !self.is_alive() {
            return Err(ProcessError::Kill(format!(
                "process {} has already exited",
                self.inner.pid
            )));
        }
        self.set_listening(false);
        if let Err(err) = self.deliver(signal) {
            self.set_listening(true);
            return Err(err);
        }
        Ok(())
    }

    /// Hand an extra listener set to the supervising task.
    pub(crate) fn listen(&self, set: ListenerSet) -> Result<()> {
        if !self.is_alive() {
            return Err(ProcessError::Configuration(format!(
                "process {} has already exited; no events left to listen for",
                self.inner.pid
            )));
        }
        self.inner
            .control
            .send(Control::Listen(set))
            .map_err(|_| {
                ProcessError::Configuration(format!(
                    "process {} is no longer supervised",
                    self.inner.pid
                ))
            })
    }

    #[cfg(unix)]
    fn deliver(&self, signal: Signal) -> Result<()> {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        tracing::debug!(pid = self.inner.pid, %signal, "delivering signal");
        kill(Pid::from_raw(self.inner.pid as i32), signal.to_nix()).map_err(|e| {
            ProcessError::Kill(format!(
                "delivering {signal} to process {}: {e}",
                self.inner.pid
            ))
        })
    }

    #[cfg(not(unix))]
    fn deliver(&self, signal: Signal) -> Result<()> {
        match signal {
            Signal::Kill | Signal::Terminate => self
                .inner
                .control
                .send(Control::Kill)
                .map_err(|_| ProcessError::Kill(format!("process {} is gone", self.inner.pid))),
            other => Err(ProcessError::Kill(format!(
                "{other} is not supported on this platform"
            ))),
        }
    }

    /// Ask the supervising task to close the child's stdin. Returns false
    /// when the task is already gone, in which case stdin was dropped with it.
    pub fn close_stdin(&self) -> bool {
        self.inner.control.send(Control::CloseStdin).is_ok()
    }

    /// Write one line to a worker's message channel.
    pub fn send(&self, message: impl Into<String>) -> Result<()> {
        if self.inner.strategy != ExecutionStrategy::Fork {
            return Err(ProcessError::Configuration(format!(
                "process {} was not launched as a worker; it has no message channel",
                self.inner.pid
            )));
        }
        if !self.is_alive() {
            return Err(ProcessError::Kill(format!(
                "worker {} has already exited",
                self.inner.pid
            )));
        }
        self.inner
            .control
            .send(Control::Send(message.into()))
            .map_err(|_| ProcessError::Kill(format!("worker {} is gone", self.inner.pid)))
    }
}
